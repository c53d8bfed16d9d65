use docannot_syntax::{Annotation, AnnotationError, AnnotationResult, Fields, Value};

use crate::metadata::{Construction, TypeMetadata};
use crate::registry::{ConstructorArgs, TypeRegistry};

/// Which annotation is being built and where it was declared.
pub struct Site<'s> {
    /// Resolved type name passed to the registry.
    pub type_name: &'s str,
    /// Name as written after `@`, quoted in errors.
    pub original: &'s str,
    pub context: &'s str,
}

/// Builds an annotation instance using the strategy its metadata selects.
pub fn instantiate(
    site: &Site<'_>,
    values: Fields,
    metadata: &TypeMetadata,
    registry: &dyn TypeRegistry,
) -> AnnotationResult<Annotation> {
    match metadata.construction() {
        Construction::NamedArguments => {
            let mut slots: Vec<Value> = Vec::new();
            for arg in &metadata.constructor_args {
                if slots.len() <= arg.position {
                    slots.resize(arg.position + 1, Value::Null);
                }
                slots[arg.position] = arg.default.clone();
            }

            for (property, value) in values {
                let Some(arg) = metadata.constructor_arg(&property) else {
                    let available: Vec<&str> = metadata
                        .constructor_args
                        .iter()
                        .map(|arg| arg.name.as_str())
                        .collect();
                    return Err(AnnotationError::creation(
                        format!(
                            "The annotation @{} declared on {} does not have a property named \"{}\" that can be set through its named arguments constructor. Available named arguments: {}",
                            site.original,
                            site.context,
                            property,
                            available.join(", ")
                        ),
                        site.context,
                    ));
                };
                slots[arg.position] = value;
            }

            construct(site, registry, ConstructorArgs::Positional(slots))
        }
        Construction::Constructor => construct(site, registry, ConstructorArgs::Values(values)),
        Construction::Properties => {
            let mut instance = construct(site, registry, ConstructorArgs::Empty)?;
            let rendered = values.to_string();

            for (property, value) in values {
                if metadata.has_property(&property) {
                    instance.set(property, value);
                    continue;
                }
                if property != "value" {
                    return Err(AnnotationError::creation(
                        format!(
                            "The annotation @{} declared on {} does not have a property named \"{}\". Available properties: {}",
                            site.original,
                            site.context,
                            property,
                            metadata.properties.join(", ")
                        ),
                        site.context,
                    ));
                }
                match &metadata.default_property {
                    Some(default) => instance.set(default.clone(), value),
                    None => {
                        return Err(AnnotationError::creation(
                            format!(
                                "The annotation @{} declared on {} does not accept any values, but got {}.",
                                site.original, site.context, rendered
                            ),
                            site.context,
                        ));
                    }
                }
            }
            Ok(instance)
        }
    }
}

fn construct(
    site: &Site<'_>,
    registry: &dyn TypeRegistry,
    args: ConstructorArgs,
) -> AnnotationResult<Annotation> {
    registry.instantiate(site.type_name, args).map_err(|cause| {
        AnnotationError::creation(
            format!(
                "An error occurred while instantiating the annotation @{} declared on {}: \"{}\".",
                site.original, site.context, cause
            ),
            site.context,
        )
    })
}

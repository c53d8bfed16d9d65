use docannot_syntax::{Annotation, AnnotationError, AnnotationResult, SemanticKind, Value};
use once_cell::sync::Lazy;
use regex::Regex;

use super::builtin::{
    self, ATTRIBUTES_TYPE, ENUM_TYPE, NAMED_ARGUMENT_CONSTRUCTOR_TYPE, TARGET_TYPE,
};
use super::{AttributeType, ConstructorArg, EnumConstraint, TypeMetadata, ValueKind};
use crate::registry::TypeRegistry;
use crate::target::Target;

static VAR_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@var\s+(\S+)").expect("Valid regex pattern for @var tags"));

/// Collects metadata for `name` from its descriptor and the meta-annotations
/// in its documentation.
///
/// `context` labels the docblock that referenced the type, for the error
/// raised when the registry cannot describe it.
pub fn collect(
    name: &str,
    registry: &dyn TypeRegistry,
    context: &str,
) -> AnnotationResult<TypeMetadata> {
    let descriptor = registry.describe(name).ok_or_else(|| {
        AnnotationError::semantical(
            SemanticKind::Resolution,
            format!(
                "The annotation \"@{}\" in {} does not exist, or could not be auto-loaded.",
                name, context
            ),
            context,
        )
    })?;

    let doc = descriptor.doc_comment.as_deref().unwrap_or("");
    let params = descriptor.constructor_params();
    let has_constructor = !params.is_empty();

    let mut metadata = TypeMetadata {
        is_annotation: doc.contains("@Annotation"),
        has_constructor,
        has_named_argument_constructor: has_constructor && descriptor.named_arguments,
        ..TypeMetadata::default()
    };

    if !metadata.is_annotation {
        return Ok(metadata);
    }

    let class_context = format!("class @{}", name);
    for meta in builtin::parse_meta(doc, &class_context, Target::CLASS, registry)? {
        if meta.is(TARGET_TYPE) {
            let bits = meta.get("targets").and_then(Value::as_i64).unwrap_or(0);
            metadata.targets = Target::from_bits_truncate(bits as u8);
            metadata.targets_literal = meta
                .get("literal")
                .map(Value::render_plain)
                .unwrap_or_default();
        } else if meta.is(NAMED_ARGUMENT_CONSTRUCTOR_TYPE) {
            metadata.has_named_argument_constructor = has_constructor;
            if has_constructor {
                metadata.default_property = params.first().map(|param| param.name.clone());
            }
        } else if meta.is(ATTRIBUTES_TYPE) {
            let attributes = meta.get("value").and_then(Value::as_array);
            for attribute in attributes.into_iter().flat_map(|list| list.values()) {
                let Some(attribute) = attribute.as_annotation() else {
                    continue;
                };
                let attr_name = attribute.get("name").map(Value::render_plain).unwrap_or_default();
                let declared = attribute.get("type").map(Value::render_plain).unwrap_or_default();
                let required = attribute.get("required").and_then(Value::as_bool).unwrap_or(false);
                add_attribute_type(&mut metadata, &attr_name, &declared, required);
            }
        }
    }

    if !has_constructor {
        for field in &descriptor.fields {
            metadata.properties.push(field.name.clone());

            let comment = field.doc_comment.as_deref();
            if comment.is_none() && field.declared_type.is_none() {
                continue;
            }
            let comment = comment.unwrap_or("");

            let required = comment.contains("@Required");
            let declared = VAR_TYPE
                .captures(comment)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
                .or_else(|| field.declared_type.clone())
                .unwrap_or_else(|| "mixed".to_string());
            add_attribute_type(&mut metadata, &field.name, &declared, required);

            if !comment.contains("@Enum") {
                continue;
            }
            let field_context = format!("property {}::${}", name, field.name);
            for meta in builtin::parse_meta(comment, &field_context, Target::PROPERTY, registry)? {
                if meta.is(ENUM_TYPE) {
                    metadata
                        .enums
                        .push((field.name.clone(), enum_constraint(&meta)));
                }
            }
        }
        metadata.default_property = metadata.properties.first().cloned();
    } else if metadata.has_named_argument_constructor {
        for (position, param) in params.iter().enumerate() {
            if param.variadic {
                break;
            }
            metadata.constructor_args.push(ConstructorArg {
                name: param.name.clone(),
                position,
                default: param.default.clone().unwrap_or(Value::Null),
            });
        }
    }

    Ok(metadata)
}

fn enum_constraint(meta: &Annotation) -> EnumConstraint {
    let values: Vec<Value> = meta
        .get("value")
        .and_then(Value::as_array)
        .map(|list| list.values().cloned().collect())
        .unwrap_or_default();
    let literals: Vec<String> = match meta.get("literal").and_then(Value::as_array) {
        Some(literal) if !literal.is_empty() => {
            literal.values().map(Value::render_plain).collect()
        }
        _ => values.iter().map(Value::render_plain).collect(),
    };
    EnumConstraint { values, literals }
}

/// Canonical spelling of scalar type names.
fn normalize(type_name: &str) -> &str {
    match type_name {
        "float" => "double",
        "bool" | "Boolean" => "boolean",
        "int" => "integer",
        other => other,
    }
}

fn add_attribute_type(metadata: &mut TypeMetadata, name: &str, declared: &str, required: bool) {
    let normalized = normalize(declared);
    if normalized == "mixed" {
        return;
    }

    let (kind, element) = if let Some(open) = normalized.find('<') {
        let inner = &normalized[open + 1..];
        let inner = inner.strip_suffix('>').unwrap_or(inner);
        (ValueKind::Array, Some(ValueKind::from_name(normalize(inner))))
    } else if let Some(inner) = normalized.strip_suffix("[]") {
        (ValueKind::Array, Some(ValueKind::from_name(normalize(inner))))
    } else {
        (ValueKind::from_name(normalized), None)
    };

    metadata.set_attribute_type(
        name,
        AttributeType {
            kind,
            element,
            declared: declared.to_string(),
            required,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ConstructorParam, FieldDescriptor, StaticRegistry, TypeDef};

    fn collect_from(def: TypeDef) -> AnnotationResult<TypeMetadata> {
        let name = def.name().to_string();
        let registry = StaticRegistry::new().with_type(def);
        collect(&name, &registry, "class Test")
    }

    #[test]
    fn test_plain_type_is_not_annotation() {
        let metadata = collect_from(TypeDef::new("Helper").doc("/** Just a helper. */")).unwrap();
        assert!(!metadata.is_annotation);
        assert!(metadata.properties.is_empty());
    }

    #[test]
    fn test_field_types_and_required() {
        let metadata = collect_from(
            TypeDef::annotation("Route")
                .typed_field("path", "/** @Required @var string */")
                .typed_field("methods", "/** @var array<string> */")
                .typed_field("priority", "/** @var int */")
                .typed_field("options", "/** @var mixed */")
                .field(FieldDescriptor::new("raw")),
        )
        .unwrap();

        assert_eq!(metadata.properties, vec!["path", "methods", "priority", "options", "raw"]);
        assert_eq!(metadata.default_property.as_deref(), Some("path"));

        let path = metadata.attribute_type("path").unwrap();
        assert_eq!(path.kind, ValueKind::String);
        assert!(path.required);

        let methods = metadata.attribute_type("methods").unwrap();
        assert_eq!(methods.kind, ValueKind::Array);
        assert_eq!(methods.element, Some(ValueKind::String));
        assert_eq!(methods.declared, "array<string>");

        assert_eq!(metadata.attribute_type("priority").unwrap().kind, ValueKind::Integer);
        assert!(metadata.attribute_type("options").is_none());
        assert!(metadata.attribute_type("raw").is_none());
    }

    #[test]
    fn test_bracket_array_and_declared_type_fallback() {
        let metadata = collect_from(
            TypeDef::annotation("Tags")
                .typed_field("names", "/** @var float[] */")
                .field(FieldDescriptor::new("flag").declared("bool")),
        )
        .unwrap();
        let names = metadata.attribute_type("names").unwrap();
        assert_eq!(names.element, Some(ValueKind::Double));
        assert_eq!(metadata.attribute_type("flag").unwrap().kind, ValueKind::Boolean);
    }

    #[test]
    fn test_targets_from_doc() {
        let metadata = collect_from(
            TypeDef::annotation("Column").doc("/**\n * @Annotation\n * @Target({\"PROPERTY\", \"ANNOTATION\"})\n */"),
        )
        .unwrap();
        assert_eq!(metadata.targets, Target::PROPERTY | Target::ANNOTATION);
        assert_eq!(metadata.targets_literal, "PROPERTY, ANNOTATION");
    }

    #[test]
    fn test_attributes_declared_on_class() {
        let metadata = collect_from(
            TypeDef::annotation("Cache")
                .doc(
                    r#"/**
                      * @Annotation
                      * @Attributes({
                      *   @Attribute("ttl", type="integer", required=true),
                      *   @Attribute("tags", type="array<string>"),
                      * })
                      */"#,
                )
                .field(FieldDescriptor::new("ttl"))
                .field(FieldDescriptor::new("tags")),
        )
        .unwrap();
        let ttl = metadata.attribute_type("ttl").unwrap();
        assert_eq!(ttl.kind, ValueKind::Integer);
        assert!(ttl.required);
        assert!(!metadata.attribute_type("tags").unwrap().required);
    }

    #[test]
    fn test_enum_on_field() {
        let metadata = collect_from(
            TypeDef::annotation("Route").typed_field(
                "method",
                r#"/** @var string @Enum({"GET", "POST"}) */"#,
            ),
        )
        .unwrap();
        let (field, constraint) = &metadata.enums[0];
        assert_eq!(field, "method");
        assert!(constraint.allows(&Value::from("GET")));
        assert!(!constraint.allows(&Value::from("PUT")));
        assert_eq!(constraint.literals, vec!["GET", "POST"]);
    }

    #[test]
    fn test_named_argument_constructor() {
        let metadata = collect_from(
            TypeDef::annotation("Length")
                .doc("/** @Annotation @NamedArgumentConstructor */")
                .constructor(vec![
                    ConstructorParam::new("min"),
                    ConstructorParam::new("max").with_default(Value::Integer(255)),
                    ConstructorParam::new("rest").variadic(),
                ]),
        )
        .unwrap();
        assert!(metadata.has_named_argument_constructor);
        assert_eq!(metadata.default_property.as_deref(), Some("min"));
        assert_eq!(metadata.constructor_args.len(), 2);
        assert_eq!(metadata.constructor_arg("max").unwrap().default, Value::Integer(255));
        assert_eq!(metadata.constructor_arg("max").unwrap().position, 1);
    }

    #[test]
    fn test_marker_trait_enables_named_arguments() {
        let metadata = collect_from(
            TypeDef::annotation("Length")
                .named_arguments()
                .constructor(vec![ConstructorParam::new("min")]),
        )
        .unwrap();
        assert!(metadata.has_named_argument_constructor);
        assert!(metadata.default_property.is_none());
        assert_eq!(metadata.constructor_args.len(), 1);
    }

    #[test]
    fn test_plain_constructor() {
        let metadata = collect_from(
            TypeDef::annotation("Options").constructor(vec![ConstructorParam::new("values")]),
        )
        .unwrap();
        assert!(metadata.has_constructor);
        assert!(!metadata.has_named_argument_constructor);
        assert!(metadata.constructor_args.is_empty());
        assert!(metadata.default_property.is_none());
    }

    #[test]
    fn test_invalid_target_surfaces_as_creation_error() {
        let err = collect_from(TypeDef::annotation("Bad").doc("/** @Annotation @Target(\"NOWHERE\") */"))
            .unwrap_err();
        assert!(err.is_creation());
        assert_eq!(err.context(), "class @Bad");
    }
}

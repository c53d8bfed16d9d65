//! Meta-annotations read from annotation type documentation.
//!
//! `@Target`, `@Attributes`/`@Attribute`, `@Enum` and
//! `@NamedArgumentConstructor` are parsed with the regular [`DocParser`],
//! but against a [`MetaRegistry`] that only knows these five types and a
//! cache that already holds their metadata. Collecting metadata for a meta
//! type therefore never recurses.

use anyhow::{anyhow, bail};
use docannot_syntax::{
    Annotation, AnnotationError, AnnotationResult, ArrayKey, ArrayValue, Fields, Value,
};
use once_cell::sync::Lazy;

use super::{AttributeType, MetadataCache, TypeMetadata, ValueKind};
use crate::context::{ImportTable, ParserContext};
use crate::parser::DocParser;
use crate::registry::{ConstructorArgs, TypeDescriptor, TypeRegistry, same_type};
use crate::target::Target;

pub const TARGET_TYPE: &str = "Annotation\\Target";
pub const ENUM_TYPE: &str = "Annotation\\Enum";
pub const ATTRIBUTE_TYPE: &str = "Annotation\\Attribute";
pub const ATTRIBUTES_TYPE: &str = "Annotation\\Attributes";
pub const NAMED_ARGUMENT_CONSTRUCTOR_TYPE: &str = "Annotation\\NamedArgumentConstructor";

const META_TYPES: [&str; 5] = [
    TARGET_TYPE,
    ENUM_TYPE,
    ATTRIBUTE_TYPE,
    ATTRIBUTES_TYPE,
    NAMED_ARGUMENT_CONSTRUCTOR_TYPE,
];

fn attribute(kind: ValueKind, element: Option<ValueKind>, declared: &str, required: bool) -> AttributeType {
    AttributeType {
        kind,
        element,
        declared: declared.to_string(),
        required,
    }
}

fn meta_metadata(targets: Target, literal: &str) -> TypeMetadata {
    TypeMetadata {
        is_annotation: true,
        targets,
        targets_literal: literal.to_string(),
        ..TypeMetadata::default()
    }
}

static BUILTIN_METADATA: Lazy<MetadataCache> = Lazy::new(|| {
    let cache = MetadataCache::new();

    // `value` is checked by `build_target`.
    let mut target = meta_metadata(Target::CLASS, "CLASS");
    target.has_constructor = true;
    target.default_property = Some("value".to_string());
    cache.insert(TARGET_TYPE, target);

    let mut attr = meta_metadata(Target::ANNOTATION, "ANNOTATION");
    attr.default_property = Some("name".to_string());
    attr.properties = vec!["name".into(), "type".into(), "required".into()];
    attr.set_attribute_type("name", attribute(ValueKind::String, None, "string", true));
    attr.set_attribute_type("type", attribute(ValueKind::String, None, "string", true));
    attr.set_attribute_type("required", attribute(ValueKind::Boolean, None, "boolean", false));
    cache.insert(ATTRIBUTE_TYPE, attr);

    let mut attrs = meta_metadata(Target::CLASS, "CLASS");
    attrs.default_property = Some("value".to_string());
    attrs.properties = vec!["value".into()];
    attrs.set_attribute_type(
        "value",
        attribute(
            ValueKind::Array,
            Some(ValueKind::Type(ATTRIBUTE_TYPE.to_string())),
            "array<Annotation\\Attribute>",
            true,
        ),
    );
    cache.insert(ATTRIBUTES_TYPE, attrs);

    let mut enumeration = meta_metadata(Target::PROPERTY, "PROPERTY");
    enumeration.has_constructor = true;
    enumeration.default_property = Some("value".to_string());
    enumeration.properties = vec!["value".into()];
    enumeration.set_attribute_type("value", attribute(ValueKind::Array, None, "array", true));
    enumeration.set_attribute_type("literal", attribute(ValueKind::Array, None, "array", false));
    cache.insert(ENUM_TYPE, enumeration);

    cache.insert(
        NAMED_ARGUMENT_CONSTRUCTOR_TYPE,
        meta_metadata(Target::CLASS, "CLASS"),
    );

    cache
});

/// Registry seen by the meta parser: the five meta types, with constants
/// delegated to the host.
pub(crate) struct MetaRegistry<'h> {
    host: &'h dyn TypeRegistry,
}

impl<'h> MetaRegistry<'h> {
    pub(crate) fn new(host: &'h dyn TypeRegistry) -> Self {
        Self { host }
    }
}

fn canonical(name: &str) -> Option<&'static str> {
    META_TYPES.into_iter().find(|meta| same_type(meta, name))
}

impl TypeRegistry for MetaRegistry<'_> {
    fn exists(&self, name: &str) -> bool {
        canonical(name).is_some()
    }

    // Metadata for meta types is pre-seeded, so nothing asks for it.
    fn describe(&self, _name: &str) -> Option<TypeDescriptor> {
        None
    }

    fn constant(&self, name: &str) -> Option<Value> {
        self.host.constant(name)
    }

    fn instantiate(&self, name: &str, args: ConstructorArgs) -> anyhow::Result<Annotation> {
        let name = canonical(name).ok_or_else(|| anyhow!("unknown meta annotation {}", name))?;
        match (name, args) {
            (TARGET_TYPE, ConstructorArgs::Values(values)) => build_target(values),
            (ENUM_TYPE, ConstructorArgs::Values(values)) => build_enum(values),
            (ATTRIBUTE_TYPE, ConstructorArgs::Empty) => Ok(Annotation::new(ATTRIBUTE_TYPE)
                .with_property("name", Value::Null)
                .with_property("type", Value::Null)
                .with_property("required", Value::Bool(false))),
            (ATTRIBUTES_TYPE, ConstructorArgs::Empty) => {
                Ok(Annotation::new(ATTRIBUTES_TYPE).with_property("value", Value::Null))
            }
            (NAMED_ARGUMENT_CONSTRUCTOR_TYPE, ConstructorArgs::Empty) => {
                Ok(Annotation::new(NAMED_ARGUMENT_CONSTRUCTOR_TYPE))
            }
            (name, args) => bail!("{} cannot be built from {:?}", name, args),
        }
    }
}

fn type_of(value: &Value) -> String {
    match value {
        Value::Annotation(instance) => instance.type_name().to_string(),
        other => other.kind_label().to_string(),
    }
}

fn build_target(values: Fields) -> anyhow::Result<Annotation> {
    let value = values.get("value").cloned().unwrap_or(Value::Null);
    let literals: Vec<String> = match &value {
        Value::String(literal) => vec![literal.clone()],
        Value::Array(items) => items.values().map(Value::render_plain).collect(),
        other => bail!(
            "@Target expects either a string value, or an array of strings, \"{}\" given.",
            type_of(other)
        ),
    };

    let mut targets = Target::empty();
    for literal in &literals {
        match Target::from_literal(literal) {
            Some(bits) => targets |= bits,
            None => bail!(
                "Invalid Target \"{}\". Available targets: [{}]",
                literal,
                Target::available_literals()
            ),
        }
    }

    Ok(Annotation::new(TARGET_TYPE)
        .with_property("value", value)
        .with_property("targets", Value::Integer(i64::from(targets.bits())))
        .with_property("literal", Value::String(literals.join(", "))))
}

fn build_enum(values: Fields) -> anyhow::Result<Annotation> {
    let enumerators = match values.get("value") {
        Some(Value::Array(items)) => items.clone(),
        _ => ArrayValue::new(),
    };
    let literal = match values.get("literal") {
        Some(Value::Array(items)) => items.clone(),
        _ => ArrayValue::new(),
    };

    for value in enumerators.values() {
        if !value.is_scalar() {
            bail!("@Enum supports only scalar values \"{}\" given.", type_of(value));
        }
    }

    for (key, label) in literal.iter() {
        let key_value = match key {
            ArrayKey::Int(n) => Value::Integer(*n),
            ArrayKey::Str(s) => Value::String(s.clone()),
        };
        if !enumerators.contains_value(&key_value) {
            bail!(
                "Undefined enumerator value \"{}\" for literal \"{}\".",
                key,
                label.render_plain()
            );
        }
    }

    Ok(Annotation::new(ENUM_TYPE)
        .with_property("value", Value::Array(enumerators))
        .with_property("literal", Value::Array(literal)))
}

/// Parses the meta-annotations in the documentation of an annotation type
/// or one of its fields.
pub(crate) fn parse_meta(
    doc: &str,
    description: &str,
    target: Target,
    host: &dyn TypeRegistry,
) -> AnnotationResult<Vec<Annotation>> {
    let imports = ImportTable::new()
        .with("enum", ENUM_TYPE)
        .with("target", TARGET_TYPE)
        .with("attribute", ATTRIBUTE_TYPE)
        .with("attributes", ATTRIBUTES_TYPE)
        .with("namedargumentconstructor", NAMED_ARGUMENT_CONSTRUCTOR_TYPE);

    let ctx = ParserContext::new(description)
        .with_target(target)
        .ignore_not_imported(true)
        .with_imports(imports)
        .map_err(|err| AnnotationError::creation(err.to_string(), description))?;

    let registry = MetaRegistry::new(host);
    DocParser::new(&registry, &BUILTIN_METADATA).parse(doc, &ctx)
}

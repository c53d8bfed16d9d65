//! Argument reconciliation and validation against collected metadata.

use docannot_syntax::{
    AnnotationError, AnnotationResult, ArrayValue, Fields, SemanticKind, Value,
};
use smallvec::SmallVec;

use crate::metadata::{TypeMetadata, ValueKind};
use crate::registry::TypeRegistry;

/// Arguments of one annotation call, split by how they were written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    /// Bare values with their index among all arguments of the call.
    pub positional: SmallVec<[(usize, Value); 4]>,
    pub named: Fields,
}

/// A positional argument followed a named one where positions map to
/// constructor parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionalAfterNamed;

/// Folds positional arguments into the named map.
///
/// For named-argument constructors with a default property, positional
/// arguments fill constructor parameters by position and must form the
/// contiguous prefix `0, 1, 2, ...` of the call. Otherwise a single
/// positional argument becomes `value`, several become a list in `value`,
/// unless a named `value` was given.
pub fn reconcile_arguments(
    arguments: Arguments,
    metadata: &TypeMetadata,
) -> Result<Fields, PositionalAfterNamed> {
    let Arguments {
        positional,
        mut named,
    } = arguments;

    if metadata.has_named_argument_constructor && metadata.default_property.is_some() {
        for (expected, (position, _)) in positional.iter().enumerate() {
            if *position != expected {
                return Err(PositionalAfterNamed);
            }
        }

        for arg in &metadata.constructor_args {
            if named.is_set(&arg.name) {
                continue;
            }
            if let Some((_, value)) = positional.iter().find(|(pos, _)| *pos == arg.position) {
                if !value.is_null() {
                    named.insert(arg.name.clone(), value.clone());
                }
            }
        }
        return Ok(named);
    }

    if !positional.is_empty() && !named.is_set("value") {
        let value = if positional.len() == 1 {
            positional.into_iter().map(|(_, v)| v).next().unwrap_or(Value::Null)
        } else {
            Value::Array(ArrayValue::from_list(positional.into_iter().map(|(_, v)| v)))
        };
        named.insert("value", value);
    }
    Ok(named)
}

/// Rejects enum-constrained values outside their allowed set.
pub fn check_enums(
    values: &Fields,
    metadata: &TypeMetadata,
    name: &str,
    context: &str,
) -> AnnotationResult<()> {
    for (property, constraint) in &metadata.enums {
        let Some(value) = values.get(property).filter(|v| !v.is_null()) else {
            continue;
        };
        if !constraint.allows(value) {
            return Err(AnnotationError::semantical(
                SemanticKind::Enum,
                format!(
                    "Attribute \"{}\" of @{} declared on {} accepts only [{}], but got {}.",
                    property,
                    name,
                    context,
                    constraint.literals.join(", "),
                    value.render_plain()
                ),
                context,
            ));
        }
    }
    Ok(())
}

/// Checks every declared attribute type, promoting single values of array
/// attributes to one-element lists in place.
pub fn check_attribute_types(
    values: &mut Fields,
    metadata: &TypeMetadata,
    name: &str,
    context: &str,
    registry: &dyn TypeRegistry,
) -> AnnotationResult<()> {
    for (attribute, declared) in &metadata.attribute_types {
        let mut property = attribute.as_str();
        if metadata.default_property.as_deref() == Some(property)
            && !values.is_set(property)
            && values.is_set("value")
        {
            property = "value";
        }

        let value = match values.get_mut(property) {
            Some(value) if !value.is_null() => value,
            _ => {
                if declared.required {
                    return Err(AnnotationError::semantical(
                        SemanticKind::Required,
                        format!(
                            "Attribute \"{}\" of @{} declared on {} expects a(n) {}. This value should not be null.",
                            property, name, context, declared.declared
                        ),
                        context,
                    ));
                }
                continue;
            }
        };

        if declared.kind == ValueKind::Array {
            if !value.is_array() {
                let single = std::mem::replace(value, Value::Null);
                *value = Value::Array(ArrayValue::from_list([single]));
            }

            let (Some(element), Value::Array(items)) = (&declared.element, &*value) else {
                continue;
            };
            if let Some(item) = items.values().find(|item| !element.matches(item, registry)) {
                return Err(type_error(
                    property,
                    name,
                    context,
                    &format!("either a(n) {}, or an array of {}s", element, element),
                    item,
                ));
            }
        } else if !declared.kind.matches(value, registry) {
            return Err(type_error(
                property,
                name,
                context,
                &format!("a(n) {}", declared.declared),
                value,
            ));
        }
    }
    Ok(())
}

fn type_error(
    property: &str,
    name: &str,
    context: &str,
    expected: &str,
    actual: &Value,
) -> AnnotationError {
    AnnotationError::semantical(
        SemanticKind::Type,
        format!(
            "Attribute \"{}\" of @{} declared on {} expects {}, but got {}.",
            property,
            name,
            context,
            expected,
            actual.describe()
        ),
        context,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{AttributeType, ConstructorArg, EnumConstraint};
    use crate::registry::StaticRegistry;
    use smallvec::smallvec;

    fn args(positional: Vec<(usize, Value)>, named: Vec<(&str, Value)>) -> Arguments {
        Arguments {
            positional: positional.into_iter().collect(),
            named: named.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        }
    }

    fn named_ctor_metadata() -> TypeMetadata {
        TypeMetadata {
            is_annotation: true,
            has_constructor: true,
            has_named_argument_constructor: true,
            default_property: Some("min".to_string()),
            constructor_args: vec![
                ConstructorArg { name: "min".into(), position: 0, default: Value::Null },
                ConstructorArg { name: "max".into(), position: 1, default: Value::Null },
            ],
            ..TypeMetadata::default()
        }
    }

    #[test]
    fn test_single_positional_becomes_value() {
        let fields = reconcile_arguments(
            args(vec![(0, Value::from("x"))], vec![]),
            &TypeMetadata::default(),
        )
        .unwrap();
        assert_eq!(fields.get("value"), Some(&Value::from("x")));
    }

    #[test]
    fn test_many_positionals_become_a_list() {
        let fields = reconcile_arguments(
            args(vec![(0, Value::Integer(1)), (2, Value::Integer(2))], vec![("name", Value::from("n"))]),
            &TypeMetadata::default(),
        )
        .unwrap();
        let list = fields.get("value").and_then(Value::as_array).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.is_list());
    }

    #[test]
    fn test_named_value_wins_over_positionals() {
        let fields = reconcile_arguments(
            args(vec![(0, Value::from("positional"))], vec![("value", Value::from("named"))]),
            &TypeMetadata::default(),
        )
        .unwrap();
        assert_eq!(fields.get("value"), Some(&Value::from("named")));
    }

    #[test]
    fn test_positionals_fill_constructor_parameters() {
        let fields = reconcile_arguments(
            args(vec![(0, Value::Integer(1)), (1, Value::Integer(9))], vec![]),
            &named_ctor_metadata(),
        )
        .unwrap();
        assert_eq!(fields.get("min"), Some(&Value::Integer(1)));
        assert_eq!(fields.get("max"), Some(&Value::Integer(9)));
    }

    #[test]
    fn test_positional_after_named_is_rejected() {
        let result = reconcile_arguments(
            args(vec![(1, Value::Integer(9))], vec![("min", Value::Integer(1))]),
            &named_ctor_metadata(),
        );
        assert_eq!(result, Err(PositionalAfterNamed));
    }

    #[test]
    fn test_array_attribute_promotes_scalar() {
        let registry = StaticRegistry::new();
        let mut metadata = TypeMetadata::default();
        metadata.attribute_types.push((
            "tags".to_string(),
            AttributeType {
                kind: ValueKind::Array,
                element: Some(ValueKind::String),
                declared: "array<string>".into(),
                required: false,
            },
        ));
        let mut values: Fields = [("tags".to_string(), Value::from("a"))].into_iter().collect();
        check_attribute_types(&mut values, &metadata, "Tags", "class Foo", &registry).unwrap();
        assert_eq!(
            values.get("tags"),
            Some(&Value::Array(ArrayValue::from_list([Value::from("a")])))
        );

        let mut values: Fields = [("tags".to_string(), Value::Integer(1))].into_iter().collect();
        let err = check_attribute_types(&mut values, &metadata, "Tags", "class Foo", &registry)
            .unwrap_err();
        assert_eq!(
            err.message(),
            "Attribute \"tags\" of @Tags declared on class Foo expects either a(n) string, or an array of strings, but got integer."
        );
    }

    #[test]
    fn test_required_attribute_reads_value_alias() {
        let registry = StaticRegistry::new();
        let mut metadata = TypeMetadata {
            default_property: Some("path".to_string()),
            ..TypeMetadata::default()
        };
        metadata.attribute_types.push((
            "path".to_string(),
            AttributeType {
                kind: ValueKind::String,
                element: None,
                declared: "string".into(),
                required: true,
            },
        ));

        let mut values: Fields = [("value".to_string(), Value::from("/"))].into_iter().collect();
        check_attribute_types(&mut values, &metadata, "Route", "", &registry).unwrap();

        let mut values = Fields::new();
        let err = check_attribute_types(&mut values, &metadata, "Route", "method Foo::bar()", &registry)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "[Type Error] Attribute \"path\" of @Route declared on method Foo::bar() expects a(n) string. This value should not be null."
        );
    }

    #[test]
    fn test_enum_lists_literals() {
        let metadata = TypeMetadata {
            enums: vec![(
                "method".to_string(),
                EnumConstraint {
                    values: vec![Value::from("GET"), Value::from("POST")],
                    literals: vec!["GET".into(), "POST".into()],
                },
            )],
            ..TypeMetadata::default()
        };
        let values: Fields = [("method".to_string(), Value::from("PUT"))].into_iter().collect();
        let err = check_enums(&values, &metadata, "Route", "class Foo").unwrap_err();
        assert_eq!(
            err.message(),
            "Attribute \"method\" of @Route declared on class Foo accepts only [GET, POST], but got PUT."
        );
        assert!(err.to_string().starts_with("[Enum Error]"));
    }

    #[test]
    fn test_single_null_positional_is_kept() {
        let arguments = Arguments {
            positional: smallvec![(0, Value::Null)],
            named: Fields::new(),
        };
        let fields = reconcile_arguments(arguments, &TypeMetadata::default()).unwrap();
        assert_eq!(fields.get("value"), Some(&Value::Null));
    }
}

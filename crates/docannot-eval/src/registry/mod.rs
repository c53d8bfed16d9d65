//! The type registry collaborator.
//!
//! The parser never knows how annotation types are defined or built. It asks
//! a [`TypeRegistry`] whether a type exists, what it looks like
//! ([`TypeDescriptor`]), what a constant evaluates to, and to build an
//! instance from already-validated arguments.

mod static_registry;

pub use static_registry::{Factory, StaticRegistry, TypeDef};

use docannot_syntax::{Annotation, Fields, Value};

pub trait TypeRegistry {
    /// Whether a type with this fully-qualified name exists.
    fn exists(&self, name: &str) -> bool;

    /// Declared shape of the type, used to collect its metadata once.
    fn describe(&self, name: &str) -> Option<TypeDescriptor>;

    /// Value of a constant, either global (`FOO`) or a class constant
    /// (`App\Foo::BAR`). Names arrive without a leading separator.
    fn constant(&self, name: &str) -> Option<Value>;

    /// Builds an instance of `name`.
    fn instantiate(&self, name: &str, args: ConstructorArgs) -> anyhow::Result<Annotation>;

    /// Whether `name` is `parent` or derives from it.
    fn is_subtype(&self, name: &str, parent: &str) -> bool {
        same_type(name, parent)
    }
}

/// Type names compare case-insensitively and ignore a leading separator.
pub fn same_type(a: &str, b: &str) -> bool {
    a.trim_start_matches('\\')
        .eq_ignore_ascii_case(b.trim_start_matches('\\'))
}

/// Arguments handed to [`TypeRegistry::instantiate`], one variant per
/// construction strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstructorArgs {
    /// Named-argument constructor: one value per parameter position.
    Positional(Vec<Value>),
    /// Constructor taking all values as a single map.
    Values(Fields),
    /// No constructor; properties are assigned after construction.
    Empty,
}

#[derive(Debug, Clone, Default)]
pub struct TypeDescriptor {
    pub name: String,
    /// The type's own documentation comment.
    pub doc_comment: Option<String>,
    /// `None` when the type has no constructor.
    pub constructor: Option<Vec<ConstructorParam>>,
    /// Set when the type opts into named-argument construction without a
    /// `@NamedArgumentConstructor` marker in its documentation.
    pub named_arguments: bool,
    pub fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
    pub fn constructor_params(&self) -> &[ConstructorParam] {
        self.constructor.as_deref().unwrap_or(&[])
    }
}

/// A public field of an annotation type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    /// Native type, used when the field comment carries no `@var`.
    pub declared_type: Option<String>,
    pub doc_comment: Option<String>,
    pub default: Value,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: None,
            doc_comment: None,
            default: Value::Null,
        }
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc_comment = Some(doc.into());
        self
    }

    pub fn declared(mut self, type_name: impl Into<String>) -> Self {
        self.declared_type = Some(type_name.into());
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = value;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorParam {
    pub name: String,
    pub default: Option<Value>,
    pub variadic: bool,
}

impl ConstructorParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            variadic: false,
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_type_ignores_case_and_leading_separator() {
        assert!(same_type("\\App\\Route", "app\\route"));
        assert!(!same_type("App\\Route", "App\\Router"));
    }

    #[test]
    fn test_constructor_params_default_empty() {
        let descriptor = TypeDescriptor::default();
        assert!(descriptor.constructor_params().is_empty());
    }
}

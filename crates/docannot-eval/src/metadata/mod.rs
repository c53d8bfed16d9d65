//! Per-type annotation metadata and its cache.
//!
//! Metadata is collected once per type from the registry's
//! [`TypeDescriptor`](crate::registry::TypeDescriptor): whether the type is an
//! annotation, which targets it allows, how it is constructed, and the
//! declared kinds, required flags and enumerations of its attributes.

pub(crate) mod builtin;
mod collector;

pub use builtin::{
    ATTRIBUTE_TYPE, ATTRIBUTES_TYPE, ENUM_TYPE, NAMED_ARGUMENT_CONSTRUCTOR_TYPE, TARGET_TYPE,
};
pub use collector::collect;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use docannot_syntax::{AnnotationResult, Value};

use crate::registry::TypeRegistry;
use crate::target::Target;

/// Declared kind of an attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    Boolean,
    Integer,
    Double,
    String,
    Array,
    Object,
    /// A named annotation type; instances of it or its subtypes match.
    Type(String),
}

impl ValueKind {
    /// Maps a normalized type name to a kind.
    pub fn from_name(name: &str) -> ValueKind {
        match name {
            "boolean" => ValueKind::Boolean,
            "integer" => ValueKind::Integer,
            "double" => ValueKind::Double,
            "string" => ValueKind::String,
            "array" => ValueKind::Array,
            "object" => ValueKind::Object,
            other => ValueKind::Type(other.trim_start_matches('\\').to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Double => "double",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
            ValueKind::Type(name) => name,
        }
    }

    pub fn matches(&self, value: &Value, registry: &dyn TypeRegistry) -> bool {
        match (self, value) {
            (ValueKind::Boolean, Value::Bool(_))
            | (ValueKind::Integer, Value::Integer(_))
            | (ValueKind::Double, Value::Float(_))
            | (ValueKind::String, Value::String(_))
            | (ValueKind::Array, Value::Array(_))
            | (ValueKind::Object, Value::Annotation(_)) => true,
            (ValueKind::Type(name), Value::Annotation(instance)) => {
                registry.is_subtype(instance.type_name(), name)
            }
            _ => false,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeType {
    pub kind: ValueKind,
    /// Element kind for typed arrays (`array<T>`, `T[]`).
    pub element: Option<ValueKind>,
    /// The type as written, quoted in error messages.
    pub declared: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumConstraint {
    pub values: Vec<Value>,
    /// Labels listed in enum errors.
    pub literals: Vec<String>,
}

impl EnumConstraint {
    pub fn allows(&self, value: &Value) -> bool {
        self.values.iter().any(|allowed| allowed.loose_eq(value))
    }
}

/// A named-argument constructor parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorArg {
    pub name: String,
    pub position: usize,
    pub default: Value,
}

/// How instances of a type get built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Construction {
    NamedArguments,
    Constructor,
    Properties,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeMetadata {
    pub is_annotation: bool,
    pub has_constructor: bool,
    pub has_named_argument_constructor: bool,
    pub default_property: Option<String>,
    /// Public fields, in declaration order.
    pub properties: Vec<String>,
    pub attribute_types: Vec<(String, AttributeType)>,
    pub constructor_args: Vec<ConstructorArg>,
    pub targets: Target,
    pub targets_literal: String,
    pub enums: Vec<(String, EnumConstraint)>,
}

impl Default for TypeMetadata {
    fn default() -> Self {
        Self {
            is_annotation: false,
            has_constructor: false,
            has_named_argument_constructor: false,
            default_property: None,
            properties: Vec::new(),
            attribute_types: Vec::new(),
            constructor_args: Vec::new(),
            targets: Target::ALL,
            targets_literal: "ALL".to_string(),
            enums: Vec::new(),
        }
    }
}

impl TypeMetadata {
    pub fn construction(&self) -> Construction {
        if self.has_named_argument_constructor {
            Construction::NamedArguments
        } else if self.has_constructor {
            Construction::Constructor
        } else {
            Construction::Properties
        }
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p == name)
    }

    pub fn attribute_type(&self, name: &str) -> Option<&AttributeType> {
        self.attribute_types
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
    }

    pub fn constructor_arg(&self, name: &str) -> Option<&ConstructorArg> {
        self.constructor_args.iter().find(|arg| arg.name == name)
    }

    /// Inserts or replaces the attribute type of `name`.
    pub(crate) fn set_attribute_type(&mut self, name: &str, attribute: AttributeType) {
        match self.attribute_types.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = attribute,
            None => self.attribute_types.push((name.to_string(), attribute)),
        }
    }
}

/// Thread-safe per-type metadata cache.
///
/// Entries are computed at most once per type name and never change after
/// insertion. Type existence answers are memoized alongside.
#[derive(Debug, Default)]
pub struct MetadataCache {
    entries: RwLock<HashMap<String, Arc<TypeMetadata>>>,
    known_types: RwLock<HashMap<String, bool>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<TypeMetadata>> {
        let entries = self.entries.read().ok()?;
        entries.get(name).cloned()
    }

    /// Inserts `metadata` unless another caller got there first; returns the
    /// entry that ends up cached.
    pub fn insert(&self, name: &str, metadata: TypeMetadata) -> Arc<TypeMetadata> {
        let metadata = Arc::new(metadata);
        match self.entries.write() {
            Ok(mut entries) => entries
                .entry(name.to_string())
                .or_insert(metadata)
                .clone(),
            Err(_) => metadata,
        }
    }

    /// Cached metadata for `name`, running `collect` on a miss.
    ///
    /// Collection runs without holding the lock, so it may itself read the
    /// cache. A failed collection caches nothing.
    pub fn get_or_try_insert_with<F>(
        &self,
        name: &str,
        collect: F,
    ) -> AnnotationResult<Arc<TypeMetadata>>
    where
        F: FnOnce() -> AnnotationResult<TypeMetadata>,
    {
        if let Some(metadata) = self.get(name) {
            return Ok(metadata);
        }
        let metadata = collect()?;
        tracing::debug!(
            type_name = %name,
            annotation = metadata.is_annotation,
            construction = ?metadata.construction(),
            "collected annotation metadata"
        );
        Ok(self.insert(name, metadata))
    }

    /// Memoized [`TypeRegistry::exists`].
    pub fn type_exists(&self, name: &str, registry: &dyn TypeRegistry) -> bool {
        if let Some(known) = self
            .known_types
            .read()
            .ok()
            .and_then(|known| known.get(name).copied())
        {
            return known;
        }

        let exists = registry.exists(name);
        if let Ok(mut known) = self.known_types.write() {
            known.insert(name.to_string(), exists);
        }
        exists
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(name))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
        if let Ok(mut known) = self.known_types.write() {
            known.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{StaticRegistry, TypeDef};
    use docannot_syntax::{AnnotationError, Annotation};
    use std::thread;

    #[test]
    fn test_collect_runs_once() {
        let cache = MetadataCache::new();
        let mut calls = 0;
        for _ in 0..3 {
            cache
                .get_or_try_insert_with("Route", || {
                    calls += 1;
                    Ok(TypeMetadata::default())
                })
                .unwrap();
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("Route"));
    }

    #[test]
    fn test_failed_collection_is_not_cached() {
        let cache = MetadataCache::new();
        let err = cache
            .get_or_try_insert_with("Broken", || Err(AnnotationError::creation("boom", "")))
            .unwrap_err();
        assert!(err.is_creation());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_readers_share_one_entry() {
        let cache = Arc::new(MetadataCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    cache
                        .get_or_try_insert_with("Shared", || Ok(TypeMetadata::default()))
                        .unwrap()
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let first = cache.get("Shared").unwrap();
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &first)));
    }

    #[test]
    fn test_type_exists_is_memoized() {
        let registry = StaticRegistry::new().with_type(TypeDef::annotation("Route"));
        let cache = MetadataCache::new();
        assert!(cache.type_exists("Route", &registry));
        assert!(!cache.type_exists("Missing", &registry));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_kind_matching() {
        let registry = StaticRegistry::new()
            .with_type(TypeDef::annotation("Base"))
            .with_type(TypeDef::annotation("Child").extends("Base"));
        let child = Value::Annotation(Annotation::new("Child"));

        assert!(ValueKind::from_name("Base").matches(&child, &registry));
        assert!(ValueKind::Object.matches(&child, &registry));
        assert!(!ValueKind::String.matches(&Value::Integer(1), &registry));
        assert!(ValueKind::Double.matches(&Value::Float(1.5), &registry));
        assert_eq!(ValueKind::from_name("\\App\\Base").label(), "App\\Base");
    }
}

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::bail;
use docannot_syntax::{Annotation, Value};

use super::{
    ConstructorArgs, ConstructorParam, FieldDescriptor, TypeDescriptor, TypeRegistry, same_type,
};

/// Custom construction logic for a [`TypeDef`].
pub type Factory = Arc<dyn Fn(ConstructorArgs) -> anyhow::Result<Annotation> + Send + Sync>;

/// Definition of one type held by a [`StaticRegistry`].
#[derive(Clone)]
pub struct TypeDef {
    descriptor: TypeDescriptor,
    parent: Option<String>,
    factory: Option<Factory>,
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("descriptor", &self.descriptor)
            .field("parent", &self.parent)
            .field("factory", &self.factory.is_some())
            .finish()
    }
}

impl TypeDef {
    /// A plain type with no documentation.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            descriptor: TypeDescriptor {
                name: name.into(),
                ..TypeDescriptor::default()
            },
            parent: None,
            factory: None,
        }
    }

    /// A type whose documentation carries `@Annotation`.
    pub fn annotation(name: impl Into<String>) -> Self {
        Self::new(name).doc("/** @Annotation */")
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.descriptor.doc_comment = Some(doc.into());
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.descriptor.fields.push(field);
        self
    }

    /// Shorthand for a field with a documentation comment.
    pub fn typed_field(self, name: impl Into<String>, doc: impl Into<String>) -> Self {
        self.field(FieldDescriptor::new(name).doc(doc))
    }

    pub fn constructor(mut self, params: Vec<ConstructorParam>) -> Self {
        self.descriptor.constructor = Some(params);
        self
    }

    /// Opts into named-argument construction without a doc marker.
    pub fn named_arguments(mut self) -> Self {
        self.descriptor.named_arguments = true;
        self
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(ConstructorArgs) -> anyhow::Result<Annotation> + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(factory));
        self
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Instance with every field at its default.
    fn blank(&self) -> Annotation {
        let mut instance = Annotation::new(self.descriptor.name.clone());
        for field in &self.descriptor.fields {
            instance.set(field.name.clone(), field.default.clone());
        }
        instance
    }

    /// Record-style construction: constructor parameters and map keys become
    /// properties of the same name.
    fn build(&self, args: ConstructorArgs) -> anyhow::Result<Annotation> {
        if let Some(factory) = &self.factory {
            return factory(args);
        }

        let mut instance = self.blank();
        match args {
            ConstructorArgs::Empty => {}
            ConstructorArgs::Values(values) => {
                for (name, value) in values {
                    instance.set(name, value);
                }
            }
            ConstructorArgs::Positional(values) => {
                let params = self.descriptor.constructor_params();
                if values.len() > params.len() {
                    bail!(
                        "{} takes {} arguments, {} given",
                        self.descriptor.name,
                        params.len(),
                        values.len()
                    );
                }
                for (param, value) in params.iter().zip(values) {
                    instance.set(param.name.clone(), value);
                }
            }
        }
        Ok(instance)
    }
}

/// In-memory [`TypeRegistry`] built from [`TypeDef`]s and named constants.
///
/// Type lookups are case-insensitive. Constants are looked up exactly.
///
/// # Example
///
/// ```rust
/// use docannot_eval::{StaticRegistry, TypeDef, TypeRegistry};
///
/// let registry = StaticRegistry::new()
///     .with_type(TypeDef::annotation("App\\Route").typed_field("path", "/** @var string */"))
///     .with_constant("App\\Route::GET", "GET".into());
///
/// assert!(registry.exists("app\\route"));
/// assert!(registry.constant("App\\Route::GET").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    types: HashMap<String, TypeDef>,
    constants: HashMap<String, Value>,
}

fn type_key(name: &str) -> String {
    name.trim_start_matches('\\').to_ascii_lowercase()
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, def: TypeDef) -> Self {
        self.register(def);
        self
    }

    pub fn with_constant(mut self, name: impl Into<String>, value: Value) -> Self {
        self.constants.insert(name.into(), value);
        self
    }

    pub fn register(&mut self, def: TypeDef) {
        self.types.insert(type_key(def.name()), def);
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(&type_key(name))
    }
}

impl TypeRegistry for StaticRegistry {
    fn exists(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    fn describe(&self, name: &str) -> Option<TypeDescriptor> {
        self.get(name).map(|def| def.descriptor.clone())
    }

    fn constant(&self, name: &str) -> Option<Value> {
        self.constants.get(name.trim_start_matches('\\')).cloned()
    }

    fn instantiate(&self, name: &str, args: ConstructorArgs) -> anyhow::Result<Annotation> {
        match self.get(name) {
            Some(def) => def.build(args),
            None => bail!("unknown type {}", name),
        }
    }

    fn is_subtype(&self, name: &str, parent: &str) -> bool {
        let mut current = name.to_string();
        // Bounded walk; a cyclic `extends` chain is not an error here.
        for _ in 0..=self.types.len() {
            if same_type(&current, parent) {
                return true;
            }
            match self.get(&current).and_then(|def| def.parent.as_ref()) {
                Some(next) => current = next.clone(),
                None => return false,
            }
        }
        false
    }
}

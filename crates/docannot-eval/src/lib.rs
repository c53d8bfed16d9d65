//! Parsing, name resolution and validation of docblock annotations.
//!
//! [`DocParser`] turns documentation comments into [`Annotation`]
//! instances. Types are looked up through a [`TypeRegistry`] supplied by the
//! host, and what is known about each annotation type is memoized in a
//! [`MetadataCache`] shared between parsers.

pub mod checker;
pub mod config;
pub mod context;
pub mod instantiate;
pub mod metadata;
pub mod parser;
pub mod registry;
pub mod resolver;
pub mod target;

pub use checker::Arguments;
pub use config::{ConfigError, ParserConfig};
pub use context::{ImportTable, NameResolution, ParserContext};
pub use metadata::{AttributeType, MetadataCache, TypeMetadata, ValueKind};
pub use parser::DocParser;
pub use registry::{
    ConstructorArgs, ConstructorParam, FieldDescriptor, StaticRegistry, TypeDef, TypeDescriptor,
    TypeRegistry,
};
pub use target::Target;

pub use docannot_syntax::{
    Annotation, AnnotationError, AnnotationResult, ArrayKey, ArrayValue, Fields, SemanticKind,
    Value,
};

//! Typed annotations embedded in documentation comments.
//!
//! ```rust
//! use docannot::prelude::*;
//!
//! let registry = StaticRegistry::new()
//!     .with_type(TypeDef::annotation("App\\Cache").typed_field("ttl", "/** @var int */"));
//! let cache = MetadataCache::new();
//! let parser = DocParser::new(&registry, &cache);
//!
//! let ctx = ParserContext::new("class App\\Report")
//!     .with_import("cache", "App\\Cache")
//!     .unwrap()
//!     .with_standard_ignores();
//!
//! let annotations = parser
//!     .parse("/**\n * @author Jane\n * @Cache(ttl=60)\n */", &ctx)
//!     .unwrap();
//!
//! assert_eq!(annotations.len(), 1);
//! assert_eq!(annotations[0].get("ttl"), Some(&Value::Integer(60)));
//! ```

pub use docannot_eval::{
    Arguments, AttributeType, ConfigError, ConstructorArgs, ConstructorParam, DocParser,
    FieldDescriptor, ImportTable, MetadataCache, NameResolution, ParserConfig, ParserContext,
    StaticRegistry, Target, TypeDef, TypeDescriptor, TypeMetadata, TypeRegistry, ValueKind,
};
pub use docannot_syntax::{
    Annotation, AnnotationError, AnnotationResult, ArrayKey, ArrayValue, DocLexer, Fields,
    SemanticKind, Token, TokenKind, Value, tokenize,
};

pub mod prelude {
    pub use crate::{Annotation, AnnotationError, AnnotationResult, Value};
    pub use crate::{DocParser, MetadataCache, ParserConfig, ParserContext, Target};
    pub use crate::{StaticRegistry, TypeDef, TypeRegistry};
}

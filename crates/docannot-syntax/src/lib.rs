//! # Docannot Syntax
//!
//! Lexer, value model and error types for annotations embedded in
//! documentation comments.
//!
//! ## Overview
//!
//! - **Lexer**: splits docblock text into classified [`Token`]s and exposes a
//!   cursor with lookahead and peeking ([`DocLexer`])
//! - **Values**: the tagged union produced for annotation arguments
//!   ([`Value`], [`ArrayValue`], [`Annotation`])
//! - **Errors**: the closed error taxonomy of a parse call
//!   ([`AnnotationError`])
//!
//! ## Architecture
//!
//! ```text
//! Docblock text
//!     ↓
//! tokenize / DocLexer
//!     ↓
//! Vec<Token>
//!     ↓
//! DocParser (docannot-eval)
//!     ↓
//! Vec<Annotation>
//! ```
//!
//! ## Example
//!
//! ```rust
//! use docannot_syntax::{tokenize, TokenKind};
//!
//! let tokens = tokenize(r#"@Route("/home", name="home")"#);
//!
//! assert_eq!(tokens[0].kind, TokenKind::At);
//! assert_eq!(tokens[1].value, "Route");
//! assert_eq!(tokens[3].kind, TokenKind::String);
//! ```
//!
//! ## Token Grammar
//!
//! ```text
//! Identifier: [a-z_\][a-z0-9_:\]*[a-z_][a-z0-9_]*   (case-insensitive)
//! Number:     [+-]?[0-9]+(\.[0-9]+)*([eE][+-]?[0-9]+)?
//! String:     "..." with "" as an embedded quote
//! Symbols:    @ , ( ) { } = : - \
//! Keywords:   true false null                     (case-insensitive)
//! Skipped:    whitespace, runs of *
//! ```

pub mod error;
pub mod lexer;
pub mod token;
pub mod value;

pub use error::{AnnotationError, AnnotationResult, SemanticKind};
pub use lexer::{DocLexer, tokenize};
pub use token::{Token, TokenKind};
pub use value::{Annotation, ArrayKey, ArrayValue, Fields, Value};

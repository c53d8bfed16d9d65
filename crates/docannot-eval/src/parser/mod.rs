//! Recursive-descent parser for annotations in documentation comments.
//!
//! ```text
//! Annotations     ::= Annotation {[ "*" ]* [Annotation]}*
//! Annotation      ::= "@" AnnotationName MethodCall
//! AnnotationName  ::= QualifiedName | SimpleName
//! MethodCall      ::= ["(" [Values] ")"]
//! Values          ::= Value {"," Value}* [","]
//! Value           ::= PlainValue | FieldAssignment
//! PlainValue      ::= integer | string | float | boolean | null
//!                   | Array | Annotation | Constant
//! FieldAssignment ::= identifier ("=" | ":") PlainValue
//! Array           ::= "{" ArrayEntry {"," ArrayEntry}* [","] "}"
//! ArrayEntry      ::= Value | KeyValuePair
//! KeyValuePair    ::= (identifier | string | integer | Constant) ("=" | ":") PlainValue
//! ```
//!
//! Name resolution, metadata lookup, validation and instantiation happen
//! while parsing: whether an annotation is skipped decides how the rest of
//! the text is scanned.

mod annotation;
mod values;

use docannot_syntax::{Annotation, AnnotationError, AnnotationResult, DocLexer, TokenKind};
use once_cell::sync::Lazy;

use crate::context::ParserContext;
use crate::metadata::MetadataCache;
use crate::registry::TypeRegistry;

/// Default limit for nested annotations and arrays.
pub const DEFAULT_MAX_NESTING: usize = 256;

/// Environment variable overriding [`DEFAULT_MAX_NESTING`].
pub const MAX_NESTING_ENV: &str = "DOCANNOT_MAX_NESTING";

static MAX_NESTING: Lazy<usize> =
    Lazy::new(|| max_nesting_from(std::env::var(MAX_NESTING_ENV).ok().as_deref()));

fn max_nesting_from(setting: Option<&str>) -> usize {
    setting
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_MAX_NESTING)
}

/// Parses annotations out of documentation comments.
///
/// A parser borrows its collaborators and holds no per-call state, so one
/// instance can serve many docblocks and threads. Everything a call needs
/// beyond the collaborators comes from the [`ParserContext`].
///
/// # Example
///
/// ```rust
/// use docannot_eval::{DocParser, MetadataCache, ParserContext, StaticRegistry, TypeDef};
///
/// let registry = StaticRegistry::new()
///     .with_type(TypeDef::annotation("App\\Route").typed_field("path", "/** @var string */"));
/// let cache = MetadataCache::new();
/// let parser = DocParser::new(&registry, &cache);
///
/// let ctx = ParserContext::new("method App\\Controller::index()")
///     .with_import("route", "App\\Route")
///     .unwrap();
/// let annotations = parser.parse(r#"/** @Route("/home") */"#, &ctx).unwrap();
///
/// assert_eq!(annotations.len(), 1);
/// assert_eq!(annotations[0].get("path").and_then(|v| v.as_str()), Some("/home"));
/// ```
pub struct DocParser<'a> {
    registry: &'a dyn TypeRegistry,
    metadata: &'a MetadataCache,
    max_depth: usize,
}

impl<'a> DocParser<'a> {
    pub fn new(registry: &'a dyn TypeRegistry, metadata: &'a MetadataCache) -> Self {
        Self {
            registry,
            metadata,
            max_depth: *MAX_NESTING,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Parses every annotation in `input`.
    ///
    /// Text before the first `@` that starts the line or follows a space,
    /// tab or `*` is ignored, as are tokens between annotations. Returns an
    /// empty list when there is no such `@`.
    pub fn parse(&self, input: &str, ctx: &ParserContext) -> AnnotationResult<Vec<Annotation>> {
        let Some(start) = find_initial_position(input) else {
            return Ok(Vec::new());
        };
        let text = input[start..].trim_matches(|c| c == '*' || c == ' ' || c == '/');

        let mut session = Session::new(self, ctx, text);
        tracing::trace!(
            tokens = session.lexer.tokens().len(),
            context = %ctx.description(),
            "parsing docblock"
        );
        session.lexer.move_next();
        session.annotations()
    }
}

/// Byte offset of the first `@` at the start of `input` or right after a
/// space, tab or `*`.
fn find_initial_position(input: &str) -> Option<usize> {
    let bytes = input.as_bytes();
    bytes.iter().enumerate().find_map(|(i, &b)| {
        let boundary = i == 0 || matches!(bytes[i - 1], b' ' | b'\t' | b'*');
        (b == b'@' && boundary).then_some(i)
    })
}

/// State of one `parse` call.
struct Session<'p, 'a> {
    parser: &'p DocParser<'a>,
    ctx: &'p ParserContext,
    lexer: DocLexer,
    depth: usize,
}

const CLASS_IDENTIFIERS: [TokenKind; 4] = [
    TokenKind::Identifier,
    TokenKind::True,
    TokenKind::False,
    TokenKind::Null,
];

impl<'p, 'a> Session<'p, 'a> {
    fn new(parser: &'p DocParser<'a>, ctx: &'p ParserContext, text: &str) -> Self {
        let mut lexer = DocLexer::new();
        lexer.set_input(text);
        Self {
            parser,
            ctx,
            lexer,
            depth: 0,
        }
    }

    fn registry(&self) -> &'a dyn TypeRegistry {
        self.parser.registry
    }

    fn type_exists(&self, name: &str) -> bool {
        self.parser.metadata.type_exists(name, self.parser.registry)
    }

    fn enter(&mut self) -> AnnotationResult<()> {
        if self.depth >= self.parser.max_depth {
            let position = self.lexer.lookahead().map(|t| t.position).unwrap_or(0);
            return Err(AnnotationError::syntax(
                format!(
                    "Maximum nesting depth of {} exceeded at position {}",
                    self.parser.max_depth, position
                ),
                Some(position),
                self.ctx.description(),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Consumes the lookahead if it is of `kind`.
    fn match_token(&mut self, kind: TokenKind) -> AnnotationResult<()> {
        if !self.lexer.is_next_token(kind) {
            return Err(self.syntax_error(kind.display_name()));
        }
        self.lexer.move_next();
        Ok(())
    }

    fn match_any(&mut self, kinds: &[TokenKind]) -> AnnotationResult<()> {
        if !self.lexer.is_next_token_any(kinds) {
            let expected: Vec<&str> = kinds.iter().map(|k| k.display_name()).collect();
            return Err(self.syntax_error(&expected.join(" or ")));
        }
        self.lexer.move_next();
        Ok(())
    }

    /// Value of the token consumed last.
    fn token_value(&self) -> String {
        self.lexer
            .token()
            .map(|t| t.value.clone())
            .unwrap_or_default()
    }

    fn syntax_error(&self, expected: &str) -> AnnotationError {
        let (found, position) = match self.lexer.lookahead() {
            Some(token) => (
                format!("'{}' at position {}", token.value, token.position),
                Some(token.position),
            ),
            None => ("end of string".to_string(), None),
        };
        self.syntax_error_at(format!("Expected {}, got {}", expected, found), position)
    }

    fn syntax_error_at(&self, message: String, position: Option<usize>) -> AnnotationError {
        let description = self.ctx.description();
        let message = if description.is_empty() {
            format!("{}.", message)
        } else {
            format!("{} in {}.", message, description)
        };
        AnnotationError::syntax(message, position, description)
    }

    /// Annotations ::= Annotation {[ "*" ]* [Annotation]}*
    fn annotations(&mut self) -> AnnotationResult<Vec<Annotation>> {
        let mut annotations = Vec::new();

        while let Some(lookahead) = self.lexer.lookahead() {
            if lookahead.kind != TokenKind::At {
                self.lexer.move_next();
                continue;
            }

            // `@` glued to the previous token, as in an e-mail address
            let at_position = lookahead.position;
            if self.lexer.token().is_some() && self.lexer.next_token_is_adjacent() {
                self.lexer.move_next();
                continue;
            }

            let starts_name = self.lexer.glimpse().is_some_and(|next| {
                next.position == at_position + 1
                    && (next.kind == TokenKind::NamespaceSeparator
                        || next.kind.is_class_identifier())
            });
            if !starts_name {
                self.lexer.move_next();
                continue;
            }

            tracing::trace!(position = at_position, "annotation start");
            if let Some(annotation) = self.annotation(false)? {
                annotations.push(annotation);
            }
        }

        Ok(annotations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_nesting_setting() {
        assert_eq!(max_nesting_from(None), DEFAULT_MAX_NESTING);
        assert_eq!(max_nesting_from(Some("32")), 32);
        assert_eq!(max_nesting_from(Some(" 8 ")), 8);
        assert_eq!(max_nesting_from(Some("deep")), DEFAULT_MAX_NESTING);
    }

    #[test]
    fn test_initial_position_requires_boundary() {
        assert_eq!(find_initial_position("@Foo"), Some(0));
        assert_eq!(find_initial_position("/** @Foo */"), Some(4));
        assert_eq!(find_initial_position("*@Foo"), Some(1));
        assert_eq!(find_initial_position("mail@example.com"), None);
        assert_eq!(find_initial_position("mail@example.com @Foo"), Some(17));
        assert_eq!(find_initial_position("no annotations"), None);
    }
}

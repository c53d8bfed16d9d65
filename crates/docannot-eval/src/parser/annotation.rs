use docannot_syntax::{Annotation, AnnotationError, AnnotationResult, SemanticKind, TokenKind};

use super::{CLASS_IDENTIFIERS, Session};
use crate::checker::{self, PositionalAfterNamed};
use crate::instantiate::{self, Site};
use crate::metadata;
use crate::resolver::{self, Resolved};
use crate::target::Target;

impl Session<'_, '_> {
    /// Annotation ::= "@" AnnotationName MethodCall
    ///
    /// Returns `None` when the annotation is skipped. `nested` is set for
    /// annotations appearing as values of another annotation, which are
    /// checked against [`Target::ANNOTATION`] instead of the context target.
    pub(super) fn annotation(&mut self, nested: bool) -> AnnotationResult<Option<Annotation>> {
        self.enter()?;
        let result = self.annotation_body(nested);
        self.leave();
        result
    }

    fn annotation_body(&mut self, nested: bool) -> AnnotationResult<Option<Annotation>> {
        self.match_token(TokenKind::At)?;
        let original = self.identifier()?;

        // `@foo-bar` reads as prose, not as an annotation
        if self.lexer.is_next_token(TokenKind::Minus) && self.lexer.next_token_is_adjacent() {
            return Ok(None);
        }

        let ctx = self.ctx;
        let description = ctx.description();

        let name = if original.starts_with('\\') {
            original.clone()
        } else {
            match resolver::resolve_annotation_name(&original, ctx, |n| self.type_exists(n))? {
                Resolved::Found(name) => name,
                Resolved::Skip => return Ok(None),
            }
        };
        let name = name.trim_start_matches('\\').to_string();
        tracing::debug!(written = %original, resolved = %name, "resolved annotation name");

        if !self.type_exists(&name) {
            return Err(AnnotationError::semantical(
                SemanticKind::Resolution,
                format!(
                    "The annotation \"@{}\" in {} does not exist, or could not be auto-loaded.",
                    name, description
                ),
                description,
            ));
        }

        let registry = self.registry();
        let metadata = self
            .parser
            .metadata
            .get_or_try_insert_with(&name, || metadata::collect(&name, registry, description))?;

        if !metadata.is_annotation {
            if ctx.is_ignored(&original) || ctx.is_ignored(&name) {
                tracing::debug!(name = %name, "skipping ignored non-annotation type");
                return Ok(None);
            }
            return Err(AnnotationError::semantical(
                SemanticKind::Resolution,
                format!(
                    "The class \"{name}\" is not annotated with @Annotation. Are you sure this class can be used as annotation? If so, then you need to add @Annotation to the _class_ doc comment of \"{name}\". If it is indeed no annotation, then you need to add @IgnoreAnnotation(\"{original}\") to the _class_ doc comment of {description}.",
                ),
                description,
            ));
        }

        let target = if nested { Target::ANNOTATION } else { ctx.target() };
        if !target.is_empty() && !metadata.targets.intersects(target) {
            return Err(AnnotationError::semantical(
                SemanticKind::Target,
                format!(
                    "Annotation @{} is not allowed to be declared on {}. You may only use this annotation on these code elements: {}.",
                    original, description, metadata.targets_literal
                ),
                description,
            ));
        }

        let arguments = self.method_call()?;
        let mut values = match checker::reconcile_arguments(arguments, &metadata) {
            Ok(values) => values,
            Err(PositionalAfterNamed) => {
                let position = self.lexer.token().map(|t| t.position);
                return Err(self.syntax_error_at(
                    "Positional arguments after named arguments is not allowed".to_string(),
                    position,
                ));
            }
        };

        checker::check_enums(&values, &metadata, &name, description)?;
        checker::check_attribute_types(&mut values, &metadata, &original, description, registry)?;

        let site = Site {
            type_name: &name,
            original: &original,
            context: description,
        };
        instantiate::instantiate(&site, values, &metadata, registry).map(Some)
    }

    /// AnnotationName ::= QualifiedName | SimpleName
    ///
    /// Parts of a qualified name must be adjacent: `Foo\Bar` is one name,
    /// `Foo \Bar` is the name `Foo` followed by other tokens.
    pub(super) fn identifier(&mut self) -> AnnotationResult<String> {
        if !self.lexer.is_next_token_any(&CLASS_IDENTIFIERS) {
            return Err(self.syntax_error("namespace separator or identifier"));
        }
        self.lexer.move_next();
        let mut name = self.token_value();

        while self.lexer.next_token_is_adjacent()
            && self.lexer.is_next_token(TokenKind::NamespaceSeparator)
        {
            self.match_token(TokenKind::NamespaceSeparator)?;
            self.match_any(&CLASS_IDENTIFIERS)?;
            name.push('\\');
            name.push_str(&self.token_value());
        }

        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use crate::context::ParserContext;
    use crate::metadata::MetadataCache;
    use crate::parser::DocParser;
    use crate::registry::{StaticRegistry, TypeDef};
    use crate::target::Target;

    fn registry() -> StaticRegistry {
        StaticRegistry::new()
            .with_type(TypeDef::annotation("App\\Marker"))
            .with_type(
                TypeDef::annotation("App\\Column")
                    .doc("/** @Annotation @Target(\"PROPERTY\") */"),
            )
            .with_type(TypeDef::new("App\\Plain").doc("/** Not an annotation. */"))
    }

    fn ctx() -> ParserContext {
        ParserContext::new("class App\\Entity")
            .with_namespace_fallback("App")
            .unwrap()
    }

    #[test]
    fn test_glued_dash_is_prose() {
        let registry = registry();
        let cache = MetadataCache::new();
        let parser = DocParser::new(&registry, &cache);
        assert!(parser.parse("@Marker-ish", &ctx()).unwrap().is_empty());
        assert_eq!(parser.parse("@Marker -", &ctx()).unwrap().len(), 1);
    }

    #[test]
    fn test_non_annotation_type_errors_with_hint() {
        let registry = registry();
        let cache = MetadataCache::new();
        let parser = DocParser::new(&registry, &cache);
        let err = parser.parse("@Plain", &ctx()).unwrap_err();
        assert!(err.message().starts_with("The class \"App\\Plain\" is not annotated with @Annotation."));
        assert!(err.message().contains("@IgnoreAnnotation(\"Plain\")"));

        let ignoring = ctx().with_ignored_name("App\\Plain");
        assert!(parser.parse("@Plain", &ignoring).unwrap().is_empty());
    }

    #[test]
    fn test_target_mismatch() {
        let registry = registry();
        let cache = MetadataCache::new();
        let parser = DocParser::new(&registry, &cache);
        let err = parser
            .parse("@Column", &ctx().with_target(Target::CLASS))
            .unwrap_err();
        assert_eq!(
            err.message(),
            "Annotation @Column is not allowed to be declared on class App\\Entity. You may only use this annotation on these code elements: PROPERTY."
        );

        let ok = parser.parse("@Column", &ctx().with_target(Target::PROPERTY)).unwrap();
        assert_eq!(ok.len(), 1);
    }

    #[test]
    fn test_qualified_name_parts_must_be_adjacent() {
        let registry = registry();
        let cache = MetadataCache::new();
        let parser = DocParser::new(&registry, &cache);
        let parsed = parser.parse("@\\App\\Marker", &ParserContext::new("")).unwrap();
        assert_eq!(parsed[0].type_name(), "App\\Marker");
    }

    #[test]
    fn test_missing_fully_qualified_type() {
        let registry = registry();
        let cache = MetadataCache::new();
        let parser = DocParser::new(&registry, &cache);
        let err = parser.parse("@\\App\\Nope", &ParserContext::new("class X")).unwrap_err();
        assert_eq!(
            err.message(),
            "The annotation \"@App\\Nope\" in class X does not exist, or could not be auto-loaded."
        );
    }
}

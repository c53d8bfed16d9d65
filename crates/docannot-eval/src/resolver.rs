//! Name resolution for annotation names and class-constant references.

use docannot_syntax::{AnnotationError, AnnotationResult, SemanticKind};

use crate::context::{NameResolution, ParserContext};

/// Outcome of resolving an annotation name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// Fully-qualified name of an existing type.
    Found(String),
    /// Unresolvable but ignored; the annotation is dropped.
    Skip,
}

/// Resolves a short or qualified annotation name as written after `@`.
///
/// Names starting with `\` are already fully qualified. Otherwise the part
/// before the first `\` is the alias: default namespaces are tried in order,
/// or the alias is looked up among the imports, then the `__NAMESPACE__`
/// fallback, then the name as is.
pub fn resolve_annotation_name(
    name: &str,
    ctx: &ParserContext,
    exists: impl Fn(&str) -> bool,
) -> AnnotationResult<Resolved> {
    if name.starts_with('\\') {
        return Ok(Resolved::Found(name.trim_start_matches('\\').to_string()));
    }

    let (alias, rest) = split_alias(name);
    let mut candidate = name.to_string();
    let mut found = false;

    match ctx.resolution() {
        NameResolution::Namespaces(namespaces) if !namespaces.is_empty() => {
            for namespace in namespaces {
                let qualified = format!("{}\\{}", namespace, name);
                if exists(&qualified) {
                    candidate = qualified;
                    found = true;
                    break;
                }
            }
        }
        resolution => {
            let imports = match resolution {
                NameResolution::Imports(table) => Some(table),
                NameResolution::Namespaces(_) => None,
            };
            if let Some(import) = imports.and_then(|table| table.get(alias)) {
                candidate = format!("{}{}", import.trim_start_matches('\\'), rest);
                found = exists(&candidate);
            } else if !ctx.is_ignored_name(name) {
                if let Some(namespace) = imports.and_then(|table| table.namespace()) {
                    let qualified = format!("{}\\{}", namespace, name);
                    if exists(&qualified) {
                        candidate = qualified;
                        found = true;
                    }
                }
                if !found && exists(name) {
                    found = true;
                }
            }
        }
    }

    if found {
        return Ok(Resolved::Found(candidate));
    }
    if ctx.is_ignored(&candidate) {
        tracing::trace!(name = %candidate, "skipping ignored annotation");
        return Ok(Resolved::Skip);
    }

    let description = ctx.description();
    Err(AnnotationError::semantical(
        SemanticKind::Resolution,
        format!(
            "The annotation \"@{}\" in {} was never imported. Did you maybe forget a 'use' statement?",
            candidate, description
        ),
        description,
    ))
}

/// Qualifies the class part of a `Class::CONSTANT` reference through the
/// same alias rules as annotation names. Identifiers that are already known
/// constants, fully qualified, or not class constants come back unchanged.
pub fn qualify_class_constant(
    identifier: &str,
    ctx: &ParserContext,
    is_constant: impl Fn(&str) -> bool,
    exists: impl Fn(&str) -> bool,
) -> String {
    if identifier.starts_with('\\') || is_constant(identifier) {
        return identifier.to_string();
    }
    let Some((class, constant)) = identifier.split_once("::") else {
        return identifier.to_string();
    };

    let (alias, rest) = split_alias(class);
    let qualified = match ctx.resolution() {
        NameResolution::Namespaces(namespaces) if !namespaces.is_empty() => namespaces
            .iter()
            .map(|namespace| format!("{}\\{}", namespace, class))
            .find(|candidate| exists(candidate)),
        NameResolution::Imports(table) => match table.get(alias) {
            Some(import) => Some(format!("{}{}", import.trim_start_matches('\\'), rest)),
            None => table
                .namespace()
                .map(|namespace| format!("{}\\{}", namespace, class))
                .filter(|candidate| exists(candidate)),
        },
        NameResolution::Namespaces(_) => None,
    };

    match qualified {
        Some(class) => format!("{}::{}", class, constant),
        None => identifier.to_string(),
    }
}

/// `Foo\Bar\Baz` → (`Foo`, `\Bar\Baz`).
fn split_alias(name: &str) -> (&str, &str) {
    match name.find('\\') {
        Some(pos) => name.split_at(pos),
        None => (name, ""),
    }
}

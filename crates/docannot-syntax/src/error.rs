//! Error taxonomy shared by the lexer-facing parser and the evaluator.
//!
//! Every failure of a `parse()` call is one of three kinds:
//!
//! - [`AnnotationError::Syntax`]: the token stream does not fit the grammar
//! - [`AnnotationError::Semantical`]: names, constants, targets or attribute
//!   values do not check out
//! - [`AnnotationError::Creation`]: building the annotation instance failed
//!
//! All of them carry the context label of the docblock they came from.

use std::fmt;

/// Sub-classification of semantical errors. Only affects the message prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticKind {
    /// Name never imported, unknown type, or not an annotation type.
    Resolution,
    Constant,
    Target,
    Type,
    Required,
    Enum,
}

impl SemanticKind {
    pub fn label(self) -> &'static str {
        match self {
            SemanticKind::Type | SemanticKind::Required => "Type Error",
            SemanticKind::Enum => "Enum Error",
            SemanticKind::Resolution | SemanticKind::Constant | SemanticKind::Target => {
                "Semantical Error"
            }
        }
    }
}

impl fmt::Display for SemanticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnnotationError {
    #[error("[Syntax Error] {message}")]
    Syntax {
        message: String,
        position: Option<usize>,
        context: String,
    },

    #[error("[{kind}] {message}")]
    Semantical {
        kind: SemanticKind,
        message: String,
        context: String,
    },

    #[error("[Creation Error] {message}")]
    Creation { message: String, context: String },
}

impl AnnotationError {
    pub fn syntax(message: impl Into<String>, position: Option<usize>, context: &str) -> Self {
        Self::Syntax {
            message: message.into(),
            position,
            context: context.to_string(),
        }
    }

    pub fn semantical(kind: SemanticKind, message: impl Into<String>, context: &str) -> Self {
        Self::Semantical {
            kind,
            message: message.into(),
            context: context.to_string(),
        }
    }

    pub fn creation(message: impl Into<String>, context: &str) -> Self {
        Self::Creation {
            message: message.into(),
            context: context.to_string(),
        }
    }

    /// The message without its `[... Error]` prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Syntax { message, .. }
            | Self::Semantical { message, .. }
            | Self::Creation { message, .. } => message,
        }
    }

    pub fn context(&self) -> &str {
        match self {
            Self::Syntax { context, .. }
            | Self::Semantical { context, .. }
            | Self::Creation { context, .. } => context,
        }
    }

    /// Byte offset of the offending token, for syntax errors that have one.
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::Syntax { position, .. } => *position,
            _ => None,
        }
    }

    pub fn semantic_kind(&self) -> Option<SemanticKind> {
        match self {
            Self::Semantical { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax { .. })
    }

    pub fn is_semantical(&self) -> bool {
        matches!(self, Self::Semantical { .. })
    }

    pub fn is_creation(&self) -> bool {
        matches!(self, Self::Creation { .. })
    }
}

pub type AnnotationResult<T> = Result<T, AnnotationError>;

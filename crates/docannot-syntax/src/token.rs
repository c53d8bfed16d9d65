use std::fmt;

/// Classification of a lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    None,
    Integer,
    Float,
    String,
    Identifier,
    At,
    OpenCurly,
    CloseCurly,
    OpenParen,
    CloseParen,
    Comma,
    Equals,
    Colon,
    Minus,
    NamespaceSeparator,
    True,
    False,
    Null,
}

impl TokenKind {
    pub fn display_name(self) -> &'static str {
        match self {
            TokenKind::None => "unknown character",
            TokenKind::Integer => "integer",
            TokenKind::Float => "float",
            TokenKind::String => "string",
            TokenKind::Identifier => "identifier",
            TokenKind::At => "'@'",
            TokenKind::OpenCurly => "'{'",
            TokenKind::CloseCurly => "'}'",
            TokenKind::OpenParen => "'('",
            TokenKind::CloseParen => "')'",
            TokenKind::Comma => "','",
            TokenKind::Equals => "'='",
            TokenKind::Colon => "':'",
            TokenKind::Minus => "'-'",
            TokenKind::NamespaceSeparator => "namespace separator",
            TokenKind::True => "keyword 'true'",
            TokenKind::False => "keyword 'false'",
            TokenKind::Null => "keyword 'null'",
        }
    }

    /// Kinds that may appear as a component of an annotation or class name.
    ///
    /// The bare words `true`, `false` and `null` are legal here even though
    /// they are keywords in value position.
    pub fn is_class_identifier(self) -> bool {
        matches!(
            self,
            TokenKind::Identifier | TokenKind::True | TokenKind::False | TokenKind::Null
        )
    }

    pub(crate) fn from_symbol(ch: char) -> Option<TokenKind> {
        let kind = match ch {
            '@' => TokenKind::At,
            ',' => TokenKind::Comma,
            '(' => TokenKind::OpenParen,
            ')' => TokenKind::CloseParen,
            '{' => TokenKind::OpenCurly,
            '}' => TokenKind::CloseCurly,
            '=' => TokenKind::Equals,
            ':' => TokenKind::Colon,
            '-' => TokenKind::Minus,
            '\\' => TokenKind::NamespaceSeparator,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A classified token with the byte offset it starts at in the lexed input.
///
/// For string tokens `value` holds the unquoted content with `""` already
/// collapsed to a single quote.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub value: String,
    pub kind: TokenKind,
    pub position: usize,
}

impl Token {
    pub fn new(value: impl Into<String>, kind: TokenKind, position: usize) -> Self {
        Self {
            value: value.into(),
            kind,
            position,
        }
    }

    /// Offset just past the token, measured with the length of `value`.
    #[inline]
    pub fn end(&self) -> usize {
        self.position + self.value.len()
    }

    #[inline]
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

use crate::token::{Token, TokenKind};
use once_cell::sync::Lazy;
use std::collections::HashMap;

static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    let mut m = HashMap::with_capacity(3);
    m.insert("true", TokenKind::True);
    m.insert("false", TokenKind::False);
    m.insert("null", TokenKind::Null);
    m
});

/// Splits docblock text into tokens.
///
/// Tokenizing never fails: whitespace and runs of `*` are dropped, and any
/// character that starts no known token becomes a single-character token
/// (of kind [`TokenKind::None`] unless it is a symbol or a letter).
pub fn tokenize(input: &str) -> Vec<Token> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::with_capacity(input.len() / 4);
    let mut offset = 0;

    while offset < bytes.len() {
        let Some(ch) = input[offset..].chars().next() else {
            break;
        };

        if ch.is_whitespace() {
            offset += ch.len_utf8();
            while let Some(next) = input[offset..].chars().next() {
                if !next.is_whitespace() {
                    break;
                }
                offset += next.len_utf8();
            }
            continue;
        }

        if ch == '*' {
            while offset < bytes.len() && bytes[offset] == b'*' {
                offset += 1;
            }
            continue;
        }

        if let Some(len) = scan_identifier(bytes, offset) {
            let text = &input[offset..offset + len];
            let kind = KEYWORDS
                .get(text.to_ascii_lowercase().as_str())
                .copied()
                .unwrap_or(TokenKind::Identifier);
            tokens.push(Token::new(text, kind, offset));
            offset += len;
            continue;
        }

        if let Some(len) = scan_number(bytes, offset) {
            let text = &input[offset..offset + len];
            tokens.push(Token::new(text, classify_number(text), offset));
            offset += len;
            continue;
        }

        if ch == '"' {
            if let Some((value, len)) = scan_string(input, offset) {
                tokens.push(Token::new(value, TokenKind::String, offset));
                offset += len;
                continue;
            }
        }

        let kind = TokenKind::from_symbol(ch).unwrap_or(if ch.is_ascii_alphabetic() || ch == '_' {
            TokenKind::Identifier
        } else {
            TokenKind::None
        });
        tokens.push(Token::new(ch.to_string(), kind, offset));
        offset += ch.len_utf8();
    }

    tokens
}

#[inline]
fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'\\'
}

#[inline]
fn is_ident_inner(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b':' || b == b'\\'
}

#[inline]
fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[inline]
fn is_word_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

/// Longest identifier starting at `start`, or `None` when fewer than two
/// characters form one.
///
/// An identifier is a start character, any run of word characters, `:` and
/// `\`, and must end in a word that begins with a letter or underscore. This
/// keeps `Foo\Bar::BAZ` together as one token.
fn scan_identifier(bytes: &[u8], start: usize) -> Option<usize> {
    if !is_ident_start(bytes[start]) {
        return None;
    }

    let mut end = None;
    let mut word_has_letter = false;
    let mut i = start + 1;
    while i < bytes.len() && is_ident_inner(bytes[i]) {
        if is_word(bytes[i]) {
            word_has_letter |= is_word_start(bytes[i]);
            if word_has_letter {
                end = Some(i + 1);
            }
        } else {
            word_has_letter = false;
        }
        i += 1;
    }

    end.map(|end| end - start)
}

fn scan_number(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start;
    if matches!(bytes[i], b'+' | b'-') {
        i += 1;
    }

    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == digits_start {
        return None;
    }

    while i + 1 < bytes.len() && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit() {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }

    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        let mut k = i + 1;
        if k < bytes.len() && matches!(bytes[k], b'+' | b'-') {
            k += 1;
        }
        let exp_digits = k;
        while k < bytes.len() && bytes[k].is_ascii_digit() {
            k += 1;
        }
        if k > exp_digits {
            i = k;
        }
    }

    Some(i - start)
}

fn classify_number(text: &str) -> TokenKind {
    let dots = text.bytes().filter(|&b| b == b'.').count();
    if dots > 1 {
        // "1.2.3" is matched as one run but is not a number.
        TokenKind::None
    } else if dots == 1 || text.bytes().any(|b| matches!(b, b'e' | b'E')) {
        TokenKind::Float
    } else {
        TokenKind::Integer
    }
}

/// Scans a double-quoted string where `""` stands for one embedded quote.
/// Returns the unescaped value and the consumed length, or `None` when the
/// string is never closed.
fn scan_string(input: &str, start: usize) -> Option<(String, usize)> {
    let bytes = input.as_bytes();
    let mut value = String::new();
    let mut segment = start + 1;
    let mut i = start + 1;

    while i < bytes.len() {
        if bytes[i] == b'"' {
            value.push_str(&input[segment..i]);
            if i + 1 < bytes.len() && bytes[i + 1] == b'"' {
                value.push('"');
                i += 2;
                segment = i;
                continue;
            }
            return Some((value, i + 1 - start));
        }
        i += 1;
    }

    None
}

/// Cursor over an eagerly tokenized docblock.
///
/// `lookahead` is the next token to be consumed and `token` the one consumed
/// last. [`DocLexer::peek`] walks ahead of the lookahead without moving the
/// cursor; [`DocLexer::glimpse`] does the same for a single token and
/// forgets the peek offset immediately.
#[derive(Debug, Default, Clone)]
pub struct DocLexer {
    tokens: Vec<Token>,
    position: usize,
    peek: usize,
    lookahead: Option<usize>,
    token: Option<usize>,
}

impl DocLexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets all cursor state and tokenizes `input`.
    pub fn set_input(&mut self, input: &str) {
        self.tokens = tokenize(input);
        self.reset();
    }

    pub fn reset(&mut self) {
        self.lookahead = None;
        self.token = None;
        self.peek = 0;
        self.position = 0;
    }

    /// Moves the lookahead into `token` and loads the next lookahead.
    /// Returns whether a lookahead token remains.
    pub fn move_next(&mut self) -> bool {
        self.peek = 0;
        self.token = self.lookahead;
        if self.position < self.tokens.len() {
            self.lookahead = Some(self.position);
            self.position += 1;
        } else {
            self.lookahead = None;
        }
        self.lookahead.is_some()
    }

    #[inline]
    pub fn lookahead(&self) -> Option<&Token> {
        self.lookahead.map(|idx| &self.tokens[idx])
    }

    #[inline]
    pub fn token(&self) -> Option<&Token> {
        self.token.map(|idx| &self.tokens[idx])
    }

    #[inline]
    pub fn is_next_token(&self, kind: TokenKind) -> bool {
        self.lookahead().is_some_and(|t| t.kind == kind)
    }

    pub fn is_next_token_any(&self, kinds: &[TokenKind]) -> bool {
        self.lookahead().is_some_and(|t| kinds.contains(&t.kind))
    }

    /// Returns the token after the previously peeked one and advances the
    /// peek offset, so consecutive calls walk further ahead.
    pub fn peek(&mut self) -> Option<&Token> {
        let idx = self.position + self.peek;
        if idx < self.tokens.len() {
            self.peek += 1;
            Some(&self.tokens[idx])
        } else {
            None
        }
    }

    /// Returns the token right after the lookahead and resets the peek
    /// offset, so repeated calls always see the same token.
    pub fn glimpse(&mut self) -> Option<&Token> {
        let idx = self.position + self.peek;
        self.peek = 0;
        self.tokens.get(idx)
    }

    pub fn reset_peek(&mut self) {
        self.peek = 0;
    }

    pub fn skip_until(&mut self, kind: TokenKind) {
        while self.lookahead().is_some_and(|t| t.kind != kind) {
            self.move_next();
        }
    }

    /// True when nothing has been consumed yet, or the lookahead starts
    /// exactly where the current token ends.
    pub fn next_token_is_adjacent(&self) -> bool {
        match (self.token(), self.lookahead()) {
            (None, _) => true,
            (Some(token), Some(lookahead)) => lookahead.position == token.end(),
            (Some(_), None) => false,
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_qualified_identifier_is_one_token() {
        let tokens = tokenize(r"Foo\Bar::BAZ");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].value, r"Foo\Bar::BAZ");
    }

    #[test]
    fn test_identifier_cannot_end_with_separator() {
        let tokens = tokenize(r"Foo\ x");
        assert_eq!(tokens[0].value, "Foo");
        assert_eq!(tokens[1].kind, TokenKind::NamespaceSeparator);
        assert_eq!(tokens[2].kind, TokenKind::Identifier);
        assert_eq!(tokens[2].value, "x");
    }

    #[test]
    fn test_identifier_ending_in_digit() {
        let tokens = tokenize("foo1");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].value, "foo1");

        assert_eq!(
            kinds("a1"),
            vec![TokenKind::Identifier, TokenKind::Integer]
        );
    }

    #[test]
    fn test_long_digit_run_inside_identifier() {
        let input = format!("a{}b", "1".repeat(100_000));
        let tokens = tokenize(&input);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].value.len(), input.len());

        let tokens = tokenize(&format!("a{}", "1".repeat(100_000)));
        assert_eq!(tokens[0].value, "a");
        assert_eq!(tokens[1].kind, TokenKind::Integer);
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(
            kinds("true FALSE Null nullable"),
            vec![
                TokenKind::True,
                TokenKind::False,
                TokenKind::Null,
                TokenKind::Identifier
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("1 -2 +3 1.5 -0.5 2e10 1.2.3");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Integer,
                TokenKind::Integer,
                TokenKind::Integer,
                TokenKind::Float,
                TokenKind::Float,
                TokenKind::Float,
                TokenKind::None,
            ]
        );
        assert_eq!(tokens[1].value, "-2");
    }

    #[test]
    fn test_string_with_doubled_quotes() {
        let tokens = tokenize(r#""say ""hi"" now""#);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].value, r#"say "hi" now"#);
    }

    #[test]
    fn test_string_spans_lines() {
        let tokens = tokenize("\"a\n * b\"");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].value, "a\n * b");
    }

    #[test]
    fn test_unterminated_string_is_unknown() {
        let tokens = tokenize("\"abc");
        assert_eq!(tokens[0].kind, TokenKind::None);
        assert_eq!(tokens[0].value, "\"");
        assert_eq!(tokens[1].value, "abc");
    }

    #[test]
    fn test_asterisks_and_whitespace_skipped() {
        let tokens = tokenize("/**\n * @Foo\n */");
        let values: Vec<_> = tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, vec!["/", "@", "Foo", "/"]);
        assert_eq!(tokens[0].kind, TokenKind::None);
    }

    #[test]
    fn test_positions_are_byte_offsets() {
        let tokens = tokenize("@Foo(\"é\", 1)");
        let positions: Vec<_> = tokens.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![0, 1, 4, 5, 9, 11, 12]);
    }

    #[test]
    fn test_unknown_characters_keep_lexer_total() {
        assert_eq!(
            kinds("# ~ é"),
            vec![TokenKind::None, TokenKind::None, TokenKind::None]
        );
    }

    #[test]
    fn test_move_next_and_lookahead() {
        let mut lexer = DocLexer::new();
        lexer.set_input("@Foo()");
        assert!(lexer.token().is_none());
        assert!(lexer.move_next());
        assert!(lexer.is_next_token(TokenKind::At));
        assert!(lexer.move_next());
        assert_eq!(lexer.token().map(|t| t.kind), Some(TokenKind::At));
        assert!(lexer.is_next_token_any(&[TokenKind::String, TokenKind::Identifier]));
    }

    #[test]
    fn test_peek_and_glimpse() {
        let mut lexer = DocLexer::new();
        lexer.set_input("a = b , c");
        lexer.move_next();

        assert_eq!(lexer.peek().map(|t| t.kind), Some(TokenKind::Equals));
        assert_eq!(lexer.peek().map(|t| t.value.clone()), Some("b".to_string()));
        lexer.reset_peek();

        assert_eq!(lexer.glimpse().map(|t| t.kind), Some(TokenKind::Equals));
        assert_eq!(lexer.glimpse().map(|t| t.kind), Some(TokenKind::Equals));
        assert_eq!(lexer.lookahead().map(|t| t.value.as_str()), Some("a"));
    }

    #[test]
    fn test_next_token_is_adjacent() {
        let mut lexer = DocLexer::new();
        lexer.set_input("foo-bar - baz");
        assert!(lexer.next_token_is_adjacent());
        lexer.move_next();
        lexer.move_next();
        assert_eq!(lexer.token().map(|t| t.value.as_str()), Some("foo"));
        assert!(lexer.is_next_token(TokenKind::Minus));
        assert!(lexer.next_token_is_adjacent());

        lexer.move_next();
        lexer.move_next();
        assert_eq!(lexer.token().map(|t| t.value.as_str()), Some("bar"));
        assert!(!lexer.next_token_is_adjacent());
    }

    #[test]
    fn test_skip_until() {
        let mut lexer = DocLexer::new();
        lexer.set_input("some text @Foo");
        lexer.move_next();
        lexer.skip_until(TokenKind::At);
        assert!(lexer.is_next_token(TokenKind::At));
    }
}

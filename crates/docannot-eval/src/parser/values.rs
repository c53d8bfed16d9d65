use docannot_syntax::{
    AnnotationError, AnnotationResult, ArrayKey, ArrayValue, SemanticKind, TokenKind, Value,
};

use super::Session;
use crate::checker::Arguments;
use crate::resolver;

/// A single argument of a method call.
enum Argument {
    Positional(Value),
    Named(String, Value),
}

const ASSIGNMENT: [TokenKind; 2] = [TokenKind::Equals, TokenKind::Colon];

fn parse_integer(literal: &str) -> i64 {
    literal.parse::<i64>().unwrap_or(if literal.starts_with('-') {
        i64::MIN
    } else {
        i64::MAX
    })
}

fn parse_float(literal: &str) -> f64 {
    literal.parse::<f64>().unwrap_or(0.0)
}

impl Session<'_, '_> {
    /// MethodCall ::= ["(" [Values] ")"]
    pub(super) fn method_call(&mut self) -> AnnotationResult<Arguments> {
        if !self.lexer.is_next_token(TokenKind::OpenParen) {
            return Ok(Arguments::default());
        }
        self.match_token(TokenKind::OpenParen)?;

        let mut arguments = Arguments::default();
        if !self.lexer.is_next_token(TokenKind::CloseParen) {
            arguments = self.values()?;
        }

        self.match_token(TokenKind::CloseParen)?;
        Ok(arguments)
    }

    /// Values ::= Value {"," Value}* [","]
    fn values(&mut self) -> AnnotationResult<Arguments> {
        let mut list = vec![self.value()?];

        while self.lexer.is_next_token(TokenKind::Comma) {
            self.match_token(TokenKind::Comma)?;
            if self.lexer.is_next_token(TokenKind::CloseParen) {
                break;
            }
            list.push(self.value()?);
        }

        let mut arguments = Arguments::default();
        for (index, argument) in list.into_iter().enumerate() {
            match argument {
                Argument::Positional(value) => arguments.positional.push((index, value)),
                Argument::Named(name, value) => {
                    arguments.named.insert(name, value);
                }
            }
        }
        Ok(arguments)
    }

    /// Value ::= PlainValue | FieldAssignment
    fn value(&mut self) -> AnnotationResult<Argument> {
        let assignment = self
            .lexer
            .glimpse()
            .is_some_and(|next| ASSIGNMENT.contains(&next.kind));
        if assignment {
            return self.field_assignment();
        }
        Ok(Argument::Positional(self.plain_value()?))
    }

    /// FieldAssignment ::= identifier ("=" | ":") PlainValue
    fn field_assignment(&mut self) -> AnnotationResult<Argument> {
        self.match_token(TokenKind::Identifier)?;
        let name = self.token_value();
        self.match_any(&ASSIGNMENT)?;
        Ok(Argument::Named(name, self.plain_value()?))
    }

    /// PlainValue ::= integer | string | float | boolean | null | Array
    ///              | Annotation | Constant
    fn plain_value(&mut self) -> AnnotationResult<Value> {
        if self.lexer.is_next_token(TokenKind::OpenCurly) {
            return Ok(Value::Array(self.array()?));
        }
        if self.lexer.is_next_token(TokenKind::At) {
            // a skipped nested annotation still occupies its slot
            return Ok(match self.annotation(true)? {
                Some(annotation) => Value::Annotation(annotation),
                None => Value::Bool(false),
            });
        }
        if self.lexer.is_next_token(TokenKind::Identifier) {
            return self.constant();
        }

        let Some(kind) = self.lexer.lookahead().map(|t| t.kind) else {
            return Err(self.syntax_error("PlainValue"));
        };
        match kind {
            TokenKind::String => {
                self.match_token(TokenKind::String)?;
                Ok(Value::String(self.token_value()))
            }
            TokenKind::Integer => {
                self.match_token(TokenKind::Integer)?;
                Ok(Value::Integer(parse_integer(&self.token_value())))
            }
            TokenKind::Float => {
                self.match_token(TokenKind::Float)?;
                Ok(Value::Float(parse_float(&self.token_value())))
            }
            TokenKind::True => {
                self.match_token(TokenKind::True)?;
                Ok(Value::Bool(true))
            }
            TokenKind::False => {
                self.match_token(TokenKind::False)?;
                Ok(Value::Bool(false))
            }
            TokenKind::Null => {
                self.match_token(TokenKind::Null)?;
                Ok(Value::Null)
            }
            TokenKind::Minus => {
                self.match_token(TokenKind::Minus)?;
                self.match_any(&[TokenKind::Integer, TokenKind::Float])?;
                let literal = self.token_value();
                match self.lexer.token().map(|t| t.kind) {
                    Some(TokenKind::Float) => Ok(Value::Float(-parse_float(&literal))),
                    _ => Ok(Value::Integer(
                        parse_integer(&literal).checked_neg().unwrap_or(i64::MAX),
                    )),
                }
            }
            _ => Err(self.syntax_error("PlainValue")),
        }
    }

    /// Array ::= "{" ArrayEntry {"," ArrayEntry}* [","] "}"
    fn array(&mut self) -> AnnotationResult<ArrayValue> {
        self.enter()?;
        let result = self.array_body();
        self.leave();
        result
    }

    fn array_body(&mut self) -> AnnotationResult<ArrayValue> {
        self.match_token(TokenKind::OpenCurly)?;

        let mut array = ArrayValue::new();
        if self.lexer.is_next_token(TokenKind::CloseCurly) {
            self.match_token(TokenKind::CloseCurly)?;
            return Ok(array);
        }

        let mut entries = vec![self.array_entry()?];
        while self.lexer.is_next_token(TokenKind::Comma) {
            self.match_token(TokenKind::Comma)?;
            if self.lexer.is_next_token(TokenKind::CloseCurly) {
                break;
            }
            entries.push(self.array_entry()?);
        }
        self.match_token(TokenKind::CloseCurly)?;

        for (key, value) in entries {
            match key {
                Some(key) => array.insert(key, value),
                None => array.push(value),
            }
        }
        Ok(array)
    }

    /// ArrayEntry ::= Value | KeyValuePair
    /// KeyValuePair ::= (identifier | string | integer | Constant) ("=" | ":") PlainValue
    fn array_entry(&mut self) -> AnnotationResult<(Option<ArrayKey>, Value)> {
        let keyed = self
            .lexer
            .glimpse()
            .is_some_and(|next| ASSIGNMENT.contains(&next.kind));

        if !keyed {
            return Ok((None, self.plain_value()?));
        }

        let key = if self.lexer.is_next_token(TokenKind::Identifier) {
            match self.constant()? {
                Value::Integer(n) => ArrayKey::Int(n),
                other => ArrayKey::Str(other.render_plain()),
            }
        } else {
            self.match_any(&[TokenKind::Integer, TokenKind::String])?;
            let literal = self.token_value();
            match self.lexer.token().map(|t| t.kind) {
                Some(TokenKind::Integer) => ArrayKey::Int(parse_integer(&literal)),
                _ => ArrayKey::Str(literal),
            }
        };

        self.match_any(&ASSIGNMENT)?;
        Ok((Some(key), self.plain_value()?))
    }

    /// Constant ::= identifier | class constant | class name via `::class`
    fn constant(&mut self) -> AnnotationResult<Value> {
        let identifier = self.identifier()?;
        let registry = self.registry();

        let identifier = resolver::qualify_class_constant(
            &identifier,
            self.ctx,
            |name| registry.constant(name).is_some(),
            |name| self.type_exists(name),
        );

        if let Some(class) = strip_class_suffix(&identifier) {
            return Ok(Value::String(class.trim_start_matches('\\').to_string()));
        }

        registry
            .constant(identifier.trim_start_matches('\\'))
            .ok_or_else(|| {
                let description = self.ctx.description();
                let suffix = if description.is_empty() {
                    String::new()
                } else {
                    format!(", {}", description)
                };
                AnnotationError::semantical(
                    SemanticKind::Constant,
                    format!("Couldn't find constant {}{}.", identifier, suffix),
                    description,
                )
            })
    }
}

/// `Foo::class` (any case) → `Foo`.
fn strip_class_suffix(identifier: &str) -> Option<&str> {
    const SUFFIX: &str = "::class";
    let split = identifier.len().checked_sub(SUFFIX.len())?;
    let suffix = identifier.get(split..)?;
    if suffix.eq_ignore_ascii_case(SUFFIX) {
        identifier.get(..split)
    } else {
        None
    }
}

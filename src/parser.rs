//! Parser (spec.md §4.3): single-pass, deterministic, consumes the
//! tokenizer's flat token stream and produces a [`TokenList`] AST rooted at
//! the whole program.

use crate::ast::{AstNode, TokenList};
use crate::error::{ErrorLocation, SofError};
use crate::token::{PrimitiveToken, Token};
use crate::tokenizer::Tokenizer;
use crate::value::{Identifier, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static INT_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(0[bB][01]+|0[oO][0-7]+|0[xX][0-9a-fA-F]+|0[dD][0-9]+|[0-9]+)$")
        .expect("int literal regex is valid")
});
static FLOAT_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?$").expect("float literal regex is valid")
});
static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex is valid"));

pub struct Parser {
    tokenizer: Tokenizer,
}

impl Parser {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self { tokenizer }
    }

    /// Parses the whole input into the root [`TokenList`].
    pub fn parse(mut self) -> Result<TokenList, SofError> {
        let list = self.parse_token_list(false)?;
        debug!(nodes = list.len(), "parsed program");
        Ok(list)
    }

    /// Drains tokens into a flat child list; when `nested` is true, a `}`
    /// closes this list instead of being an error — it is this function's
    /// caller's job to have already consumed the opening `{`.
    fn parse_token_list(&mut self, nested: bool) -> Result<TokenList, SofError> {
        let mut nodes = Vec::new();
        loop {
            if !self.tokenizer.has_next() {
                if nested {
                    return Err(SofError::syntax(
                        ErrorLocation::Complete(self.tokenizer.location_at(self.tokenizer.offset())),
                        "unbalanced '{': missing closing '}'",
                    ));
                }
                return Ok(TokenList::new(nodes));
            }

            // Peek without consuming by saving/restoring tokenizer state —
            // only `}` needs special handling at this level.
            self.tokenizer.push_state();
            let token = self.tokenizer.next()?;
            if token.text == "}" {
                self.tokenizer.pop_state();
                if nested {
                    self.tokenizer.next()?; // actually consume the '}'
                    return Ok(TokenList::new(nodes));
                }
                return Err(SofError::syntax(
                    ErrorLocation::Complete(self.tokenizer.location_at(token.start)),
                    "unbalanced '}': no matching '{'",
                ));
            }
            self.tokenizer.pop_state();
            let token = self.tokenizer.next()?;

            if token.text == "{" {
                let body = self.parse_token_list(true)?;
                let end = self.tokenizer.offset();
                nodes.push(AstNode::Block { body, start: token.start, end });
                continue;
            }

            nodes.push(self.classify(token)?);
        }
    }

    /// Classifies one raw token by regex, per spec.md §4.3 step 3.
    fn classify(&self, token: Token) -> Result<AstNode, SofError> {
        let start = token.start;
        let end = token.end();
        let text = token.text.as_str();

        if text.starts_with('"') {
            let value = parse_string_literal(text, start, &self.tokenizer)?;
            return Ok(AstNode::Literal { value, start, end });
        }
        if text == "true" || text == "false" {
            return Ok(AstNode::Literal {
                value: Value::Boolean(text == "true"),
                start,
                end,
            });
        }
        if let Some(rest) = text.strip_prefix('\'') {
            let id = Identifier::new(rest).map_err(|msg| {
                SofError::syntax(ErrorLocation::Complete(self.tokenizer.location_at(start)), msg)
            })?;
            return Ok(AstNode::Literal {
                value: Value::Identifier(id),
                start,
                end,
            });
        }
        if FLOAT_LITERAL.is_match(text) {
            let value: f64 = text.parse().map_err(|_| {
                SofError::syntax(
                    ErrorLocation::Complete(self.tokenizer.location_at(start)),
                    format!("invalid float literal '{}'", text),
                )
            })?;
            return Ok(AstNode::Literal {
                value: Value::Float(value),
                start,
                end,
            });
        }
        if INT_LITERAL.is_match(text) {
            let value = parse_int_literal(text).map_err(|msg| {
                SofError::math(ErrorLocation::Complete(self.tokenizer.location_at(start)), msg)
            })?;
            return Ok(AstNode::Literal {
                value: Value::Integer(value),
                start,
                end,
            });
        }
        if let Some(primitive) = PrimitiveToken::classify(text) {
            return Ok(AstNode::Primitive { token: primitive, start, end });
        }
        if IDENTIFIER.is_match(text) {
            let id = Identifier::new(text).map_err(|msg| {
                SofError::syntax(ErrorLocation::Complete(self.tokenizer.location_at(start)), msg)
            })?;
            return Ok(AstNode::Atom { id, start, end });
        }
        Err(SofError::syntax(
            ErrorLocation::Complete(self.tokenizer.location_at(start)),
            format!("unrecognized token '{}'", text),
        ))
    }
}

fn parse_int_literal(text: &str) -> Result<i64, String> {
    let (digits, radix) = if let Some(rest) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        (rest, 2)
    } else if let Some(rest) = text.strip_prefix("0o").or_else(|| text.strip_prefix("0O")) {
        (rest, 8)
    } else if let Some(rest) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        (rest, 16)
    } else if let Some(rest) = text.strip_prefix("0d").or_else(|| text.strip_prefix("0D")) {
        (rest, 10)
    } else {
        (text, 10)
    };
    i64::from_str_radix(digits, radix)
        .map_err(|_| format!("integer literal '{}' exceeds 64-bit signed range", text))
}

fn parse_string_literal(text: &str, start: usize, tokenizer: &Tokenizer) -> Result<Value, SofError> {
    let inner = &text[1..text.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => out.push(other),
                None => {
                    return Err(SofError::syntax(
                        ErrorLocation::Complete(tokenizer.location_at(start)),
                        "dangling escape at end of string literal",
                    ))
                }
            }
        } else {
            out.push(c);
        }
    }
    Ok(Value::Str(out.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::FileTag;

    fn parse(src: &str) -> TokenList {
        let tokenizer = Tokenizer::new(src, FileTag::Synthetic("<test>"));
        Parser::new(tokenizer).parse().unwrap()
    }

    #[test]
    fn parses_flat_literals_and_primitives() {
        let list = parse("1 2 + writeln");
        assert_eq!(list.len(), 4);
        assert!(matches!(list.nodes[0], AstNode::Literal { value: Value::Integer(1), .. }));
        assert!(matches!(list.nodes[2], AstNode::Primitive { token: PrimitiveToken::Add, .. }));
    }

    #[test]
    fn parses_nested_block() {
        let list = parse("{ dup * } 1 function");
        assert!(matches!(list.nodes[0], AstNode::Block { .. }));
        if let AstNode::Block { body, .. } = &list.nodes[0] {
            assert_eq!(body.len(), 2);
        }
    }

    #[test]
    fn unbalanced_open_brace_is_syntax_error() {
        let tokenizer = Tokenizer::new("{ dup", FileTag::Synthetic("<test>"));
        assert!(matches!(Parser::new(tokenizer).parse(), Err(SofError::Syntax { .. })));
    }

    #[test]
    fn unbalanced_close_brace_is_syntax_error() {
        let tokenizer = Tokenizer::new("dup }", FileTag::Synthetic("<test>"));
        assert!(matches!(Parser::new(tokenizer).parse(), Err(SofError::Syntax { .. })));
    }

    #[test]
    fn integer_bases_all_parse_to_same_value() {
        let list = parse("0b101 0o5 0d5 0x5 5");
        for node in &list.nodes {
            assert!(matches!(node, AstNode::Literal { value: Value::Integer(5), .. }));
        }
    }

    #[test]
    fn overflowing_integer_is_math_error() {
        let tokenizer = Tokenizer::new("99999999999999999999", FileTag::Synthetic("<test>"));
        assert!(matches!(Parser::new(tokenizer).parse(), Err(SofError::Math { .. })));
    }

    #[test]
    fn quoted_identifier_is_data_literal() {
        let list = parse("'foo");
        assert!(matches!(
            &list.nodes[0],
            AstNode::Literal { value: Value::Identifier(id), .. } if id.as_str() == "foo"
        ));
    }
}

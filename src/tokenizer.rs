//! Lazy, restartable tokenizer cursor (spec.md §4.2). A single master
//! [`regex::Regex`] — built once behind [`once_cell::sync::Lazy`], the
//! teacher crate's own `once_cell` dependency — matches any valid token at
//! the cursor's current offset.

use crate::error::{ErrorLocation, SofError};
use crate::location::{line_col_at, FileTag, SourceLocation};
use crate::token::Token;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

/// Order matters: longer/more specific alternatives are listed before the
/// shorter ones they would otherwise shadow (`:=` before `:`, `<=` before
/// `<`, a full float before a bare integer, `return:<n>` before a plain
/// identifier).
static MASTER_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"^(?:"#,
        r#"(?P<float>[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?)"#,
        r#"|(?P<int>0[bB][01]+|0[oO][0-7]+|0[xX][0-9a-fA-F]+|0[dD][0-9]+|[0-9]+)"#,
        r#"|(?P<string>"(?:[^"\\]|\\.)*")"#,
        r#"|(?P<boolean>true|false)\b"#,
        r#"|(?P<returnn>return:[0-9]+)"#,
        r#"|(?P<convert>convert:(?:int|float|string|bool))"#,
        r#"|(?P<qident>'[A-Za-z_][A-Za-z0-9_]*)"#,
        r#"|(?P<ident>[A-Za-z_][A-Za-z0-9_]*)"#,
        r#"|(?P<sym>:=|<=|>=|/=|\{|\}|[-+*/%<>=.,:])"#,
        r#")"#,
    ))
    .expect("master token regex is valid")
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s+").expect("whitespace regex is valid"));

/// A captured `(offset, region)` window, restorable by [`Tokenizer::pop_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizerState {
    pub offset: usize,
    pub region: (usize, usize),
}

/// A lazy cursor over cleaned source producing `(text, start)` tokens.
pub struct Tokenizer {
    code: String,
    file: FileTag,
    offset: usize,
    region: (usize, usize),
    saved: Vec<TokenizerState>,
}

impl Tokenizer {
    pub fn new(code: impl Into<String>, file: FileTag) -> Self {
        let code = code.into();
        let len = code.len();
        Self {
            code,
            file,
            offset: 0,
            region: (0, len),
            saved: Vec::new(),
        }
        .skip_whitespace_init()
    }

    fn skip_whitespace_init(mut self) -> Self {
        self.skip_whitespace();
        self
    }

    fn skip_whitespace(&mut self) {
        loop {
            let slice = &self.code[self.offset..self.region.1];
            match WHITESPACE.find(slice) {
                Some(m) if m.start() == 0 && m.end() > 0 => {
                    self.offset += m.end();
                }
                _ => break,
            }
        }
    }

    /// Pure peek: may be called repeatedly without advancing.
    pub fn has_next(&self) -> bool {
        self.offset < self.region.1
    }

    fn remaining(&self) -> &str {
        &self.code[self.offset..self.region.1]
    }

    /// Advances past the next token, or fails per spec.md §4.2: `NotFound`
    /// when the region is simply exhausted, `Syntax` when there is
    /// unmatchable garbage before the region end.
    pub fn next(&mut self) -> Result<Token, SofError> {
        if !self.has_next() {
            return Err(SofError::NotFound);
        }
        let slice = self.remaining();
        match MASTER_TOKEN.find(slice) {
            Some(m) if m.start() == 0 => {
                let start = self.offset;
                let text = slice[m.start()..m.end()].to_string();
                self.offset += m.end();
                self.skip_whitespace();
                trace!(text = %text, start, "produced token");
                Ok(Token::new(text, start))
            }
            _ => Err(SofError::syntax(
                ErrorLocation::Complete(self.location_at(self.offset)),
                format!(
                    "unrecognized token near '{}'",
                    slice.chars().take(20).collect::<String>()
                ),
            )),
        }
    }

    /// Saves the current offset and region window onto an explicit stack
    /// (spec.md §4.2, §9 "Serializable tokenizer state"): a plain value,
    /// no hidden pointers.
    pub fn push_state(&mut self) {
        self.saved.push(TokenizerState {
            offset: self.offset,
            region: self.region,
        });
    }

    /// Restores the most recently saved state. Panics if the save stack is
    /// empty — a push/pop mismatch is a parser bug, not a user-facing error.
    pub fn pop_state(&mut self) {
        let state = self.saved.pop().expect("pop_state without matching push_state");
        self.offset = state.offset;
        self.region = state.region;
    }

    /// Narrows the active scanning window without touching the save stack;
    /// used by the parser to bound a nested code-block region to `[start, end)`.
    pub fn set_region(&mut self, region: (usize, usize)) {
        self.region = region;
    }

    pub fn region(&self) -> (usize, usize) {
        self.region
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns a new cursor over an extended code buffer, preserving the
    /// old scanning position — supports incremental/REPL use (spec.md §4.2).
    pub fn with_code_appended(&self, extra: &str) -> Tokenizer {
        let mut code = self.code.clone();
        code.push_str(extra);
        let new_len = code.len();
        Tokenizer {
            code,
            file: self.file.clone(),
            offset: self.offset,
            region: (self.region.0, new_len),
            saved: self.saved.clone(),
        }
    }

    pub fn current_position(&self) -> (usize, usize) {
        let lc = line_col_at(&self.code, self.offset);
        (lc.line, lc.column)
    }

    pub fn location_at(&self, offset: usize) -> SourceLocation {
        SourceLocation::new(self.file.clone(), offset)
    }

    pub fn source(&self) -> &str {
        &self.code
    }

    pub fn file(&self) -> &FileTag {
        &self.file
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(src: &str) -> Tokenizer {
        Tokenizer::new(src, FileTag::Synthetic("<test>"))
    }

    #[test]
    fn tokenizes_simple_program() {
        let mut t = tok("1 2 + writeln");
        let mut texts = Vec::new();
        while t.has_next() {
            texts.push(t.next().unwrap().text);
        }
        assert_eq!(texts, vec!["1", "2", "+", "writeln"]);
    }

    #[test]
    fn tokenizes_bases() {
        let mut t = tok("0b101 0o5 0d5 0x5 5");
        let mut texts = Vec::new();
        while t.has_next() {
            texts.push(t.next().unwrap().text);
        }
        assert_eq!(texts, vec!["0b101", "0o5", "0d5", "0x5", "5"]);
    }

    #[test]
    fn tokenizes_string_with_escape() {
        let mut t = tok(r#""a\"b" writeln"#);
        let first = t.next().unwrap();
        assert_eq!(first.text, r#""a\"b""#);
    }

    #[test]
    fn tokenizes_return_n() {
        let mut t = tok("return:2");
        assert_eq!(t.next().unwrap().text, "return:2");
    }

    #[test]
    fn tokenizes_two_char_symbols_before_shadowing_single_char() {
        let mut t = tok(":= <= >= /=");
        let texts: Vec<_> = (0..4).map(|_| t.next().unwrap().text).collect();
        assert_eq!(texts, vec![":=", "<=", ">=", "/="]);
    }

    #[test]
    fn garbage_is_syntax_error() {
        let mut t = tok("@@@");
        assert!(matches!(t.next(), Err(SofError::Syntax { .. })));
    }

    #[test]
    fn exhausted_region_is_not_found() {
        let mut t = tok("");
        assert!(matches!(t.next(), Err(SofError::NotFound)));
    }

    #[test]
    fn save_restore_replays_same_sequence() {
        let mut t = tok("1 2 3");
        let before: Vec<_> = {
            t.push_state();
            let seq = vec![t.next().unwrap(), t.next().unwrap(), t.next().unwrap()];
            t.pop_state();
            seq
        };
        let after = vec![t.next().unwrap(), t.next().unwrap(), t.next().unwrap()];
        assert_eq!(before, after);
    }

    #[test]
    fn with_code_appended_preserves_position() {
        let mut t = tok("1 2");
        let first = t.next().unwrap();
        assert_eq!(first.text, "1");
        let mut extended = t.with_code_appended(" 3");
        let rest: Vec<_> = std::iter::from_fn(|| extended.has_next().then(|| extended.next().unwrap().text))
            .collect();
        assert_eq!(rest, vec!["2", "3"]);
    }
}

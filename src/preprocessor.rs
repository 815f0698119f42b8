//! Preprocessor (spec.md §4.1): a pure `&str -> String` pass that resolves
//! line continuations, strips comments, and leaves string literals intact
//! so the tokenizer's master regex never has to think about `#`.

use crate::error::{ErrorLocation, SofError};
use crate::location::FileTag;

/// Transforms raw source into the canonical form the tokenizer expects.
///
/// Idempotent on already-clean input (Testable Property 1): none of the
/// four rules fire again once continuations are joined, comments are
/// replaced with whitespace, and strings are passed through unchanged.
///
/// `file` is the real origin of `source` — threaded through so an
/// unterminated string/block comment is reported under the caller's actual
/// file name rather than a placeholder (spec.md §7's location contract).
pub fn preprocess(source: &str, file: FileTag) -> Result<String, SofError> {
    let joined = join_line_continuations(source);
    strip_comments(&joined, file)
}

fn join_line_continuations(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('\n') => {
                    chars.next();
                    continue;
                }
                Some('\r') => {
                    chars.next();
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    continue;
                }
                _ => out.push(c),
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Code,
    String,
    LineComment,
    BlockComment,
}

/// Replaces `#* ... *#` and `# ... \n` comments with single spaces (block
/// comments emit one newline per removed newline so line numbers survive),
/// recognizing double-quoted, backslash-escaped string literals so that a
/// `#` inside a string never opens a comment.
fn strip_comments(source: &str, file: FileTag) -> Result<String, SofError> {
    let mut out = String::with_capacity(source.len());
    let mut state = ScanState::Code;
    let mut chars = source.char_indices().peekable();
    let mut string_start = 0usize;
    let mut comment_start = 0usize;
    let mut escaped = false;

    while let Some((idx, c)) = chars.next() {
        match state {
            ScanState::Code => match c {
                '"' => {
                    string_start = idx;
                    state = ScanState::String;
                    escaped = false;
                    out.push(c);
                }
                '#' => {
                    if matches!(chars.peek(), Some((_, '*'))) {
                        chars.next();
                        comment_start = idx;
                        state = ScanState::BlockComment;
                    } else {
                        comment_start = idx;
                        state = ScanState::LineComment;
                    }
                }
                _ => out.push(c),
            },
            ScanState::String => {
                out.push(c);
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '"' {
                    state = ScanState::Code;
                }
            }
            ScanState::LineComment => {
                if c == '\n' {
                    out.push(' ');
                    out.push('\n');
                    state = ScanState::Code;
                }
            }
            ScanState::BlockComment => {
                if c == '\n' {
                    out.push('\n');
                } else if c == '*' && matches!(chars.peek(), Some((_, '#'))) {
                    chars.next();
                    out.push(' ');
                    state = ScanState::Code;
                }
            }
        }
    }

    match state {
        ScanState::String => Err(SofError::syntax(
            ErrorLocation::Complete(crate::location::SourceLocation::new(file, string_start)),
            "unterminated string literal",
        )),
        ScanState::BlockComment => Err(SofError::syntax(
            ErrorLocation::Complete(crate::location::SourceLocation::new(file, comment_start)),
            "unterminated block comment",
        )),
        ScanState::LineComment => {
            out.push(' ');
            Ok(out)
        }
        ScanState::Code => Ok(out),
    }
}

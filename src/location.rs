//! Source location tracking: a file tag plus a byte offset, with line/column
//! derived on demand by scanning newlines the way [`crate::Code`] derives
//! [`Position`](crate::Position) in the teacher library this crate grew out of.

use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Identifies where a chunk of source text came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileTag {
    /// A real file on disk.
    Real(PathBuf),
    /// A synthetic origin such as `<literal>`, `<preamble>`, `<repl>`.
    Synthetic(&'static str),
}

impl Display for FileTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FileTag::Real(path) => write!(f, "{}", path.display()),
            FileTag::Synthetic(tag) => write!(f, "{}", tag),
        }
    }
}

/// A line/column pair, 1-based line and 0-based column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineCol {
    pub line: usize,
    pub column: usize,
}

impl Display for LineCol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Scans `source` for the 1-based line number and 0-based column of `offset`.
pub fn line_col_at(source: &str, offset: usize) -> LineCol {
    let bytes = source.as_bytes();
    let clamped = offset.min(bytes.len());
    let mut line = 1usize;
    let mut line_start = 0usize;
    for (idx, byte) in bytes[..clamped].iter().enumerate() {
        if *byte == b'\n' {
            line += 1;
            line_start = idx + 1;
        }
    }
    let column = source[line_start..clamped].chars().count();
    LineCol { line, column }
}

/// Returns the full text of the line containing `offset`, for caret-excerpt
/// rendering by the error-reporting collaborator.
pub fn line_text_at(source: &str, offset: usize) -> &str {
    let bytes = source.as_bytes();
    let clamped = offset.min(bytes.len());
    let start = source[..clamped].rfind('\n').map_or(0, |i| i + 1);
    let end = source[clamped..]
        .find('\n')
        .map_or(source.len(), |i| clamped + i);
    &source[start..end]
}

/// `(file_tag, byte_index)` — a fully resolved source location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: FileTag,
    pub offset: usize,
}

impl SourceLocation {
    pub fn new(file: FileTag, offset: usize) -> Self {
        Self { file, offset }
    }

    pub fn line_col(&self, source: &str) -> LineCol {
        line_col_at(source, self.offset)
    }
}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.file, self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_first_column() {
        let lc = line_col_at("abc", 0);
        assert_eq!(lc, LineCol { line: 1, column: 0 });
    }

    #[test]
    fn counts_lines_crossed() {
        let src = "one\ntwo\nthree";
        let lc = line_col_at(src, src.find("three").unwrap());
        assert_eq!(lc, LineCol { line: 3, column: 0 });
    }

    #[test]
    fn column_within_line() {
        let src = "abcdef\nghij";
        let lc = line_col_at(src, src.find('j').unwrap());
        assert_eq!(lc, LineCol { line: 2, column: 3 });
    }

    #[test]
    fn line_text_extracts_whole_line() {
        let src = "one\ntwo three\nfour";
        let offset = src.find("three").unwrap();
        assert_eq!(line_text_at(src, offset), "two three");
    }
}

//! Lays out the abstract pieces of an error report (spec.md §7): kind
//! header, file/line/column, and a caret-marked source excerpt. The actual
//! localized message bundle behind a `SofError`'s text stays an external,
//! unspecified collaborator — this module only arranges what's already on
//! the error, it doesn't translate it.

use crate::error::{ErrorLocation, SofError};
use crate::location::{line_col_at, line_text_at};

/// Renders `err` against `source` as a multi-line report suitable for
/// printing to stderr. When `err`'s location is [`ErrorLocation::Incomplete`]
/// (should not happen for an error that has crossed `Interpreter::run`'s
/// boundary, but kept safe here) only the header line is produced.
pub fn report(err: &SofError, source: &str) -> String {
    let mut out = format!("{} error: {}\n", err.kind_key(), err);
    if let Some(ErrorLocation::Complete(loc)) = err.location() {
        let lc = line_col_at(source, loc.offset);
        out.push_str(&format!("  --> {}:{}:{}\n", loc.file, lc.line, lc.column));
        let line = line_text_at(source, loc.offset);
        out.push_str(&format!("  {}\n", line));
        out.push_str(&format!("  {}^\n", " ".repeat(lc.column)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_includes_kind_and_location() {
        let source = "1 0 /";
        let err = SofError::math(
            ErrorLocation::Complete(crate::location::SourceLocation::new(
                crate::location::FileTag::Synthetic("<test>"),
                4,
            )),
            "division by zero",
        );
        let text = report(&err, source);
        assert!(text.starts_with("math error: division by zero\n"));
        assert!(text.contains("<test>:1:4"));
        assert!(text.contains("1 0 /"));
        assert!(text.contains("^"));
    }

    #[test]
    fn report_without_location_is_header_only() {
        let err = SofError::name(ErrorLocation::Incomplete, "x");
        let text = report(&err, "x");
        assert_eq!(text, format!("name error: {}\n", err));
    }
}

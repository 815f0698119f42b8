//! Error taxonomy (spec.md §7). Each [`SofError`] carries a kind, a location
//! that may be [`ErrorLocation::Incomplete`] when raised deep in the value
//! model, and format arguments for the (unspecified, external) localized
//! message bundle. `Display` is derived with `thiserror`, matching the rest
//! of the pack's compiler/interpreter crates rather than hand rolled.

use crate::location::SourceLocation;
use thiserror::Error;

/// Either a fully resolved location or a marker to be filled in by an
/// enclosing interpreter frame that knows the current AST node's span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorLocation {
    Complete(SourceLocation),
    Incomplete,
}

impl ErrorLocation {
    pub fn is_complete(&self) -> bool {
        matches!(self, ErrorLocation::Complete(_))
    }
}

/// The localizable type-key taxonomy from spec.md §7.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SofError {
    #[error("syntax error: {message}")]
    Syntax {
        location: ErrorLocation,
        message: String,
        args: Vec<String>,
    },
    #[error("type error: {message}")]
    Type {
        location: ErrorLocation,
        message: String,
        args: Vec<String>,
    },
    #[error("name error: {message}")]
    Name {
        location: ErrorLocation,
        message: String,
        args: Vec<String>,
    },
    #[error("stack error: {message}")]
    Stack {
        location: ErrorLocation,
        message: String,
        args: Vec<String>,
    },
    #[error("math error: {message}")]
    Math {
        location: ErrorLocation,
        message: String,
        args: Vec<String>,
    },
    #[error("assertion failed: {message}")]
    Assert {
        location: ErrorLocation,
        message: String,
        args: Vec<String>,
    },
    #[error("io error: {message}")]
    Io {
        location: ErrorLocation,
        message: String,
        args: Vec<String>,
    },
    #[error("error: {message}")]
    Generic {
        location: ErrorLocation,
        message: String,
        args: Vec<String>,
    },
    /// Raised by the tokenizer when the remaining region has no matchable
    /// content before its end (spec.md §4.2) — distinct from `Syntax`,
    /// which is unmatchable garbage.
    #[error("no further tokens")]
    NotFound,
}

impl SofError {
    pub fn syntax(location: ErrorLocation, message: impl Into<String>) -> Self {
        SofError::Syntax {
            location,
            message: message.into(),
            args: Vec::new(),
        }
    }

    pub fn name(location: ErrorLocation, identifier: &str) -> Self {
        SofError::Name {
            location,
            message: format!("undefined identifier '{}'", identifier),
            args: vec![identifier.to_string()],
        }
    }

    pub fn stack(location: ErrorLocation, message: impl Into<String>) -> Self {
        SofError::Stack {
            location,
            message: message.into(),
            args: Vec::new(),
        }
    }

    pub fn math(location: ErrorLocation, message: impl Into<String>) -> Self {
        SofError::Math {
            location,
            message: message.into(),
            args: Vec::new(),
        }
    }

    pub fn type_error(location: ErrorLocation, message: impl Into<String>) -> Self {
        SofError::Type {
            location,
            message: message.into(),
            args: Vec::new(),
        }
    }

    pub fn assert(location: ErrorLocation) -> Self {
        SofError::Assert {
            location,
            message: "assertion failed".to_string(),
            args: Vec::new(),
        }
    }

    /// The localizable type-key used to head the user-visible error report.
    pub fn kind_key(&self) -> &'static str {
        match self {
            SofError::Syntax { .. } => "syntax",
            SofError::Type { .. } => "type",
            SofError::Name { .. } => "name",
            SofError::Stack { .. } => "stack",
            SofError::Math { .. } => "math",
            SofError::Assert { .. } => "assert",
            SofError::Io { .. } => "io",
            SofError::Generic { .. } => "generic",
            SofError::NotFound => "generic",
        }
    }

    pub fn location(&self) -> Option<&ErrorLocation> {
        match self {
            SofError::Syntax { location, .. }
            | SofError::Type { location, .. }
            | SofError::Name { location, .. }
            | SofError::Stack { location, .. }
            | SofError::Math { location, .. }
            | SofError::Assert { location, .. }
            | SofError::Io { location, .. }
            | SofError::Generic { location, .. } => Some(location),
            SofError::NotFound => None,
        }
    }

    /// Enriches an [`ErrorLocation::Incomplete`] error with `location`,
    /// leaving already-complete errors untouched. This is the promotion
    /// spec.md §4.6 requires at each interpreter step.
    pub fn complete_with(self, location: SourceLocation) -> Self {
        fn fill(current: ErrorLocation, location: SourceLocation) -> ErrorLocation {
            match current {
                ErrorLocation::Incomplete => ErrorLocation::Complete(location),
                complete => complete,
            }
        }
        match self {
            SofError::Syntax { location: l, message, args } => SofError::Syntax {
                location: fill(l, location),
                message,
                args,
            },
            SofError::Type { location: l, message, args } => SofError::Type {
                location: fill(l, location),
                message,
                args,
            },
            SofError::Name { location: l, message, args } => SofError::Name {
                location: fill(l, location),
                message,
                args,
            },
            SofError::Stack { location: l, message, args } => SofError::Stack {
                location: fill(l, location),
                message,
                args,
            },
            SofError::Math { location: l, message, args } => SofError::Math {
                location: fill(l, location),
                message,
                args,
            },
            SofError::Assert { location: l, message, args } => SofError::Assert {
                location: fill(l, location),
                message,
                args,
            },
            SofError::Io { location: l, message, args } => SofError::Io {
                location: fill(l, location),
                message,
                args,
            },
            SofError::Generic { location: l, message, args } => SofError::Generic {
                location: fill(l, location),
                message,
                args,
            },
            SofError::NotFound => SofError::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::FileTag;

    #[test]
    fn incomplete_error_is_completed() {
        let err = SofError::name(ErrorLocation::Incomplete, "foo");
        let completed = err.complete_with(SourceLocation::new(FileTag::Synthetic("<literal>"), 3));
        match completed.location() {
            Some(ErrorLocation::Complete(loc)) => assert_eq!(loc.offset, 3),
            other => panic!("expected complete location, got {:?}", other),
        }
    }

    #[test]
    fn complete_error_is_not_overwritten() {
        let loc = SourceLocation::new(FileTag::Synthetic("<literal>"), 1);
        let err = SofError::Name {
            location: ErrorLocation::Complete(loc.clone()),
            message: "x".into(),
            args: vec![],
        };
        let completed = err.complete_with(SourceLocation::new(FileTag::Synthetic("<literal>"), 99));
        match completed.location() {
            Some(ErrorLocation::Complete(l)) => assert_eq!(l.offset, 1),
            other => panic!("expected complete location, got {:?}", other),
        }
    }
}

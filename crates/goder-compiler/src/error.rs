//! Transformation errors
//!
//! Every error here is fatal: the transformation stops and no output is
//! produced. Incomplete type-parameter bindings are not errors; they are
//! reported as [`BindingIncomplete`](crate::diagnostic::BindingIncomplete)
//! diagnostics next to the output.

use crate::config::ConfigError;
use goder_parser::{CheckError, ParseError};
use goder_pm::LocateError;
use std::path::PathBuf;
use thiserror::Error;

pub type TransformResult<T> = Result<T, TransformError>;

/// Errors that abort a transformation
#[derive(Debug, Error)]
pub enum TransformError {
    /// The input file does not parse
    #[error("{}", first_message(.errors))]
    ParseError {
        /// Every error the parser reported
        errors: Vec<ParseError>,
    },

    /// The input file does not type-check
    #[error("{}", first_message(.errors))]
    CheckError {
        /// Every error the checker reported
        errors: Vec<CheckError>,
    },

    /// An external package is missing from the module cache, or more than
    /// one cached version matches it
    #[error(transparent)]
    ModuleNotFound(LocateError),

    /// A source file of an external package does not parse
    #[error("{}: {error}", .file.display())]
    ExternalParseError {
        /// Import path of the package
        package: String,
        /// The offending file
        file: PathBuf,
        /// First parse error in that file
        error: ParseError,
    },

    /// Two declarations bound for the output share a name
    #[error("{name} is declared by both {first} and {second}")]
    NameCollision {
        /// The shared name
        name: String,
        /// Where the existing declaration comes from
        first: String,
        /// Where the conflicting declaration comes from
        second: String,
    },

    /// Reading the module cache or a package directory failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// goder.toml could not be read
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Specialization kept producing new declarations
    #[error("generic specialization did not settle after {rounds} rounds (polymorphic recursion?)")]
    SpecializationLimit {
        /// The configured round limit
        rounds: usize,
    },
}

impl TransformError {
    /// Stable name of the error kind, as printed by the command line.
    pub fn kind(&self) -> &'static str {
        match self {
            TransformError::ParseError { .. } => "ParseError",
            TransformError::CheckError { .. } => "CheckError",
            TransformError::ModuleNotFound(_) => "ModuleNotFound",
            TransformError::ExternalParseError { .. } => "ExternalParseError",
            TransformError::NameCollision { .. } => "NameCollision",
            TransformError::Io(_) => "Io",
            TransformError::Config(_) => "Config",
            TransformError::SpecializationLimit { .. } => "SpecializationLimit",
        }
    }
}

impl From<LocateError> for TransformError {
    fn from(error: LocateError) -> Self {
        match error {
            LocateError::IoError(e) => TransformError::Io(e),
            other => TransformError::ModuleNotFound(other),
        }
    }
}

fn first_message<E: std::fmt::Display>(errors: &[E]) -> String {
    match errors {
        [] => "unknown error".to_string(),
        [single] => single.to_string(),
        [first, rest @ ..] => format!("{} (and {} more)", first, rest.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use goder_parser::Span;

    #[test]
    fn test_kind_names() {
        let err = TransformError::SpecializationLimit { rounds: 64 };
        assert_eq!(err.kind(), "SpecializationLimit");
        let err = TransformError::NameCollision {
            name: "Map".to_string(),
            first: "main".to_string(),
            second: "github.com/samber/lo".to_string(),
        };
        assert_eq!(err.kind(), "NameCollision");
        assert_eq!(
            err.to_string(),
            "Map is declared by both main and github.com/samber/lo"
        );
    }

    #[test]
    fn test_locate_errors_map_to_kinds() {
        let not_found = LocateError::NotFound {
            path: "github.com/samber/lo".to_string(),
            cache: PathBuf::from("/go/pkg/mod"),
            hint: "go get \"github.com/samber/lo\"".to_string(),
        };
        let err = TransformError::from(not_found);
        assert_eq!(err.kind(), "ModuleNotFound");
        assert!(err.to_string().contains("$ go get \"github.com/samber/lo\""));

        let io = LocateError::IoError(std::io::Error::other("denied"));
        assert_eq!(TransformError::from(io).kind(), "Io");
    }

    #[test]
    fn test_multiple_check_errors_summarized() {
        let errors = vec![
            CheckError::UndefinedName {
                name: "x".to_string(),
                span: Span::dummy(),
            },
            CheckError::UndefinedName {
                name: "y".to_string(),
                span: Span::dummy(),
            },
        ];
        let err = TransformError::CheckError { errors };
        assert_eq!(err.to_string(), "undefined: x (and 1 more)");
    }
}

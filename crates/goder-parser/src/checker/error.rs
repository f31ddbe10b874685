//! Error types for type checking
//!
//! The checker only reports errors it can be sure about: names that do not
//! resolve anywhere, and top-level names declared twice. Anything it cannot
//! type (members of other packages, unsupported constructs) is recorded as
//! [`Type::Unresolved`](super::Type::Unresolved) instead.

use crate::token::Span;
use thiserror::Error;

/// Errors that can occur during type checking
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CheckError {
    /// Identifier does not resolve in any enclosing scope
    #[error("undefined: {name}")]
    UndefinedName {
        /// Identifier as written
        name: String,
        /// Location of the use
        span: Span,
    },

    /// Two top-level declarations share a name
    #[error("{name} redeclared in this block")]
    DuplicateDeclaration {
        /// Declared name (`Recv.Method` for methods)
        name: String,
        /// Location of the first declaration
        original: Span,
        /// Location of the second declaration
        duplicate: Span,
    },
}

impl CheckError {
    /// Primary location of the error.
    pub fn span(&self) -> Span {
        match self {
            CheckError::UndefinedName { span, .. } => *span,
            CheckError::DuplicateDeclaration { duplicate, .. } => *duplicate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_follow_go_wording() {
        let err = CheckError::UndefinedName {
            name: "foo".to_string(),
            span: Span::new(4, 7, 2, 5),
        };
        assert_eq!(err.to_string(), "undefined: foo");
        assert_eq!(err.span().line, 2);

        let dup = CheckError::DuplicateDeclaration {
            name: "Max".to_string(),
            original: Span::new(0, 3, 1, 1),
            duplicate: Span::new(20, 23, 5, 1),
        };
        assert_eq!(dup.to_string(), "Max redeclared in this block");
        assert_eq!(dup.span().line, 5);
    }
}

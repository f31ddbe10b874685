//! Parse error types and error reporting

use crate::lexer::LexError;
use crate::token::{Span, Token};
use std::fmt;

/// A parse error with location and contextual information.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// The kind of error that occurred
    pub kind: ParseErrorKind,

    /// Source location of the error
    pub span: Span,

    /// Human-readable error message
    pub message: String,

    /// Optional suggestion for fixing the error
    pub suggestion: Option<String>,
}

/// The kind of parse error.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    /// Unexpected token found
    UnexpectedToken { expected: Vec<Token>, found: Token },

    /// Unexpected end of file
    UnexpectedEof { expected: Vec<Token> },

    /// Invalid syntax
    InvalidSyntax { reason: String },

    /// The lexer rejected the input
    Lexical(LexError),

    /// Expression used where a type is required
    ExpectedType,

    /// Parser got stuck (position didn't advance)
    ParserStuck { message: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}",
            self.span.line, self.span.column, self.message
        )?;

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  Suggestion: {}", suggestion)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl ParseError {
    /// Create an "unexpected token" error.
    pub fn unexpected_token(expected: Vec<Token>, found: Token, span: Span) -> Self {
        let message = match expected.as_slice() {
            [] => format!("unexpected {}", describe(&found)),
            [single] => format!("expected {}, found {}", describe(single), describe(&found)),
            many => {
                let names: Vec<String> = many.iter().map(describe).collect();
                format!(
                    "expected one of {}, found {}",
                    names.join(", "),
                    describe(&found)
                )
            }
        };

        Self {
            kind: ParseErrorKind::UnexpectedToken { expected, found },
            span,
            message,
            suggestion: None,
        }
    }

    /// Create an "unexpected EOF" error.
    pub fn unexpected_eof(expected: Vec<Token>, span: Span) -> Self {
        let message = match expected.first() {
            Some(tok) => format!("unexpected end of file, expected {}", describe(tok)),
            None => "unexpected end of file".to_string(),
        };

        Self {
            kind: ParseErrorKind::UnexpectedEof { expected },
            span,
            message,
            suggestion: None,
        }
    }

    /// Create an "invalid syntax" error.
    pub fn invalid_syntax(reason: impl Into<String>, span: Span) -> Self {
        let reason = reason.into();
        Self {
            kind: ParseErrorKind::InvalidSyntax {
                reason: reason.clone(),
            },
            span,
            message: reason,
            suggestion: None,
        }
    }

    /// Create an "expected type" error.
    pub fn expected_type(span: Span) -> Self {
        Self {
            kind: ParseErrorKind::ExpectedType,
            span,
            message: "expected type".to_string(),
            suggestion: None,
        }
    }

    /// Create a "parser stuck" error.
    pub fn parser_stuck(message: impl Into<String>, span: Span) -> Self {
        let message = message.into();
        Self {
            kind: ParseErrorKind::ParserStuck {
                message: message.clone(),
            },
            span,
            message: format!("parser stuck: {}", message),
            suggestion: None,
        }
    }

    /// Add a suggestion to this error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        Self {
            span: *err.span(),
            message: err.description(),
            suggestion: err.hint(),
            kind: ParseErrorKind::Lexical(err),
        }
    }
}

fn describe(tok: &Token) -> String {
    match tok {
        Token::Identifier(_) => "identifier".to_string(),
        Token::IntLiteral(_) | Token::FloatLiteral(_) => "number".to_string(),
        Token::StringLiteral(_) => "string literal".to_string(),
        Token::RuneLiteral(_) => "rune literal".to_string(),
        Token::Semicolon => "newline or ';'".to_string(),
        Token::Eof => "end of file".to_string(),
        other => format!("'{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_token_message() {
        let err = ParseError::unexpected_token(
            vec![Token::RightParen],
            Token::Identifier("x".to_string()),
            Span::new(4, 5, 1, 5),
        );
        assert_eq!(err.message, "expected ')', found identifier");
        assert_eq!(err.to_string(), "1:5: expected ')', found identifier");
    }

    #[test]
    fn test_lex_error_conversion_keeps_hint() {
        let lex = LexError::UnterminatedString {
            span: Span::new(0, 3, 2, 1),
        };
        let err = ParseError::from(lex);
        assert!(matches!(err.kind, ParseErrorKind::Lexical(_)));
        assert_eq!(err.span.line, 2);
        assert!(err.suggestion.is_some());
    }
}

//! Goder Parser
//!
//! Lexer, parser and type checker for the Go files goder transforms.
//!
//! ```rust
//! let file = goder_parser::parse("package main\n\nfunc main() {}\n").unwrap();
//! let info = goder_parser::checker::check(&file).unwrap();
//! assert_eq!(file.decls.len(), 1);
//! assert!(info.is_empty());
//! ```

pub mod ast;
pub mod checker;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::SourceFile;
pub use checker::{check, check_lenient, CheckError, Type, TypeInfo};
pub use lexer::{LexError, Lexer};
pub use parser::{parse_type_text, ParseError, ParseErrorKind, Parser};
pub use token::{Span, Token};

/// Parse a complete source file. Lexical errors are reported as
/// [`ParseError`]s.
pub fn parse(source: &str) -> Result<SourceFile, Vec<ParseError>> {
    let parser = Parser::new(source)
        .map_err(|errors| errors.into_iter().map(ParseError::from).collect::<Vec<_>>())?;
    parser.parse()
}

//! Error recovery strategies for the parser.
//!
//! When the parser encounters an error, it uses these strategies to
//! resynchronize and continue parsing to find more errors.

use super::Parser;
use crate::token::Token;

/// Skip to the next top-level declaration keyword.
pub fn sync_to_declaration(parser: &mut Parser) {
    while !parser.at_eof() {
        if matches!(
            parser.current(),
            Token::Func | Token::Type | Token::Var | Token::Const | Token::Import
        ) && parser.at_line_start()
        {
            return;
        }
        parser.advance();
    }
}

/// Synchronize to the next statement boundary inside a block.
pub fn sync_to_statement_boundary(parser: &mut Parser) {
    let mut depth = 0usize;
    while !parser.at_eof() {
        match parser.current() {
            Token::LeftBrace | Token::LeftParen | Token::LeftBracket => depth += 1,
            Token::RightParen | Token::RightBracket => depth = depth.saturating_sub(1),
            Token::RightBrace if depth == 0 => return,
            Token::RightBrace => depth -= 1,
            Token::Semicolon if depth == 0 => {
                parser.advance();
                return;
            }
            _ => {}
        }
        parser.advance();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_to_declaration() {
        let source = "package main\nbogus tokens here\nfunc main() {}\n";
        let mut parser = Parser::new(source).unwrap();
        parser.advance(); // package
        parser.advance(); // main
        parser.advance(); // ;
        sync_to_declaration(&mut parser);
        assert!(matches!(parser.current(), Token::Func));
    }

    #[test]
    fn test_sync_skips_nested_braces() {
        let source = "x := T{a: {1}}; y";
        let mut parser = Parser::new(source).unwrap();
        sync_to_statement_boundary(&mut parser);
        assert!(matches!(parser.current(), Token::Identifier(ref n) if n == "y"));
    }
}

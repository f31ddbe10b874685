//! Parser for Go source files
//!
//! This module implements a recursive descent parser that transforms
//! a token stream from the lexer into an Abstract Syntax Tree (AST).
//! Declarations are parsed here; types, expressions and statements live in
//! the submodules.

pub mod error;
pub mod expr;
pub mod recovery;
pub mod stmt;
pub mod types;

use crate::ast::*;
use crate::lexer::Lexer;
use crate::token::{Span, Token};

pub use error::{ParseError, ParseErrorKind};
pub use types::{expr_to_type, parse_type_text};

/// Parser state.
///
/// A recursive descent parser with arbitrary lookahead over the
/// pre-tokenized input.
pub struct Parser {
    /// Pre-tokenized input
    tokens: Vec<(Token, Span)>,

    /// Current position in token stream
    pos: usize,

    /// Accumulated parse errors (allows continuing after errors)
    errors: Vec<ParseError>,

    /// Nesting level of parentheses; composite literals are not allowed
    /// at level -1 (the header of `if`, `for` and `switch`).
    expr_level: i32,
}

impl Parser {
    /// Create a new parser from source code.
    pub fn new(source: &str) -> Result<Self, Vec<crate::lexer::LexError>> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
            expr_level: 0,
        })
    }

    /// Parse an entire source file.
    ///
    /// Returns the file on success, or all accumulated errors on failure.
    pub fn parse(mut self) -> Result<SourceFile, Vec<ParseError>> {
        let start_span = self.current_span();
        self.skip_semicolons();

        let package = match self.parse_package_clause() {
            Ok(ident) => ident,
            Err(err) => return Err(vec![err]),
        };

        let mut imports = Vec::new();
        while self.check(&Token::Import) {
            match self.parse_import_decl() {
                Ok(specs) => imports.extend(specs),
                Err(err) => {
                    self.errors.push(err);
                    recovery::sync_to_declaration(&mut self);
                }
            }
        }

        let mut decls = Vec::new();
        while !self.at_eof() {
            let before = self.pos;
            match self.parse_top_level_decl() {
                Ok(mut parsed) => decls.append(&mut parsed),
                Err(err) => {
                    self.errors.push(err);
                    recovery::sync_to_declaration(&mut self);
                }
            }
            if self.pos == before && !self.at_eof() {
                self.errors.push(ParseError::parser_stuck(
                    "no progress at top level",
                    self.current_span(),
                ));
                self.advance();
            }
        }

        if !self.errors.is_empty() {
            return Err(self.errors);
        }

        let span = self.combine_spans(&start_span, &self.current_span());
        Ok(SourceFile {
            package,
            imports,
            decls,
            span,
        })
    }

    // ========================================================================
    // Token Management
    // ========================================================================

    /// Get the current token.
    #[inline]
    pub fn current(&self) -> &Token {
        &self.tokens[self.pos].0
    }

    /// Get the current token's span.
    #[inline]
    pub fn current_span(&self) -> Span {
        self.tokens[self.pos].1
    }

    /// Peek at the next token (lookahead).
    #[inline]
    pub fn peek(&self) -> Option<&Token> {
        self.peek_nth(1)
    }

    /// Peek `n` tokens ahead of the current one.
    #[inline]
    pub fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|(tok, _)| tok)
    }

    /// Span of the most recently consumed token.
    pub fn previous_span(&self) -> Span {
        if self.pos == 0 {
            self.current_span()
        } else {
            self.tokens[self.pos - 1].1
        }
    }

    /// Advance to the next token, returning the previous current token.
    pub fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].0.clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    /// Check if the current token matches the given kind.
    #[inline]
    pub fn check(&self, expected: &Token) -> bool {
        std::mem::discriminant(self.current()) == std::mem::discriminant(expected)
    }

    /// Check if the current token matches any of the given kinds.
    pub fn check_any(&self, expected: &[Token]) -> bool {
        expected.iter().any(|tok| self.check(tok))
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Check if we've reached EOF.
    #[inline]
    pub fn at_eof(&self) -> bool {
        matches!(self.current(), Token::Eof)
    }

    /// True if the current token is the first on its line.
    pub fn at_line_start(&self) -> bool {
        self.pos == 0 || matches!(self.tokens[self.pos - 1].0, Token::Semicolon)
    }

    /// Consume the current token if it matches the expected kind.
    pub fn expect(&mut self, expected: Token) -> Result<Token, ParseError> {
        if self.check(&expected) {
            Ok(self.advance())
        } else {
            Err(self.unexpected_token(&[expected]))
        }
    }

    /// Consume an identifier.
    pub fn expect_ident(&mut self) -> Result<Ident, ParseError> {
        let span = self.current_span();
        match self.current() {
            Token::Identifier(name) => {
                let ident = Ident::new(name.clone(), span);
                self.advance();
                Ok(ident)
            }
            _ => Err(self.unexpected_token(&[Token::Identifier(String::new())])),
        }
    }

    /// Consume a statement terminator.
    ///
    /// The terminator may be omitted before a closing `)` or `}`.
    pub fn expect_semicolon(&mut self) -> Result<(), ParseError> {
        match self.current() {
            Token::Semicolon => {
                self.advance();
                Ok(())
            }
            Token::RightParen | Token::RightBrace | Token::Eof => Ok(()),
            _ => Err(self.unexpected_token(&[Token::Semicolon])),
        }
    }

    pub fn skip_semicolons(&mut self) {
        while self.check(&Token::Semicolon) {
            self.advance();
        }
    }

    // ========================================================================
    // Error Handling
    // ========================================================================

    /// Record a parse error without aborting.
    pub fn record(&mut self, err: ParseError) {
        self.errors.push(err);
    }

    /// Create an "unexpected token" error.
    pub fn unexpected_token(&self, expected: &[Token]) -> ParseError {
        let span = self.current_span();
        if self.at_eof() {
            ParseError::unexpected_eof(expected.to_vec(), span)
        } else {
            ParseError::unexpected_token(expected.to_vec(), self.current().clone(), span)
        }
    }

    // ========================================================================
    // Utilities
    // ========================================================================

    /// Combine two spans into a single span.
    pub fn combine_spans(&self, start: &Span, end: &Span) -> Span {
        Span {
            start: start.start,
            end: end.end.max(start.start),
            line: start.line,
            column: start.column,
        }
    }

    /// Span from `start` to the end of the last consumed token.
    pub fn span_from(&self, start: &Span) -> Span {
        self.combine_spans(start, &self.previous_span())
    }

    /// Run `f` with composite literals allowed again (inside brackets).
    pub fn with_nesting<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.expr_level;
        self.expr_level = self.expr_level.max(0) + 1;
        let result = f(self);
        self.expr_level = saved;
        result
    }

    /// Run `f` in a control clause header where `T{` is not a literal.
    pub fn in_control_clause<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.expr_level;
        self.expr_level = -1;
        let result = f(self);
        self.expr_level = saved;
        result
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn parse_package_clause(&mut self) -> Result<Ident, ParseError> {
        self.expect(Token::Package).map_err(|e| {
            e.with_suggestion("a Go source file starts with `package <name>`")
        })?;
        let name = self.expect_ident()?;
        self.expect_semicolon()?;
        Ok(name)
    }

    fn parse_import_decl(&mut self) -> Result<Vec<ImportSpec>, ParseError> {
        self.expect(Token::Import)?;
        let mut specs = Vec::new();
        if self.eat(&Token::LeftParen) {
            self.skip_semicolons();
            while !self.check(&Token::RightParen) && !self.at_eof() {
                specs.push(self.parse_import_spec()?);
                self.expect_semicolon()?;
            }
            self.expect(Token::RightParen)?;
        } else {
            specs.push(self.parse_import_spec()?);
        }
        self.expect_semicolon()?;
        Ok(specs)
    }

    fn parse_import_spec(&mut self) -> Result<ImportSpec, ParseError> {
        let start = self.current_span();
        let name = match self.current() {
            Token::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Some(name)
            }
            Token::Dot => {
                self.advance();
                Some(".".to_string())
            }
            _ => None,
        };
        let path = match self.current() {
            Token::StringLiteral(lit) => unquote(lit),
            _ => return Err(self.unexpected_token(&[Token::StringLiteral(String::new())])),
        };
        self.advance();
        Ok(ImportSpec {
            name,
            path,
            span: self.span_from(&start),
        })
    }

    /// Parse one top-level declaration.
    ///
    /// Parenthesized `type` groups are split into one declaration per spec.
    pub fn parse_top_level_decl(&mut self) -> Result<Vec<Decl>, ParseError> {
        let decls = match self.current() {
            Token::Func => vec![Decl::Func(self.parse_func_decl()?)],
            Token::Type | Token::Var | Token::Const => self.parse_decl()?,
            Token::Import => {
                return Err(ParseError::invalid_syntax(
                    "imports must appear before other declarations",
                    self.current_span(),
                ))
            }
            _ => {
                return Err(self
                    .unexpected_token(&[Token::Func, Token::Type, Token::Var, Token::Const])
                    .with_suggestion("expected a declaration"))
            }
        };
        self.expect_semicolon()?;
        self.skip_semicolons();
        Ok(decls)
    }

    /// Parse a `type`, `var` or `const` declaration.
    pub fn parse_decl(&mut self) -> Result<Vec<Decl>, ParseError> {
        let start = self.current_span();
        let keyword = self.advance();
        let grouped = self.eat(&Token::LeftParen);

        if matches!(keyword, Token::Type) {
            let mut specs = Vec::new();
            if grouped {
                self.skip_semicolons();
                while !self.check(&Token::RightParen) && !self.at_eof() {
                    specs.push(Decl::Type(self.parse_type_spec()?));
                    self.expect_semicolon()?;
                }
                self.expect(Token::RightParen)?;
            } else {
                specs.push(Decl::Type(self.parse_type_spec()?));
            }
            return Ok(specs);
        }

        let is_const = matches!(keyword, Token::Const);
        let mut specs = Vec::new();
        if grouped {
            self.skip_semicolons();
            while !self.check(&Token::RightParen) && !self.at_eof() {
                specs.push(self.parse_value_spec(is_const)?);
                self.expect_semicolon()?;
            }
            self.expect(Token::RightParen)?;
        } else {
            specs.push(self.parse_value_spec(is_const)?);
        }
        let group = ValueDecl {
            specs,
            grouped,
            span: self.span_from(&start),
        };
        Ok(vec![if is_const {
            Decl::Const(group)
        } else {
            Decl::Var(group)
        }])
    }

    fn parse_type_spec(&mut self) -> Result<TypeSpec, ParseError> {
        let start = self.current_span();
        let name = self.expect_ident()?;
        let type_params = if self.check(&Token::LeftBracket) && self.looks_like_type_params() {
            self.parse_type_params()?
        } else {
            Vec::new()
        };
        let alias = self.eat(&Token::Equal);
        let ty = self.parse_type()?;
        Ok(TypeSpec {
            name,
            type_params,
            alias,
            ty,
            span: self.span_from(&start),
        })
    }

    /// Distinguish `type A[T any] ...` from the array type `type A [N]int`.
    fn looks_like_type_params(&self) -> bool {
        matches!(self.peek(), Some(Token::Identifier(_)))
            && matches!(
                self.peek_nth(2),
                Some(
                    Token::Identifier(_)
                        | Token::Tilde
                        | Token::Comma
                        | Token::Interface
                        | Token::LeftBracket
                        | Token::Func
                        | Token::Map
                        | Token::Chan
                        | Token::Struct
                )
            )
    }

    fn parse_value_spec(&mut self, is_const: bool) -> Result<ValueSpec, ParseError> {
        let start = self.current_span();
        let mut names = vec![self.expect_ident()?];
        while self.eat(&Token::Comma) {
            names.push(self.expect_ident()?);
        }
        let ty = if !self.check_any(&[Token::Equal, Token::Semicolon, Token::RightParen]) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let values = if self.eat(&Token::Equal) {
            self.parse_expr_list()?
        } else {
            Vec::new()
        };
        if !is_const && ty.is_none() && values.is_empty() {
            return Err(ParseError::invalid_syntax(
                "missing variable type or initialization",
                self.span_from(&start),
            ));
        }
        Ok(ValueSpec {
            names,
            ty,
            values,
            span: self.span_from(&start),
        })
    }

    fn parse_func_decl(&mut self) -> Result<FuncDecl, ParseError> {
        let start = self.current_span();
        self.expect(Token::Func)?;

        let recv = if self.check(&Token::LeftParen) {
            Some(self.parse_receiver()?)
        } else {
            None
        };

        let name = self.expect_ident()?;
        let type_params = if self.check(&Token::LeftBracket) {
            self.parse_type_params()?
        } else {
            Vec::new()
        };
        let sig = self.parse_signature()?;
        let body = if self.check(&Token::LeftBrace) {
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(FuncDecl {
            recv,
            name,
            type_params,
            sig,
            body,
            span: self.span_from(&start),
        })
    }

    fn parse_receiver(&mut self) -> Result<Receiver, ParseError> {
        let start = self.current_span();
        self.expect(Token::LeftParen)?;
        let name = match (self.current(), self.peek()) {
            (
                Token::Identifier(_),
                Some(Token::Identifier(_) | Token::Star | Token::LeftParen),
            ) => Some(self.expect_ident()?),
            _ => None,
        };
        let ty = self.parse_type()?;
        self.eat(&Token::Comma);
        self.expect(Token::RightParen)?;
        Ok(Receiver {
            name,
            ty,
            span: self.span_from(&start),
        })
    }

    /// Parse `[K comparable, V any]`.
    pub fn parse_type_params(&mut self) -> Result<Vec<TypeParam>, ParseError> {
        self.expect(Token::LeftBracket)?;
        let mut params = Vec::new();
        while !self.check(&Token::RightBracket) {
            let mut names = vec![self.expect_ident()?];
            while self.eat(&Token::Comma) {
                names.push(self.expect_ident()?);
            }
            let constraint = self.parse_constraint()?;
            params.push(TypeParam { names, constraint });
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::RightBracket)?;
        Ok(params)
    }
}

/// Strip the quotes from an interpreted or raw string literal.
///
/// Import paths are plain ASCII, so escape sequences are kept as written.
pub fn unquote(lit: &str) -> String {
    if lit.len() >= 2 {
        lit[1..lit.len() - 1].to_string()
    } else {
        lit.to_string()
    }
}

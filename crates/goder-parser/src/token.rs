//! Token definitions for Go source.
//!
//! This module defines all tokens that can appear in the Go subset goder
//! transforms, including keywords, operators, literals, and special tokens.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A token of Go source text.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords (all 25)
    Break,
    Case,
    Chan,
    Const,
    Continue,
    Default,
    Defer,
    Else,
    Fallthrough,
    For,
    Func,
    Go,
    Goto,
    If,
    Import,
    Interface,
    Map,
    Package,
    Range,
    Return,
    Select,
    Struct,
    Switch,
    Type,
    Var,

    // Literals, kept verbatim so the printer can reproduce them
    IntLiteral(String),
    FloatLiteral(String),
    RuneLiteral(String),
    StringLiteral(String),

    // Identifiers
    Identifier(String),

    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // Bitwise
    Amp,
    Pipe,
    Caret,
    LessLess,
    GreaterGreater,
    AmpCaret,

    // Assignment
    Equal,
    ColonEqual,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    PercentEqual,
    AmpEqual,
    PipeEqual,
    CaretEqual,
    LessLessEqual,
    GreaterGreaterEqual,
    AmpCaretEqual,

    // Logical and comparison
    AmpAmp,
    PipePipe,
    EqualEqual,
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Bang,

    // Other
    Arrow, // <-
    PlusPlus,
    MinusMinus,
    Tilde,
    DotDotDot,
    Dot,
    Colon,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Semicolon,
    Comma,

    // Special
    Eof,
}

/// Source location information for a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// A span that points nowhere, used for synthesized nodes.
    pub fn dummy() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line: self.line.min(other.line),
            column: if self.line <= other.line {
                self.column
            } else {
                other.column
            },
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Break => write!(f, "break"),
            Token::Case => write!(f, "case"),
            Token::Chan => write!(f, "chan"),
            Token::Const => write!(f, "const"),
            Token::Continue => write!(f, "continue"),
            Token::Default => write!(f, "default"),
            Token::Defer => write!(f, "defer"),
            Token::Else => write!(f, "else"),
            Token::Fallthrough => write!(f, "fallthrough"),
            Token::For => write!(f, "for"),
            Token::Func => write!(f, "func"),
            Token::Go => write!(f, "go"),
            Token::Goto => write!(f, "goto"),
            Token::If => write!(f, "if"),
            Token::Import => write!(f, "import"),
            Token::Interface => write!(f, "interface"),
            Token::Map => write!(f, "map"),
            Token::Package => write!(f, "package"),
            Token::Range => write!(f, "range"),
            Token::Return => write!(f, "return"),
            Token::Select => write!(f, "select"),
            Token::Struct => write!(f, "struct"),
            Token::Switch => write!(f, "switch"),
            Token::Type => write!(f, "type"),
            Token::Var => write!(f, "var"),
            Token::IntLiteral(s)
            | Token::FloatLiteral(s)
            | Token::RuneLiteral(s)
            | Token::StringLiteral(s) => write!(f, "{}", s),
            Token::Identifier(name) => write!(f, "{}", name),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Amp => write!(f, "&"),
            Token::Pipe => write!(f, "|"),
            Token::Caret => write!(f, "^"),
            Token::LessLess => write!(f, "<<"),
            Token::GreaterGreater => write!(f, ">>"),
            Token::AmpCaret => write!(f, "&^"),
            Token::Equal => write!(f, "="),
            Token::ColonEqual => write!(f, ":="),
            Token::PlusEqual => write!(f, "+="),
            Token::MinusEqual => write!(f, "-="),
            Token::StarEqual => write!(f, "*="),
            Token::SlashEqual => write!(f, "/="),
            Token::PercentEqual => write!(f, "%="),
            Token::AmpEqual => write!(f, "&="),
            Token::PipeEqual => write!(f, "|="),
            Token::CaretEqual => write!(f, "^="),
            Token::LessLessEqual => write!(f, "<<="),
            Token::GreaterGreaterEqual => write!(f, ">>="),
            Token::AmpCaretEqual => write!(f, "&^="),
            Token::AmpAmp => write!(f, "&&"),
            Token::PipePipe => write!(f, "||"),
            Token::EqualEqual => write!(f, "=="),
            Token::BangEqual => write!(f, "!="),
            Token::Less => write!(f, "<"),
            Token::LessEqual => write!(f, "<="),
            Token::Greater => write!(f, ">"),
            Token::GreaterEqual => write!(f, ">="),
            Token::Bang => write!(f, "!"),
            Token::Arrow => write!(f, "<-"),
            Token::PlusPlus => write!(f, "++"),
            Token::MinusMinus => write!(f, "--"),
            Token::Tilde => write!(f, "~"),
            Token::DotDotDot => write!(f, "..."),
            Token::Dot => write!(f, "."),
            Token::Colon => write!(f, ":"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::Semicolon => write!(f, ";"),
            Token::Comma => write!(f, ","),
            Token::Eof => write!(f, "EOF"),
        }
    }
}

impl Token {
    /// Returns true if this token is a keyword.
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Token::Break
                | Token::Case
                | Token::Chan
                | Token::Const
                | Token::Continue
                | Token::Default
                | Token::Defer
                | Token::Else
                | Token::Fallthrough
                | Token::For
                | Token::Func
                | Token::Go
                | Token::Goto
                | Token::If
                | Token::Import
                | Token::Interface
                | Token::Map
                | Token::Package
                | Token::Range
                | Token::Return
                | Token::Select
                | Token::Struct
                | Token::Switch
                | Token::Type
                | Token::Var
        )
    }

    /// Returns true if this token is a literal.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Token::IntLiteral(_)
                | Token::FloatLiteral(_)
                | Token::RuneLiteral(_)
                | Token::StringLiteral(_)
        )
    }

    /// Returns true if a newline after this token ends the statement.
    ///
    /// This is Go's automatic semicolon insertion rule.
    pub fn ends_statement(&self) -> bool {
        matches!(
            self,
            Token::Identifier(_)
                | Token::IntLiteral(_)
                | Token::FloatLiteral(_)
                | Token::RuneLiteral(_)
                | Token::StringLiteral(_)
                | Token::Break
                | Token::Continue
                | Token::Fallthrough
                | Token::Return
                | Token::PlusPlus
                | Token::MinusMinus
                | Token::RightParen
                | Token::RightBracket
                | Token::RightBrace
        )
    }

    /// Returns true if this token is an assignment operator (`=`, `+=`, ...).
    pub fn is_assign_op(&self) -> bool {
        matches!(
            self,
            Token::Equal
                | Token::ColonEqual
                | Token::PlusEqual
                | Token::MinusEqual
                | Token::StarEqual
                | Token::SlashEqual
                | Token::PercentEqual
                | Token::AmpEqual
                | Token::PipeEqual
                | Token::CaretEqual
                | Token::LessLessEqual
                | Token::GreaterGreaterEqual
                | Token::AmpCaretEqual
        )
    }
}

//! Lexer for Go source text.
//!
//! Tokens are recognised with logos. Whitespace and comments are skipped by
//! hand before each token so that Go's automatic semicolon insertion can be
//! applied: a newline that follows a statement-ending token becomes a `;`.

use crate::token::{Span, Token};
use logos::Logos;

/// Logos-based token enum for lexing.
///
/// This enum is used internally by logos for efficient tokenization.
/// It's converted to our main Token enum after lexing.
#[derive(Logos, Debug, Clone, PartialEq)]
enum LogosToken {
    #[regex(r"[ \t\r\n]+", logos::skip)]
    Whitespace,

    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    #[token("break")]
    Break,
    #[token("case")]
    Case,
    #[token("chan")]
    Chan,
    #[token("const")]
    Const,
    #[token("continue")]
    Continue,
    #[token("default")]
    Default,
    #[token("defer")]
    Defer,
    #[token("else")]
    Else,
    #[token("fallthrough")]
    Fallthrough,
    #[token("for")]
    For,
    #[token("func")]
    Func,
    #[token("go")]
    Go,
    #[token("goto")]
    Goto,
    #[token("if")]
    If,
    #[token("import")]
    Import,
    #[token("interface")]
    Interface,
    #[token("map")]
    Map,
    #[token("package")]
    Package,
    #[token("range")]
    Range,
    #[token("return")]
    Return,
    #[token("select")]
    Select,
    #[token("struct")]
    Struct,
    #[token("switch")]
    Switch,
    #[token("type")]
    Type,
    #[token("var")]
    Var,

    // Numbers keep their spelling
    #[regex(r"0[xX][0-9a-fA-F_]+")]
    #[regex(r"0[bB][01_]+")]
    #[regex(r"0[oO][0-7_]+")]
    #[regex(r"[0-9][0-9_]*")]
    Int,

    #[regex(r"[0-9][0-9_]*\.[0-9_]*([eE][+-]?[0-9_]+)?")]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9_]+)?")]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9_]+")]
    Float,

    #[regex(r"[0-9][0-9_]*(\.[0-9_]*)?i")]
    Imaginary,

    #[regex(r"'(\\[^\n]|[^'\\\n])*'")]
    Rune,

    #[regex(r#""(\\[^\n]|[^"\\\n])*""#)]
    #[regex(r"`[^`]*`")]
    String,

    #[regex(r#""(\\[^\n]|[^"\\\n])*"#)]
    #[regex(r"`[^`]*")]
    UnterminatedString,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Identifier,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("<<")]
    LessLess,
    #[token(">>")]
    GreaterGreater,
    #[token("&^")]
    AmpCaret,
    #[token("=")]
    Equal,
    #[token(":=")]
    ColonEqual,
    #[token("+=")]
    PlusEqual,
    #[token("-=")]
    MinusEqual,
    #[token("*=")]
    StarEqual,
    #[token("/=")]
    SlashEqual,
    #[token("%=")]
    PercentEqual,
    #[token("&=")]
    AmpEqual,
    #[token("|=")]
    PipeEqual,
    #[token("^=")]
    CaretEqual,
    #[token("<<=")]
    LessLessEqual,
    #[token(">>=")]
    GreaterGreaterEqual,
    #[token("&^=")]
    AmpCaretEqual,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("==")]
    EqualEqual,
    #[token("!=")]
    BangEqual,
    #[token("<")]
    Less,
    #[token("<=")]
    LessEqual,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterEqual,
    #[token("!")]
    Bang,
    #[token("<-")]
    Arrow,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("~")]
    Tilde,
    #[token("...")]
    DotDotDot,
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
}

/// Main lexer structure.
pub struct Lexer<'a> {
    source: &'a str,
    tokens: Vec<(Token, Span)>,
    errors: Vec<LexError>,
}

/// Lexer error types.
#[derive(Debug, Clone, PartialEq)]
pub enum LexError {
    UnexpectedCharacter { char: char, span: Span },
    UnterminatedString { span: Span },
    UnterminatedComment { span: Span },
    InvalidNumber { text: String, span: Span },
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Format all errors with source context
    pub fn format_errors(errors: &[LexError], source: &str) -> String {
        errors
            .iter()
            .map(|e| e.format_with_source(source))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn tokenize(mut self) -> Result<Vec<(Token, Span)>, Vec<LexError>> {
        let mut pos = 0;
        let mut line = 1u32;
        let mut column = 1u32;
        let bytes = self.source.as_bytes();

        loop {
            // Skip whitespace and comments by hand; a newline seen here may
            // terminate the previous statement.
            while pos < bytes.len() {
                match bytes[pos] {
                    b' ' | b'\t' | b'\r' => {
                        column += 1;
                        pos += 1;
                    }
                    b'\n' => {
                        self.insert_semicolon(Span::new(pos, pos + 1, line, column));
                        line += 1;
                        column = 1;
                        pos += 1;
                    }
                    b'/' if pos + 1 < bytes.len() && bytes[pos + 1] == b'/' => {
                        while pos < bytes.len() && bytes[pos] != b'\n' {
                            pos += 1;
                            column += 1;
                        }
                    }
                    b'/' if pos + 1 < bytes.len() && bytes[pos + 1] == b'*' => {
                        let start = Span::new(pos, pos + 2, line, column);
                        let mut saw_newline = false;
                        let mut closed = false;
                        pos += 2;
                        column += 2;
                        while pos < bytes.len() {
                            if bytes[pos] == b'*' && pos + 1 < bytes.len() && bytes[pos + 1] == b'/'
                            {
                                pos += 2;
                                column += 2;
                                closed = true;
                                break;
                            }
                            if bytes[pos] == b'\n' {
                                saw_newline = true;
                                line += 1;
                                column = 1;
                            } else {
                                column += 1;
                            }
                            pos += 1;
                        }
                        if !closed {
                            self.errors.push(LexError::UnterminatedComment { span: start });
                        }
                        if saw_newline {
                            self.insert_semicolon(start);
                        }
                    }
                    _ => break,
                }
            }

            if pos >= bytes.len() {
                break;
            }

            let mut logos_lexer = LogosToken::lexer(&self.source[pos..]);
            let Some(token_result) = logos_lexer.next() else {
                break;
            };
            let range = logos_lexer.span();
            let abs_start = pos + range.start;
            let abs_end = pos + range.end;
            let span = Span::new(abs_start, abs_end, line, column);
            let text = &self.source[abs_start..abs_end];

            match token_result {
                Ok(LogosToken::Imaginary) => {
                    self.errors.push(LexError::InvalidNumber {
                        text: text.to_string(),
                        span,
                    });
                }
                Ok(LogosToken::UnterminatedString) => {
                    self.errors.push(LexError::UnterminatedString { span });
                }
                Ok(logos_token) => {
                    let token = convert_token(logos_token, text);
                    self.tokens.push((token, span));
                }
                Err(_) => {
                    let char = self.source[abs_start..].chars().next().unwrap_or('\0');
                    self.errors.push(LexError::UnexpectedCharacter { char, span });
                }
            }

            for c in text.chars() {
                if c == '\n' {
                    line += 1;
                    column = 1;
                } else {
                    column += 1;
                }
            }

            // Always make progress, even on an error with an empty match.
            pos = abs_end.max(pos + 1);
        }

        let eof_span = Span::new(self.source.len(), self.source.len(), line, column);
        self.insert_semicolon(eof_span);
        self.tokens.push((Token::Eof, eof_span));

        if self.errors.is_empty() {
            Ok(self.tokens)
        } else {
            Err(self.errors)
        }
    }

    fn insert_semicolon(&mut self, span: Span) {
        if let Some((last, _)) = self.tokens.last() {
            if last.ends_statement() {
                self.tokens.push((Token::Semicolon, span));
            }
        }
    }
}

fn convert_token(logos_token: LogosToken, text: &str) -> Token {
    match logos_token {
        LogosToken::Break => Token::Break,
        LogosToken::Case => Token::Case,
        LogosToken::Chan => Token::Chan,
        LogosToken::Const => Token::Const,
        LogosToken::Continue => Token::Continue,
        LogosToken::Default => Token::Default,
        LogosToken::Defer => Token::Defer,
        LogosToken::Else => Token::Else,
        LogosToken::Fallthrough => Token::Fallthrough,
        LogosToken::For => Token::For,
        LogosToken::Func => Token::Func,
        LogosToken::Go => Token::Go,
        LogosToken::Goto => Token::Goto,
        LogosToken::If => Token::If,
        LogosToken::Import => Token::Import,
        LogosToken::Interface => Token::Interface,
        LogosToken::Map => Token::Map,
        LogosToken::Package => Token::Package,
        LogosToken::Range => Token::Range,
        LogosToken::Return => Token::Return,
        LogosToken::Select => Token::Select,
        LogosToken::Struct => Token::Struct,
        LogosToken::Switch => Token::Switch,
        LogosToken::Type => Token::Type,
        LogosToken::Var => Token::Var,
        LogosToken::Int => Token::IntLiteral(text.to_string()),
        LogosToken::Float => Token::FloatLiteral(text.to_string()),
        LogosToken::Rune => Token::RuneLiteral(text.to_string()),
        LogosToken::String => Token::StringLiteral(text.to_string()),
        LogosToken::Identifier => Token::Identifier(text.to_string()),
        LogosToken::Plus => Token::Plus,
        LogosToken::Minus => Token::Minus,
        LogosToken::Star => Token::Star,
        LogosToken::Slash => Token::Slash,
        LogosToken::Percent => Token::Percent,
        LogosToken::Amp => Token::Amp,
        LogosToken::Pipe => Token::Pipe,
        LogosToken::Caret => Token::Caret,
        LogosToken::LessLess => Token::LessLess,
        LogosToken::GreaterGreater => Token::GreaterGreater,
        LogosToken::AmpCaret => Token::AmpCaret,
        LogosToken::Equal => Token::Equal,
        LogosToken::ColonEqual => Token::ColonEqual,
        LogosToken::PlusEqual => Token::PlusEqual,
        LogosToken::MinusEqual => Token::MinusEqual,
        LogosToken::StarEqual => Token::StarEqual,
        LogosToken::SlashEqual => Token::SlashEqual,
        LogosToken::PercentEqual => Token::PercentEqual,
        LogosToken::AmpEqual => Token::AmpEqual,
        LogosToken::PipeEqual => Token::PipeEqual,
        LogosToken::CaretEqual => Token::CaretEqual,
        LogosToken::LessLessEqual => Token::LessLessEqual,
        LogosToken::GreaterGreaterEqual => Token::GreaterGreaterEqual,
        LogosToken::AmpCaretEqual => Token::AmpCaretEqual,
        LogosToken::AmpAmp => Token::AmpAmp,
        LogosToken::PipePipe => Token::PipePipe,
        LogosToken::EqualEqual => Token::EqualEqual,
        LogosToken::BangEqual => Token::BangEqual,
        LogosToken::Less => Token::Less,
        LogosToken::LessEqual => Token::LessEqual,
        LogosToken::Greater => Token::Greater,
        LogosToken::GreaterEqual => Token::GreaterEqual,
        LogosToken::Bang => Token::Bang,
        LogosToken::Arrow => Token::Arrow,
        LogosToken::PlusPlus => Token::PlusPlus,
        LogosToken::MinusMinus => Token::MinusMinus,
        LogosToken::Tilde => Token::Tilde,
        LogosToken::DotDotDot => Token::DotDotDot,
        LogosToken::Dot => Token::Dot,
        LogosToken::Colon => Token::Colon,
        LogosToken::LeftParen => Token::LeftParen,
        LogosToken::RightParen => Token::RightParen,
        LogosToken::LeftBrace => Token::LeftBrace,
        LogosToken::RightBrace => Token::RightBrace,
        LogosToken::LeftBracket => Token::LeftBracket,
        LogosToken::RightBracket => Token::RightBracket,
        LogosToken::Semicolon => Token::Semicolon,
        LogosToken::Comma => Token::Comma,
        // Filtered out before conversion.
        LogosToken::Whitespace
        | LogosToken::LineComment
        | LogosToken::Imaginary
        | LogosToken::UnterminatedString => Token::Eof,
    }
}

impl LexError {
    /// Get the span of this error
    pub fn span(&self) -> &Span {
        match self {
            LexError::UnexpectedCharacter { span, .. }
            | LexError::UnterminatedString { span }
            | LexError::UnterminatedComment { span }
            | LexError::InvalidNumber { span, .. } => span,
        }
    }

    /// Get a description of this error
    pub fn description(&self) -> String {
        match self {
            LexError::UnexpectedCharacter { char, .. } => {
                format!("Unexpected character '{}'", char)
            }
            LexError::UnterminatedString { .. } => "Unterminated string literal".to_string(),
            LexError::UnterminatedComment { .. } => "Unterminated block comment".to_string(),
            LexError::InvalidNumber { text, .. } => format!("Invalid number '{}'", text),
        }
    }

    /// Get a hint for fixing this error
    pub fn hint(&self) -> Option<String> {
        match self {
            LexError::UnterminatedString { .. } => {
                Some("Add a closing quote to terminate the string".to_string())
            }
            LexError::UnterminatedComment { .. } => {
                Some("Add */ to close the comment".to_string())
            }
            LexError::InvalidNumber { text, .. } if text.ends_with('i') => {
                Some("Imaginary literals are not supported".to_string())
            }
            _ => None,
        }
    }

    /// Format the error with source context
    pub fn format_with_source(&self, source: &str) -> String {
        let span = self.span();
        let mut result = String::new();

        result.push_str(&format!(
            "Error at {}:{}: {}\n",
            span.line,
            span.column,
            self.description()
        ));

        if let Some(error_line) = source.lines().nth(span.line.saturating_sub(1) as usize) {
            result.push_str("  |\n");
            result.push_str(&format!("{:3} | {}\n", span.line, error_line));
            result.push_str(&format!(
                "  | {}^\n",
                " ".repeat(span.column.saturating_sub(1) as usize)
            ));
        }

        if let Some(hint) = self.hint() {
            result.push_str(&format!("\nHint: {}\n", hint));
        }

        result
    }
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.description(),
            self.span().line,
            self.span().column
        )
    }
}

impl std::error::Error for LexError {}

//! Expression parsing
//!
//! Binary operators use precedence climbing over Go's five levels. Types
//! that can appear in value position (`[]int{...}`, `map[K]V(nil)`,
//! `make(chan T)`) are parsed as [`ExprKind::Type`] operands.

use super::types::expr_to_type;
use super::{ParseError, Parser};
use crate::ast::*;
use crate::token::Token;

impl Parser {
    /// Parse an expression.
    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(1)
    }

    /// Parse a comma-separated, non-empty expression list.
    pub fn parse_expr_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut exprs = vec![self.parse_expr()?];
        while self.eat(&Token::Comma) {
            exprs.push(self.parse_expr()?);
        }
        Ok(exprs)
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        while let Some(op) = binary_op(self.current()) {
            if op.precedence() < min_prec {
                break;
            }
            self.advance();
            let right = self.parse_binary(op.precedence() + 1)?;
            let span = left.span.merge(&right.span);
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_span();
        let op = match self.current() {
            Token::Plus => UnaryOp::Plus,
            Token::Minus => UnaryOp::Neg,
            Token::Bang => UnaryOp::Not,
            Token::Caret => UnaryOp::BitNot,
            Token::Star => UnaryOp::Deref,
            Token::Amp => UnaryOp::Addr,
            Token::Arrow if matches!(self.peek(), Some(Token::Chan)) => {
                let ty = self.parse_type()?;
                return Ok(Expr::new(ExprKind::Type(ty), self.span_from(&start)));
            }
            Token::Arrow => UnaryOp::Recv,
            _ => return self.parse_primary(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            self.span_from(&start),
        ))
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_span();
        let mut expr = self.parse_operand()?;

        loop {
            match self.current() {
                Token::Dot => {
                    self.advance();
                    if self.eat(&Token::LeftParen) {
                        let ty = if self.eat(&Token::Type) {
                            None
                        } else {
                            Some(self.parse_type()?)
                        };
                        self.expect(Token::RightParen)?;
                        expr = Expr::new(
                            ExprKind::TypeAssert {
                                base: Box::new(expr),
                                ty,
                            },
                            self.span_from(&start),
                        );
                    } else {
                        let field = self.expect_ident()?;
                        expr = Expr::new(
                            ExprKind::Selector {
                                base: Box::new(expr),
                                field,
                            },
                            self.span_from(&start),
                        );
                    }
                }
                Token::LeftBracket => {
                    self.advance();
                    let kind = self.with_nesting(|p| p.parse_index_or_slice(expr))?;
                    expr = Expr::new(kind, self.span_from(&start));
                }
                Token::LeftParen => {
                    self.advance();
                    let (args, ellipsis) = self.with_nesting(|p| p.parse_call_args())?;
                    expr = Expr::new(
                        ExprKind::Call {
                            func: Box::new(expr),
                            args,
                            ellipsis,
                        },
                        self.span_from(&start),
                    );
                }
                Token::LeftBrace if self.literal_allowed(&expr) => {
                    let ty = expr_to_type(&expr)?;
                    let elems = self.parse_literal_body()?;
                    expr = Expr::new(
                        ExprKind::CompositeLit {
                            ty: Some(ty),
                            elems,
                        },
                        self.span_from(&start),
                    );
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_operand(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_span();
        let kind = match self.current().clone() {
            Token::Identifier(name) => {
                self.advance();
                ExprKind::Ident(name)
            }
            Token::IntLiteral(value) => {
                self.advance();
                ExprKind::BasicLit(BasicLit {
                    kind: LitKind::Int,
                    value,
                })
            }
            Token::FloatLiteral(value) => {
                self.advance();
                ExprKind::BasicLit(BasicLit {
                    kind: LitKind::Float,
                    value,
                })
            }
            Token::RuneLiteral(value) => {
                self.advance();
                ExprKind::BasicLit(BasicLit {
                    kind: LitKind::Rune,
                    value,
                })
            }
            Token::StringLiteral(value) => {
                self.advance();
                ExprKind::BasicLit(BasicLit {
                    kind: LitKind::String,
                    value,
                })
            }
            Token::LeftParen => {
                self.advance();
                let inner = self.with_nesting(|p| p.parse_expr())?;
                self.expect(Token::RightParen)?;
                ExprKind::Paren(Box::new(inner))
            }
            Token::Func => {
                self.advance();
                let sig = self.parse_signature()?;
                if self.check(&Token::LeftBrace) {
                    let body = self.parse_block()?;
                    ExprKind::FuncLit { sig, body }
                } else {
                    ExprKind::Type(TypeExpr::Func(Box::new(sig)))
                }
            }
            Token::LeftBracket
            | Token::Map
            | Token::Chan
            | Token::Struct
            | Token::Interface => ExprKind::Type(self.parse_type()?),
            _ => {
                return Err(self
                    .unexpected_token(&[])
                    .with_suggestion("expected an expression"))
            }
        };
        Ok(Expr::new(kind, self.span_from(&start)))
    }

    fn parse_index_or_slice(&mut self, base: Expr) -> Result<ExprKind, ParseError> {
        let low = if self.check(&Token::Colon) {
            None
        } else {
            Some(self.parse_expr()?)
        };

        if self.eat(&Token::Colon) {
            let high = if self.check_any(&[Token::Colon, Token::RightBracket]) {
                None
            } else {
                Some(Box::new(self.parse_expr()?))
            };
            let max = if self.eat(&Token::Colon) {
                Some(Box::new(self.parse_expr()?))
            } else {
                None
            };
            self.expect(Token::RightBracket)?;
            return Ok(ExprKind::Slice {
                base: Box::new(base),
                low: low.map(Box::new),
                high,
                max,
            });
        }

        let mut indices = Vec::new();
        if let Some(first) = low {
            indices.push(first);
        }
        while self.eat(&Token::Comma) {
            if self.check(&Token::RightBracket) {
                break;
            }
            indices.push(self.parse_expr()?);
        }
        self.expect(Token::RightBracket)?;
        Ok(ExprKind::Index {
            base: Box::new(base),
            indices,
        })
    }

    fn parse_call_args(&mut self) -> Result<(Vec<Expr>, bool), ParseError> {
        let mut args = Vec::new();
        let mut ellipsis = false;
        while !self.check(&Token::RightParen) && !self.at_eof() {
            args.push(self.parse_expr()?);
            if self.eat(&Token::DotDotDot) {
                ellipsis = true;
            }
            if !self.eat(&Token::Comma) {
                break;
            }
            self.skip_semicolons();
        }
        self.skip_semicolons();
        self.expect(Token::RightParen)?;
        Ok((args, ellipsis))
    }

    /// `{ elem, key: value, {nested}, }`
    fn parse_literal_body(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect(Token::LeftBrace)?;
        let elems = self.with_nesting(|p| {
            let mut elems = Vec::new();
            p.skip_semicolons();
            while !p.check(&Token::RightBrace) && !p.at_eof() {
                let start = p.current_span();
                let first = p.parse_literal_elem()?;
                let elem = if p.eat(&Token::Colon) {
                    let value = p.parse_literal_elem()?;
                    Expr::new(
                        ExprKind::KeyValue {
                            key: Box::new(first),
                            value: Box::new(value),
                        },
                        p.span_from(&start),
                    )
                } else {
                    first
                };
                elems.push(elem);
                if !p.eat(&Token::Comma) {
                    break;
                }
                p.skip_semicolons();
            }
            p.skip_semicolons();
            Ok::<_, ParseError>(elems)
        })?;
        self.expect(Token::RightBrace)?;
        Ok(elems)
    }

    fn parse_literal_elem(&mut self) -> Result<Expr, ParseError> {
        if self.check(&Token::LeftBrace) {
            let start = self.current_span();
            let elems = self.parse_literal_body()?;
            return Ok(Expr::new(
                ExprKind::CompositeLit { ty: None, elems },
                self.span_from(&start),
            ));
        }
        self.parse_expr()
    }

    /// Whether `{` after `expr` opens a composite literal.
    ///
    /// In control clause headers a type name, qualified or instantiated
    /// (`T`, `pkg.T`, `a[i]`), followed by `{` is the start of the block
    /// instead. Only literal types (`[]T{`, `map[K]V{`) open a literal there.
    fn literal_allowed(&self, expr: &Expr) -> bool {
        let is_named = match &expr.kind {
            ExprKind::Ident(_) => true,
            ExprKind::Selector { base, .. } => base.as_ident().is_some(),
            ExprKind::Index { base, .. } => {
                base.as_ident().is_some()
                    || matches!(&base.kind, ExprKind::Selector { base, .. } if base.as_ident().is_some())
            }
            _ => false,
        };
        if is_named {
            return self.expr_level >= 0;
        }
        matches!(
            &expr.kind,
            ExprKind::Type(TypeExpr::Array { .. } | TypeExpr::Slice(_) | TypeExpr::Map { .. } | TypeExpr::Struct(_))
        )
    }
}

fn binary_op(tok: &Token) -> Option<BinaryOp> {
    Some(match tok {
        Token::Plus => BinaryOp::Add,
        Token::Minus => BinaryOp::Sub,
        Token::Star => BinaryOp::Mul,
        Token::Slash => BinaryOp::Div,
        Token::Percent => BinaryOp::Rem,
        Token::Amp => BinaryOp::And,
        Token::Pipe => BinaryOp::Or,
        Token::Caret => BinaryOp::Xor,
        Token::LessLess => BinaryOp::Shl,
        Token::GreaterGreater => BinaryOp::Shr,
        Token::AmpCaret => BinaryOp::AndNot,
        Token::AmpAmp => BinaryOp::LogAnd,
        Token::PipePipe => BinaryOp::LogOr,
        Token::EqualEqual => BinaryOp::Eq,
        Token::BangEqual => BinaryOp::Ne,
        Token::Less => BinaryOp::Lt,
        Token::LessEqual => BinaryOp::Le,
        Token::Greater => BinaryOp::Gt,
        Token::GreaterEqual => BinaryOp::Ge,
        _ => return None,
    })
}

/// Map a compound assignment token (`+=`) to its binary operator.
pub fn compound_op(tok: &Token) -> Option<BinaryOp> {
    Some(match tok {
        Token::PlusEqual => BinaryOp::Add,
        Token::MinusEqual => BinaryOp::Sub,
        Token::StarEqual => BinaryOp::Mul,
        Token::SlashEqual => BinaryOp::Div,
        Token::PercentEqual => BinaryOp::Rem,
        Token::AmpEqual => BinaryOp::And,
        Token::PipeEqual => BinaryOp::Or,
        Token::CaretEqual => BinaryOp::Xor,
        Token::LessLessEqual => BinaryOp::Shl,
        Token::GreaterGreaterEqual => BinaryOp::Shr,
        Token::AmpCaretEqual => BinaryOp::AndNot,
        _ => return None,
    })
}

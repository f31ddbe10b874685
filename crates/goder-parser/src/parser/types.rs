//! Type expression parsing

use super::{ParseError, Parser};
use crate::ast::*;
use crate::token::Token;

impl Parser {
    /// Parse a type expression.
    pub fn parse_type(&mut self) -> Result<TypeExpr, ParseError> {
        match self.current().clone() {
            Token::Identifier(_) => self.parse_type_name(),
            Token::Star => {
                self.advance();
                Ok(TypeExpr::Pointer(Box::new(self.parse_type()?)))
            }
            Token::LeftBracket => {
                self.advance();
                if self.eat(&Token::RightBracket) {
                    return Ok(TypeExpr::Slice(Box::new(self.parse_type()?)));
                }
                let len = if self.eat(&Token::DotDotDot) {
                    None
                } else {
                    Some(Box::new(self.with_nesting(|p| p.parse_expr())?))
                };
                self.expect(Token::RightBracket)?;
                let elem = Box::new(self.parse_type()?);
                Ok(TypeExpr::Array { len, elem })
            }
            Token::Map => {
                self.advance();
                self.expect(Token::LeftBracket)?;
                let key = Box::new(self.parse_type()?);
                self.expect(Token::RightBracket)?;
                let value = Box::new(self.parse_type()?);
                Ok(TypeExpr::Map { key, value })
            }
            Token::Chan => {
                self.advance();
                let dir = if self.eat(&Token::Arrow) {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                let elem = Box::new(self.parse_type()?);
                Ok(TypeExpr::Chan { dir, elem })
            }
            Token::Arrow => {
                self.advance();
                self.expect(Token::Chan)?;
                let elem = Box::new(self.parse_type()?);
                Ok(TypeExpr::Chan {
                    dir: ChanDir::Recv,
                    elem,
                })
            }
            Token::Func => {
                self.advance();
                Ok(TypeExpr::Func(Box::new(self.parse_signature()?)))
            }
            Token::Struct => self.parse_struct_type(),
            Token::Interface => self.parse_interface_type(),
            Token::LeftParen => {
                self.advance();
                let ty = self.parse_type()?;
                self.expect(Token::RightParen)?;
                Ok(ty)
            }
            _ => Err(ParseError::expected_type(self.current_span())),
        }
    }

    /// `Name`, `pkg.Name`, optionally followed by `[args]`.
    fn parse_type_name(&mut self) -> Result<TypeExpr, ParseError> {
        let first = self.expect_ident()?;
        let base = if self.check(&Token::Dot) {
            self.advance();
            let name = self.expect_ident()?;
            TypeExpr::Qualified {
                package: first,
                name,
            }
        } else {
            TypeExpr::Named(first)
        };
        if self.check(&Token::LeftBracket) {
            let args = self.parse_type_args()?;
            return Ok(TypeExpr::Instantiated {
                base: Box::new(base),
                args,
            });
        }
        Ok(base)
    }

    /// `[T1, T2]`
    pub fn parse_type_args(&mut self) -> Result<Vec<TypeExpr>, ParseError> {
        self.expect(Token::LeftBracket)?;
        let mut args = Vec::new();
        while !self.check(&Token::RightBracket) {
            args.push(self.parse_type()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::RightBracket)?;
        Ok(args)
    }

    /// A type-parameter constraint: a type or a union of `~`-terms.
    pub fn parse_constraint(&mut self) -> Result<TypeExpr, ParseError> {
        let mut terms = vec![self.parse_term()?];
        while self.eat(&Token::Pipe) {
            terms.push(self.parse_term()?);
        }
        if terms.len() == 1 && !terms[0].tilde {
            if let Some(term) = terms.pop() {
                return Ok(term.ty);
            }
        }
        Ok(TypeExpr::Union(terms))
    }

    fn parse_term(&mut self) -> Result<Term, ParseError> {
        let tilde = self.eat(&Token::Tilde);
        let ty = self.parse_type()?;
        Ok(Term { tilde, ty })
    }

    /// Parse `(params) results` after `func` and an optional name.
    pub fn parse_signature(&mut self) -> Result<Signature, ParseError> {
        let params = self.parse_params()?;
        let results = if self.check(&Token::LeftParen) {
            self.parse_params()?
        } else if self.starts_type() {
            vec![Field::unnamed(self.parse_type()?)]
        } else {
            Vec::new()
        };
        Ok(Signature { params, results })
    }

    /// True if the current token can begin a type.
    pub fn starts_type(&self) -> bool {
        matches!(
            self.current(),
            Token::Identifier(_)
                | Token::Star
                | Token::LeftBracket
                | Token::Map
                | Token::Chan
                | Token::Func
                | Token::Struct
                | Token::Interface
                | Token::LeftParen
                | Token::Arrow
        )
    }

    /// Parse a parenthesized parameter or result list.
    ///
    /// Go allows both `(int, string)` and `(a, b int, c string)`; entries are
    /// parsed as optional-name/type pairs and regrouped afterwards.
    fn parse_params(&mut self) -> Result<Vec<Field>, ParseError> {
        self.expect(Token::LeftParen)?;
        let mut entries: Vec<(Option<Ident>, TypeExpr)> = Vec::new();
        while !self.check(&Token::RightParen) {
            let name = if matches!(self.current(), Token::Identifier(_)) && self.param_has_name()
            {
                Some(self.expect_ident()?)
            } else {
                None
            };
            let ty = if self.eat(&Token::DotDotDot) {
                TypeExpr::Ellipsis(Box::new(self.parse_type()?))
            } else {
                self.parse_type()?
            };
            entries.push((name, ty));
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::RightParen)?;

        if entries.iter().all(|(name, _)| name.is_none()) {
            return Ok(entries
                .into_iter()
                .map(|(_, ty)| Field::unnamed(ty))
                .collect());
        }

        // Named list: bare identifiers are names sharing the next type.
        let mut fields = Vec::new();
        let mut pending = Vec::new();
        for (name, ty) in entries {
            match name {
                Some(name) => {
                    pending.push(name);
                    fields.push(Field {
                        names: std::mem::take(&mut pending),
                        ty,
                        tag: None,
                    });
                }
                None => match ty {
                    TypeExpr::Named(ident) => pending.push(ident),
                    _ => {
                        return Err(ParseError::invalid_syntax(
                            "mixed named and unnamed parameters",
                            self.previous_span(),
                        ))
                    }
                },
            }
        }
        if !pending.is_empty() {
            return Err(ParseError::invalid_syntax(
                "mixed named and unnamed parameters",
                self.previous_span(),
            ));
        }
        Ok(fields)
    }

    /// With the current token an identifier, decide whether it names the
    /// parameter (`a []int`) or starts its type (`Stack[int]`, `pkg.T`).
    fn param_has_name(&self) -> bool {
        match self.peek() {
            Some(Token::Identifier(_))
            | Some(Token::Star)
            | Some(Token::Map)
            | Some(Token::Chan)
            | Some(Token::Func)
            | Some(Token::Struct)
            | Some(Token::Interface)
            | Some(Token::DotDotDot)
            | Some(Token::Arrow)
            | Some(Token::LeftParen) => true,
            Some(Token::LeftBracket) => self.bracket_starts_array_or_slice(1),
            _ => false,
        }
    }

    /// Looking at `[` at offset `n`, true if it begins `[]T` or `[N]T` rather
    /// than the type arguments of an instantiation.
    fn bracket_starts_array_or_slice(&self, n: usize) -> bool {
        if matches!(self.peek_nth(n + 1), Some(Token::RightBracket)) {
            return true;
        }
        let mut depth = 0usize;
        let mut i = n;
        while let Some(tok) = self.peek_nth(i) {
            match tok {
                Token::LeftBracket => depth += 1,
                Token::RightBracket => {
                    depth -= 1;
                    if depth == 0 {
                        return matches!(
                            self.peek_nth(i + 1),
                            Some(
                                Token::Identifier(_)
                                    | Token::Star
                                    | Token::LeftBracket
                                    | Token::Map
                                    | Token::Chan
                                    | Token::Func
                                    | Token::Struct
                                    | Token::Interface
                            )
                        );
                    }
                }
                Token::Eof | Token::Semicolon => return false,
                _ => {}
            }
            i += 1;
        }
        false
    }

    fn parse_struct_type(&mut self) -> Result<TypeExpr, ParseError> {
        self.expect(Token::Struct)?;
        self.expect(Token::LeftBrace)?;
        self.skip_semicolons();
        let mut fields = Vec::new();
        while !self.check(&Token::RightBrace) && !self.at_eof() {
            fields.push(self.parse_struct_field()?);
            self.expect_semicolon()?;
            self.skip_semicolons();
        }
        self.expect(Token::RightBrace)?;
        Ok(TypeExpr::Struct(fields))
    }

    fn parse_struct_field(&mut self) -> Result<Field, ParseError> {
        let embedded = match (self.current(), self.peek()) {
            (Token::Star, _) => true,
            (
                Token::Identifier(_),
                Some(Token::Dot | Token::Semicolon | Token::RightBrace | Token::StringLiteral(_)),
            ) => true,
            (Token::Identifier(_), Some(Token::LeftBracket)) => {
                !self.bracket_starts_array_or_slice(1)
            }
            _ => false,
        };

        let (names, ty) = if embedded {
            (Vec::new(), self.parse_type()?)
        } else {
            let mut names = vec![self.expect_ident()?];
            while self.eat(&Token::Comma) {
                names.push(self.expect_ident()?);
            }
            (names, self.parse_type()?)
        };

        let tag = match self.current() {
            Token::StringLiteral(lit) => {
                let tag = lit.clone();
                self.advance();
                Some(tag)
            }
            _ => None,
        };
        Ok(Field { names, ty, tag })
    }

    fn parse_interface_type(&mut self) -> Result<TypeExpr, ParseError> {
        self.expect(Token::Interface)?;
        self.expect(Token::LeftBrace)?;
        self.skip_semicolons();
        let mut elems = Vec::new();
        while !self.check(&Token::RightBrace) && !self.at_eof() {
            let is_method = matches!(self.current(), Token::Identifier(_))
                && matches!(self.peek(), Some(Token::LeftParen));
            if is_method {
                let name = self.expect_ident()?;
                let sig = self.parse_signature()?;
                elems.push(InterfaceElem::Method { name, sig });
            } else {
                elems.push(InterfaceElem::Type(self.parse_constraint()?));
            }
            self.expect_semicolon()?;
            self.skip_semicolons();
        }
        self.expect(Token::RightBrace)?;
        Ok(TypeExpr::Interface(elems))
    }
}

/// Reinterpret an expression parsed in value position as a type.
///
/// Go's grammar cannot always tell types from expressions (`f[int]`,
/// `(*T)(x)`, `case []int:`), so the parser builds expressions and converts
/// them where a type is required.
pub fn expr_to_type(expr: &Expr) -> Result<TypeExpr, ParseError> {
    match &expr.kind {
        ExprKind::Ident(name) => Ok(TypeExpr::Named(Ident::new(name.clone(), expr.span))),
        ExprKind::Selector { base, field } => match &base.kind {
            ExprKind::Ident(pkg) => Ok(TypeExpr::Qualified {
                package: Ident::new(pkg.clone(), base.span),
                name: field.clone(),
            }),
            _ => Err(ParseError::expected_type(expr.span)),
        },
        ExprKind::Unary {
            op: UnaryOp::Deref,
            operand,
        } => Ok(TypeExpr::Pointer(Box::new(expr_to_type(operand)?))),
        ExprKind::Index { base, indices } => {
            let args = indices.iter().map(expr_to_type).collect::<Result<_, _>>()?;
            Ok(TypeExpr::Instantiated {
                base: Box::new(expr_to_type(base)?),
                args,
            })
        }
        ExprKind::Paren(inner) => expr_to_type(inner),
        ExprKind::Type(ty) => Ok(ty.clone()),
        _ => Err(ParseError::expected_type(expr.span)),
    }
}

/// Parse a standalone type expression such as `map[string][]int`.
pub fn parse_type_text(text: &str) -> Result<TypeExpr, ParseError> {
    let mut parser = Parser::new(text).map_err(|mut errs| ParseError::from(errs.remove(0)))?;
    let ty = parser.parse_type()?;
    parser.skip_semicolons();
    if !parser.at_eof() {
        return Err(parser.unexpected_token(&[Token::Eof]));
    }
    Ok(ty)
}

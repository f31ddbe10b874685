//! Statement parsing

use super::expr::compound_op;
use super::types::expr_to_type;
use super::{recovery, ParseError, Parser};
use crate::ast::*;
use crate::token::Token;

/// What a simple statement may additionally be in its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SimpleMode {
    Basic,
    LabelOk,
    RangeOk,
}

impl Parser {
    /// Parse `{ stmts }`.
    pub fn parse_block(&mut self) -> Result<Block, ParseError> {
        let start = self.current_span();
        self.expect(Token::LeftBrace)?;
        let saved = self.expr_level;
        self.expr_level = 0;
        let stmts = self.parse_stmt_list();
        self.expr_level = saved;
        self.expect(Token::RightBrace)?;
        Ok(Block {
            stmts,
            span: self.span_from(&start),
        })
    }

    /// Parse statements up to `}`, `case` or `default`, recovering from
    /// errors at statement boundaries.
    fn parse_stmt_list(&mut self) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        loop {
            self.skip_semicolons();
            if self.check_any(&[Token::RightBrace, Token::Case, Token::Default]) || self.at_eof()
            {
                break;
            }
            let before = self.pos;
            let result = if self.check_any(&[Token::Var, Token::Const, Token::Type]) {
                self.parse_decl()
                    .map(|decls| decls.into_iter().map(Stmt::Decl).collect::<Vec<_>>())
            } else {
                self.parse_stmt().map(|s| vec![s])
            };
            match result.and_then(|parsed| {
                self.expect_semicolon()?;
                Ok(parsed)
            }) {
                Ok(mut parsed) => stmts.append(&mut parsed),
                Err(err) => {
                    self.record(err);
                    recovery::sync_to_statement_boundary(self);
                    if self.pos == before {
                        self.advance();
                    }
                }
            }
        }
        stmts
    }

    /// Parse a single statement.
    pub fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        match self.current() {
            Token::Var | Token::Const | Token::Type => {
                let mut decls = self.parse_decl()?;
                if decls.len() != 1 {
                    return Err(ParseError::invalid_syntax(
                        "declaration group not allowed here",
                        self.span_from(&start),
                    ));
                }
                Ok(Stmt::Decl(decls.remove(0)))
            }
            Token::Return => {
                self.advance();
                let results = if self.check_any(&[Token::Semicolon, Token::RightBrace]) {
                    Vec::new()
                } else {
                    self.parse_expr_list()?
                };
                Ok(Stmt::Return {
                    results,
                    span: self.span_from(&start),
                })
            }
            Token::If => Ok(Stmt::If(self.parse_if()?)),
            Token::For => self.parse_for(),
            Token::Switch => self.parse_switch(),
            Token::Select => self.parse_select(),
            Token::Go => {
                self.advance();
                Ok(Stmt::Go(self.parse_expr()?))
            }
            Token::Defer => {
                self.advance();
                Ok(Stmt::Defer(self.parse_expr()?))
            }
            Token::Break | Token::Continue | Token::Goto | Token::Fallthrough => {
                let kind = match self.advance() {
                    Token::Break => BranchKind::Break,
                    Token::Continue => BranchKind::Continue,
                    Token::Goto => BranchKind::Goto,
                    _ => BranchKind::Fallthrough,
                };
                let label = if kind != BranchKind::Fallthrough
                    && matches!(self.current(), Token::Identifier(_))
                {
                    Some(self.expect_ident()?)
                } else {
                    None
                };
                Ok(Stmt::Branch {
                    kind,
                    label,
                    span: self.span_from(&start),
                })
            }
            Token::LeftBrace => Ok(Stmt::Block(self.parse_block()?)),
            Token::Semicolon => Ok(Stmt::Empty),
            _ => self.parse_simple_stmt(SimpleMode::LabelOk),
        }
    }

    fn parse_simple_stmt(&mut self, mode: SimpleMode) -> Result<Stmt, ParseError> {
        let start = self.current_span();

        if mode == SimpleMode::RangeOk && self.eat(&Token::Range) {
            let expr = self.parse_expr()?;
            return Ok(Stmt::Range(RangeStmt {
                key: None,
                value: None,
                define: false,
                expr,
                body: Block::default(),
                span: self.span_from(&start),
            }));
        }

        let mut lhs = self.parse_expr_list()?;

        let op = match self.current() {
            Token::ColonEqual => Some(AssignOp::Define),
            Token::Equal => Some(AssignOp::Assign),
            tok => compound_op(tok).map(AssignOp::Compound),
        };
        if let Some(op) = op {
            self.advance();
            if mode == SimpleMode::RangeOk
                && matches!(op, AssignOp::Define | AssignOp::Assign)
                && self.eat(&Token::Range)
            {
                if lhs.len() > 2 {
                    return Err(ParseError::invalid_syntax(
                        "range clause permits at most two iteration variables",
                        self.span_from(&start),
                    ));
                }
                let expr = self.parse_expr()?;
                let mut vars = lhs.into_iter();
                return Ok(Stmt::Range(RangeStmt {
                    key: vars.next(),
                    value: vars.next(),
                    define: op == AssignOp::Define,
                    expr,
                    body: Block::default(),
                    span: self.span_from(&start),
                }));
            }
            let rhs = self.parse_expr_list()?;
            return Ok(Stmt::Assign(AssignStmt {
                lhs,
                op,
                rhs,
                span: self.span_from(&start),
            }));
        }

        if lhs.len() > 1 {
            return Err(self.unexpected_token(&[Token::ColonEqual, Token::Equal]));
        }
        let expr = lhs.remove(0);

        match self.current() {
            Token::Colon if mode == SimpleMode::LabelOk && expr.as_ident().is_some() => {
                self.advance();
                let label = Ident::new(expr.as_ident().unwrap_or_default(), expr.span);
                self.skip_semicolons();
                let stmt = if self.check(&Token::RightBrace) {
                    Stmt::Empty
                } else {
                    self.parse_stmt()?
                };
                Ok(Stmt::Labeled {
                    label,
                    stmt: Box::new(stmt),
                })
            }
            Token::Arrow => {
                self.advance();
                let value = self.parse_expr()?;
                Ok(Stmt::Send { chan: expr, value })
            }
            Token::PlusPlus | Token::MinusMinus => {
                let inc = matches!(self.advance(), Token::PlusPlus);
                Ok(Stmt::IncDec { expr, inc })
            }
            _ => Ok(Stmt::Expr(expr)),
        }
    }

    fn parse_if(&mut self) -> Result<IfStmt, ParseError> {
        let start = self.current_span();
        self.expect(Token::If)?;

        let (init, cond) = self.in_control_clause(|p| {
            if p.eat(&Token::Semicolon) {
                return Ok::<_, ParseError>((None, p.parse_expr()?));
            }
            let first = p.parse_simple_stmt(SimpleMode::Basic)?;
            if p.eat(&Token::Semicolon) {
                let cond = p.parse_expr()?;
                Ok((Some(Box::new(first)), cond))
            } else {
                match first {
                    Stmt::Expr(cond) => Ok((None, cond)),
                    _ => Err(ParseError::invalid_syntax(
                        "expected condition in if statement",
                        p.span_from(&start),
                    )),
                }
            }
        })?;

        let then = self.parse_block()?;
        let els = if self.eat(&Token::Else) {
            if self.check(&Token::If) {
                Some(Box::new(Stmt::If(self.parse_if()?)))
            } else {
                Some(Box::new(Stmt::Block(self.parse_block()?)))
            }
        } else {
            None
        };

        Ok(IfStmt {
            init,
            cond,
            then,
            els,
            span: self.span_from(&start),
        })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        self.expect(Token::For)?;

        let header = self.in_control_clause(|p| {
            let mut header = ForHeader::default();
            if p.check(&Token::LeftBrace) {
                return Ok::<_, ParseError>(header);
            }
            let first = if p.check(&Token::Semicolon) {
                None
            } else {
                Some(p.parse_simple_stmt(SimpleMode::RangeOk)?)
            };
            let first = match first {
                Some(Stmt::Range(range)) => {
                    header.range = Some(range);
                    return Ok(header);
                }
                other => other,
            };
            if p.eat(&Token::Semicolon) {
                header.init = first.map(Box::new);
                if !p.check(&Token::Semicolon) {
                    header.cond = Some(p.parse_expr()?);
                }
                p.expect(Token::Semicolon)?;
                if !p.check(&Token::LeftBrace) {
                    header.post = Some(Box::new(p.parse_simple_stmt(SimpleMode::Basic)?));
                }
            } else {
                match first {
                    Some(Stmt::Expr(cond)) => header.cond = Some(cond),
                    _ => {
                        return Err(ParseError::invalid_syntax(
                            "expected for loop condition",
                            p.span_from(&start),
                        ))
                    }
                }
            }
            Ok(header)
        })?;

        let body = self.parse_block()?;
        if let Some(mut range) = header.range {
            range.body = body;
            range.span = self.span_from(&start);
            return Ok(Stmt::Range(range));
        }
        Ok(Stmt::For(ForStmt {
            init: header.init,
            cond: header.cond,
            post: header.post,
            body,
            span: self.span_from(&start),
        }))
    }

    fn parse_switch(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        self.expect(Token::Switch)?;

        let (init, tag) = self.in_control_clause(|p| {
            let mut init = None;
            let mut tag = None;
            if !p.check(&Token::LeftBrace) {
                if !p.check(&Token::Semicolon) {
                    tag = Some(p.parse_simple_stmt(SimpleMode::Basic)?);
                }
                if p.eat(&Token::Semicolon) {
                    init = tag.take().map(Box::new);
                    if !p.check(&Token::LeftBrace) {
                        tag = Some(p.parse_simple_stmt(SimpleMode::Basic)?);
                    }
                }
            }
            Ok::<_, ParseError>((init, tag))
        })?;

        if let Some((binding, expr)) = tag.as_ref().and_then(type_switch_guard) {
            let cases = self.parse_case_clauses(|p| {
                p.parse_expr_list()?
                    .iter()
                    .map(expr_to_type)
                    .collect::<Result<Vec<_>, _>>()
            })?;
            let cases = cases
                .into_iter()
                .map(|(types, body)| TypeCaseClause { types, body })
                .collect();
            return Ok(Stmt::TypeSwitch(TypeSwitchStmt {
                init,
                binding,
                expr,
                cases,
                span: self.span_from(&start),
            }));
        }

        let tag = match tag {
            Some(Stmt::Expr(expr)) => Some(expr),
            None => None,
            Some(_) => {
                return Err(ParseError::invalid_syntax(
                    "switch expression must be an expression",
                    self.span_from(&start),
                ))
            }
        };
        let cases = self
            .parse_case_clauses(|p| p.parse_expr_list())?
            .into_iter()
            .map(|(exprs, body)| CaseClause { exprs, body })
            .collect();
        Ok(Stmt::Switch(SwitchStmt {
            init,
            tag,
            cases,
            span: self.span_from(&start),
        }))
    }

    fn parse_select(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        self.expect(Token::Select)?;
        let cases = self
            .parse_case_clauses(|p| p.parse_simple_stmt(SimpleMode::Basic).map(Box::new))?
            .into_iter()
            .map(|(comm, body)| CommClause { comm, body })
            .collect();
        Ok(Stmt::Select(SelectStmt {
            cases,
            span: self.span_from(&start),
        }))
    }

    /// Parse `{ case X: stmts ... default: stmts }`, with `head` parsing
    /// what follows `case`.
    fn parse_case_clauses<T>(
        &mut self,
        mut head: impl FnMut(&mut Self) -> Result<T, ParseError>,
    ) -> Result<Vec<(Option<T>, Vec<Stmt>)>, ParseError> {
        self.expect(Token::LeftBrace)?;
        let saved = self.expr_level;
        self.expr_level = 0;
        let mut clauses = Vec::new();
        self.skip_semicolons();
        while !self.check(&Token::RightBrace) && !self.at_eof() {
            let label = if self.eat(&Token::Default) {
                None
            } else {
                self.expect(Token::Case)?;
                Some(head(self)?)
            };
            self.expect(Token::Colon)?;
            let body = self.parse_stmt_list();
            clauses.push((label, body));
        }
        self.expr_level = saved;
        self.expect(Token::RightBrace)?;
        Ok(clauses)
    }
}

#[derive(Default)]
struct ForHeader {
    init: Option<Box<Stmt>>,
    cond: Option<Expr>,
    post: Option<Box<Stmt>>,
    range: Option<RangeStmt>,
}

/// Recognise `x.(type)` and `v := x.(type)`.
fn type_switch_guard(stmt: &Stmt) -> Option<(Option<Ident>, Expr)> {
    fn guard(expr: &Expr) -> Option<&Expr> {
        match &expr.kind {
            ExprKind::TypeAssert { base, ty: None } => Some(base),
            _ => None,
        }
    }
    match stmt {
        Stmt::Expr(expr) => guard(expr).map(|base| (None, base.clone())),
        Stmt::Assign(assign) if assign.op == AssignOp::Define && assign.rhs.len() == 1 => {
            let base = guard(&assign.rhs[0])?;
            match assign.lhs.as_slice() {
                [lhs] => {
                    let name = lhs.as_ident()?;
                    Some((Some(Ident::new(name, lhs.span)), base.clone()))
                }
                _ => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(source: &str) -> Vec<Stmt> {
        let file = format!("package main\nfunc main() {{\n{}\n}}\n", source);
        let parsed = Parser::new(&file).unwrap().parse().unwrap();
        match parsed.decls.into_iter().next() {
            Some(Decl::Func(f)) => f.body.unwrap().stmts,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_short_var_decl_and_compound_assign() {
        let stmts = body("x := 1\nx += 2\nx++");
        assert!(matches!(&stmts[0], Stmt::Assign(a) if a.op == AssignOp::Define));
        assert!(matches!(&stmts[1], Stmt::Assign(a) if a.op == AssignOp::Compound(BinaryOp::Add)));
        assert!(matches!(&stmts[2], Stmt::IncDec { inc: true, .. }));
    }

    #[test]
    fn test_for_forms() {
        let stmts = body(
            "for {}\nfor i < 3 {}\nfor i := 0; i < 3; i++ {}\nfor _, v := range []int{1, 2} { _ = v }\nfor range ch {}",
        );
        assert!(matches!(&stmts[0], Stmt::For(f) if f.cond.is_none()));
        assert!(matches!(&stmts[1], Stmt::For(f) if f.cond.is_some() && f.init.is_none()));
        assert!(matches!(&stmts[2], Stmt::For(f) if f.init.is_some() && f.post.is_some()));
        assert!(matches!(&stmts[3], Stmt::Range(r) if r.define && r.value.is_some()));
        assert!(matches!(&stmts[4], Stmt::Range(r) if r.key.is_none()));
    }

    #[test]
    fn test_if_with_init_and_else_chain() {
        let stmts = body("if v, ok := m[k]; ok {\n} else if v > 1 {\n} else {\n}");
        match &stmts[0] {
            Stmt::If(stmt) => {
                assert!(stmt.init.is_some());
                assert!(matches!(stmt.els.as_deref(), Some(Stmt::If(_))));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_composite_literal_not_allowed_in_header() {
        let stmts = body("if x == y {\n\tprintln(x)\n}");
        assert!(matches!(&stmts[0], Stmt::If(_)));
    }

    #[test]
    fn test_index_before_block_in_header() {
        let stmts = body(
            "if b[i] != expect[i] {\n\treturn\n}\nfor m[k] {\n}\nswitch xs[0] {\ncase 1:\n}\nif p.Tags[0] == tags[n] {\n}",
        );
        match &stmts[0] {
            Stmt::If(stmt) => {
                assert!(matches!(&stmt.cond.kind, ExprKind::Binary { op: BinaryOp::Ne, .. }));
                assert_eq!(stmt.then.stmts.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(&stmts[1], Stmt::For(f) if f.cond.is_some()));
        assert!(matches!(&stmts[2], Stmt::Switch(s) if s.tag.is_some() && s.cases.len() == 1));
        assert!(matches!(&stmts[3], Stmt::If(_)));
    }

    #[test]
    fn test_literal_types_still_open_literals_in_header() {
        let stmts = body("for _, v := range []int{1, 2} {\n\t_ = v\n}\nif x == (Point{}) {\n}");
        assert!(matches!(&stmts[0], Stmt::Range(_)));
        assert!(matches!(&stmts[1], Stmt::If(_)));
    }

    #[test]
    fn test_type_switch() {
        let stmts = body("switch v := x.(type) {\ncase int, string:\n\t_ = v\ncase nil:\ndefault:\n}");
        match &stmts[0] {
            Stmt::TypeSwitch(ts) => {
                assert_eq!(ts.binding.as_ref().map(|b| b.name.as_str()), Some("v"));
                assert_eq!(ts.cases.len(), 3);
                assert!(ts.cases[2].types.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_switch_with_fallthrough_and_labels() {
        let stmts = body(
            "outer:\nfor {\n\tswitch n {\n\tcase 1:\n\t\tfallthrough\n\tcase 2:\n\t\tbreak outer\n\t}\n}",
        );
        assert!(matches!(&stmts[0], Stmt::Labeled { .. }));
    }

    #[test]
    fn test_select_and_send() {
        let stmts = body("select {\ncase v := <-ch:\n\t_ = v\ncase out <- 1:\ndefault:\n}");
        match &stmts[0] {
            Stmt::Select(sel) => {
                assert_eq!(sel.cases.len(), 3);
                assert!(matches!(sel.cases[1].comm.as_deref(), Some(Stmt::Send { .. })));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_local_declarations() {
        let stmts = body("var a, b int\nconst c = 3\ntype pair struct{ x, y int }");
        assert_eq!(stmts.len(), 3);
        assert!(stmts.iter().all(|s| matches!(s, Stmt::Decl(_))));
    }
}

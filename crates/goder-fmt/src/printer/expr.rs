//! Expression printing
//!
//! Binary expressions are spaced the way gofmt does it: operators of the
//! highest precedence present lose their surrounding blanks once the
//! expression mixes levels or sits in a nested context (`x%i == 0`,
//! `f(a+b, c)`).

use super::{align_rows, Printer};
use goder_parser::ast::*;

const LOWEST_PREC: u8 = 0;
const UNARY_PREC: u8 = 6;
const HIGHEST_PREC: u8 = 7;

impl Printer {
    pub fn expr(&mut self, expr: &Expr) {
        self.expr1(expr, LOWEST_PREC, 1);
    }

    pub(super) fn expr_list(&mut self, exprs: &[Expr], depth: usize) {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                self.word(", ");
            }
            self.expr0(expr, depth);
        }
    }

    fn expr0(&mut self, expr: &Expr, depth: usize) {
        self.expr1(expr, LOWEST_PREC, depth);
    }

    fn expr1(&mut self, expr: &Expr, prec1: u8, depth: usize) {
        match &expr.kind {
            ExprKind::Ident(name) => self.word(name),
            ExprKind::BasicLit(lit) => self.word(&lit.value),
            ExprKind::Binary { op, left, right } => {
                if op.precedence() < prec1 {
                    self.word("(");
                    self.expr0(expr, reduce_depth(depth));
                    self.word(")");
                } else {
                    self.binary(*op, left, right, cutoff(expr, depth), depth);
                }
            }
            ExprKind::KeyValue { key, value } => {
                self.expr(key);
                self.word(": ");
                self.expr(value);
            }
            ExprKind::Unary { op, operand } => {
                if UNARY_PREC < prec1 {
                    self.word("(");
                    self.expr0(expr, reduce_depth(depth));
                    self.word(")");
                    return;
                }
                self.word(&op.to_string());
                if needs_blank_after_unary(*op, operand) {
                    self.word(" ");
                }
                self.expr1(operand, UNARY_PREC, depth);
            }
            ExprKind::Paren(inner) => {
                if matches!(inner.kind, ExprKind::Paren(_)) {
                    self.expr0(inner, depth);
                } else {
                    self.word("(");
                    self.expr0(inner, reduce_depth(depth));
                    self.word(")");
                }
            }
            ExprKind::Selector { base, field } => {
                self.postfix_operand(base, depth);
                self.word(".");
                self.word(&field.name);
            }
            ExprKind::Index { base, indices } => {
                self.postfix_operand(base, 1);
                self.word("[");
                self.expr_list(indices, depth + 1);
                self.word("]");
            }
            ExprKind::Slice {
                base,
                low,
                high,
                max,
            } => {
                self.postfix_operand(base, 1);
                self.word("[");
                let mut parts = vec![low.as_deref(), high.as_deref()];
                if max.is_some() {
                    parts.push(max.as_deref());
                }
                let present = parts.iter().flatten().count();
                let has_binary = parts
                    .iter()
                    .flatten()
                    .any(|e| matches!(e.kind, ExprKind::Binary { .. }));
                let blanks = depth <= 1 && present > 1 && has_binary;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        if parts[i - 1].is_some() && blanks {
                            self.word(" ");
                        }
                        self.word(":");
                        if part.is_some() && blanks {
                            self.word(" ");
                        }
                    }
                    if let Some(part) = part {
                        self.expr0(part, depth + 1);
                    }
                }
                self.word("]");
            }
            ExprKind::TypeAssert { base, ty } => {
                self.postfix_operand(base, depth);
                self.word(".(");
                match ty {
                    Some(ty) => self.type_expr(ty),
                    None => self.word("type"),
                }
                self.word(")");
            }
            ExprKind::Call {
                func,
                args,
                ellipsis,
            } => {
                let depth = if args.len() > 1 { depth + 1 } else { depth };
                self.postfix_operand(func, depth);
                let multiline = starts_later(args.first(), expr);
                self.word("(");
                if multiline {
                    self.multiline_list(args, *ellipsis);
                } else {
                    self.expr_list(args, depth);
                    if *ellipsis {
                        self.word("...");
                    }
                }
                self.word(")");
            }
            ExprKind::CompositeLit { ty, elems } => {
                if let Some(ty) = ty {
                    self.type_in_expr(ty, true);
                }
                self.word("{");
                if starts_later(elems.first(), expr) {
                    self.multiline_list(elems, false);
                } else {
                    self.expr_list(elems, 1);
                }
                self.word("}");
            }
            ExprKind::FuncLit { sig, body } => {
                self.word("func");
                self.signature(sig);
                self.word(" ");
                self.block(body);
            }
            ExprKind::Type(ty) => self.type_in_expr(ty, false),
        }
    }

    fn binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr, cutoff: u8, depth: usize) {
        let prec = op.precedence();
        let blank = prec < cutoff;
        self.expr1(left, prec, depth + diff_prec(left, prec));
        if blank {
            self.word(" ");
        }
        self.word(&op.to_string());
        if blank {
            self.word(" ");
        }
        self.expr1(right, prec + 1, depth + 1);
    }

    /// The operand of a selector, index, call or assertion. Types that
    /// would read differently without parentheses get them.
    fn postfix_operand(&mut self, base: &Expr, depth: usize) {
        match &base.kind {
            ExprKind::Type(ty) if needs_parens_as_operand(ty) => {
                self.word("(");
                self.type_in_expr(ty, false);
                self.word(")");
            }
            _ => self.expr1(base, HIGHEST_PREC, depth),
        }
    }

    fn type_in_expr(&mut self, ty: &TypeExpr, literal: bool) {
        if literal {
            self.type_expr(ty);
        } else {
            self.type_expr_inline(ty);
        }
    }

    /// One element per line, each followed by a comma. Keyed elements are
    /// aligned on their values.
    fn multiline_list(&mut self, elems: &[Expr], ellipsis: bool) {
        self.newline();
        self.indent += 1;
        let last = elems.len().saturating_sub(1);
        let rows: Vec<Vec<String>> = elems
            .iter()
            .enumerate()
            .map(|(i, elem)| {
                let suffix = if ellipsis && i == last { "...," } else { "," };
                match &elem.kind {
                    ExprKind::KeyValue { key, value } => {
                        let key = self.nested(|p| p.expr(key));
                        let value = self.nested(|p| p.expr(value));
                        if key.contains('\n') {
                            vec![format!("{}: {}{}", key, value, suffix)]
                        } else {
                            vec![format!("{}:", key), format!("{}{}", value, suffix)]
                        }
                    }
                    _ => vec![format!("{}{}", self.nested(|p| p.expr(elem)), suffix)],
                }
            })
            .collect();
        for line in align_rows(&rows) {
            self.tabs();
            self.word(&line);
            self.newline();
        }
        self.indent -= 1;
        self.tabs();
    }
}

/// First element begins on a later source line than the expression.
fn starts_later(first: Option<&Expr>, expr: &Expr) -> bool {
    first.is_some_and(|first| expr.span.line > 0 && first.span.line > expr.span.line)
}

fn needs_parens_as_operand(ty: &TypeExpr) -> bool {
    matches!(
        ty,
        TypeExpr::Pointer(_) | TypeExpr::Func(_) | TypeExpr::Chan { .. }
    )
}

fn needs_blank_after_unary(op: UnaryOp, operand: &Expr) -> bool {
    match (&op, &operand.kind) {
        (UnaryOp::Neg, ExprKind::Unary { op: inner, .. }) => *inner == UnaryOp::Neg,
        (UnaryOp::Plus, ExprKind::Unary { op: inner, .. }) => *inner == UnaryOp::Plus,
        _ => false,
    }
}

fn reduce_depth(depth: usize) -> usize {
    depth.saturating_sub(1).max(1)
}

fn diff_prec(expr: &Expr, prec: u8) -> usize {
    match &expr.kind {
        ExprKind::Binary { op, .. } if op.precedence() == prec => 0,
        _ => 1,
    }
}

/// Precedence below which operators of `expr` are printed with blanks.
fn cutoff(expr: &Expr, depth: usize) -> u8 {
    let (has4, has5, max_problem) = walk_binary(expr);
    if max_problem > 0 {
        return max_problem + 1;
    }
    if has4 && has5 {
        return if depth == 1 { 5 } else { 4 };
    }
    if depth == 1 {
        6
    } else {
        4
    }
}

/// Which precedence levels occur in a binary chain, and the level at which
/// dropping blanks would glue tokens together (`a - -b`, `a / *p`).
fn walk_binary(expr: &Expr) -> (bool, bool, u8) {
    let ExprKind::Binary { op, left, right } = &expr.kind else {
        return (false, false, 0);
    };
    let prec = op.precedence();
    let mut has4 = prec == 4;
    let mut has5 = prec == 5;
    let mut max_problem = 0;

    if let ExprKind::Binary { op: left_op, .. } = &left.kind {
        if left_op.precedence() >= prec {
            let (h4, h5, mp) = walk_binary(left);
            has4 |= h4;
            has5 |= h5;
            max_problem = max_problem.max(mp);
        }
    }

    match &right.kind {
        ExprKind::Binary { op: right_op, .. } => {
            if right_op.precedence() > prec {
                let (h4, h5, mp) = walk_binary(right);
                has4 |= h4;
                has5 |= h5;
                max_problem = max_problem.max(mp);
            }
        }
        ExprKind::Unary { op: right_op, .. } => {
            let pair = format!("{}{}", op, right_op);
            match pair.as_str() {
                "/*" | "&&" | "&^" => max_problem = 5,
                "++" | "--" => max_problem = max_problem.max(4),
                _ => {}
            }
        }
        _ => {}
    }

    (has4, has5, max_problem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use goder_parser::Parser;

    fn print(source: &str) -> String {
        let mut parser = Parser::new(source).unwrap();
        let expr = parser.parse_expr().unwrap();
        let mut printer = Printer::new();
        printer.expr(&expr);
        printer.finish()
    }

    #[test]
    fn test_binary_spacing() {
        assert_eq!(print("a+b"), "a + b");
        assert_eq!(print("x%i==0"), "x%i == 0");
        assert_eq!(print("a*b+c"), "a*b + c");
        assert_eq!(print("f(a+b, c)"), "f(a+b, c)");
        assert_eq!(print("f(a+b)"), "f(a + b)");
        assert_eq!(print("a - -b"), "a - -b");
    }

    #[test]
    fn test_slice_spacing() {
        assert_eq!(print("s[i:j+1]"), "s[i : j+1]");
        assert_eq!(print("s[1:]"), "s[1:]");
        assert_eq!(print("s[:n]"), "s[:n]");
    }

    #[test]
    fn test_postfix_forms() {
        assert_eq!(print("(*T)(x)"), "(*T)(x)");
        assert_eq!(print("v.(string)"), "v.(string)");
        assert_eq!(print("m[k].f"), "m[k].f");
        assert_eq!(print("f(xs...)"), "f(xs...)");
    }

    #[test]
    fn test_pointer_type_callee_gets_parens() {
        let call = Expr::new(
            ExprKind::Call {
                func: Box::new(Expr::new(
                    ExprKind::Type(TypeExpr::Pointer(Box::new(TypeExpr::named("Node")))),
                    Default::default(),
                )),
                args: vec![Expr::ident("nil", Default::default())],
                ellipsis: false,
            },
            Default::default(),
        );
        let mut printer = Printer::new();
        printer.expr(&call);
        assert_eq!(printer.finish(), "(*Node)(nil)");
    }

    #[test]
    fn test_composite_literals() {
        assert_eq!(print("[]int{1, 2, 3}"), "[]int{1, 2, 3}");
        assert_eq!(print("P{X:1}"), "P{X: 1}");
        assert_eq!(
            print("map[string]int{\n\"a\": 1,\n\"bcd\": 2,\n}"),
            "map[string]int{\n\t\"a\":   1,\n\t\"bcd\": 2,\n}"
        );
    }

    #[test]
    fn test_func_literal_argument() {
        assert_eq!(
            print("lo.Map(a, func(t int, _ int) string { return strconv.Itoa(t) })"),
            "lo.Map(a, func(t int, _ int) string {\n\treturn strconv.Itoa(t)\n})"
        );
    }
}

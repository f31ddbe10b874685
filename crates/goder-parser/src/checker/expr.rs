//! Expression typing

use super::checker::TypeChecker;
use super::error::CheckError;
use super::infer;
use super::stdlib::{self, StdMember};
use super::symbols::{ObjectKind, ScopeKind};
use super::ty::{BasicKind, Type, UntypedKind};
use crate::ast::*;
use crate::parser::{expr_to_type, parse_type_text};
use rustc_hash::FxHashMap;

impl TypeChecker {
    /// Type an expression and record the result.
    pub fn check_expr(&mut self, expr: &Expr) -> Type {
        self.check_expr_hint(expr, None)
    }

    /// Like [`check_expr`](Self::check_expr), with the type expected by the
    /// context. The hint only supplies elided composite literal types.
    pub(super) fn check_expr_hint(&mut self, expr: &Expr, hint: Option<&Type>) -> Type {
        let ty = self.expr_type(expr, hint);
        self.info.record(expr.id, &ty);
        ty
    }

    fn expr_type(&mut self, expr: &Expr, hint: Option<&Type>) -> Type {
        match &expr.kind {
            ExprKind::Ident(name) => self.ident_type(expr, name),
            ExprKind::BasicLit(lit) => Type::Untyped(match lit.kind {
                LitKind::Int => UntypedKind::Int,
                LitKind::Float => UntypedKind::Float,
                LitKind::Rune => UntypedKind::Rune,
                LitKind::String => UntypedKind::String,
            }),
            ExprKind::CompositeLit { ty, elems } => self.composite_type(ty.as_ref(), elems, hint),
            ExprKind::FuncLit { sig, body } => {
                self.table.push_scope(ScopeKind::Function);
                let func = self.func_type(sig);
                self.declare_params(sig);
                self.check_stmts(&body.stmts);
                self.table.pop_scope();
                Type::Func(func)
            }
            ExprKind::Paren(inner) => self.check_expr_hint(inner, hint),
            ExprKind::Selector { base, field } => self.selector_type(base, field),
            ExprKind::Index { base, indices } => self.index_type(base, indices),
            ExprKind::Slice {
                base,
                low,
                high,
                max,
            } => {
                let base_ty = self.check_expr(base);
                for bound in [low, high, max].into_iter().flatten() {
                    self.check_expr(bound);
                }
                match self.underlying(&base_ty) {
                    Type::Basic(BasicKind::String) => base_ty,
                    Type::Untyped(UntypedKind::String) => Type::Basic(BasicKind::String),
                    Type::Slice(_) => base_ty,
                    Type::Array { elem, .. } => Type::Slice(elem),
                    Type::Pointer(inner) => match self.underlying(&inner) {
                        Type::Array { elem, .. } => Type::Slice(elem),
                        _ => Type::Unresolved,
                    },
                    _ => Type::Unresolved,
                }
            }
            ExprKind::TypeAssert { base, ty } => {
                self.check_expr(base);
                match ty {
                    Some(ty) => self.resolve_type(ty),
                    None => Type::Unresolved,
                }
            }
            ExprKind::Call {
                func,
                args,
                ellipsis,
            } => self.call_type(func, args, *ellipsis),
            ExprKind::Unary { op, operand } => self.unary_type(*op, operand, hint),
            ExprKind::Binary { op, left, right } => {
                let left = self.check_expr(left);
                let right = self.check_expr(right);
                if op.is_comparison() {
                    return Type::Untyped(UntypedKind::Bool);
                }
                if op.is_shift() {
                    return left;
                }
                match (&left, &right) {
                    (Type::Untyped(a), Type::Untyped(b)) => Type::Untyped(a.max(*b)),
                    (Type::Untyped(_), _) => right,
                    _ => left,
                }
            }
            ExprKind::KeyValue { key, value } => {
                self.check_expr(key);
                self.check_expr_hint(value, hint)
            }
            ExprKind::Type(ty) => Type::TypeValue(Box::new(self.resolve_type(ty))),
        }
    }

    fn ident_type(&mut self, expr: &Expr, name: &str) -> Type {
        if name == "_" {
            return Type::Unresolved;
        }
        let Some(object) = self.table.resolve(name).cloned() else {
            self.report(CheckError::UndefinedName {
                name: name.to_string(),
                span: expr.span,
            });
            return Type::Unresolved;
        };
        if object.package_level {
            self.info.record_use(expr.id, name);
        }
        match object.kind {
            ObjectKind::TypeName => {
                let ty = self.resolve_type(&TypeExpr::Named(Ident::new(name, expr.span)));
                Type::TypeValue(Box::new(ty))
            }
            ObjectKind::TypeParam => Type::TypeValue(Box::new(Type::TypeParam(object.name))),
            _ => object.ty,
        }
    }

    fn composite_type(&mut self, ty: Option<&TypeExpr>, elems: &[Expr], hint: Option<&Type>) -> Type {
        let (literal, result) = match ty {
            Some(written) => {
                let mut resolved = self.resolve_type(written);
                if let (TypeExpr::Array { len: None, .. }, Type::Array { elem, .. }) =
                    (written, &resolved)
                {
                    resolved = Type::Array {
                        len: elems.len().to_string(),
                        elem: elem.clone(),
                    };
                }
                (resolved.clone(), resolved)
            }
            // `[]*Point{{1, 2}}` elides `&Point`
            None => match hint {
                Some(Type::Pointer(inner)) => (inner.as_ref().clone(), Type::Pointer(inner.clone())),
                Some(hinted) => (hinted.clone(), hinted.clone()),
                None => (Type::Unresolved, Type::Unresolved),
            },
        };

        match self.underlying(&literal) {
            Type::Struct(fields) => {
                for (i, elem) in elems.iter().enumerate() {
                    if let ExprKind::KeyValue { key, value } = &elem.kind {
                        let field_ty = key
                            .as_ident()
                            .and_then(|k| fields.iter().find(|f| f.name == k))
                            .map(|f| f.ty.clone());
                        let value_ty = self.check_expr_hint(value, field_ty.as_ref());
                        self.info.record(elem.id, &value_ty);
                    } else {
                        let field_ty = fields.get(i).map(|f| f.ty.clone());
                        self.check_expr_hint(elem, field_ty.as_ref());
                    }
                }
            }
            Type::Slice(elem_ty) | Type::Array { elem: elem_ty, .. } => {
                for elem in elems {
                    if let ExprKind::KeyValue { key, value } = &elem.kind {
                        self.check_expr(key);
                        let value_ty = self.check_expr_hint(value, Some(elem_ty.as_ref()));
                        self.info.record(elem.id, &value_ty);
                    } else {
                        self.check_expr_hint(elem, Some(elem_ty.as_ref()));
                    }
                }
            }
            Type::Map { key: key_ty, value: value_ty } => {
                for elem in elems {
                    if let ExprKind::KeyValue { key, value } = &elem.kind {
                        self.check_expr_hint(key, Some(key_ty.as_ref()));
                        let ty = self.check_expr_hint(value, Some(value_ty.as_ref()));
                        self.info.record(elem.id, &ty);
                    } else {
                        self.check_expr_hint(elem, Some(value_ty.as_ref()));
                    }
                }
            }
            _ => {
                // Unknown shape: a bare identifier key is most likely a field
                // name of a type from another package.
                for elem in elems {
                    if let ExprKind::KeyValue { key, value } = &elem.kind {
                        if key.as_ident().is_none() {
                            self.check_expr(key);
                        }
                        let ty = self.check_expr(value);
                        self.info.record(elem.id, &ty);
                    } else {
                        self.check_expr(elem);
                    }
                }
            }
        }
        result
    }

    fn selector_type(&mut self, base: &Expr, field: &Ident) -> Type {
        if let Some(name) = base.as_ident() {
            if let Some(object) = self.table.resolve(name) {
                if let (ObjectKind::Package, Type::Package(path)) = (object.kind, &object.ty) {
                    let path = path.clone();
                    let package_ty = object.ty.clone();
                    self.info.record(base.id, &package_ty);
                    self.info.record_use(base.id, name);
                    return self.package_member(&path, &field.name);
                }
            }
        }

        let base_ty = self.check_expr(base);
        if let Type::TypeValue(recv) = &base_ty {
            // Method expression: `T.Method` takes the receiver first.
            return match self.lookup_member(recv, &field.name) {
                Type::Func(mut func) => {
                    func.params.insert(0, recv.as_ref().clone());
                    Type::Func(func)
                }
                _ => Type::Unresolved,
            };
        }
        self.lookup_member(&base_ty, &field.name)
    }

    fn package_member(&mut self, path: &str, member: &str) -> Type {
        match stdlib::lookup(path, member) {
            Some(StdMember::Func(text)) | Some(StdMember::Var(text)) => match parse_type_text(text) {
                Ok(ty) => self.resolve_type(&ty),
                Err(_) => Type::Unresolved,
            },
            Some(StdMember::Const(kind)) => Type::Untyped(kind),
            None => Type::Unresolved,
        }
    }

    /// Type of field or method `name` on a value of type `ty`.
    pub(super) fn lookup_member(&self, ty: &Type, name: &str) -> Type {
        self.find_member(ty, name, 0).unwrap_or(Type::Unresolved)
    }

    fn find_member(&self, ty: &Type, name: &str, depth: usize) -> Option<Type> {
        if depth > 8 {
            return None;
        }
        let base = match ty {
            Type::Pointer(inner) => inner.as_ref(),
            other => other,
        };
        if let Type::Named {
            name: type_name,
            args,
        } = base
        {
            if let Some(method) = self.methods.get(type_name).and_then(|m| m.get(name)) {
                let subst: FxHashMap<String, Type> = method
                    .recv_params
                    .iter()
                    .cloned()
                    .zip(args.iter().cloned())
                    .collect();
                return Some(Type::Func(method.sig.substitute(&subst)));
            }
        }
        match self.underlying(base) {
            Type::Struct(fields) => {
                if let Some(field) = fields.iter().find(|f| f.name == name) {
                    return Some(field.ty.clone());
                }
                fields
                    .iter()
                    .filter(|f| f.embedded)
                    .find_map(|f| self.find_member(&f.ty, name, depth + 1))
            }
            Type::Interface { methods } => methods
                .into_iter()
                .find(|(n, _)| n == name)
                .map(|(_, func)| Type::Func(func)),
            _ => None,
        }
    }

    /// Type parameters of the generic function `expr` names, if any.
    fn generic_callee(&self, expr: &Expr) -> Option<Vec<String>> {
        let name = expr.unparen().as_ident()?;
        let object = self.table.resolve(name)?;
        (object.kind == ObjectKind::Func && object.is_generic()).then(|| object.type_params.clone())
    }

    /// Resolve an index expression used as a type argument.
    fn type_arg(&mut self, expr: &Expr) -> Type {
        match expr_to_type(expr) {
            Ok(ty) => self.resolve_type(&ty),
            Err(_) => match self.check_expr(expr) {
                Type::TypeValue(ty) => *ty,
                _ => Type::Unresolved,
            },
        }
    }

    fn index_type(&mut self, base: &Expr, indices: &[Expr]) -> Type {
        // Explicit instantiation: `Map[int, string]`
        if let Some(type_params) = self.generic_callee(base) {
            let func_ty = self.check_expr(base);
            let args: Vec<Type> = indices.iter().map(|i| self.type_arg(i)).collect();
            let subst: FxHashMap<String, Type> = type_params.into_iter().zip(args).collect();
            return match func_ty {
                Type::Func(func) => Type::Func(func.substitute(&subst)),
                other => other,
            };
        }

        let base_ty = self.check_expr(base);
        if let Type::TypeValue(inner) = &base_ty {
            if let Type::Named { name, .. } = inner.as_ref() {
                let name = name.clone();
                let args = indices.iter().map(|i| self.type_arg(i)).collect();
                return Type::TypeValue(Box::new(Type::Named { name, args }));
            }
        }

        for index in indices {
            self.check_expr(index);
        }
        match self.underlying(&base_ty) {
            Type::Slice(elem) | Type::Array { elem, .. } => *elem,
            Type::Pointer(inner) => match self.underlying(&inner) {
                Type::Array { elem, .. } => *elem,
                _ => Type::Unresolved,
            },
            Type::Basic(BasicKind::String) | Type::Untyped(UntypedKind::String) => {
                Type::Basic(BasicKind::Byte)
            }
            Type::Map { value, .. } => *value,
            _ => Type::Unresolved,
        }
    }

    fn call_type(&mut self, func: &Expr, args: &[Expr], ellipsis: bool) -> Type {
        if let Some(name) = func.unparen().as_ident() {
            if self
                .table
                .resolve(name)
                .is_some_and(|o| o.kind == ObjectKind::Builtin)
            {
                self.check_expr(func);
                return self.builtin_call(name, args);
            }
        }

        let callee = self.check_expr(func);
        let mut arg_types: Vec<Type> = args.iter().map(|a| self.check_expr(a)).collect();
        match callee {
            // Conversion
            Type::TypeValue(target) => *target,
            Type::Func(func_ty) => {
                if let [Type::Tuple(items)] = arg_types.as_slice() {
                    if items.len() > 1 {
                        arg_types = items.clone();
                    }
                }
                let func_ty = if func_ty.has_type_params() {
                    let underlying = |t: &Type| self.underlying(t);
                    infer::instantiate(&func_ty, &arg_types, ellipsis, &underlying)
                } else {
                    func_ty
                };
                func_ty.result_type()
            }
            _ => Type::Unresolved,
        }
    }

    fn builtin_call(&mut self, name: &str, args: &[Expr]) -> Type {
        let types: Vec<Type> = args.iter().map(|a| self.check_expr(a)).collect();
        let first = types.first().cloned().unwrap_or(Type::Unresolved);
        match name {
            "len" | "cap" | "copy" => Type::Basic(BasicKind::Int),
            "make" => match first {
                Type::TypeValue(ty) => *ty,
                _ => Type::Unresolved,
            },
            "new" => match first {
                Type::TypeValue(ty) => Type::Pointer(ty),
                _ => Type::Unresolved,
            },
            "append" => match first {
                Type::Untyped(_) => Type::Unresolved,
                other => other,
            },
            "min" | "max" => types
                .iter()
                .find(|t| !t.is_untyped())
                .cloned()
                .unwrap_or_else(|| {
                    types.iter().fold(Type::Untyped(UntypedKind::Int), |acc, t| match (acc, t) {
                        (Type::Untyped(a), Type::Untyped(b)) => Type::Untyped(a.max(*b)),
                        (acc, _) => acc,
                    })
                }),
            "complex" => Type::Basic(BasicKind::Complex128),
            "real" | "imag" => Type::Basic(BasicKind::Float64),
            "recover" => Type::named("any"),
            _ => Type::Tuple(Vec::new()),
        }
    }

    fn unary_type(&mut self, op: UnaryOp, operand: &Expr, hint: Option<&Type>) -> Type {
        match op {
            UnaryOp::Addr => {
                let inner_hint = match hint {
                    Some(Type::Pointer(inner)) => Some(inner.as_ref().clone()),
                    _ => None,
                };
                let ty = self.check_expr_hint(operand, inner_hint.as_ref());
                Type::Pointer(Box::new(ty.default_type()))
            }
            UnaryOp::Deref => match self.check_expr(operand) {
                Type::TypeValue(inner) => Type::TypeValue(Box::new(Type::Pointer(inner))),
                other => match self.underlying(&other) {
                    Type::Pointer(inner) => *inner,
                    _ => Type::Unresolved,
                },
            },
            UnaryOp::Recv => {
                let chan = self.check_expr(operand);
                match self.underlying(&chan) {
                    Type::Chan { elem, .. } => *elem,
                    _ => Type::Unresolved,
                }
            }
            _ => self.check_expr(operand),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::checker::{check, TypeInfo};
    use crate::parse;

    /// Types of every expression statement `_ = e` in `main`, in order.
    fn blank_assign_types(source: &str) -> Vec<String> {
        let file = parse(source).unwrap();
        let info: TypeInfo = check(&file).unwrap();
        let main = file.funcs().find(|f| f.name.name == "main").unwrap();
        main.body
            .as_ref()
            .unwrap()
            .stmts
            .iter()
            .filter_map(|s| match s {
                Stmt::Assign(a) if a.lhs[0].as_ident() == Some("_") => {
                    Some(info.type_of(a.rhs[0].id).map(|t| t.to_string()).unwrap_or_default())
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_literal_and_operator_types() {
        let source = r#"package main
func main() {
	x := 2.5
	_ = 1
	_ = x * 2
	_ = "a" + "b"
	_ = 'c'
	_ = x > 1
	_ = []int{1, 2}
	_ = map[string][]int{}
}
"#;
        assert_eq!(
            blank_assign_types(source),
            vec!["int", "float64", "string", "rune", "bool", "[]int", "map[string][]int"]
        );
    }

    #[test]
    fn test_untyped_flag_is_kept() {
        let source = "package main\nconst N = 3\nfunc main() {\n\tx := 1\n\t_ = N\n\t_ = x\n}\n";
        let file = parse(source).unwrap();
        let info = check(&file).unwrap();
        let main = file.funcs().next().unwrap();
        let stmts = &main.body.as_ref().unwrap().stmts;
        let rhs = |i: usize| match &stmts[i] {
            Stmt::Assign(a) => a.rhs[0].id,
            _ => unreachable!(),
        };
        assert!(info.is_untyped(rhs(1)));
        assert!(!info.is_untyped(rhs(2)));
        assert_eq!(info.type_of(rhs(1)).unwrap().to_string(), "int");
        assert_eq!(info.use_of(rhs(1)), Some("N"));
        assert_eq!(info.use_of(rhs(2)), None);
    }

    #[test]
    fn test_generic_call_result_is_instantiated() {
        let source = r#"package main
func Map[T, R any](s []T, f func(T) R) []R {
	out := make([]R, 0, len(s))
	for _, v := range s {
		out = append(out, f(v))
	}
	return out
}
func Max[T int | float64](a, b T) T {
	if a > b {
		return a
	}
	return b
}
func show(n int) string { return "" }
func main() {
	_ = Map([]int{1}, show)
	_ = Max(1, 2.5)
	_ = Max[int](1, 2)
}
"#;
        assert_eq!(blank_assign_types(source), vec!["[]string", "float64", "int"]);
    }

    #[test]
    fn test_struct_fields_methods_and_generic_types() {
        let source = r#"package main
type Node struct {
	Value int
	Next  *Node
}
type Stack[T any] struct {
	items []T
}
func (s *Stack[T]) Pop() T {
	v := s.items[len(s.items)-1]
	return v
}
type Named struct {
	*Node
	Name string
}
func main() {
	n := &Node{Value: 1}
	s := Stack[string]{}
	m := Named{Node: n}
	_ = n.Next
	_ = n.Value
	_ = s.Pop()
	_ = s.items
	_ = m.Value
}
"#;
        assert_eq!(
            blank_assign_types(source),
            vec!["*Node", "int", "string", "[]string", "int"]
        );
    }

    #[test]
    fn test_stdlib_members_and_conversions() {
        let source = r#"package main
import (
	"math"
	"strconv"
	"strings"
)
func main() {
	_ = strconv.Itoa(1)
	_ = strings.Fields("a b")
	_ = math.Pi
	_ = float64(3)
	_ = []byte("x")
	_ = len("abc")
}
"#;
        assert_eq!(
            blank_assign_types(source),
            vec!["string", "[]string", "float64", "float64", "[]byte", "int"]
        );
    }

    #[test]
    fn test_range_and_comma_ok() {
        let source = r#"package main
func main() {
	m := map[string]float64{}
	for k, v := range m {
		_ = k
		_ = v
	}
	v, ok := m["a"]
	_ = v
	_ = ok
	for i, r := range "héllo" {
		_, _ = i, r
	}
}
"#;
        let file = parse(source).unwrap();
        assert!(check(&file).is_ok());
        assert_eq!(blank_assign_types(source), vec!["float64", "bool"]);
    }

    #[test]
    fn test_func_literal_scope() {
        let source = r#"package main
func apply(f func(int) int, v int) int { return f(v) }
func main() {
	offset := 3
	_ = apply(func(n int) int { return n + offset }, 4)
}
"#;
        assert_eq!(blank_assign_types(source), vec!["int"]);
    }

    #[test]
    fn test_undefined_inside_func_literal() {
        let source = "package main\nfunc main() {\n\tf := func() int { return missing }\n\t_ = f\n}\n";
        let file = parse(source).unwrap();
        assert!(check(&file).is_err());
    }
}

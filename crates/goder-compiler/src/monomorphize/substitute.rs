//! Type Substitution
//!
//! Replaces type parameter names with the concrete types of a binding
//! inside a cloned declaration.

use crate::naming::Binding;
use goder_parser::ast::*;
use goder_parser::{parse_type_text, Span};
use rustc_hash::FxHashMap;

/// Substitutes type parameters with concrete types
///
/// Types written as `T` become the bound type. Expressions naming `T`
/// (conversions like `T(2)`, type arguments like `Stack[T]{}`) become the
/// bound type in expression position. Struct field names and selectors are
/// never touched.
#[derive(Debug, Clone)]
pub struct TypeSubstitution {
    mappings: FxHashMap<String, TypeExpr>,
}

impl TypeSubstitution {
    /// Build a substitution from a binding, parsing each bound type once.
    pub fn new(binding: &Binding) -> Self {
        let mappings = binding
            .iter()
            .map(|(param, text)| {
                let ty = match parse_type_text(text) {
                    Ok(mut ty) => {
                        clear_spans(&mut ty);
                        ty
                    }
                    Err(err) => {
                        tracing::warn!(%param, %text, %err, "bound type does not parse, using it verbatim");
                        TypeExpr::named(text.clone())
                    }
                };
                (param.clone(), ty)
            })
            .collect();
        Self { mappings }
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// The concrete type for a type parameter name, if bound.
    pub fn apply(&self, name: &str) -> Option<&TypeExpr> {
        self.mappings.get(name)
    }

    pub fn apply_func(&self, func: &mut FuncDecl) {
        if !self.is_empty() {
            self.visitor().visit_func_decl_mut(func);
        }
    }

    pub fn apply_type_spec(&self, spec: &mut TypeSpec) {
        if !self.is_empty() {
            self.visitor().visit_type_spec_mut(spec);
        }
    }

    fn visitor(&self) -> Substitute<'_> {
        Substitute { subst: self }
    }
}

struct Substitute<'a> {
    subst: &'a TypeSubstitution,
}

impl VisitorMut for Substitute<'_> {
    fn visit_type_expr_mut(&mut self, ty: &mut TypeExpr) {
        if let TypeExpr::Named(id) = ty {
            if let Some(concrete) = self.subst.apply(&id.name) {
                *ty = concrete.clone();
            }
            return;
        }
        walk_type_expr_mut(self, ty);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        if let ExprKind::Ident(name) = &expr.kind {
            if let Some(concrete) = self.subst.apply(name) {
                expr.kind = match concrete {
                    TypeExpr::Named(id) => ExprKind::Ident(id.name.clone()),
                    other => ExprKind::Type(other.clone()),
                };
            }
            return;
        }
        walk_expr_mut(self, expr);
    }
}

/// Reset positions inside a type parsed from text, so the formatter does
/// not take them for source lines.
fn clear_spans(ty: &mut TypeExpr) {
    struct Clear;

    impl VisitorMut for Clear {
        fn visit_type_expr_mut(&mut self, ty: &mut TypeExpr) {
            match ty {
                TypeExpr::Named(id) => id.span = Span::dummy(),
                TypeExpr::Qualified { package, name } => {
                    package.span = Span::dummy();
                    name.span = Span::dummy();
                }
                _ => {}
            }
            walk_type_expr_mut(self, ty);
        }

        fn visit_expr_mut(&mut self, expr: &mut Expr) {
            expr.span = Span::dummy();
            walk_expr_mut(self, expr);
        }
    }

    Clear.visit_type_expr_mut(ty);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(pairs: &[(&str, &str)]) -> Binding {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn substituted(source: &str, pairs: &[(&str, &str)]) -> String {
        let mut file = goder_parser::parse(source).unwrap();
        let subst = TypeSubstitution::new(&binding(pairs));
        for decl in &mut file.decls {
            match decl {
                Decl::Func(func) => {
                    func.type_params.clear();
                    subst.apply_func(func);
                }
                Decl::Type(spec) => {
                    spec.type_params.clear();
                    subst.apply_type_spec(spec);
                }
                _ => {}
            }
        }
        goder_fmt::render(&file)
    }

    #[test]
    fn test_substitute_types_and_conversions() {
        let out = substituted(
            "package main

func IsPrime[T Integer](x T) bool {
	for i := T(2); i <= x; i++ {
		if x%i == 0 {
			return false
		}
	}
	return true
}
",
            &[("T", "int8")],
        );
        assert!(out.contains("func IsPrime(x int8) bool {"));
        assert!(out.contains("i := int8(2)"));
    }

    #[test]
    fn test_substitute_compound_type_in_expression() {
        let out = substituted(
            "package main

func Wrap[T any](x T) []T {
	return []T{T(x)}
}
",
            &[("T", "[]byte")],
        );
        assert!(out.contains("func Wrap(x []byte) [][]byte {"));
        assert!(out.contains("[][]byte{[]byte(x)}"));
    }

    #[test]
    fn test_field_names_untouched() {
        let out = substituted(
            "package main

type Box[T any] struct {
	T T
}

func Get[T any](b Box[T]) T {
	return b.T
}
",
            &[("T", "string")],
        );
        assert!(out.contains("T string"));
        assert!(out.contains("return b.T"));
        assert!(out.contains("b Box[string]"));
    }

    #[test]
    fn test_unparsable_binding_used_verbatim() {
        let subst = TypeSubstitution::new(&binding(&[("T", "not a type")]));
        assert_eq!(subst.apply("T"), Some(&TypeExpr::named("not a type")));
    }
}

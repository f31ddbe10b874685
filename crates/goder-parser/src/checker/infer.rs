//! Type argument inference for generic calls
//!
//! Unifies declared parameter types against argument types. Typed
//! arguments take precedence over untyped constants: `Max(3, x)` with
//! `x float64` infers `float64`, not `int`.

use super::ty::{FuncType, Type, UntypedKind};
use rustc_hash::FxHashMap;

/// Type parameter bindings collected while unifying one call.
#[derive(Debug, Default)]
pub struct Inference {
    subst: FxHashMap<String, Type>,
    /// Bindings that came only from untyped constants.
    weak: FxHashMap<String, UntypedKind>,
}

impl Inference {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record what `arg` implies for the type parameters in `param`.
    pub fn unify(&mut self, param: &Type, arg: &Type, underlying: &dyn Fn(&Type) -> Type) {
        match param {
            Type::TypeParam(name) => self.bind(name, arg),
            Type::Pointer(p) => {
                if let Type::Pointer(a) = underlying_or_self(arg, underlying) {
                    self.unify(p, &a, underlying);
                }
            }
            Type::Slice(p) => {
                if let Type::Slice(a) = underlying_or_self(arg, underlying) {
                    self.unify(p, &a, underlying);
                }
            }
            Type::Array { elem: p, .. } => {
                if let Type::Array { elem: a, .. } = underlying_or_self(arg, underlying) {
                    self.unify(p, &a, underlying);
                }
            }
            Type::Chan { elem: p, .. } => {
                if let Type::Chan { elem: a, .. } = underlying_or_self(arg, underlying) {
                    self.unify(p, &a, underlying);
                }
            }
            Type::Map { key, value } => {
                if let Type::Map {
                    key: arg_key,
                    value: arg_value,
                } = underlying_or_self(arg, underlying)
                {
                    self.unify(key, &arg_key, underlying);
                    self.unify(value, &arg_value, underlying);
                }
            }
            Type::Func(p) => {
                if let Type::Func(a) = underlying_or_self(arg, underlying) {
                    for (pp, ap) in p.params.iter().zip(a.params.iter()) {
                        self.unify(pp, ap, underlying);
                    }
                    for (pr, ar) in p.results.iter().zip(a.results.iter()) {
                        self.unify(pr, ar, underlying);
                    }
                }
            }
            Type::Named { name, args } => {
                if let Type::Named {
                    name: arg_name,
                    args: arg_args,
                } = arg
                {
                    if name == arg_name {
                        for (p, a) in args.iter().zip(arg_args.iter()) {
                            self.unify(p, a, underlying);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn bind(&mut self, name: &str, arg: &Type) {
        match arg {
            Type::Unresolved | Type::Untyped(UntypedKind::Nil) => {}
            Type::Untyped(kind) => {
                if let Some(previous) = self.weak.get(name).copied() {
                    let merged = previous.max(*kind);
                    self.weak.insert(name.to_string(), merged);
                    self.subst
                        .insert(name.to_string(), Type::Untyped(merged).default_type());
                } else if !self.subst.contains_key(name) {
                    self.weak.insert(name.to_string(), *kind);
                    self.subst.insert(name.to_string(), arg.default_type());
                }
            }
            typed => {
                if !self.subst.contains_key(name) || self.weak.remove(name).is_some() {
                    self.subst.insert(name.to_string(), typed.clone());
                }
            }
        }
    }

    pub fn into_subst(self) -> FxHashMap<String, Type> {
        self.subst
    }
}

fn underlying_or_self(ty: &Type, underlying: &dyn Fn(&Type) -> Type) -> Type {
    match ty {
        Type::Named { .. } => underlying(ty),
        other => other.clone(),
    }
}

/// Instantiate a generic function type from the types of the call
/// arguments.
pub fn instantiate(
    func: &FuncType,
    args: &[Type],
    ellipsis: bool,
    underlying: &dyn Fn(&Type) -> Type,
) -> FuncType {
    let mut inference = Inference::new();
    let fixed = if func.variadic && !ellipsis {
        func.params.len().saturating_sub(1)
    } else {
        func.params.len()
    };
    for (i, arg) in args.iter().enumerate() {
        let param = if i < fixed {
            func.params.get(i)
        } else {
            match func.params.last() {
                Some(Type::Slice(elem)) => Some(elem.as_ref()),
                other => other,
            }
        };
        if let Some(param) = param {
            inference.unify(param, arg, underlying);
        }
    }
    func.substitute(&inference.into_subst())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::ty::BasicKind;

    fn t(name: &str) -> Type {
        Type::TypeParam(name.to_string())
    }

    fn int() -> Type {
        Type::Basic(BasicKind::Int)
    }

    fn identity(ty: &Type) -> Type {
        ty.clone()
    }

    #[test]
    fn test_typed_argument_beats_untyped() {
        let func = FuncType {
            params: vec![t("T"), t("T")],
            results: vec![t("T")],
            variadic: false,
        };
        let out = instantiate(
            &func,
            &[Type::Untyped(UntypedKind::Int), Type::Basic(BasicKind::Float64)],
            false,
            &identity,
        );
        assert_eq!(out.results[0].to_string(), "float64");
    }

    #[test]
    fn test_untyped_arguments_merge() {
        let func = FuncType {
            params: vec![t("T"), t("T")],
            results: vec![t("T")],
            variadic: false,
        };
        let out = instantiate(
            &func,
            &[Type::Untyped(UntypedKind::Int), Type::Untyped(UntypedKind::Float)],
            false,
            &identity,
        );
        assert_eq!(out.results[0].to_string(), "float64");
    }

    #[test]
    fn test_structural_unification() {
        // func Map[T, R any](s []T, f func(T) R) []R
        let func = FuncType {
            params: vec![
                Type::Slice(Box::new(t("T"))),
                Type::Func(FuncType {
                    params: vec![t("T")],
                    results: vec![t("R")],
                    variadic: false,
                }),
            ],
            results: vec![Type::Slice(Box::new(t("R")))],
            variadic: false,
        };
        let args = [
            Type::Slice(Box::new(int())),
            Type::Func(FuncType {
                params: vec![int()],
                results: vec![Type::Basic(BasicKind::String)],
                variadic: false,
            }),
        ];
        let out = instantiate(&func, &args, false, &identity);
        assert_eq!(out.results[0].to_string(), "[]string");
    }

    #[test]
    fn test_variadic_arguments() {
        let func = FuncType {
            params: vec![Type::Slice(Box::new(t("T")))],
            results: vec![t("T")],
            variadic: true,
        };
        let out = instantiate(&func, &[int(), int(), int()], false, &identity);
        assert_eq!(out.results[0].to_string(), "int");
    }
}

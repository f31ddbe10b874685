//! Call-site type binding
//!
//! Works out which concrete type each type parameter of a generic function
//! stands for at one call site, positionally, one parameter per argument:
//!
//! - A function literal passed for a function-typed parameter is matched
//!   against the declared function type signature by signature, position by
//!   position, without consulting the checker.
//! - Any other argument is typed by the checker, and the declared parameter
//!   type and the argument type are compared as text. The common prefix is
//!   cut off both (`[]T` against `[]int` leaves `T` and `int`), and what
//!   remains of the declared type binds if it is a type parameter.
//!
//! The textual comparison is a heuristic. It misfires whenever text follows
//! the type parameter: `map[K]V` against `map[string]int` leaves `K]V` and
//! `string]int`, and `func(T) bool` against `func(int) bool` leaves
//! `T) bool`. Neither binds, so the call is reported as incomplete.
//! [`TypeMatching::Refined`] also cuts the common suffix, which handles the
//! second case.

use crate::config::TypeMatching;
use crate::naming::Binding;
use goder_parser::ast::*;
use goder_parser::{Type, TypeInfo};
use rustc_hash::FxHashSet;

/// How the checker spells a type it could not resolve.
const INVALID: &str = "invalid type";

/// Result of binding one call site.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindOutcome {
    pub binding: Binding,
    /// Type parameters the declaration uses that stayed unbound.
    pub missing: Vec<String>,
}

impl BindOutcome {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Binds the type parameters of one generic function.
pub struct CallSiteBinder<'a> {
    decl: &'a FuncDecl,
    info: &'a TypeInfo,
    params: Vec<String>,
    matching: TypeMatching,
    binding: Binding,
    /// Entries bound from untyped constants, which typed arguments replace.
    weak: FxHashSet<String>,
}

impl<'a> CallSiteBinder<'a> {
    pub fn new(decl: &'a FuncDecl, info: &'a TypeInfo) -> Self {
        Self {
            decl,
            info,
            params: type_param_names(&decl.type_params),
            matching: TypeMatching::default(),
            binding: Binding::new(),
            weak: FxHashSet::default(),
        }
    }

    pub fn matching(mut self, matching: TypeMatching) -> Self {
        self.matching = matching;
        self
    }

    /// Bind type parameters positionally from explicit type arguments
    /// (`Map[int, string]`).
    pub fn explicit(&mut self, type_args: &[TypeExpr]) {
        for (param, arg) in self.params.clone().iter().zip(type_args) {
            self.bind(param, arg.to_string(), false);
        }
    }

    /// Bind from the arguments of a call.
    pub fn arguments(&mut self, args: &[Expr], ellipsis: bool) {
        let declared: Vec<TypeExpr> = self.decl.sig.param_types().into_iter().cloned().collect();
        let variadic = self.decl.sig.is_variadic();

        for (i, arg) in args.iter().enumerate() {
            let param_ty = match declared.get(i) {
                Some(TypeExpr::Ellipsis(elem)) if variadic && i + 1 == declared.len() => {
                    variadic_param(elem, ellipsis)
                }
                Some(ty) => ty.clone(),
                None => match declared.last() {
                    Some(TypeExpr::Ellipsis(elem)) if variadic => elem.as_ref().clone(),
                    _ => break,
                },
            };
            self.argument(&param_ty, arg);
        }
    }

    fn argument(&mut self, param_ty: &TypeExpr, arg: &Expr) {
        if let (TypeExpr::Func(declared), ExprKind::FuncLit { sig, .. }) = (param_ty, &arg.unparen().kind) {
            self.lambda(declared, sig);
            return;
        }

        let Some(ty) = self.info.type_of(arg.id) else {
            tracing::debug!(param = %param_ty, "argument has no type");
            return;
        };
        if ty.is_unresolved() || ty.is_untyped() || matches!(ty, Type::Tuple(_)) {
            // Untyped nil, or a member of a package the checker does not load.
            return;
        }
        let actual = ty.to_string();
        if actual.contains(INVALID) {
            return;
        }
        let weak = self.info.is_untyped(arg.id);
        self.bind_text(&param_ty.to_string(), &actual, weak);
    }

    /// Match a function literal's written signature against the declared
    /// function type.
    fn lambda(&mut self, declared: &Signature, literal: &Signature) {
        let pairs = declared
            .param_types()
            .into_iter()
            .zip(literal.param_types())
            .chain(declared.result_types().into_iter().zip(literal.result_types()));
        for (d, l) in pairs {
            self.bind_text(&d.to_string(), &l.to_string(), false);
        }
    }

    /// Bind by cutting the common prefix off the declared and the actual
    /// type text.
    pub fn bind_text(&mut self, declared: &str, actual: &str, weak: bool) {
        if declared == actual {
            return;
        }
        let (key, value) = match self.matching {
            TypeMatching::Prefix => {
                let prefix = common_prefix_len(declared, actual);
                (&declared[prefix..], &actual[prefix..])
            }
            TypeMatching::Refined => {
                let prefix = ident_prefix_len(declared, actual);
                let (key, value) = (&declared[prefix..], &actual[prefix..]);
                if self.is_param(key) {
                    (key, value)
                } else {
                    let suffix = ident_suffix_len(key, value);
                    (&key[..key.len() - suffix], &value[..value.len() - suffix])
                }
            }
        };
        if self.is_param(key) {
            self.bind(&key.to_string(), value.to_string(), weak);
        } else {
            tracing::debug!(%declared, %actual, %key, %value, "type text comparison bound nothing");
        }
    }

    fn bind(&mut self, param: &str, value: String, weak: bool) {
        if value.is_empty() {
            return;
        }
        match self.binding.get(param) {
            None => {}
            Some(_) if !self.weak.contains(param) => return,
            Some(existing) if weak && untyped_rank(existing) >= untyped_rank(&value) => return,
            Some(_) => {}
        }
        if weak {
            self.weak.insert(param.to_string());
        } else {
            self.weak.remove(param);
        }
        self.binding.insert(param.to_string(), value);
    }

    fn is_param(&self, name: &str) -> bool {
        self.params.iter().any(|p| p == name)
    }

    /// The binding, without entries that map a parameter to its own name,
    /// and the parameters left unbound.
    pub fn finish(mut self) -> BindOutcome {
        self.binding.retain(|k, v| {
            let keep = k != v;
            if !keep {
                tracing::debug!(param = %k, "dropping identity binding");
            }
            keep
        });
        let used = used_names(self.decl);
        let missing = self
            .params
            .iter()
            .filter(|p| !self.binding.contains_key(*p) && used.contains(*p))
            .cloned()
            .collect();
        BindOutcome {
            binding: self.binding,
            missing,
        }
    }
}

fn variadic_param(elem: &TypeExpr, ellipsis: bool) -> TypeExpr {
    if ellipsis {
        TypeExpr::Slice(Box::new(elem.clone()))
    } else {
        elem.clone()
    }
}

/// Order in which untyped constant kinds win: `Min(1, 2.5)` is a float64.
fn untyped_rank(ty: &str) -> u8 {
    match ty {
        "int" => 1,
        "rune" => 2,
        "float64" => 3,
        "complex128" => 4,
        _ => 0,
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Byte length of the common prefix of `a` and `b`.
fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .map(|(c, _)| c.len_utf8())
        .sum()
}

/// Byte length of the common suffix of `a` and `b`.
fn common_suffix_len(a: &str, b: &str) -> usize {
    a.chars()
        .rev()
        .zip(b.chars().rev())
        .take_while(|(x, y)| x == y)
        .map(|(c, _)| c.len_utf8())
        .sum()
}

/// Common prefix that never ends inside an identifier (`[]T` against
/// `[]Tree` shares `[]`, not `[]T`).
fn ident_prefix_len(a: &str, b: &str) -> usize {
    let mut n = common_prefix_len(a, b);
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let continues = |s: &[u8], n: usize| s.get(n).is_some_and(|&c| is_ident_byte(c));
    while n > 0 && is_ident_byte(a[n - 1]) && (continues(a, n) || continues(b, n)) {
        n -= 1;
    }
    n
}

/// Common suffix that never starts inside an identifier.
fn ident_suffix_len(a: &str, b: &str) -> usize {
    let mut n = common_suffix_len(a, b);
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let continues = |s: &[u8], n: usize| n < s.len() && is_ident_byte(s[s.len() - n - 1]);
    while n > 0 && is_ident_byte(a[a.len() - n]) && (continues(a, n) || continues(b, n)) {
        n -= 1;
    }
    n
}

/// Every name a declaration refers to, outside its type parameter list.
fn used_names(decl: &FuncDecl) -> FxHashSet<String> {
    struct Names(FxHashSet<String>);

    impl Visitor for Names {
        fn visit_expr(&mut self, expr: &Expr) {
            if let Some(name) = expr.as_ident() {
                self.0.insert(name.to_string());
            }
            walk_expr(self, expr);
        }

        fn visit_type_expr(&mut self, ty: &TypeExpr) {
            if let TypeExpr::Named(id) = ty {
                self.0.insert(id.name.clone());
            }
            walk_type_expr(self, ty);
        }
    }

    let mut names = Names(FxHashSet::default());
    if let Some(recv) = &decl.recv {
        names.visit_type_expr(&recv.ty);
    }
    names.visit_signature(&decl.sig);
    if let Some(body) = &decl.body {
        names.visit_block(body);
    }
    names.0
}

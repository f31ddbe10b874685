//! Call Site Rewriting
//!
//! Walks a concrete declaration and points every use of a generic function
//! or type at a specialization, requesting the specialization from the
//! [`MonomorphizationContext`] as it goes.

use super::bind::CallSiteBinder;
use super::classify::Classification;
use super::{DeclOrigin, MonomorphizationContext};
use goder_parser::ast::*;
use goder_parser::parser::expr_to_type;
use goder_parser::{Span, TypeInfo};
use rustc_hash::FxHashSet;

/// Rewrites generic uses inside one concrete declaration
pub struct CallSiteRewriter<'a> {
    classes: &'a Classification,
    info: &'a TypeInfo,
    ctx: &'a mut MonomorphizationContext,
    origin: DeclOrigin,
    /// Names bound locally in the declaration, which shadow package-level
    /// generics.
    locals: FxHashSet<String>,
}

impl<'a> CallSiteRewriter<'a> {
    pub fn new(
        classes: &'a Classification,
        info: &'a TypeInfo,
        ctx: &'a mut MonomorphizationContext,
        origin: DeclOrigin,
        decl: &Decl,
    ) -> Self {
        Self {
            classes,
            info,
            ctx,
            origin,
            locals: goder_fmt::local_names(decl),
        }
    }

    /// The generic function `expr` refers to, if any.
    fn generic_function(&self, expr: &Expr) -> Option<String> {
        let name = expr.as_ident()?;
        let generic = self.classes.function(name)?;
        if generic.decl.is_method() {
            return None;
        }
        let refers = match self.info.use_of(expr.id) {
            Some(used) => used == name,
            None => !self.locals.contains(name),
        };
        refers.then(|| name.to_string())
    }

    fn is_generic_type(&self, name: &str) -> bool {
        self.classes.generic_type(name).is_some() && !self.locals.contains(name)
    }

    /// Callee name and explicit type arguments of a call to a generic
    /// function: `Map(...)` or `Map[int, string](...)`.
    fn generic_callee(&self, func: &Expr) -> Option<(String, Vec<TypeExpr>)> {
        let func = func.unparen();
        match &func.kind {
            ExprKind::Ident(_) => self.generic_function(func).map(|name| (name, Vec::new())),
            ExprKind::Index { base, indices } => {
                let name = self.generic_function(base.unparen())?;
                Some((name, type_arguments(indices)))
            }
            _ => None,
        }
    }

    /// Bind and request a specialization of `key`.
    fn instantiate(
        &mut self,
        key: &str,
        type_args: &[TypeExpr],
        call: Option<(&[Expr], bool)>,
        span: Span,
    ) -> Option<String> {
        let classes = self.classes;
        let generic = classes.function(key)?;
        let mut binder = CallSiteBinder::new(&generic.decl, self.info).matching(self.ctx.matching);
        binder.explicit(type_args);
        if let Some((args, ellipsis)) = call {
            binder.arguments(args, ellipsis);
        }
        let outcome = binder.finish();
        let name = self
            .ctx
            .request_function(key, outcome, generic.in_input, self.origin, span);
        Some(name)
    }
}

fn type_arguments(indices: &[Expr]) -> Vec<TypeExpr> {
    indices
        .iter()
        .filter_map(|index| match expr_to_type(index) {
            Ok(ty) => Some(ty),
            Err(err) => {
                tracing::debug!(%err, "type argument is not a type");
                None
            }
        })
        .collect()
}

impl VisitorMut for CallSiteRewriter<'_> {
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        let span = expr.span;
        match &mut expr.kind {
            ExprKind::Call {
                func,
                args,
                ellipsis,
            } => {
                if let Some((key, type_args)) = self.generic_callee(func) {
                    if let Some(name) = self.instantiate(&key, &type_args, Some((args, *ellipsis)), span) {
                        tracing::debug!(callee = %key, specialization = %name, "rewrote call site");
                        func.kind = ExprKind::Ident(name);
                    }
                }
            }
            ExprKind::Index { base, indices } => {
                // A generic function used as a value: `f := Map[int, string]`.
                if let Some(key) = self.generic_function(base.unparen()) {
                    let type_args = type_arguments(indices);
                    if let Some(name) = self.instantiate(&key, &type_args, None, span) {
                        expr.kind = ExprKind::Ident(name);
                    }
                    return;
                }

                let generic_type = base
                    .as_ident()
                    .filter(|name| self.is_generic_type(name))
                    .map(str::to_string);
                if let Some(type_name) = generic_type {
                    walk_expr_mut(self, expr);
                    let ExprKind::Index { indices, .. } = &expr.kind else {
                        return;
                    };
                    let args = type_arguments(indices);
                    let name = self.ctx.request_type(self.classes, &type_name, &args);
                    expr.kind = ExprKind::Ident(name);
                    return;
                }
            }
            _ => {}
        }
        walk_expr_mut(self, expr);
    }

    fn visit_type_expr_mut(&mut self, ty: &mut TypeExpr) {
        walk_type_expr_mut(self, ty);
        if let TypeExpr::Instantiated { base, args } = ty {
            if let TypeExpr::Named(id) = base.as_ref() {
                if self.is_generic_type(&id.name) {
                    let span = id.span;
                    let name = self.ctx.request_type(self.classes, &id.name, args);
                    *ty = TypeExpr::Named(Ident::new(name, span));
                }
            }
        }
    }
}

//! Qualified reference rewriting
//!
//! `lo.Map(xs, f)` becomes `Map(xs, f)` and `set.Set[int]` becomes
//! `Set[int]` once the declarations behind them are part of the unit.
//! Inside inlined code, references to the owning package's own top-level
//! names are rewritten too, so renamed declarations stay connected.

use crate::error::{TransformError, TransformResult};
use goder_parser::ast::*;
use rustc_hash::{FxHashMap, FxHashSet};

/// Supplies the output names of external symbols, pulling the declarations
/// behind them into the unit.
pub trait SymbolResolver {
    /// Output name of `symbol` from the package `import_path`.
    fn qualified(&mut self, import_path: &str, symbol: &str) -> TransformResult<String>;

    /// Output name of `name` if it is a top-level name of the package the
    /// code being rewritten belongs to.
    fn unqualified(&mut self, name: &str) -> TransformResult<Option<String>>;
}

/// Rewrites the references of one declaration
pub struct QualifiedRewriter<'a, R: SymbolResolver> {
    /// Local name -> import path of inlined packages.
    aliases: &'a FxHashMap<String, String>,
    /// Names declared in the enclosing blocks, innermost last.
    scopes: Vec<FxHashSet<String>>,
    resolver: &'a mut R,
    error: Option<TransformError>,
    rewritten: usize,
}

impl<'a, R: SymbolResolver> QualifiedRewriter<'a, R> {
    pub fn new(aliases: &'a FxHashMap<String, String>, resolver: &'a mut R) -> Self {
        Self {
            aliases,
            scopes: Vec::new(),
            resolver,
            error: None,
            rewritten: 0,
        }
    }

    /// Rewrite `decl` and report how many references changed.
    pub fn rewrite(mut self, decl: &mut Decl) -> TransformResult<usize> {
        self.visit_decl_mut(decl);
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.rewritten),
        }
    }

    fn is_local(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains(name))
    }

    fn declare(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string());
        }
    }

    fn declare_fields(&mut self, fields: &[Field]) {
        for name in fields.iter().flat_map(|f| &f.names) {
            self.declare(&name.name);
        }
    }

    fn package_of(&self, qualifier: &str) -> Option<&'a str> {
        if self.is_local(qualifier) {
            return None;
        }
        let aliases: &'a FxHashMap<String, String> = self.aliases;
        aliases.get(qualifier).map(String::as_str)
    }

    fn record<T>(&mut self, result: TransformResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.error.get_or_insert(err);
                None
            }
        }
    }

    fn qualified(&mut self, import_path: &str, symbol: &str) -> Option<String> {
        let result = self.resolver.qualified(import_path, symbol);
        let name = self.record(result)?;
        self.rewritten += 1;
        Some(name)
    }

    fn unqualified(&mut self, name: &str) -> Option<String> {
        if self.is_local(name) {
            return None;
        }
        let result = self.resolver.unqualified(name);
        let out = self.record(result).flatten()?;
        if out != name {
            self.rewritten += 1;
        }
        Some(out)
    }

    /// Composite literal elements, leaving struct field keys alone.
    fn literal_elements(&mut self, ty: Option<&TypeExpr>, elems: &mut [Expr]) {
        let keyed_by_value = matches!(
            ty,
            Some(TypeExpr::Map { .. } | TypeExpr::Slice(_) | TypeExpr::Array { .. })
        );
        for elem in elems {
            let field_key = !keyed_by_value
                && matches!(&elem.kind, ExprKind::KeyValue { key, .. } if key.as_ident().is_some());
            if !field_key {
                self.visit_expr_mut(elem);
            } else if let ExprKind::KeyValue { value, .. } = &mut elem.kind {
                self.visit_expr_mut(value);
            }
        }
    }

    /// Statements of one case clause, which form their own block.
    fn clause(&mut self, binding: Option<&Ident>, body: &mut [Stmt]) {
        self.scopes.push(FxHashSet::default());
        if let Some(binding) = binding {
            self.declare(&binding.name);
        }
        for stmt in body {
            self.visit_stmt_mut(stmt);
        }
        self.scopes.pop();
    }
}

impl<R: SymbolResolver> VisitorMut for QualifiedRewriter<'_, R> {
    fn visit_func_decl_mut(&mut self, func: &mut FuncDecl) {
        let mut scope: FxHashSet<String> = type_param_names(&func.type_params).into_iter().collect();
        if let Some(recv) = &func.recv {
            scope.extend(recv.type_param_names());
            if let Some(name) = &recv.name {
                scope.insert(name.name.clone());
            }
        }
        self.scopes.push(scope);
        self.declare_fields(&func.sig.params);
        self.declare_fields(&func.sig.results);
        walk_func_decl_mut(self, func);
        self.scopes.pop();
    }

    fn visit_type_spec_mut(&mut self, spec: &mut TypeSpec) {
        self.scopes.push(type_param_names(&spec.type_params).into_iter().collect());
        walk_type_spec_mut(self, spec);
        self.scopes.pop();
    }

    fn visit_block_mut(&mut self, block: &mut Block) {
        self.scopes.push(FxHashSet::default());
        walk_block_mut(self, block);
        self.scopes.pop();
    }

    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        if self.error.is_some() {
            return;
        }
        match stmt {
            Stmt::Assign(assign) if assign.op == AssignOp::Define => {
                for value in &mut assign.rhs {
                    self.visit_expr_mut(value);
                }
                for name in assign.lhs.iter().filter_map(Expr::as_ident) {
                    self.declare(name);
                }
            }
            Stmt::Decl(Decl::Var(group) | Decl::Const(group)) => {
                for spec in &mut group.specs {
                    self.visit_value_spec_mut(spec);
                    for name in &spec.names {
                        self.declare(&name.name);
                    }
                }
            }
            Stmt::Decl(Decl::Type(spec)) => {
                self.declare(&spec.name.name);
                self.visit_type_spec_mut(spec);
            }
            Stmt::Range(range) if range.define => {
                self.visit_expr_mut(&mut range.expr);
                self.scopes.push(FxHashSet::default());
                for name in [&range.key, &range.value].into_iter().flatten().filter_map(Expr::as_ident) {
                    self.declare(name);
                }
                self.visit_block_mut(&mut range.body);
                self.scopes.pop();
            }
            Stmt::Switch(switch) => {
                self.scopes.push(FxHashSet::default());
                if let Some(init) = &mut switch.init {
                    self.visit_stmt_mut(init);
                }
                if let Some(tag) = &mut switch.tag {
                    self.visit_expr_mut(tag);
                }
                for case in &mut switch.cases {
                    for expr in case.exprs.iter_mut().flatten() {
                        self.visit_expr_mut(expr);
                    }
                    self.clause(None, &mut case.body);
                }
                self.scopes.pop();
            }
            Stmt::TypeSwitch(switch) => {
                self.scopes.push(FxHashSet::default());
                if let Some(init) = &mut switch.init {
                    self.visit_stmt_mut(init);
                }
                self.visit_expr_mut(&mut switch.expr);
                for case in &mut switch.cases {
                    for ty in case.types.iter_mut().flatten() {
                        self.visit_type_expr_mut(ty);
                    }
                    self.clause(switch.binding.as_ref(), &mut case.body);
                }
                self.scopes.pop();
            }
            Stmt::Select(select) => {
                for case in &mut select.cases {
                    self.scopes.push(FxHashSet::default());
                    if let Some(comm) = &mut case.comm {
                        self.visit_stmt_mut(comm);
                    }
                    self.clause(None, &mut case.body);
                    self.scopes.pop();
                }
            }
            Stmt::If(_) | Stmt::For(_) => {
                self.scopes.push(FxHashSet::default());
                walk_stmt_mut(self, stmt);
                self.scopes.pop();
            }
            _ => walk_stmt_mut(self, stmt),
        }
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        if self.error.is_some() {
            return;
        }
        match &mut expr.kind {
            ExprKind::Selector { base, field } => {
                let package = base.as_ident().and_then(|q| self.package_of(q));
                if let Some(import_path) = package {
                    let symbol = field.name.clone();
                    if let Some(name) = self.qualified(import_path, &symbol) {
                        expr.kind = ExprKind::Ident(name);
                    }
                    return;
                }
            }
            ExprKind::Ident(name) => {
                let name = name.clone();
                if let Some(out) = self.unqualified(&name) {
                    expr.kind = ExprKind::Ident(out);
                }
                return;
            }
            ExprKind::CompositeLit { ty, elems } => {
                if let Some(ty) = ty.as_mut() {
                    self.visit_type_expr_mut(ty);
                }
                self.literal_elements(ty.as_ref(), elems);
                return;
            }
            ExprKind::FuncLit { sig, body } => {
                self.visit_signature_mut(sig);
                self.scopes.push(FxHashSet::default());
                self.declare_fields(&sig.params);
                self.declare_fields(&sig.results);
                self.visit_block_mut(body);
                self.scopes.pop();
                return;
            }
            _ => {}
        }
        walk_expr_mut(self, expr);
    }

    fn visit_type_expr_mut(&mut self, ty: &mut TypeExpr) {
        if self.error.is_some() {
            return;
        }
        match ty {
            TypeExpr::Qualified { package, name } => {
                if let Some(import_path) = self.package_of(&package.name) {
                    let span = name.span;
                    let symbol = name.name.clone();
                    if let Some(out) = self.qualified(import_path, &symbol) {
                        *ty = TypeExpr::Named(Ident::new(out, span));
                    }
                }
            }
            TypeExpr::Named(id) => {
                let name = id.name.clone();
                if let Some(out) = self.unqualified(&name) {
                    id.name = out;
                }
            }
            _ => walk_type_expr_mut(self, ty),
        }
    }
}

//! Type checker for declarations and statements
//!
//! Checking runs in four passes over the file: imports, package-level
//! names, signatures and underlying types, then package-level values and
//! function bodies. Expression typing lives in `expr.rs`.

use super::error::CheckError;
use super::symbols::{universe_underlying, Object, ObjectKind, ScopeKind, SymbolTable};
use super::ty::{BasicKind, FuncType, StructField, Type, UntypedKind};
use super::TypeInfo;
use crate::ast::*;
use crate::token::Span;
use rustc_hash::FxHashMap;

/// A declared (named) type.
#[derive(Debug, Clone)]
pub(crate) struct NamedType {
    pub type_params: Vec<String>,
    pub underlying: Type,
    pub alias: bool,
}

/// An entry of the method table.
#[derive(Debug, Clone)]
pub(crate) struct Method {
    /// Type parameter names bound by the receiver (`T` in `Stack[T]`).
    pub recv_params: Vec<String>,
    pub sig: FuncType,
    pub pointer: bool,
}

/// Outcome of checking one file.
#[derive(Debug, Clone, Default)]
pub struct CheckResult {
    pub info: TypeInfo,
    pub errors: Vec<CheckError>,
}

/// Type checker state for one file.
pub struct TypeChecker {
    pub(super) table: SymbolTable,
    pub(super) named: FxHashMap<String, NamedType>,
    pub(super) methods: FxHashMap<String, FxHashMap<String, Method>>,
    /// Import alias to import path.
    pub(super) imports: FxHashMap<String, String>,
    pub(super) info: TypeInfo,
    pub(super) errors: Vec<CheckError>,
}

impl TypeChecker {
    pub fn new() -> Self {
        Self {
            table: SymbolTable::new(),
            named: FxHashMap::default(),
            methods: FxHashMap::default(),
            imports: FxHashMap::default(),
            info: TypeInfo::default(),
            errors: Vec::new(),
        }
    }

    /// Check a whole file.
    pub fn check_file(mut self, file: &SourceFile) -> CheckResult {
        self.declare_imports(file);
        self.collect(file);
        self.resolve_signatures(file);
        self.check_package_values(file);
        for decl in &file.decls {
            if let Decl::Func(func) = decl {
                self.check_func_body(func);
            }
        }
        CheckResult {
            info: self.info,
            errors: self.errors,
        }
    }

    pub(super) fn report(&mut self, error: CheckError) {
        if !self.errors.contains(&error) {
            self.errors.push(error);
        }
    }

    fn declare(&mut self, object: Object) {
        let name = object.name.clone();
        let span = object.span;
        if let Err(original) = self.table.define(object) {
            self.report(CheckError::DuplicateDeclaration {
                name,
                original,
                duplicate: span,
            });
        }
    }

    fn declare_imports(&mut self, file: &SourceFile) {
        for import in &file.imports {
            let local = import.local_name();
            if local == "_" || local == "." {
                continue;
            }
            self.imports.insert(local.clone(), import.path.clone());
            let mut object = Object::new(
                local,
                ObjectKind::Package,
                Type::Package(import.path.clone()),
                import.span,
            );
            object.package_level = true;
            self.declare(object);
        }
    }

    /// Enter every package-level name with a placeholder type.
    fn collect(&mut self, file: &SourceFile) {
        let mut method_spans: FxHashMap<String, Span> = FxHashMap::default();
        for decl in &file.decls {
            match decl {
                Decl::Func(func) if func.is_method() => {
                    let key = func.key();
                    if let Some(original) = method_spans.insert(key.clone(), func.name.span) {
                        self.report(CheckError::DuplicateDeclaration {
                            name: key,
                            original,
                            duplicate: func.name.span,
                        });
                    }
                }
                Decl::Func(func) => {
                    // init may be declared any number of times
                    if func.name.name == "init" {
                        continue;
                    }
                    let mut object = Object::new(
                        func.name.name.clone(),
                        ObjectKind::Func,
                        Type::Unresolved,
                        func.name.span,
                    );
                    object.type_params = type_param_names(&func.type_params);
                    object.package_level = true;
                    self.declare(object);
                }
                Decl::Type(spec) => {
                    let mut object = Object::new(
                        spec.name.name.clone(),
                        ObjectKind::TypeName,
                        Type::named(spec.name.name.clone()),
                        spec.name.span,
                    );
                    object.type_params = type_param_names(&spec.type_params);
                    object.package_level = true;
                    self.declare(object);
                }
                Decl::Var(group) | Decl::Const(group) => {
                    let kind = if matches!(decl, Decl::Var(_)) {
                        ObjectKind::Var
                    } else {
                        ObjectKind::Const
                    };
                    for spec in &group.specs {
                        for name in &spec.names {
                            let mut object =
                                Object::new(name.name.clone(), kind, Type::Unresolved, name.span);
                            object.package_level = true;
                            self.declare(object);
                        }
                    }
                }
            }
        }
    }

    /// Resolve underlying types, function signatures and the method table.
    fn resolve_signatures(&mut self, file: &SourceFile) {
        for decl in &file.decls {
            if let Decl::Type(spec) = decl {
                self.declare_named_type(spec);
            }
        }
        for decl in &file.decls {
            let Decl::Func(func) = decl else { continue };
            self.table.push_scope(ScopeKind::Function);
            let recv_params = self.declare_receiver_params(func);
            self.declare_type_params(&func.type_params, true);
            let sig = self.func_type(&func.sig);
            self.table.pop_scope();

            match &func.recv {
                Some(recv) => {
                    self.methods
                        .entry(recv.base_name().to_string())
                        .or_default()
                        .insert(
                            func.name.name.clone(),
                            Method {
                                recv_params,
                                sig,
                                pointer: recv.is_pointer(),
                            },
                        );
                }
                None if func.name.name != "init" => {
                    self.table.set_package_type(&func.name.name, Type::Func(sig));
                }
                None => {}
            }
        }
    }

    fn declare_named_type(&mut self, spec: &TypeSpec) {
        self.table.push_scope(ScopeKind::Function);
        self.declare_type_params(&spec.type_params, true);
        let underlying = self.resolve_type(&spec.ty);
        self.table.pop_scope();
        self.named.insert(
            spec.name.name.clone(),
            NamedType {
                type_params: type_param_names(&spec.type_params),
                underlying,
                alias: spec.alias,
            },
        );
    }

    fn declare_type_params(&mut self, params: &[TypeParam], resolve_constraints: bool) {
        for group in params {
            for name in &group.names {
                self.table
                    .define(Object::new(
                        name.name.clone(),
                        ObjectKind::TypeParam,
                        Type::TypeParam(name.name.clone()),
                        name.span,
                    ))
                    .ok();
            }
        }
        if resolve_constraints {
            for group in params {
                self.resolve_type(&group.constraint);
            }
        }
    }

    fn declare_receiver_params(&mut self, func: &FuncDecl) -> Vec<String> {
        let Some(recv) = &func.recv else {
            return Vec::new();
        };
        let names = recv.type_param_names();
        for name in &names {
            self.table
                .define(Object::new(
                    name.clone(),
                    ObjectKind::TypeParam,
                    Type::TypeParam(name.clone()),
                    recv.span,
                ))
                .ok();
        }
        names
    }

    pub(super) fn func_type(&mut self, sig: &Signature) -> FuncType {
        FuncType {
            params: self.field_types(&sig.params),
            results: self.field_types(&sig.results),
            variadic: sig.is_variadic(),
        }
    }

    fn field_types(&mut self, fields: &[Field]) -> Vec<Type> {
        let mut out = Vec::new();
        for field in fields {
            let ty = self.resolve_type(&field.ty);
            for _ in 0..field.names.len().max(1) {
                out.push(ty.clone());
            }
        }
        out
    }

    fn check_package_values(&mut self, file: &SourceFile) {
        for decl in &file.decls {
            match decl {
                Decl::Var(group) => self.check_value_decl(group, ObjectKind::Var, false),
                Decl::Const(group) => self.check_value_decl(group, ObjectKind::Const, false),
                _ => {}
            }
        }
    }

    /// Type a `var` or `const` group. Local groups define their names in the
    /// current scope; package-level names were already entered by `collect`.
    fn check_value_decl(&mut self, group: &ValueDecl, kind: ObjectKind, local: bool) {
        let mut previous: Vec<Type> = Vec::new();
        for spec in &group.specs {
            // A const spec without values repeats the previous one.
            let repeated =
                kind == ObjectKind::Const && spec.values.is_empty() && spec.ty.is_none();
            let types = if repeated {
                (0..spec.names.len())
                    .map(|i| previous.get(i).cloned().unwrap_or(Type::Unresolved))
                    .collect()
            } else {
                self.spec_types(spec)
            };
            for (name, ty) in spec.names.iter().zip(types.iter()) {
                let ty = if kind == ObjectKind::Var {
                    ty.default_type()
                } else {
                    ty.clone()
                };
                if local {
                    self.table
                        .define(Object::new(name.name.clone(), kind, ty, name.span))
                        .ok();
                } else {
                    self.table.set_package_type(&name.name, ty);
                }
            }
            previous = types;
        }
    }

    fn spec_types(&mut self, spec: &ValueSpec) -> Vec<Type> {
        let declared = spec.ty.as_ref().map(|t| self.resolve_type(t));
        let values: Vec<Type> = spec
            .values
            .iter()
            .map(|v| self.check_expr_hint(v, declared.as_ref()))
            .collect();
        let values = spread_values(values, spec.names.len());
        (0..spec.names.len())
            .map(|i| match &declared {
                Some(ty) => ty.clone(),
                None => values.get(i).cloned().unwrap_or(Type::Unresolved),
            })
            .collect()
    }

    fn check_func_body(&mut self, func: &FuncDecl) {
        let Some(body) = &func.body else { return };
        self.table.push_scope(ScopeKind::Function);
        self.declare_receiver_params(func);
        self.declare_type_params(&func.type_params, false);
        if let Some(recv) = &func.recv {
            if let Some(name) = &recv.name {
                let ty = self.resolve_type(&recv.ty);
                self.define_local(name, ObjectKind::Var, ty);
            }
        }
        self.declare_params(&func.sig);
        self.check_stmts(&body.stmts);
        self.table.pop_scope();
    }

    pub(super) fn declare_params(&mut self, sig: &Signature) {
        for field in sig.params.iter().chain(sig.results.iter()) {
            let ty = self.resolve_type(&field.ty);
            for name in &field.names {
                self.define_local(name, ObjectKind::Var, ty.clone());
            }
        }
    }

    fn define_local(&mut self, name: &Ident, kind: ObjectKind, ty: Type) {
        self.table
            .define(Object::new(name.name.clone(), kind, ty, name.span))
            .ok();
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    pub(super) fn check_block(&mut self, block: &Block) {
        self.table.push_scope(ScopeKind::Block);
        self.check_stmts(&block.stmts);
        self.table.pop_scope();
    }

    pub(super) fn check_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.check_stmt(stmt);
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Decl(decl) => self.check_local_decl(decl),
            Stmt::Assign(assign) => self.check_assign(assign),
            Stmt::IncDec { expr, .. } => {
                self.check_expr(expr);
            }
            Stmt::Expr(expr) | Stmt::Go(expr) | Stmt::Defer(expr) => {
                self.check_expr(expr);
            }
            Stmt::Send { chan, value } => {
                self.check_expr(chan);
                self.check_expr(value);
            }
            Stmt::Return { results, .. } => {
                for result in results {
                    self.check_expr(result);
                }
            }
            Stmt::Block(block) => self.check_block(block),
            Stmt::If(s) => {
                self.table.push_scope(ScopeKind::Block);
                if let Some(init) = &s.init {
                    self.check_stmt(init);
                }
                self.check_expr(&s.cond);
                self.check_block(&s.then);
                if let Some(els) = &s.els {
                    self.check_stmt(els);
                }
                self.table.pop_scope();
            }
            Stmt::For(s) => {
                self.table.push_scope(ScopeKind::Block);
                if let Some(init) = &s.init {
                    self.check_stmt(init);
                }
                if let Some(cond) = &s.cond {
                    self.check_expr(cond);
                }
                if let Some(post) = &s.post {
                    self.check_stmt(post);
                }
                self.check_block(&s.body);
                self.table.pop_scope();
            }
            Stmt::Range(s) => self.check_range(s),
            Stmt::Switch(s) => {
                self.table.push_scope(ScopeKind::Block);
                if let Some(init) = &s.init {
                    self.check_stmt(init);
                }
                if let Some(tag) = &s.tag {
                    self.check_expr(tag);
                }
                for case in &s.cases {
                    for expr in case.exprs.iter().flatten() {
                        self.check_expr(expr);
                    }
                    self.table.push_scope(ScopeKind::Block);
                    self.check_stmts(&case.body);
                    self.table.pop_scope();
                }
                self.table.pop_scope();
            }
            Stmt::TypeSwitch(s) => self.check_type_switch(s),
            Stmt::Select(s) => {
                for case in &s.cases {
                    self.table.push_scope(ScopeKind::Block);
                    if let Some(comm) = &case.comm {
                        self.check_stmt(comm);
                    }
                    self.check_stmts(&case.body);
                    self.table.pop_scope();
                }
            }
            Stmt::Labeled { stmt, .. } => self.check_stmt(stmt),
            Stmt::Branch { .. } | Stmt::Empty => {}
        }
    }

    fn check_local_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Var(group) => self.check_value_decl(group, ObjectKind::Var, true),
            Decl::Const(group) => self.check_value_decl(group, ObjectKind::Const, true),
            Decl::Type(spec) => {
                let mut object = Object::new(
                    spec.name.name.clone(),
                    ObjectKind::TypeName,
                    Type::named(spec.name.name.clone()),
                    spec.name.span,
                );
                object.type_params = type_param_names(&spec.type_params);
                self.table.define(object).ok();
                self.declare_named_type(spec);
            }
            Decl::Func(_) => {}
        }
    }

    fn check_assign(&mut self, assign: &AssignStmt) {
        if assign.op != AssignOp::Define {
            for lhs in &assign.lhs {
                self.check_expr(lhs);
            }
            for rhs in &assign.rhs {
                self.check_expr(rhs);
            }
            return;
        }

        let values: Vec<Type> = assign.rhs.iter().map(|e| self.check_expr(e)).collect();
        let values = spread_values(values, assign.lhs.len());
        for (i, lhs) in assign.lhs.iter().enumerate() {
            let Some(name) = lhs.as_ident() else {
                self.check_expr(lhs);
                continue;
            };
            let ty = values
                .get(i)
                .cloned()
                .unwrap_or(Type::Unresolved)
                .default_type();
            self.table
                .define(Object::new(name, ObjectKind::Var, ty.clone(), lhs.span))
                .ok();
            self.info.record(lhs.id, &ty);
        }
    }

    fn check_range(&mut self, s: &RangeStmt) {
        self.table.push_scope(ScopeKind::Block);
        let ranged = self.check_expr(&s.expr);
        let (key_ty, value_ty) = self.range_types(&ranged);
        for (target, ty) in [(&s.key, key_ty), (&s.value, value_ty)] {
            let Some(target) = target else { continue };
            match target.as_ident() {
                Some(name) if s.define => {
                    self.table
                        .define(Object::new(name, ObjectKind::Var, ty.clone(), target.span))
                        .ok();
                    self.info.record(target.id, &ty);
                }
                _ => {
                    self.check_expr(target);
                }
            }
        }
        self.check_block(&s.body);
        self.table.pop_scope();
    }

    /// Key and value types produced by ranging over `ty`.
    fn range_types(&self, ty: &Type) -> (Type, Type) {
        let int = Type::Basic(BasicKind::Int);
        match self.underlying(ty) {
            Type::Slice(elem) => (int, *elem),
            Type::Array { elem, .. } => (int, *elem),
            Type::Pointer(inner) => match self.underlying(&inner) {
                Type::Array { elem, .. } => (int, *elem),
                _ => (Type::Unresolved, Type::Unresolved),
            },
            Type::Basic(BasicKind::String) | Type::Untyped(UntypedKind::String) => {
                (int, Type::Basic(BasicKind::Rune))
            }
            Type::Map { key, value } => (*key, *value),
            Type::Chan { elem, .. } => (*elem, Type::Unresolved),
            Type::Basic(kind) if kind.is_integer() => (ty.clone(), Type::Unresolved),
            Type::Untyped(UntypedKind::Int) => (int, Type::Unresolved),
            Type::Func(func) => match func.params.first() {
                Some(Type::Func(yield_fn)) => (
                    yield_fn.params.first().cloned().unwrap_or(Type::Unresolved),
                    yield_fn.params.get(1).cloned().unwrap_or(Type::Unresolved),
                ),
                _ => (Type::Unresolved, Type::Unresolved),
            },
            _ => (Type::Unresolved, Type::Unresolved),
        }
    }

    fn check_type_switch(&mut self, s: &TypeSwitchStmt) {
        self.table.push_scope(ScopeKind::Block);
        if let Some(init) = &s.init {
            self.check_stmt(init);
        }
        let operand = self.check_expr(&s.expr);
        for case in &s.cases {
            self.table.push_scope(ScopeKind::Block);
            let case_types: Vec<Type> = case
                .types
                .iter()
                .flatten()
                .map(|t| self.resolve_type(t))
                .collect();
            if let Some(binding) = &s.binding {
                let ty = match case_types.as_slice() {
                    [single] if !single.is_unresolved() => single.clone(),
                    _ => operand.clone(),
                };
                self.define_local(binding, ObjectKind::Var, ty);
            }
            self.check_stmts(&case.body);
            self.table.pop_scope();
        }
        self.table.pop_scope();
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    /// Resolve a written type in the current scope.
    pub fn resolve_type(&mut self, ty: &TypeExpr) -> Type {
        match ty {
            TypeExpr::Named(id) => self.resolve_type_name(id),
            TypeExpr::Qualified { .. } => Type::Unresolved,
            TypeExpr::Pointer(inner) => Type::Pointer(Box::new(self.resolve_type(inner))),
            TypeExpr::Slice(elem) | TypeExpr::Ellipsis(elem) => {
                Type::Slice(Box::new(self.resolve_type(elem)))
            }
            TypeExpr::Array { len, elem } => {
                let len = match len {
                    Some(expr) => {
                        self.check_expr(expr);
                        const_text(expr)
                    }
                    None => "...".to_string(),
                };
                Type::Array {
                    len,
                    elem: Box::new(self.resolve_type(elem)),
                }
            }
            TypeExpr::Map { key, value } => Type::Map {
                key: Box::new(self.resolve_type(key)),
                value: Box::new(self.resolve_type(value)),
            },
            TypeExpr::Chan { dir, elem } => Type::Chan {
                dir: *dir,
                elem: Box::new(self.resolve_type(elem)),
            },
            TypeExpr::Func(sig) => Type::Func(self.func_type(sig)),
            TypeExpr::Instantiated { base, args } => {
                let args: Vec<Type> = args.iter().map(|a| self.resolve_type(a)).collect();
                match self.resolve_type(base) {
                    Type::Named { name, .. } => Type::Named { name, args },
                    _ => Type::Unresolved,
                }
            }
            TypeExpr::Struct(fields) => {
                let mut out = Vec::new();
                for field in fields {
                    let ty = self.resolve_type(&field.ty);
                    if field.names.is_empty() {
                        out.push(StructField {
                            name: field.ty.base_name().unwrap_or("").to_string(),
                            ty,
                            embedded: true,
                        });
                    } else {
                        for name in &field.names {
                            out.push(StructField {
                                name: name.name.clone(),
                                ty: ty.clone(),
                                embedded: false,
                            });
                        }
                    }
                }
                Type::Struct(out)
            }
            TypeExpr::Interface(elems) => {
                let mut methods = Vec::new();
                for elem in elems {
                    match elem {
                        InterfaceElem::Method { name, sig } => {
                            methods.push((name.name.clone(), self.func_type(sig)));
                        }
                        InterfaceElem::Type(ty) => {
                            self.resolve_type(ty);
                        }
                    }
                }
                Type::Interface { methods }
            }
            TypeExpr::Union(terms) => {
                for term in terms {
                    self.resolve_type(&term.ty);
                }
                Type::Unresolved
            }
        }
    }

    fn resolve_type_name(&mut self, id: &Ident) -> Type {
        let Some(object) = self.table.resolve(&id.name) else {
            self.report(CheckError::UndefinedName {
                name: id.name.clone(),
                span: id.span,
            });
            return Type::Unresolved;
        };
        match object.kind {
            ObjectKind::TypeName => match &object.ty {
                Type::Named { name, .. } => match self.named.get(name) {
                    Some(named) if named.alias => named.underlying.clone(),
                    _ => object.ty.clone(),
                },
                other => other.clone(),
            },
            ObjectKind::TypeParam => Type::TypeParam(id.name.clone()),
            _ => Type::Unresolved,
        }
    }

    /// The underlying type of `ty`, with type arguments substituted.
    pub(super) fn underlying(&self, ty: &Type) -> Type {
        let mut current = ty.clone();
        for _ in 0..16 {
            let Type::Named { name, args } = &current else {
                return current;
            };
            if let Some(named) = self.named.get(name) {
                let subst: FxHashMap<String, Type> = named
                    .type_params
                    .iter()
                    .cloned()
                    .zip(args.iter().cloned())
                    .collect();
                current = named.underlying.substitute(&subst);
            } else if let Some(builtin) = universe_underlying(name) {
                return builtin;
            } else {
                return Type::Unresolved;
            }
        }
        Type::Unresolved
    }
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

/// Distribute one multi-valued expression over several names, or add the
/// `ok` of a comma-ok form.
fn spread_values(values: Vec<Type>, names: usize) -> Vec<Type> {
    if values.len() != 1 || names < 2 {
        return values;
    }
    match values.into_iter().next() {
        Some(Type::Tuple(items)) => items,
        Some(single) => vec![single, Type::Basic(BasicKind::Bool)],
        None => Vec::new(),
    }
}

/// Spelling of an array length.
fn const_text(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::BasicLit(lit) => lit.value.clone(),
        ExprKind::Ident(name) => name.clone(),
        ExprKind::Paren(inner) => const_text(inner),
        _ => "?".to_string(),
    }
}

//! AST visitor pattern for traversing the syntax tree
//!
//! [`Visitor`] walks the tree by shared reference, [`VisitorMut`] by mutable
//! reference. Each visit method has a default implementation that calls the
//! corresponding walk function, so implementors override only the nodes they
//! care about and call the `walk_*` function to keep descending.
//!
//! # Example
//!
//! ```rust
//! use goder_parser::ast::*;
//!
//! struct CountCalls {
//!     count: usize,
//! }
//!
//! impl Visitor for CountCalls {
//!     fn visit_expr(&mut self, expr: &Expr) {
//!         if matches!(expr.kind, ExprKind::Call { .. }) {
//!             self.count += 1;
//!         }
//!         walk_expr(self, expr);
//!     }
//! }
//! ```

use super::*;

pub use self::mutable::*;

/// Read-only AST visitor.
pub trait Visitor: Sized {
    fn visit_source_file(&mut self, file: &SourceFile) {
        walk_source_file(self, file);
    }

    fn visit_decl(&mut self, decl: &Decl) {
        walk_decl(self, decl);
    }

    fn visit_func_decl(&mut self, func: &FuncDecl) {
        walk_func_decl(self, func);
    }

    fn visit_type_spec(&mut self, spec: &TypeSpec) {
        walk_type_spec(self, spec);
    }

    fn visit_value_spec(&mut self, spec: &ValueSpec) {
        walk_value_spec(self, spec);
    }

    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_type_expr(&mut self, ty: &TypeExpr) {
        walk_type_expr(self, ty);
    }

    fn visit_signature(&mut self, sig: &Signature) {
        walk_signature(self, sig);
    }
}

pub fn walk_source_file<V: Visitor>(visitor: &mut V, file: &SourceFile) {
    for decl in &file.decls {
        visitor.visit_decl(decl);
    }
}

pub fn walk_decl<V: Visitor>(visitor: &mut V, decl: &Decl) {
    match decl {
        Decl::Func(func) => visitor.visit_func_decl(func),
        Decl::Type(spec) => visitor.visit_type_spec(spec),
        Decl::Var(group) | Decl::Const(group) => {
            for spec in &group.specs {
                visitor.visit_value_spec(spec);
            }
        }
    }
}

pub fn walk_func_decl<V: Visitor>(visitor: &mut V, func: &FuncDecl) {
    if let Some(recv) = &func.recv {
        visitor.visit_type_expr(&recv.ty);
    }
    for param in &func.type_params {
        visitor.visit_type_expr(&param.constraint);
    }
    visitor.visit_signature(&func.sig);
    if let Some(body) = &func.body {
        visitor.visit_block(body);
    }
}

pub fn walk_type_spec<V: Visitor>(visitor: &mut V, spec: &TypeSpec) {
    for param in &spec.type_params {
        visitor.visit_type_expr(&param.constraint);
    }
    visitor.visit_type_expr(&spec.ty);
}

pub fn walk_value_spec<V: Visitor>(visitor: &mut V, spec: &ValueSpec) {
    if let Some(ty) = &spec.ty {
        visitor.visit_type_expr(ty);
    }
    for value in &spec.values {
        visitor.visit_expr(value);
    }
}

pub fn walk_signature<V: Visitor>(visitor: &mut V, sig: &Signature) {
    for field in sig.params.iter().chain(sig.results.iter()) {
        visitor.visit_type_expr(&field.ty);
    }
}

pub fn walk_block<V: Visitor>(visitor: &mut V, block: &Block) {
    for stmt in &block.stmts {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: Visitor>(visitor: &mut V, stmt: &Stmt) {
    match stmt {
        Stmt::Decl(decl) => visitor.visit_decl(decl),
        Stmt::Assign(assign) => {
            for expr in assign.lhs.iter().chain(assign.rhs.iter()) {
                visitor.visit_expr(expr);
            }
        }
        Stmt::IncDec { expr, .. } | Stmt::Expr(expr) | Stmt::Go(expr) | Stmt::Defer(expr) => {
            visitor.visit_expr(expr)
        }
        Stmt::Send { chan, value } => {
            visitor.visit_expr(chan);
            visitor.visit_expr(value);
        }
        Stmt::Return { results, .. } => {
            for expr in results {
                visitor.visit_expr(expr);
            }
        }
        Stmt::Block(block) => visitor.visit_block(block),
        Stmt::If(stmt) => {
            if let Some(init) = &stmt.init {
                visitor.visit_stmt(init);
            }
            visitor.visit_expr(&stmt.cond);
            visitor.visit_block(&stmt.then);
            if let Some(els) = &stmt.els {
                visitor.visit_stmt(els);
            }
        }
        Stmt::For(stmt) => {
            if let Some(init) = &stmt.init {
                visitor.visit_stmt(init);
            }
            if let Some(cond) = &stmt.cond {
                visitor.visit_expr(cond);
            }
            if let Some(post) = &stmt.post {
                visitor.visit_stmt(post);
            }
            visitor.visit_block(&stmt.body);
        }
        Stmt::Range(stmt) => {
            if let Some(key) = &stmt.key {
                visitor.visit_expr(key);
            }
            if let Some(value) = &stmt.value {
                visitor.visit_expr(value);
            }
            visitor.visit_expr(&stmt.expr);
            visitor.visit_block(&stmt.body);
        }
        Stmt::Switch(stmt) => {
            if let Some(init) = &stmt.init {
                visitor.visit_stmt(init);
            }
            if let Some(tag) = &stmt.tag {
                visitor.visit_expr(tag);
            }
            for case in &stmt.cases {
                for expr in case.exprs.iter().flatten() {
                    visitor.visit_expr(expr);
                }
                for stmt in &case.body {
                    visitor.visit_stmt(stmt);
                }
            }
        }
        Stmt::TypeSwitch(stmt) => {
            if let Some(init) = &stmt.init {
                visitor.visit_stmt(init);
            }
            visitor.visit_expr(&stmt.expr);
            for case in &stmt.cases {
                for ty in case.types.iter().flatten() {
                    visitor.visit_type_expr(ty);
                }
                for stmt in &case.body {
                    visitor.visit_stmt(stmt);
                }
            }
        }
        Stmt::Select(stmt) => {
            for case in &stmt.cases {
                if let Some(comm) = &case.comm {
                    visitor.visit_stmt(comm);
                }
                for stmt in &case.body {
                    visitor.visit_stmt(stmt);
                }
            }
        }
        Stmt::Labeled { stmt, .. } => visitor.visit_stmt(stmt),
        Stmt::Branch { .. } | Stmt::Empty => {}
    }
}

pub fn walk_expr<V: Visitor>(visitor: &mut V, expr: &Expr) {
    match &expr.kind {
        ExprKind::Ident(_) | ExprKind::BasicLit(_) => {}
        ExprKind::CompositeLit { ty, elems } => {
            if let Some(ty) = ty {
                visitor.visit_type_expr(ty);
            }
            for elem in elems {
                visitor.visit_expr(elem);
            }
        }
        ExprKind::FuncLit { sig, body } => {
            visitor.visit_signature(sig);
            visitor.visit_block(body);
        }
        ExprKind::Paren(inner) => visitor.visit_expr(inner),
        ExprKind::Selector { base, .. } => visitor.visit_expr(base),
        ExprKind::Index { base, indices } => {
            visitor.visit_expr(base);
            for index in indices {
                visitor.visit_expr(index);
            }
        }
        ExprKind::Slice {
            base,
            low,
            high,
            max,
        } => {
            visitor.visit_expr(base);
            for part in [low, high, max].into_iter().flatten() {
                visitor.visit_expr(part);
            }
        }
        ExprKind::TypeAssert { base, ty } => {
            visitor.visit_expr(base);
            if let Some(ty) = ty {
                visitor.visit_type_expr(ty);
            }
        }
        ExprKind::Call { func, args, .. } => {
            visitor.visit_expr(func);
            for arg in args {
                visitor.visit_expr(arg);
            }
        }
        ExprKind::Unary { operand, .. } => visitor.visit_expr(operand),
        ExprKind::Binary { left, right, .. } => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        ExprKind::KeyValue { key, value } => {
            visitor.visit_expr(key);
            visitor.visit_expr(value);
        }
        ExprKind::Type(ty) => visitor.visit_type_expr(ty),
    }
}

pub fn walk_type_expr<V: Visitor>(visitor: &mut V, ty: &TypeExpr) {
    match ty {
        TypeExpr::Named(_) | TypeExpr::Qualified { .. } => {}
        TypeExpr::Pointer(inner) | TypeExpr::Slice(inner) | TypeExpr::Ellipsis(inner) => {
            visitor.visit_type_expr(inner)
        }
        TypeExpr::Array { len, elem } => {
            if let Some(len) = len {
                visitor.visit_expr(len);
            }
            visitor.visit_type_expr(elem);
        }
        TypeExpr::Chan { elem, .. } => visitor.visit_type_expr(elem),
        TypeExpr::Map { key, value } => {
            visitor.visit_type_expr(key);
            visitor.visit_type_expr(value);
        }
        TypeExpr::Func(sig) => visitor.visit_signature(sig),
        TypeExpr::Instantiated { base, args } => {
            visitor.visit_type_expr(base);
            for arg in args {
                visitor.visit_type_expr(arg);
            }
        }
        TypeExpr::Struct(fields) => {
            for field in fields {
                visitor.visit_type_expr(&field.ty);
            }
        }
        TypeExpr::Interface(elems) => {
            for elem in elems {
                match elem {
                    InterfaceElem::Method { sig, .. } => visitor.visit_signature(sig),
                    InterfaceElem::Type(ty) => visitor.visit_type_expr(ty),
                }
            }
        }
        TypeExpr::Union(terms) => {
            for term in terms {
                visitor.visit_type_expr(&term.ty);
            }
        }
    }
}

mod mutable {
    use super::*;

    /// Mutating AST visitor, used by rewriting passes.
    pub trait VisitorMut: Sized {
        fn visit_source_file_mut(&mut self, file: &mut SourceFile) {
            walk_source_file_mut(self, file);
        }

        fn visit_decl_mut(&mut self, decl: &mut Decl) {
            walk_decl_mut(self, decl);
        }

        fn visit_func_decl_mut(&mut self, func: &mut FuncDecl) {
            walk_func_decl_mut(self, func);
        }

        fn visit_type_spec_mut(&mut self, spec: &mut TypeSpec) {
            walk_type_spec_mut(self, spec);
        }

        fn visit_value_spec_mut(&mut self, spec: &mut ValueSpec) {
            walk_value_spec_mut(self, spec);
        }

        fn visit_block_mut(&mut self, block: &mut Block) {
            walk_block_mut(self, block);
        }

        fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
            walk_stmt_mut(self, stmt);
        }

        fn visit_expr_mut(&mut self, expr: &mut Expr) {
            walk_expr_mut(self, expr);
        }

        fn visit_type_expr_mut(&mut self, ty: &mut TypeExpr) {
            walk_type_expr_mut(self, ty);
        }

        fn visit_signature_mut(&mut self, sig: &mut Signature) {
            walk_signature_mut(self, sig);
        }
    }

    pub fn walk_source_file_mut<V: VisitorMut>(visitor: &mut V, file: &mut SourceFile) {
        for decl in &mut file.decls {
            visitor.visit_decl_mut(decl);
        }
    }

    pub fn walk_decl_mut<V: VisitorMut>(visitor: &mut V, decl: &mut Decl) {
        match decl {
            Decl::Func(func) => visitor.visit_func_decl_mut(func),
            Decl::Type(spec) => visitor.visit_type_spec_mut(spec),
            Decl::Var(group) | Decl::Const(group) => {
                for spec in &mut group.specs {
                    visitor.visit_value_spec_mut(spec);
                }
            }
        }
    }

    pub fn walk_func_decl_mut<V: VisitorMut>(visitor: &mut V, func: &mut FuncDecl) {
        if let Some(recv) = &mut func.recv {
            visitor.visit_type_expr_mut(&mut recv.ty);
        }
        for param in &mut func.type_params {
            visitor.visit_type_expr_mut(&mut param.constraint);
        }
        visitor.visit_signature_mut(&mut func.sig);
        if let Some(body) = &mut func.body {
            visitor.visit_block_mut(body);
        }
    }

    pub fn walk_type_spec_mut<V: VisitorMut>(visitor: &mut V, spec: &mut TypeSpec) {
        for param in &mut spec.type_params {
            visitor.visit_type_expr_mut(&mut param.constraint);
        }
        visitor.visit_type_expr_mut(&mut spec.ty);
    }

    pub fn walk_value_spec_mut<V: VisitorMut>(visitor: &mut V, spec: &mut ValueSpec) {
        if let Some(ty) = &mut spec.ty {
            visitor.visit_type_expr_mut(ty);
        }
        for value in &mut spec.values {
            visitor.visit_expr_mut(value);
        }
    }

    pub fn walk_signature_mut<V: VisitorMut>(visitor: &mut V, sig: &mut Signature) {
        for field in sig.params.iter_mut().chain(sig.results.iter_mut()) {
            visitor.visit_type_expr_mut(&mut field.ty);
        }
    }

    pub fn walk_block_mut<V: VisitorMut>(visitor: &mut V, block: &mut Block) {
        for stmt in &mut block.stmts {
            visitor.visit_stmt_mut(stmt);
        }
    }

    pub fn walk_stmt_mut<V: VisitorMut>(visitor: &mut V, stmt: &mut Stmt) {
        match stmt {
            Stmt::Decl(decl) => visitor.visit_decl_mut(decl),
            Stmt::Assign(assign) => {
                for expr in assign.lhs.iter_mut().chain(assign.rhs.iter_mut()) {
                    visitor.visit_expr_mut(expr);
                }
            }
            Stmt::IncDec { expr, .. }
            | Stmt::Expr(expr)
            | Stmt::Go(expr)
            | Stmt::Defer(expr) => visitor.visit_expr_mut(expr),
            Stmt::Send { chan, value } => {
                visitor.visit_expr_mut(chan);
                visitor.visit_expr_mut(value);
            }
            Stmt::Return { results, .. } => {
                for expr in results {
                    visitor.visit_expr_mut(expr);
                }
            }
            Stmt::Block(block) => visitor.visit_block_mut(block),
            Stmt::If(stmt) => {
                if let Some(init) = &mut stmt.init {
                    visitor.visit_stmt_mut(init);
                }
                visitor.visit_expr_mut(&mut stmt.cond);
                visitor.visit_block_mut(&mut stmt.then);
                if let Some(els) = &mut stmt.els {
                    visitor.visit_stmt_mut(els);
                }
            }
            Stmt::For(stmt) => {
                if let Some(init) = &mut stmt.init {
                    visitor.visit_stmt_mut(init);
                }
                if let Some(cond) = &mut stmt.cond {
                    visitor.visit_expr_mut(cond);
                }
                if let Some(post) = &mut stmt.post {
                    visitor.visit_stmt_mut(post);
                }
                visitor.visit_block_mut(&mut stmt.body);
            }
            Stmt::Range(stmt) => {
                if let Some(key) = &mut stmt.key {
                    visitor.visit_expr_mut(key);
                }
                if let Some(value) = &mut stmt.value {
                    visitor.visit_expr_mut(value);
                }
                visitor.visit_expr_mut(&mut stmt.expr);
                visitor.visit_block_mut(&mut stmt.body);
            }
            Stmt::Switch(stmt) => {
                if let Some(init) = &mut stmt.init {
                    visitor.visit_stmt_mut(init);
                }
                if let Some(tag) = &mut stmt.tag {
                    visitor.visit_expr_mut(tag);
                }
                for case in &mut stmt.cases {
                    for expr in case.exprs.iter_mut().flatten() {
                        visitor.visit_expr_mut(expr);
                    }
                    for stmt in &mut case.body {
                        visitor.visit_stmt_mut(stmt);
                    }
                }
            }
            Stmt::TypeSwitch(stmt) => {
                if let Some(init) = &mut stmt.init {
                    visitor.visit_stmt_mut(init);
                }
                visitor.visit_expr_mut(&mut stmt.expr);
                for case in &mut stmt.cases {
                    for ty in case.types.iter_mut().flatten() {
                        visitor.visit_type_expr_mut(ty);
                    }
                    for stmt in &mut case.body {
                        visitor.visit_stmt_mut(stmt);
                    }
                }
            }
            Stmt::Select(stmt) => {
                for case in &mut stmt.cases {
                    if let Some(comm) = &mut case.comm {
                        visitor.visit_stmt_mut(comm);
                    }
                    for stmt in &mut case.body {
                        visitor.visit_stmt_mut(stmt);
                    }
                }
            }
            Stmt::Labeled { stmt, .. } => visitor.visit_stmt_mut(stmt),
            Stmt::Branch { .. } | Stmt::Empty => {}
        }
    }

    pub fn walk_expr_mut<V: VisitorMut>(visitor: &mut V, expr: &mut Expr) {
        match &mut expr.kind {
            ExprKind::Ident(_) | ExprKind::BasicLit(_) => {}
            ExprKind::CompositeLit { ty, elems } => {
                if let Some(ty) = ty {
                    visitor.visit_type_expr_mut(ty);
                }
                for elem in elems {
                    visitor.visit_expr_mut(elem);
                }
            }
            ExprKind::FuncLit { sig, body } => {
                visitor.visit_signature_mut(sig);
                visitor.visit_block_mut(body);
            }
            ExprKind::Paren(inner) => visitor.visit_expr_mut(inner),
            ExprKind::Selector { base, .. } => visitor.visit_expr_mut(base),
            ExprKind::Index { base, indices } => {
                visitor.visit_expr_mut(base);
                for index in indices {
                    visitor.visit_expr_mut(index);
                }
            }
            ExprKind::Slice {
                base,
                low,
                high,
                max,
            } => {
                visitor.visit_expr_mut(base);
                for part in [low, high, max].into_iter().flatten() {
                    visitor.visit_expr_mut(part);
                }
            }
            ExprKind::TypeAssert { base, ty } => {
                visitor.visit_expr_mut(base);
                if let Some(ty) = ty {
                    visitor.visit_type_expr_mut(ty);
                }
            }
            ExprKind::Call { func, args, .. } => {
                visitor.visit_expr_mut(func);
                for arg in args {
                    visitor.visit_expr_mut(arg);
                }
            }
            ExprKind::Unary { operand, .. } => visitor.visit_expr_mut(operand),
            ExprKind::Binary { left, right, .. } => {
                visitor.visit_expr_mut(left);
                visitor.visit_expr_mut(right);
            }
            ExprKind::KeyValue { key, value } => {
                visitor.visit_expr_mut(key);
                visitor.visit_expr_mut(value);
            }
            ExprKind::Type(ty) => visitor.visit_type_expr_mut(ty),
        }
    }

    pub fn walk_type_expr_mut<V: VisitorMut>(visitor: &mut V, ty: &mut TypeExpr) {
        match ty {
            TypeExpr::Named(_) | TypeExpr::Qualified { .. } => {}
            TypeExpr::Pointer(inner) | TypeExpr::Slice(inner) | TypeExpr::Ellipsis(inner) => {
                visitor.visit_type_expr_mut(inner)
            }
            TypeExpr::Array { len, elem } => {
                if let Some(len) = len {
                    visitor.visit_expr_mut(len);
                }
                visitor.visit_type_expr_mut(elem);
            }
            TypeExpr::Chan { elem, .. } => visitor.visit_type_expr_mut(elem),
            TypeExpr::Map { key, value } => {
                visitor.visit_type_expr_mut(key);
                visitor.visit_type_expr_mut(value);
            }
            TypeExpr::Func(sig) => visitor.visit_signature_mut(sig),
            TypeExpr::Instantiated { base, args } => {
                visitor.visit_type_expr_mut(base);
                for arg in args {
                    visitor.visit_type_expr_mut(arg);
                }
            }
            TypeExpr::Struct(fields) => {
                for field in fields {
                    visitor.visit_type_expr_mut(&mut field.ty);
                }
            }
            TypeExpr::Interface(elems) => {
                for elem in elems {
                    match elem {
                        InterfaceElem::Method { sig, .. } => visitor.visit_signature_mut(sig),
                        InterfaceElem::Type(ty) => visitor.visit_type_expr_mut(ty),
                    }
                }
            }
            TypeExpr::Union(terms) => {
                for term in terms {
                    visitor.visit_type_expr_mut(&mut term.ty);
                }
            }
        }
    }

    struct Renumber;

    impl VisitorMut for Renumber {
        fn visit_expr_mut(&mut self, expr: &mut Expr) {
            expr.id = ExprId::fresh();
            walk_expr_mut(self, expr);
        }
    }

    /// Give every expression in `decl` a fresh [`ExprId`].
    ///
    /// Needed after cloning a declaration, so the clone and the original do
    /// not share type-information keys.
    pub fn renumber(decl: &mut Decl) {
        Renumber.visit_decl_mut(decl);
    }
}

//! Goder Type Checker
//!
//! Static type resolution for a single Go source file.
//!
//! This module provides:
//! - Checked types with Go's `TypeString` spelling
//! - Symbol tables with scope management
//! - Expression typing, including instantiation of generic calls
//! - A small table of standard-library signatures
//!
//! Other packages are never loaded: qualified references outside the
//! standard-library table type as [`Type::Unresolved`].

pub mod checker;
pub mod error;
mod expr;
pub mod infer;
pub mod stdlib;
pub mod symbols;
pub mod ty;

pub use checker::{CheckResult, TypeChecker};
pub use error::CheckError;
pub use symbols::{Object, ObjectKind, ScopeKind, SymbolTable};
pub use ty::{BasicKind, FuncType, StructField, Type, UntypedKind};

use crate::ast::{ExprId, SourceFile};
use rustc_hash::{FxHashMap, FxHashSet};

/// Types recorded for expressions, keyed by [`ExprId`].
#[derive(Debug, Clone, Default)]
pub struct TypeInfo {
    types: FxHashMap<ExprId, Type>,
    untyped: FxHashSet<ExprId>,
    uses: FxHashMap<ExprId, String>,
}

impl TypeInfo {
    /// The type of an expression. Untyped constants report their default
    /// type; see [`TypeInfo::is_untyped`].
    pub fn type_of(&self, id: ExprId) -> Option<&Type> {
        self.types.get(&id)
    }

    /// True if the expression is an untyped constant (`3`, `"a"`, `N` for
    /// `const N = 3`).
    pub fn is_untyped(&self, id: ExprId) -> bool {
        self.untyped.contains(&id)
    }

    /// The package-level declaration an identifier expression refers to.
    pub fn use_of(&self, id: ExprId) -> Option<&str> {
        self.uses.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub(crate) fn record(&mut self, id: ExprId, ty: &Type) {
        if ty.is_untyped() {
            self.untyped.insert(id);
            self.types.insert(id, ty.default_type());
        } else {
            self.untyped.remove(&id);
            self.types.insert(id, ty.clone());
        }
    }

    pub(crate) fn record_use(&mut self, id: ExprId, name: &str) {
        self.uses.insert(id, name.to_string());
    }
}

/// Type-check a file, failing on any error.
pub fn check(file: &SourceFile) -> Result<TypeInfo, Vec<CheckError>> {
    let result = TypeChecker::new().check_file(file);
    if result.errors.is_empty() {
        Ok(result.info)
    } else {
        Err(result.errors)
    }
}

/// Type-check a file and return whatever could be resolved.
pub fn check_lenient(file: &SourceFile) -> TypeInfo {
    TypeChecker::new().check_file(file).info
}

//! Abstract syntax tree for Go source files.
//!
//! The tree is fully owned and cloneable so that generic declarations can be
//! deep-copied and specialized independently. Every expression carries an
//! [`ExprId`] which the type checker uses as a side-table key.

mod expression;
mod statement;
mod types;
pub mod visitor;

pub use expression::*;
pub use statement::*;
pub use types::*;
pub use visitor::*;

use crate::token::Span;

/// An identifier with its location.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }

    /// An identifier with no source location, for synthesized nodes.
    pub fn synthetic(name: impl Into<String>) -> Self {
        Self::new(name, Span::dummy())
    }

    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }

    /// Exported names start with an uppercase letter.
    pub fn is_exported(&self) -> bool {
        self.name.chars().next().is_some_and(|c| c.is_uppercase())
    }
}

/// A parsed Go source file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub package: Ident,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
    pub span: Span,
}

impl SourceFile {
    /// Iterate over every function declaration.
    pub fn funcs(&self) -> impl Iterator<Item = &FuncDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Func(f) => Some(f),
            _ => None,
        })
    }

    /// Iterate over every type declaration.
    pub fn types(&self) -> impl Iterator<Item = &TypeSpec> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Type(t) => Some(t),
            _ => None,
        })
    }

    /// Find the import bound to `local` in this file.
    pub fn import_named(&self, local: &str) -> Option<&ImportSpec> {
        self.imports.iter().find(|i| i.local_name() == local)
    }
}

/// A single import: `import alias "path"`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpec {
    /// Explicit local name (`_`, `.`, or an alias).
    pub name: Option<String>,
    /// Import path without quotes.
    pub path: String,
    pub span: Span,
}

impl ImportSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            name: None,
            path: path.into(),
            span: Span::dummy(),
        }
    }

    /// The name this import binds in the file scope.
    pub fn local_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => default_package_name(&self.path).to_string(),
        }
    }
}

/// Guess a package's name from its import path.
///
/// The last path segment is used, skipping a trailing major-version segment
/// (`v2`, `v3`, ...) and stripping a `.vN` suffix (`yaml.v3`).
pub fn default_package_name(path: &str) -> &str {
    let mut segments = path.rsplit('/');
    let mut last = segments.next().unwrap_or(path);
    if is_major_version(last) {
        if let Some(prev) = segments.next() {
            last = prev;
        }
    }
    if let Some((head, tail)) = last.rsplit_once('.') {
        if is_major_version(tail) {
            last = head;
        }
    }
    last
}

fn is_major_version(segment: &str) -> bool {
    segment.len() > 1
        && segment.starts_with('v')
        && segment[1..].chars().all(|c| c.is_ascii_digit())
}

/// A top-level or local declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Func(FuncDecl),
    Type(TypeSpec),
    Var(ValueDecl),
    Const(ValueDecl),
}

impl Decl {
    /// The names this declaration introduces into its scope.
    ///
    /// Methods are named `Recv.Method` so they never collide with functions.
    pub fn names(&self) -> Vec<String> {
        match self {
            Decl::Func(f) => vec![f.key()],
            Decl::Type(t) => vec![t.name.name.clone()],
            Decl::Var(v) | Decl::Const(v) => v
                .specs
                .iter()
                .flat_map(|s| s.names.iter())
                .filter(|n| !n.is_blank())
                .map(|n| n.name.clone())
                .collect(),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Decl::Func(f) => f.span,
            Decl::Type(t) => t.span,
            Decl::Var(v) | Decl::Const(v) => v.span,
        }
    }
}

/// `func (recv) Name[T any](params) results { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub recv: Option<Receiver>,
    pub name: Ident,
    pub type_params: Vec<TypeParam>,
    pub sig: Signature,
    pub body: Option<Block>,
    pub span: Span,
}

impl FuncDecl {
    /// Lookup key: the plain name for functions, `Recv.Method` for methods.
    pub fn key(&self) -> String {
        match &self.recv {
            Some(recv) => format!("{}.{}", recv.base_name(), self.name.name),
            None => self.name.name.clone(),
        }
    }

    pub fn is_method(&self) -> bool {
        self.recv.is_some()
    }
}

/// A method receiver: `(s *Stack[T])`.
#[derive(Debug, Clone, PartialEq)]
pub struct Receiver {
    pub name: Option<Ident>,
    pub ty: TypeExpr,
    pub span: Span,
}

impl Receiver {
    /// Name of the receiver's base type, without pointer or type arguments.
    pub fn base_name(&self) -> &str {
        self.ty.base_name().unwrap_or("")
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.ty, TypeExpr::Pointer(_))
    }

    /// Type parameter names bound by an instantiated receiver (`Stack[T]`).
    pub fn type_param_names(&self) -> Vec<String> {
        let inner = match &self.ty {
            TypeExpr::Pointer(inner) => inner.as_ref(),
            other => other,
        };
        match inner {
            TypeExpr::Instantiated { args, .. } => args
                .iter()
                .filter_map(|a| match a {
                    TypeExpr::Named(id) => Some(id.name.clone()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// `type Name[T any] = ty` or `type Name[T any] ty`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpec {
    pub name: Ident,
    pub type_params: Vec<TypeParam>,
    pub alias: bool,
    pub ty: TypeExpr,
    pub span: Span,
}

/// A `var` or `const` declaration, possibly parenthesized.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueDecl {
    pub specs: Vec<ValueSpec>,
    /// Written as `var ( ... )`.
    pub grouped: bool,
    pub span: Span,
}

/// One line of a value declaration: `a, b int = 1, 2`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSpec {
    pub names: Vec<Ident>,
    pub ty: Option<TypeExpr>,
    pub values: Vec<Expr>,
    pub span: Span,
}

/// A type parameter group: `K comparable` or `T int | float64`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParam {
    pub names: Vec<Ident>,
    pub constraint: TypeExpr,
}

/// Collect the flat list of type parameter names.
pub fn type_param_names(params: &[TypeParam]) -> Vec<String> {
    params
        .iter()
        .flat_map(|p| p.names.iter().map(|n| n.name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_package_name() {
        assert_eq!(default_package_name("fmt"), "fmt");
        assert_eq!(default_package_name("math/rand"), "rand");
        assert_eq!(default_package_name("github.com/foo/bar/v2"), "bar");
        assert_eq!(default_package_name("gopkg.in/yaml.v3"), "yaml");
    }

    #[test]
    fn test_import_local_name() {
        let mut spec = ImportSpec::new("github.com/earlgray283/goder/set");
        assert_eq!(spec.local_name(), "set");
        spec.name = Some("s".to_string());
        assert_eq!(spec.local_name(), "s");
    }
}

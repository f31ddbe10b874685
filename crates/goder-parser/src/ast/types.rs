//! Type expression AST nodes
//!
//! Type expressions appear in declarations, conversions, composite literals
//! and explicit instantiations. Their [`Display`](std::fmt::Display) form is
//! Go's canonical spelling (`[]int`, `map[string]T`, `func(T) R`), which the
//! generic binder compares textually against checked types.

use super::*;
use std::fmt;

/// A written type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// `int`, `T`, `Node`
    Named(Ident),
    /// `pkg.Name`
    Qualified { package: Ident, name: Ident },
    /// `*T`
    Pointer(Box<TypeExpr>),
    /// `[]T`
    Slice(Box<TypeExpr>),
    /// `[N]T`, or `[...]T` when `len` is `None`
    Array {
        len: Option<Box<Expr>>,
        elem: Box<TypeExpr>,
    },
    /// `map[K]V`
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    /// `chan T`, `<-chan T`, `chan<- T`
    Chan { dir: ChanDir, elem: Box<TypeExpr> },
    /// `func(params) results`
    Func(Box<Signature>),
    /// `Stack[int]`, `pkg.Pair[K, V]`
    Instantiated {
        base: Box<TypeExpr>,
        args: Vec<TypeExpr>,
    },
    /// `struct { fields }`
    Struct(Vec<Field>),
    /// `interface { elems }`
    Interface(Vec<InterfaceElem>),
    /// `...T` in a variadic parameter
    Ellipsis(Box<TypeExpr>),
    /// `~int | float64` in a constraint
    Union(Vec<Term>),
}

/// Channel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// Parameters and results of a function.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signature {
    pub params: Vec<Field>,
    pub results: Vec<Field>,
}

impl Signature {
    /// Flatten parameters into one entry per declared name (or one per
    /// unnamed parameter).
    pub fn param_types(&self) -> Vec<&TypeExpr> {
        flatten_fields(&self.params)
    }

    pub fn result_types(&self) -> Vec<&TypeExpr> {
        flatten_fields(&self.results)
    }

    pub fn is_variadic(&self) -> bool {
        self.params
            .last()
            .is_some_and(|f| matches!(f.ty, TypeExpr::Ellipsis(_)))
    }
}

fn flatten_fields(fields: &[Field]) -> Vec<&TypeExpr> {
    let mut out = Vec::new();
    for field in fields {
        let count = field.names.len().max(1);
        for _ in 0..count {
            out.push(&field.ty);
        }
    }
    out
}

/// A parameter, result or struct field group: `a, b int`.
///
/// Embedded struct fields and unnamed parameters have no names.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub names: Vec<Ident>,
    pub ty: TypeExpr,
    pub tag: Option<String>,
}

impl Field {
    pub fn unnamed(ty: TypeExpr) -> Self {
        Self {
            names: Vec::new(),
            ty,
            tag: None,
        }
    }
}

/// An element of an interface type.
#[derive(Debug, Clone, PartialEq)]
pub enum InterfaceElem {
    Method { name: Ident, sig: Signature },
    /// Embedded interface or type-set term list.
    Type(TypeExpr),
}

/// One term of a union: `~int`.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub tilde: bool,
    pub ty: TypeExpr,
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Named(Ident::synthetic(name))
    }

    /// The declared type this expression refers to, ignoring one pointer
    /// level and any type arguments.
    pub fn base_name(&self) -> Option<&str> {
        match self {
            TypeExpr::Named(id) => Some(&id.name),
            TypeExpr::Pointer(inner) => inner.base_name(),
            TypeExpr::Instantiated { base, .. } => base.base_name(),
            _ => None,
        }
    }

    /// True if any identifier inside this type is one of `names`.
    pub fn mentions(&self, names: &[String]) -> bool {
        let mut found = false;
        self.for_each_named(&mut |id| {
            if names.iter().any(|n| n == &id.name) {
                found = true;
            }
        });
        found
    }

    /// Visit every `Named` identifier in this type.
    pub fn for_each_named(&self, f: &mut dyn FnMut(&Ident)) {
        match self {
            TypeExpr::Named(id) => f(id),
            TypeExpr::Qualified { .. } => {}
            TypeExpr::Pointer(inner) | TypeExpr::Slice(inner) | TypeExpr::Ellipsis(inner) => {
                inner.for_each_named(f)
            }
            TypeExpr::Array { elem, .. } | TypeExpr::Chan { elem, .. } => elem.for_each_named(f),
            TypeExpr::Map { key, value } => {
                key.for_each_named(f);
                value.for_each_named(f);
            }
            TypeExpr::Func(sig) => {
                for field in sig.params.iter().chain(sig.results.iter()) {
                    field.ty.for_each_named(f);
                }
            }
            TypeExpr::Instantiated { base, args } => {
                base.for_each_named(f);
                for arg in args {
                    arg.for_each_named(f);
                }
            }
            TypeExpr::Struct(fields) => {
                for field in fields {
                    field.ty.for_each_named(f);
                }
            }
            TypeExpr::Interface(elems) => {
                for elem in elems {
                    match elem {
                        InterfaceElem::Method { sig, .. } => {
                            for field in sig.params.iter().chain(sig.results.iter()) {
                                field.ty.for_each_named(f);
                            }
                        }
                        InterfaceElem::Type(ty) => ty.for_each_named(f),
                    }
                }
            }
            TypeExpr::Union(terms) => {
                for term in terms {
                    term.ty.for_each_named(f);
                }
            }
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named(id) => write!(f, "{}", id.name),
            TypeExpr::Qualified { package, name } => write!(f, "{}.{}", package.name, name.name),
            TypeExpr::Pointer(inner) => write!(f, "*{}", inner),
            TypeExpr::Slice(elem) => write!(f, "[]{}", elem),
            TypeExpr::Array { len: Some(len), elem } => {
                write!(f, "[{}]{}", ConstExpr(len), elem)
            }
            TypeExpr::Array { len: None, elem } => write!(f, "[...]{}", elem),
            TypeExpr::Map { key, value } => write!(f, "map[{}]{}", key, value),
            TypeExpr::Chan { dir, elem } => match dir {
                ChanDir::Both => {
                    // chan (<-chan T) needs parens to stay unambiguous
                    if matches!(elem.as_ref(), TypeExpr::Chan { dir: ChanDir::Recv, .. }) {
                        write!(f, "chan ({})", elem)
                    } else {
                        write!(f, "chan {}", elem)
                    }
                }
                ChanDir::Send => write!(f, "chan<- {}", elem),
                ChanDir::Recv => write!(f, "<-chan {}", elem),
            },
            TypeExpr::Func(sig) => write!(f, "func{}", sig),
            TypeExpr::Instantiated { base, args } => {
                write!(f, "{}[", base)?;
                write_list(f, args)?;
                write!(f, "]")
            }
            TypeExpr::Struct(fields) => {
                if fields.is_empty() {
                    return write!(f, "struct{{}}");
                }
                write!(f, "struct{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write_field(f, field)?;
                    if let Some(tag) = &field.tag {
                        write!(f, " {}", tag)?;
                    }
                }
                write!(f, "}}")
            }
            TypeExpr::Interface(elems) => {
                if elems.is_empty() {
                    return write!(f, "interface{{}}");
                }
                write!(f, "interface{{")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    match elem {
                        InterfaceElem::Method { name, sig } => write!(f, "{}{}", name.name, sig)?,
                        InterfaceElem::Type(ty) => write!(f, "{}", ty)?,
                    }
                }
                write!(f, "}}")
            }
            TypeExpr::Ellipsis(elem) => write!(f, "...{}", elem),
            TypeExpr::Union(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    if term.tilde {
                        write!(f, "~")?;
                    }
                    write!(f, "{}", term.ty)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        write_fields(f, &self.params)?;
        write!(f, ")")?;
        match self.results.as_slice() {
            [] => Ok(()),
            [single] if single.names.is_empty() => write!(f, " {}", single.ty),
            results => {
                write!(f, " (")?;
                write_fields(f, results)?;
                write!(f, ")")
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, types: &[TypeExpr]) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", ty)?;
    }
    Ok(())
}

fn write_fields(f: &mut fmt::Formatter<'_>, fields: &[Field]) -> fmt::Result {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write_field(f, field)?;
    }
    Ok(())
}

fn write_field(f: &mut fmt::Formatter<'_>, field: &Field) -> fmt::Result {
    if !field.names.is_empty() {
        let names: Vec<&str> = field.names.iter().map(|n| n.name.as_str()).collect();
        write!(f, "{} ", names.join(", "))?;
    }
    write!(f, "{}", field.ty)
}

/// Display adapter for constant expressions used as array lengths.
struct ConstExpr<'a>(&'a Expr);

impl fmt::Display for ConstExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.kind {
            ExprKind::Ident(name) => write!(f, "{}", name),
            ExprKind::BasicLit(lit) => write!(f, "{}", lit.value),
            ExprKind::Selector { base, field } => write!(f, "{}.{}", ConstExpr(base), field.name),
            ExprKind::Paren(inner) => write!(f, "({})", ConstExpr(inner)),
            ExprKind::Unary { op, operand } => write!(f, "{}{}", op, ConstExpr(operand)),
            ExprKind::Binary { op, left, right } => {
                write!(f, "{} {} {}", ConstExpr(left), op, ConstExpr(right))
            }
            ExprKind::Call { func, args, .. } => {
                write!(f, "{}(", ConstExpr(func))?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", ConstExpr(arg))?;
                }
                write!(f, ")")
            }
            ExprKind::Type(ty) => write!(f, "{}", ty),
            _ => write!(f, "_"),
        }
    }
}

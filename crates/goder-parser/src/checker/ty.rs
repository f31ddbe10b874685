//! Checked types
//!
//! [`Type`] is the checker's resolved view of a type. Its `Display` form
//! follows Go's `types.TypeString` with unqualified names, which is the text
//! the generic binder works with.

use crate::ast::ChanDir;
use rustc_hash::FxHashMap;
use std::fmt;

/// Predeclared basic types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Bool,
    String,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    /// `byte`, an alias of `uint8` that keeps its own spelling.
    Byte,
    /// `rune`, an alias of `int32` that keeps its own spelling.
    Rune,
    Float32,
    Float64,
    Complex64,
    Complex128,
}

impl BasicKind {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "bool" => BasicKind::Bool,
            "string" => BasicKind::String,
            "int" => BasicKind::Int,
            "int8" => BasicKind::Int8,
            "int16" => BasicKind::Int16,
            "int32" => BasicKind::Int32,
            "rune" => BasicKind::Rune,
            "int64" => BasicKind::Int64,
            "uint" => BasicKind::Uint,
            "uint8" => BasicKind::Uint8,
            "byte" => BasicKind::Byte,
            "uint16" => BasicKind::Uint16,
            "uint32" => BasicKind::Uint32,
            "uint64" => BasicKind::Uint64,
            "uintptr" => BasicKind::Uintptr,
            "float32" => BasicKind::Float32,
            "float64" => BasicKind::Float64,
            "complex64" => BasicKind::Complex64,
            "complex128" => BasicKind::Complex128,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            BasicKind::Bool => "bool",
            BasicKind::String => "string",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Byte => "byte",
            BasicKind::Rune => "rune",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, BasicKind::Bool | BasicKind::String)
    }

    pub fn is_integer(self) -> bool {
        self.is_numeric()
            && !matches!(
                self,
                BasicKind::Float32
                    | BasicKind::Float64
                    | BasicKind::Complex64
                    | BasicKind::Complex128
            )
    }
}

/// Kinds of untyped constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UntypedKind {
    Bool,
    Int,
    Rune,
    Float,
    String,
    Nil,
}

impl UntypedKind {
    /// Rank used when two untyped operands meet (`1 + 2.0` is a float).
    fn rank(self) -> u8 {
        match self {
            UntypedKind::Int => 1,
            UntypedKind::Rune => 2,
            UntypedKind::Float => 3,
            _ => 0,
        }
    }

    pub fn max(self, other: UntypedKind) -> UntypedKind {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }
}

/// Parameters and results of a function type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FuncType {
    pub params: Vec<Type>,
    pub results: Vec<Type>,
    pub variadic: bool,
}

impl FuncType {
    /// The type of a call expression: nothing, one value, or a tuple.
    pub fn result_type(&self) -> Type {
        match self.results.as_slice() {
            [single] => single.clone(),
            results => Type::Tuple(results.to_vec()),
        }
    }
}

/// A struct field.
#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: String,
    pub ty: Type,
    pub embedded: bool,
}

/// A resolved type.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Basic(BasicKind),
    /// An untyped constant; displays as Go does (`untyped int`).
    Untyped(UntypedKind),
    /// A declared type, possibly instantiated.
    Named { name: String, args: Vec<Type> },
    TypeParam(String),
    Pointer(Box<Type>),
    Slice(Box<Type>),
    Array { len: String, elem: Box<Type> },
    Map { key: Box<Type>, value: Box<Type> },
    Chan { dir: ChanDir, elem: Box<Type> },
    Func(FuncType),
    Struct(Vec<StructField>),
    Interface { methods: Vec<(String, FuncType)> },
    /// Multiple results of a call.
    Tuple(Vec<Type>),
    /// An import alias; members of other packages are not resolved.
    Package(String),
    /// An expression that denotes a type (`int` in `int(x)`).
    TypeValue(Box<Type>),
    Builtin(String),
    Unresolved,
}

impl Type {
    pub fn named(name: impl Into<String>) -> Self {
        Type::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, Type::Unresolved)
    }

    pub fn is_untyped(&self) -> bool {
        matches!(self, Type::Untyped(_))
    }

    /// The type an untyped constant takes when nothing else constrains it.
    pub fn default_type(&self) -> Type {
        match self {
            Type::Untyped(kind) => match kind {
                UntypedKind::Bool => Type::Basic(BasicKind::Bool),
                UntypedKind::Int => Type::Basic(BasicKind::Int),
                UntypedKind::Rune => Type::Basic(BasicKind::Rune),
                UntypedKind::Float => Type::Basic(BasicKind::Float64),
                UntypedKind::String => Type::Basic(BasicKind::String),
                UntypedKind::Nil => Type::Untyped(UntypedKind::Nil),
            },
            other => other.clone(),
        }
    }

    /// True if any type parameter occurs in this type.
    pub fn has_type_params(&self) -> bool {
        match self {
            Type::TypeParam(_) => true,
            Type::Named { args, .. } => args.iter().any(Type::has_type_params),
            Type::Pointer(t) | Type::Slice(t) | Type::TypeValue(t) => t.has_type_params(),
            Type::Array { elem, .. } | Type::Chan { elem, .. } => elem.has_type_params(),
            Type::Map { key, value } => key.has_type_params() || value.has_type_params(),
            Type::Func(f) => f.has_type_params(),
            Type::Struct(fields) => fields.iter().any(|f| f.ty.has_type_params()),
            Type::Tuple(items) => items.iter().any(Type::has_type_params),
            _ => false,
        }
    }

    /// Replace type parameters according to `subst`.
    pub fn substitute(&self, subst: &FxHashMap<String, Type>) -> Type {
        if subst.is_empty() {
            return self.clone();
        }
        match self {
            Type::TypeParam(name) => subst.get(name).cloned().unwrap_or_else(|| self.clone()),
            Type::Named { name, args } => Type::Named {
                name: name.clone(),
                args: args.iter().map(|a| a.substitute(subst)).collect(),
            },
            Type::Pointer(t) => Type::Pointer(Box::new(t.substitute(subst))),
            Type::Slice(t) => Type::Slice(Box::new(t.substitute(subst))),
            Type::TypeValue(t) => Type::TypeValue(Box::new(t.substitute(subst))),
            Type::Array { len, elem } => Type::Array {
                len: len.clone(),
                elem: Box::new(elem.substitute(subst)),
            },
            Type::Chan { dir, elem } => Type::Chan {
                dir: *dir,
                elem: Box::new(elem.substitute(subst)),
            },
            Type::Map { key, value } => Type::Map {
                key: Box::new(key.substitute(subst)),
                value: Box::new(value.substitute(subst)),
            },
            Type::Func(f) => Type::Func(f.substitute(subst)),
            Type::Struct(fields) => Type::Struct(
                fields
                    .iter()
                    .map(|f| StructField {
                        name: f.name.clone(),
                        ty: f.ty.substitute(subst),
                        embedded: f.embedded,
                    })
                    .collect(),
            ),
            Type::Interface { methods } => Type::Interface {
                methods: methods
                    .iter()
                    .map(|(n, f)| (n.clone(), f.substitute(subst)))
                    .collect(),
            },
            Type::Tuple(items) => Type::Tuple(items.iter().map(|t| t.substitute(subst)).collect()),
            other => other.clone(),
        }
    }
}

impl FuncType {
    pub fn has_type_params(&self) -> bool {
        self.params
            .iter()
            .chain(self.results.iter())
            .any(Type::has_type_params)
    }

    pub fn substitute(&self, subst: &FxHashMap<String, Type>) -> FuncType {
        FuncType {
            params: self.params.iter().map(|t| t.substitute(subst)).collect(),
            results: self.results.iter().map(|t| t.substitute(subst)).collect(),
            variadic: self.variadic,
        }
    }
}

impl fmt::Display for FuncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match param {
                Type::Slice(elem) if self.variadic && i + 1 == self.params.len() => {
                    write!(f, "...{}", elem)?
                }
                other => write!(f, "{}", other)?,
            }
        }
        write!(f, ")")?;
        match self.results.as_slice() {
            [] => Ok(()),
            [single] => write!(f, " {}", single),
            results => {
                write!(f, " (")?;
                for (i, result) in results.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", result)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Basic(kind) => write!(f, "{}", kind.name()),
            Type::Untyped(kind) => match kind {
                UntypedKind::Bool => write!(f, "untyped bool"),
                UntypedKind::Int => write!(f, "untyped int"),
                UntypedKind::Rune => write!(f, "untyped rune"),
                UntypedKind::Float => write!(f, "untyped float"),
                UntypedKind::String => write!(f, "untyped string"),
                UntypedKind::Nil => write!(f, "untyped nil"),
            },
            Type::Named { name, args } => {
                write!(f, "{}", name)?;
                if !args.is_empty() {
                    write!(f, "[")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    write!(f, "]")?;
                }
                Ok(())
            }
            Type::TypeParam(name) => write!(f, "{}", name),
            Type::Pointer(inner) => write!(f, "*{}", inner),
            Type::Slice(elem) => write!(f, "[]{}", elem),
            Type::Array { len, elem } => write!(f, "[{}]{}", len, elem),
            Type::Map { key, value } => write!(f, "map[{}]{}", key, value),
            Type::Chan { dir, elem } => match dir {
                ChanDir::Both => write!(f, "chan {}", elem),
                ChanDir::Send => write!(f, "chan<- {}", elem),
                ChanDir::Recv => write!(f, "<-chan {}", elem),
            },
            Type::Func(func) => write!(f, "func{}", func),
            Type::Struct(fields) => {
                write!(f, "struct{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    if field.embedded {
                        write!(f, "{}", field.ty)?;
                    } else {
                        write!(f, "{} {}", field.name, field.ty)?;
                    }
                }
                write!(f, "}}")
            }
            Type::Interface { methods } => {
                write!(f, "interface{{")?;
                for (i, (name, sig)) in methods.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}{}", name, sig)?;
                }
                write!(f, "}}")
            }
            Type::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Type::Package(path) => write!(f, "package {}", path),
            Type::TypeValue(inner) => write!(f, "{}", inner),
            Type::Builtin(name) => write!(f, "builtin {}", name),
            Type::Unresolved => write!(f, "invalid type"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_go() {
        let ty = Type::Map {
            key: Box::new(Type::Basic(BasicKind::String)),
            value: Box::new(Type::Slice(Box::new(Type::Basic(BasicKind::Int)))),
        };
        assert_eq!(ty.to_string(), "map[string][]int");
        let f = Type::Func(FuncType {
            params: vec![Type::Basic(BasicKind::Int)],
            results: vec![Type::Basic(BasicKind::String)],
            variadic: false,
        });
        assert_eq!(f.to_string(), "func(int) string");
        let stack = Type::Named {
            name: "Stack".to_string(),
            args: vec![Type::Basic(BasicKind::Int)],
        };
        assert_eq!(Type::Pointer(Box::new(stack)).to_string(), "*Stack[int]");
    }

    #[test]
    fn test_untyped_defaults() {
        assert_eq!(Type::Untyped(UntypedKind::Int).to_string(), "untyped int");
        assert_eq!(Type::Untyped(UntypedKind::Int).default_type().to_string(), "int");
        assert_eq!(
            Type::Untyped(UntypedKind::Float).default_type().to_string(),
            "float64"
        );
        assert_eq!(Type::Untyped(UntypedKind::Rune).default_type().to_string(), "rune");
    }

    #[test]
    fn test_substitute_type_params() {
        let mut subst = FxHashMap::default();
        subst.insert("T".to_string(), Type::Basic(BasicKind::Float64));
        let ty = Type::Slice(Box::new(Type::TypeParam("T".to_string())));
        assert_eq!(ty.substitute(&subst).to_string(), "[]float64");
    }

    #[test]
    fn test_variadic_display() {
        let f = FuncType {
            params: vec![
                Type::Basic(BasicKind::String),
                Type::Slice(Box::new(Type::named("any"))),
            ],
            results: vec![],
            variadic: true,
        };
        assert_eq!(Type::Func(f).to_string(), "func(string, ...any)");
    }
}

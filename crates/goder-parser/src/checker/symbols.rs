//! Symbol table implementation for name resolution
//!
//! Scopes form a stack on top of the universe scope. The package scope sits
//! directly above the universe; function bodies, blocks and clauses push
//! further scopes.

use super::ty::{BasicKind, FuncType, Type, UntypedKind};
use crate::token::Span;
use rustc_hash::FxHashMap;

/// What a name denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Var,
    Const,
    TypeName,
    Func,
    /// A type parameter of the enclosing function or type.
    TypeParam,
    /// An import alias.
    Package,
    Builtin,
    Nil,
}

/// A named entity in some scope.
#[derive(Debug, Clone)]
pub struct Object {
    pub name: String,
    pub kind: ObjectKind,
    pub ty: Type,
    /// Type parameters of a generic function or type.
    pub type_params: Vec<String>,
    /// Declared at package level.
    pub package_level: bool,
    pub span: Span,
}

impl Object {
    pub fn new(name: impl Into<String>, kind: ObjectKind, ty: Type, span: Span) -> Self {
        Self {
            name: name.into(),
            kind,
            ty,
            type_params: Vec::new(),
            package_level: false,
            span,
        }
    }

    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }
}

/// Scope kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Universe,
    Package,
    Function,
    Block,
}

#[derive(Debug, Clone)]
struct Scope {
    kind: ScopeKind,
    objects: FxHashMap<String, Object>,
}

/// Stack of scopes with the universe at the bottom.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    /// Create a table holding the universe scope and an empty package scope.
    pub fn new() -> Self {
        let mut table = SymbolTable {
            scopes: vec![Scope {
                kind: ScopeKind::Universe,
                objects: FxHashMap::default(),
            }],
        };
        table.populate_universe();
        table.push_scope(ScopeKind::Package);
        table
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn push_scope(&mut self, kind: ScopeKind) {
        self.scopes.push(Scope {
            kind,
            objects: FxHashMap::default(),
        });
    }

    /// Pop the innermost scope. The universe and package scopes stay.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 2 {
            self.scopes.pop();
        }
    }

    pub fn current_kind(&self) -> ScopeKind {
        self.scopes
            .last()
            .map(|s| s.kind)
            .unwrap_or(ScopeKind::Universe)
    }

    /// Define `object` in the innermost scope.
    ///
    /// Returns the span of the previous definition if the name was already
    /// taken in this scope. Local redeclarations simply shadow; only the
    /// package scope treats them as an error.
    pub fn define(&mut self, object: Object) -> Result<(), Span> {
        if object.name == "_" {
            return Ok(());
        }
        let scope = match self.scopes.last_mut() {
            Some(scope) => scope,
            None => return Ok(()),
        };
        if let Some(existing) = scope.objects.get(&object.name) {
            if scope.kind == ScopeKind::Package {
                return Err(existing.span);
            }
        }
        scope.objects.insert(object.name.clone(), object);
        Ok(())
    }

    /// Resolve a name from the innermost scope outwards.
    pub fn resolve(&self, name: &str) -> Option<&Object> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.objects.get(name))
    }

    /// Resolve a name in the package scope only.
    pub fn resolve_package(&self, name: &str) -> Option<&Object> {
        self.scopes.get(1).and_then(|s| s.objects.get(name))
    }

    /// Update the type of a package-level object once it is known.
    pub fn set_package_type(&mut self, name: &str, ty: Type) {
        if let Some(obj) = self.scopes.get_mut(1).and_then(|s| s.objects.get_mut(name)) {
            obj.ty = ty;
        }
    }

    fn populate_universe(&mut self) {
        let universe = &mut self.scopes[0].objects;
        let mut add = |obj: Object| {
            universe.insert(obj.name.clone(), obj);
        };

        for name in [
            "bool", "string", "int", "int8", "int16", "int32", "int64", "uint", "uint8",
            "uint16", "uint32", "uint64", "uintptr", "float32", "float64", "complex64",
            "complex128", "byte", "rune",
        ] {
            if let Some(kind) = BasicKind::from_name(name) {
                add(Object::new(
                    name,
                    ObjectKind::TypeName,
                    Type::Basic(kind),
                    Span::dummy(),
                ));
            }
        }
        for name in ["error", "any", "comparable"] {
            add(Object::new(
                name,
                ObjectKind::TypeName,
                Type::named(name),
                Span::dummy(),
            ));
        }

        add(Object::new(
            "true",
            ObjectKind::Const,
            Type::Untyped(UntypedKind::Bool),
            Span::dummy(),
        ));
        add(Object::new(
            "false",
            ObjectKind::Const,
            Type::Untyped(UntypedKind::Bool),
            Span::dummy(),
        ));
        add(Object::new(
            "iota",
            ObjectKind::Const,
            Type::Untyped(UntypedKind::Int),
            Span::dummy(),
        ));
        add(Object::new(
            "nil",
            ObjectKind::Nil,
            Type::Untyped(UntypedKind::Nil),
            Span::dummy(),
        ));

        for name in BUILTINS {
            add(Object::new(
                *name,
                ObjectKind::Builtin,
                Type::Builtin(name.to_string()),
                Span::dummy(),
            ));
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Predeclared functions.
pub const BUILTINS: &[&str] = &[
    "append", "cap", "clear", "close", "complex", "copy", "delete", "imag", "len", "make",
    "max", "min", "new", "panic", "print", "println", "real", "recover",
];

/// Underlying types of the predeclared named types.
pub fn universe_underlying(name: &str) -> Option<Type> {
    match name {
        "error" => Some(Type::Interface {
            methods: vec![(
                "Error".to_string(),
                FuncType {
                    params: Vec::new(),
                    results: vec![Type::Basic(BasicKind::String)],
                    variadic: false,
                },
            )],
        }),
        "any" | "comparable" => Some(Type::Interface {
            methods: Vec::new(),
        }),
        _ => None,
    }
}

//! Symbol classification
//!
//! Splits the top-level declarations of a unit into generic and concrete
//! ones. Generic functions (including methods of generic types, keyed
//! `Recv.Method`) and generic types are indexed by name so the call-site
//! binder and the specializer can find them.

use crate::error::TransformError;
use goder_parser::ast::*;
use goder_parser::checker::BasicKind;
use goder_parser::CheckError;
use rustc_hash::{FxHashMap, FxHashSet};

/// A generic function or method.
#[derive(Debug, Clone)]
pub struct GenericFunction {
    pub decl: FuncDecl,
    /// Spans point into the input file.
    pub in_input: bool,
}

/// A generic type and the keys of its methods.
#[derive(Debug, Clone)]
pub struct GenericType {
    pub spec: TypeSpec,
    pub methods: Vec<String>,
    pub in_input: bool,
}

/// Generic declarations of a unit, by name.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// Generic functions by name, generic methods by `Recv.Method`.
    pub functions: FxHashMap<String, GenericFunction>,
    pub types: FxHashMap<String, GenericType>,
    /// Interfaces usable only as type constraints.
    pub constraints: FxHashSet<String>,
}

impl Classification {
    pub fn function(&self, name: &str) -> Option<&GenericFunction> {
        self.functions.get(name)
    }

    pub fn generic_type(&self, name: &str) -> Option<&GenericType> {
        self.types.get(name)
    }

    /// True for declarations that must not survive specialization.
    pub fn is_generic_only(&self, decl: &Decl) -> bool {
        match decl {
            Decl::Type(spec) if self.constraints.contains(&spec.name.name) => true,
            other => is_generic_decl(other),
        }
    }
}

/// True if `decl` has type parameters or is a method of a generic type.
pub fn is_generic_decl(decl: &Decl) -> bool {
    match decl {
        Decl::Func(func) => !func.type_params.is_empty() || has_generic_receiver(func),
        Decl::Type(spec) => !spec.type_params.is_empty(),
        Decl::Var(_) | Decl::Const(_) => false,
    }
}

fn has_generic_receiver(func: &FuncDecl) -> bool {
    let Some(recv) = &func.recv else {
        return false;
    };
    let inner = match &recv.ty {
        TypeExpr::Pointer(inner) => inner.as_ref(),
        other => other,
    };
    matches!(inner, TypeExpr::Instantiated { .. })
}

/// Index the generic declarations of `decls`. `in_input` tells, per
/// declaration index, whether its spans point into the input file.
pub fn classify(decls: &[Decl], in_input: &dyn Fn(usize) -> bool) -> Result<Classification, TransformError> {
    check_unique_names(decls)?;

    let mut classes = Classification::default();
    for (i, decl) in decls.iter().enumerate() {
        match decl {
            Decl::Type(spec) if !spec.type_params.is_empty() => {
                classes.types.insert(
                    spec.name.name.clone(),
                    GenericType {
                        spec: spec.clone(),
                        methods: Vec::new(),
                        in_input: in_input(i),
                    },
                );
            }
            Decl::Func(func) if is_generic_decl(decl) => {
                classes.functions.insert(
                    func.key(),
                    GenericFunction {
                        decl: func.clone(),
                        in_input: in_input(i),
                    },
                );
            }
            _ => {}
        }
    }

    for func in decls.iter().filter_map(|d| match d {
        Decl::Func(f) if has_generic_receiver(f) => Some(f),
        _ => None,
    }) {
        let Some(recv) = &func.recv else { continue };
        match classes.types.get_mut(recv.base_name()) {
            Some(ty) => ty.methods.push(func.key()),
            None => tracing::warn!(method = %func.key(), "method of unknown generic type"),
        }
    }

    classes.constraints = constraint_interfaces(decls);
    tracing::debug!(
        functions = classes.functions.len(),
        types = classes.types.len(),
        constraints = classes.constraints.len(),
        "classified generic declarations"
    );
    Ok(classes)
}

fn check_unique_names(decls: &[Decl]) -> Result<(), TransformError> {
    let mut seen: FxHashMap<String, goder_parser::Span> = FxHashMap::default();
    let mut errors = Vec::new();
    for decl in decls {
        if matches!(decl, Decl::Func(f) if f.name.name == "init" && f.recv.is_none()) {
            continue;
        }
        for name in decl.names() {
            if let Some(original) = seen.insert(name.clone(), decl.span()) {
                errors.push(CheckError::DuplicateDeclaration {
                    name,
                    original,
                    duplicate: decl.span(),
                });
            }
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TransformError::CheckError { errors })
    }
}

/// Interfaces whose type set is restricted (`~int | ~uint`, `comparable`,
/// or an embedded constraint interface).
fn constraint_interfaces(decls: &[Decl]) -> FxHashSet<String> {
    let interfaces: Vec<(&str, &[InterfaceElem])> = decls
        .iter()
        .filter_map(|d| match d {
            Decl::Type(TypeSpec {
                name,
                ty: TypeExpr::Interface(elems),
                ..
            }) => Some((name.name.as_str(), elems.as_slice())),
            _ => None,
        })
        .collect();

    let mut found = FxHashSet::default();
    loop {
        let before = found.len();
        for (name, elems) in &interfaces {
            if found.contains(*name) {
                continue;
            }
            let restricted = elems.iter().any(|elem| match elem {
                InterfaceElem::Type(ty) => is_type_set_term(ty, &found),
                InterfaceElem::Method { .. } => false,
            });
            if restricted {
                found.insert(name.to_string());
            }
        }
        if found.len() == before {
            return found;
        }
    }
}

fn is_type_set_term(ty: &TypeExpr, constraints: &FxHashSet<String>) -> bool {
    match ty {
        TypeExpr::Union(_) => true,
        TypeExpr::Named(id) => {
            BasicKind::from_name(&id.name).is_some()
                || id.name == "comparable"
                || constraints.contains(&id.name)
        }
        _ => false,
    }
}

//! Closure worklist
//!
//! Declarations join the unit in the order they are first demanded. Each
//! one is queued at most once, however many paths lead to it.

use super::loader::{DeclRef, LoadedModule};
use crate::config::ClosurePolicy;
use goder_parser::ast::Decl;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

/// A declaration of a loaded module, by module index.
pub type Demand = (usize, DeclRef);

#[derive(Debug, Default)]
pub struct Worklist {
    queue: VecDeque<Demand>,
    included: FxHashSet<Demand>,
}

impl Worklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a declaration. False if it was queued before.
    pub fn push(&mut self, demand: Demand) -> bool {
        if !self.included.insert(demand) {
            return false;
        }
        self.queue.push_back(demand);
        true
    }

    pub fn pop(&mut self) -> Option<Demand> {
        self.queue.pop_front()
    }

    pub fn is_included(&self, demand: &Demand) -> bool {
        self.included.contains(demand)
    }

    pub fn len(&self) -> usize {
        self.included.len()
    }

    pub fn is_empty(&self) -> bool {
        self.included.is_empty()
    }
}

/// Declarations a module contributes as soon as it is first entered.
pub fn entry_decls(module: &LoadedModule, policy: ClosurePolicy) -> Vec<DeclRef> {
    match policy {
        ClosurePolicy::Reachable => module.inits().to_vec(),
        ClosurePolicy::WholeModule => module.all_decls(),
    }
}

/// Declarations that come along with `at`: the methods of a type.
pub fn companions(module: &LoadedModule, at: DeclRef) -> Vec<DeclRef> {
    match module.decl(at) {
        Decl::Type(spec) => module.methods_of(&spec.name.name).to_vec(),
        _ => Vec::new(),
    }
}

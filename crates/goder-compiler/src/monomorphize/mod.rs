//! Monomorphization - Generic Specialization
//!
//! Replaces every generic function and type of a Go file with one plain
//! declaration per concrete instantiation, and removes the generic
//! declarations themselves.
//!
//! # Overview
//!
//! Work proceeds in rounds. Each round type-checks the whole file, walks
//! every concrete declaration not walked before, rewrites each use of a
//! generic to a specialization, and emits the specializations requested so
//! far. Specializations are concrete declarations too, so the next round
//! walks them and finds the generics they use in turn. Work stops once a
//! round requests nothing new.
//!
//! Generics nothing concrete uses are never specialized and simply vanish,
//! along with interfaces that only serve as constraints.
//!
//! # Example
//!
//! ```go
//! // Source
//! func minimum[T int | float64](a, b T) T { ... }
//! var x = minimum(3, 5)
//! var y = minimum(3.0, 5.0)
//!
//! // After monomorphization
//! func minimumVdqbcpkl(a, b int) int { ... }
//! func minimumHxoazteg(a, b float64) float64 { ... }
//! var x = minimumVdqbcpkl(3, 5)
//! var y = minimumHxoazteg(3.0, 5.0)
//! ```

pub mod bind;
pub mod classify;
mod rewrite;
mod specialize;
mod substitute;

pub use bind::{BindOutcome, CallSiteBinder};
pub use classify::{classify, Classification, GenericFunction, GenericType};
pub use rewrite::CallSiteRewriter;
pub use specialize::{specialize_func, specialize_method, specialize_type};
pub use substitute::TypeSubstitution;

use crate::config::{GenericsConfig, NamingStrategy, TypeMatching};
use crate::diagnostic::BindingIncomplete;
use crate::error::{TransformError, TransformResult};
use crate::naming::{binding_identity, Binding, Namer};
use goder_parser::ast::*;
use goder_parser::checker::{check, check_lenient};
use goder_parser::Span;
use rustc_hash::{FxHashMap, FxHashSet};

/// Where a top-level declaration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeclOrigin {
    /// Written in the input file (not inlined, not a specialization).
    pub input: bool,
    /// Spans point into the input file.
    pub input_spans: bool,
}

/// The kind of generic instantiation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstantiationKind {
    Function,
    Type,
}

/// A specialization requested but not yet emitted
#[derive(Debug, Clone)]
pub struct PendingInstantiation {
    /// Name of the specialization
    pub name: String,
    pub kind: InstantiationKind,
    /// Key of the generic declaration
    pub generic: String,
    pub binding: Binding,
    /// The generic declaration's spans point into the input file.
    pub in_input: bool,
}

/// Context tracking all specializations
pub struct MonomorphizationContext {
    namer: Namer,
    matching: TypeMatching,
    /// Instantiation identity -> specialized function name
    functions: FxHashMap<String, String>,
    /// Instantiation identity -> specialized type name
    types: FxHashMap<String, String>,
    /// Every top-level name in use
    taken: FxHashSet<String>,
    pending: Vec<PendingInstantiation>,
    diagnostics: Vec<BindingIncomplete>,
    call_sites_rewritten: usize,
}

impl MonomorphizationContext {
    pub fn new(namer: Namer) -> Self {
        Self {
            namer,
            matching: TypeMatching::default(),
            functions: FxHashMap::default(),
            types: FxHashMap::default(),
            taken: FxHashSet::default(),
            pending: Vec::new(),
            diagnostics: Vec::new(),
            call_sites_rewritten: 0,
        }
    }

    /// Reserve a top-level name so generated names avoid it.
    pub fn reserve(&mut self, name: impl Into<String>) {
        self.taken.insert(name.into());
    }

    fn fresh(&mut self, base: &str, identity: &str) -> String {
        let taken = &self.taken;
        let name = self.namer.fresh(base, identity, &|n| taken.contains(n));
        self.taken.insert(name.clone());
        name
    }

    /// Name of the specialization of generic function `key` for a call
    /// site, requesting it if needed.
    ///
    /// With random naming, call sites written in the input get a
    /// specialization each; all other call sites share one per binding.
    pub fn request_function(
        &mut self,
        key: &str,
        outcome: BindOutcome,
        in_input: bool,
        site: DeclOrigin,
        span: Span,
    ) -> String {
        self.call_sites_rewritten += 1;
        let identity = binding_identity(key, &outcome.binding);
        let per_site = self.namer.strategy() == NamingStrategy::Random && site.input;

        let existing = if per_site {
            None
        } else {
            self.functions.get(&identity).cloned()
        };
        let name = match existing {
            Some(name) => name,
            None => {
                let name = self.fresh(key, &identity);
                if !per_site {
                    self.functions.insert(identity, name.clone());
                }
                self.pending.push(PendingInstantiation {
                    name: name.clone(),
                    kind: InstantiationKind::Function,
                    generic: key.to_string(),
                    binding: outcome.binding,
                    in_input,
                });
                name
            }
        };

        if !outcome.missing.is_empty() {
            let diagnostic = BindingIncomplete {
                callee: key.to_string(),
                specialized: name.clone(),
                missing: outcome.missing,
                span: site.input_spans.then_some(span),
            };
            tracing::warn!(%diagnostic, specialization = %name, "incomplete binding");
            self.diagnostics.push(diagnostic);
        }
        name
    }

    /// Name of the instance of generic type `type_name` with `args`,
    /// requesting it if needed. Type instances are always shared.
    pub fn request_type(&mut self, classes: &Classification, type_name: &str, args: &[TypeExpr]) -> String {
        let Some(generic) = classes.generic_type(type_name) else {
            return type_name.to_string();
        };
        let mut binding: Binding = type_param_names(&generic.spec.type_params)
            .into_iter()
            .zip(args.iter().map(|a| a.to_string()))
            .collect();
        binding.retain(|k, v| k != v);

        let identity = binding_identity(type_name, &binding);
        if let Some(name) = self.types.get(&identity) {
            return name.clone();
        }
        let name = self.fresh(type_name, &identity);
        tracing::debug!(%identity, instance = %name, "requested type instance");
        self.types.insert(identity, name.clone());
        self.pending.push(PendingInstantiation {
            name: name.clone(),
            kind: InstantiationKind::Type,
            generic: type_name.to_string(),
            binding,
            in_input: generic.in_input,
        });
        name
    }

    pub fn take_pending(&mut self) -> Vec<PendingInstantiation> {
        std::mem::take(&mut self.pending)
    }

    pub fn specialized_function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn specialized_type_count(&self) -> usize {
        self.types.len()
    }
}

/// Result of monomorphization
#[derive(Debug, Default)]
pub struct MonomorphizationResult {
    /// Number of function specializations emitted
    pub functions_specialized: usize,
    /// Number of type instances emitted (methods not counted)
    pub types_specialized: usize,
    /// Number of call sites rewritten
    pub call_sites_rewritten: usize,
    /// Rounds until no new specialization was requested
    pub rounds: usize,
    /// Generic and constraint declarations removed
    pub generics_removed: usize,
    pub diagnostics: Vec<BindingIncomplete>,
}

/// Drives the specialization rounds over one file
pub struct Monomorphizer {
    ctx: MonomorphizationContext,
    max_rounds: usize,
    strict: bool,
}

impl Monomorphizer {
    pub fn new(config: &GenericsConfig) -> Self {
        let mut ctx = MonomorphizationContext::new(Namer::new(config));
        ctx.matching = config.matching;
        Self {
            ctx,
            max_rounds: config.max_rounds.max(1),
            strict: true,
        }
    }

    /// Use a fixed seed for random names.
    pub fn with_seed(mut self, config: &GenericsConfig, seed: u64) -> Self {
        self.ctx.namer = Namer::new(config).with_seed(seed);
        self
    }

    /// Whether the first round rejects a file that does not type-check.
    /// Off when the file was already checked before external code was
    /// merged into it.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Specialize `file` in place. The first `input_decls` declarations
    /// were written in the input file.
    pub fn monomorphize(mut self, file: &mut SourceFile, input_decls: usize) -> TransformResult<MonomorphizationResult> {
        let classes = classify(&file.decls, &|i| i < input_decls)?;

        for decl in &file.decls {
            for name in decl.names() {
                self.ctx.reserve(name);
            }
        }
        for import in &file.imports {
            self.ctx.reserve(import.local_name());
        }

        let mut origins: Vec<DeclOrigin> = (0..file.decls.len())
            .map(|i| DeclOrigin {
                input: i < input_decls,
                input_spans: i < input_decls,
            })
            .collect();
        let mut processed = vec![false; file.decls.len()];
        let mut result = MonomorphizationResult::default();

        loop {
            if result.rounds >= self.max_rounds {
                return Err(TransformError::SpecializationLimit {
                    rounds: self.max_rounds,
                });
            }
            let info = if result.rounds == 0 && self.strict {
                check(file).map_err(|errors| TransformError::CheckError { errors })?
            } else {
                check_lenient(file)
            };
            result.rounds += 1;

            for (i, decl) in file.decls.iter_mut().enumerate() {
                if processed[i] || classes.is_generic_only(decl) {
                    continue;
                }
                processed[i] = true;
                let mut rewriter = CallSiteRewriter::new(&classes, &info, &mut self.ctx, origins[i], decl);
                rewriter.visit_decl_mut(decl);
            }

            let pending = self.ctx.take_pending();
            if pending.is_empty() {
                break;
            }
            tracing::debug!(round = result.rounds, count = pending.len(), "emitting specializations");

            for instantiation in pending {
                let origin = DeclOrigin {
                    input: false,
                    input_spans: instantiation.in_input,
                };
                for decl in self.emit(&classes, &instantiation) {
                    file.decls.push(decl);
                    origins.push(origin);
                    processed.push(false);
                }
                match instantiation.kind {
                    InstantiationKind::Function => result.functions_specialized += 1,
                    InstantiationKind::Type => result.types_specialized += 1,
                }
            }
        }

        let before = file.decls.len();
        file.decls.retain(|decl| !classes.is_generic_only(decl));
        result.generics_removed = before - file.decls.len();
        result.call_sites_rewritten = self.ctx.call_sites_rewritten;
        result.diagnostics = std::mem::take(&mut self.ctx.diagnostics);

        tracing::info!(
            functions = result.functions_specialized,
            types = result.types_specialized,
            call_sites = result.call_sites_rewritten,
            rounds = result.rounds,
            removed = result.generics_removed,
            "monomorphized generics"
        );
        Ok(result)
    }

    /// The declarations standing for one instantiation: the function, or
    /// the type with all of its methods.
    fn emit(&self, classes: &Classification, instantiation: &PendingInstantiation) -> Vec<Decl> {
        let PendingInstantiation {
            name,
            generic,
            binding,
            ..
        } = instantiation;
        match instantiation.kind {
            InstantiationKind::Function => match classes.function(generic) {
                Some(f) => vec![specialize_func(&f.decl, name, binding)],
                None => Vec::new(),
            },
            InstantiationKind::Type => {
                let Some(ty) = classes.generic_type(generic) else {
                    return Vec::new();
                };
                let params = type_param_names(&ty.spec.type_params);
                let mut decls = vec![specialize_type(&ty.spec, name, binding)];
                for key in &ty.methods {
                    if let Some(method) = classes.function(key) {
                        decls.push(specialize_method(&method.decl, name, &params, binding));
                    }
                }
                decls
            }
        }
    }
}

/// Specialize all generics of `file` in place.
///
/// The first `input_decls` declarations were written in the input file;
/// only their spans are used for diagnostics.
pub fn convert_generics(
    file: &mut SourceFile,
    config: &GenericsConfig,
    input_decls: usize,
) -> TransformResult<MonomorphizationResult> {
    Monomorphizer::new(config).monomorphize(file, input_decls)
}

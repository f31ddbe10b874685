//! External package inlining
//!
//! Copies the declarations a file uses from allow-listed external packages
//! into the file itself, transitively, and drops the imports, so the
//! result no longer depends on the module cache.
//!
//! # Overview
//!
//! Imports of allow-listed hosts are located and parsed up front. Every
//! `alias.Symbol` reference in the file then becomes a plain `Symbol`, and
//! resolving it demands the declaration behind it. Demanded declarations
//! are processed first come, first served: each is copied, its own
//! qualified references and references to its package's top-level names
//! are resolved the same way (loading further packages on first use), and
//! it is appended to the file.
//!
//! Every package is loaded at most once and every declaration copied at
//! most once, so import cycles and diamonds terminate.
//!
//! With [`ClosurePolicy::Reachable`] only demanded declarations (plus the
//! methods of demanded types and each package's `init` functions) are
//! copied. [`ClosurePolicy::WholeModule`] copies every declaration of every
//! package it enters.

pub mod loader;
pub mod qualify;
pub mod reach;

pub use loader::{DeclRef, LoadedModule, ModuleFile};
pub use qualify::{QualifiedRewriter, SymbolResolver};
pub use reach::Worklist;

use crate::config::{CollisionPolicy, InlineConfig};
use crate::error::{TransformError, TransformResult};
use crate::naming::Namer;
use goder_parser::ast::*;
use goder_parser::Span;
use goder_pm::{is_external, ModuleLocator};
use reach::{companions, entry_decls};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// Result of inlining
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InlineResult {
    /// Declarations the file had before inlining
    pub input_decls: usize,
    /// Number of packages loaded
    pub packages_inlined: usize,
    /// Number of declarations copied into the file
    pub decls_inlined: usize,
    /// Number of references rewritten
    pub references_rewritten: usize,
    /// Number of copied declarations renamed to avoid a collision
    pub renamed: usize,
}

/// Dependency closure resolver for one file
pub struct Inliner<'a> {
    config: &'a InlineConfig,
    locator: &'a ModuleLocator,
    namer: Namer,
    modules: Vec<LoadedModule>,
    /// Import path -> index into `modules`, for every package entered.
    visited: FxHashMap<String, usize>,
    /// (module, symbol) -> name in the output
    names: FxHashMap<(usize, String), String>,
    /// Output name -> package that owns it
    taken: FxHashMap<String, String>,
    work: Worklist,
    renamed: usize,
}

impl<'a> Inliner<'a> {
    pub fn new(config: &'a InlineConfig, locator: &'a ModuleLocator, namer: Namer) -> Self {
        Self {
            config,
            locator,
            namer,
            modules: Vec::new(),
            visited: FxHashMap::default(),
            names: FxHashMap::default(),
            taken: FxHashMap::default(),
            work: Worklist::new(),
            renamed: 0,
        }
    }

    /// Inline every allow-listed import of `file` in place.
    pub fn inline(mut self, file: &mut SourceFile) -> TransformResult<InlineResult> {
        let mut result = InlineResult {
            input_decls: file.decls.len(),
            ..Default::default()
        };
        let unit = file.package.name.clone();
        for decl in &file.decls {
            for name in defined_names(decl) {
                self.taken.insert(name, unit.clone());
            }
        }

        let mut aliases = FxHashMap::default();
        let mut kept = Vec::new();
        for import in std::mem::take(&mut file.imports) {
            if !is_external(&import.path, &self.config.hosts) {
                kept.push(import);
                continue;
            }
            if import.name.as_deref() == Some(".") {
                tracing::warn!(path = %import.path, "dot imports are not inlined");
                kept.push(import);
                continue;
            }
            let m = self.module(&import.path)?;
            let local = import
                .name
                .clone()
                .unwrap_or_else(|| self.modules[m].package.clone());
            if local != "_" {
                aliases.insert(local, import.path.clone());
            }
        }
        file.imports = kept;

        for decl in &mut file.decls {
            let mut scope = Scope {
                inliner: &mut self,
                module: None,
            };
            result.references_rewritten += QualifiedRewriter::new(&aliases, &mut scope).rewrite(decl)?;
        }

        let mut contributing = BTreeSet::new();
        let mut inlined = Vec::new();
        while let Some((m, at)) = self.work.pop() {
            let mut decl = self.modules[m].decl(at).clone();
            self.rename_defined(m, &mut decl);
            let file_aliases = self.file_aliases(m, at)?;
            let mut scope = Scope {
                inliner: &mut self,
                module: Some(m),
            };
            result.references_rewritten += QualifiedRewriter::new(&file_aliases, &mut scope).rewrite(&mut decl)?;
            renumber(&mut decl);
            contributing.insert((m, at.file));
            inlined.push(decl);
        }

        for (m, f) in contributing {
            for import in &self.modules[m].files[f].carried {
                let present = file
                    .imports
                    .iter()
                    .any(|i| i.path == import.path && i.name == import.name);
                if !present {
                    file.imports.push(ImportSpec {
                        span: Span::dummy(),
                        ..import.clone()
                    });
                }
            }
        }

        result.packages_inlined = self.modules.len();
        result.decls_inlined = inlined.len();
        result.renamed = self.renamed;
        file.decls.extend(inlined);

        tracing::info!(
            packages = result.packages_inlined,
            decls = result.decls_inlined,
            references = result.references_rewritten,
            renamed = result.renamed,
            "inlined external packages"
        );
        Ok(result)
    }

    /// Index of the loaded package `import_path`, loading it on first use.
    fn module(&mut self, import_path: &str) -> TransformResult<usize> {
        if let Some(&index) = self.visited.get(import_path) {
            return Ok(index);
        }
        let module = LoadedModule::load(self.locator, import_path, &self.config.hosts)?;
        let index = self.modules.len();
        self.visited.insert(import_path.to_string(), index);
        let entry = entry_decls(&module, self.config.policy);
        tracing::info!(package = %import_path, files = module.files.len(), "entering external package");
        self.modules.push(module);

        for at in entry {
            self.include(index, at)?;
        }
        Ok(index)
    }

    /// Qualifier -> import path for the inlined imports of the file holding
    /// `at`. Unaliased imports go by the package clause of the imported
    /// package, which may differ from the last element of its path.
    fn file_aliases(&mut self, m: usize, at: DeclRef) -> TransformResult<FxHashMap<String, String>> {
        let file = self.modules[m].file(at);
        let mut aliases = file.external.clone();
        let unnamed = file.unnamed.clone();
        for path in unnamed {
            let dep = self.module(&path)?;
            aliases.insert(self.modules[dep].package.clone(), path);
        }
        Ok(aliases)
    }

    /// Queue a declaration and name everything it declares.
    fn include(&mut self, m: usize, at: DeclRef) -> TransformResult<()> {
        if !self.work.push((m, at)) {
            return Ok(());
        }
        for name in defined_names(self.modules[m].decl(at)) {
            self.output_name(m, &name)?;
        }
        for companion in companions(&self.modules[m], at) {
            self.include(m, companion)?;
        }
        Ok(())
    }

    /// Output name of top-level `symbol` of module `m`.
    fn output_name(&mut self, m: usize, symbol: &str) -> TransformResult<String> {
        let key = (m, symbol.to_string());
        if let Some(name) = self.names.get(&key) {
            return Ok(name.clone());
        }
        let owner = self.modules[m].import_path.clone();
        let name = match self.taken.get(symbol) {
            None => symbol.to_string(),
            Some(first) => match self.config.collisions {
                CollisionPolicy::Error => {
                    return Err(TransformError::NameCollision {
                        name: symbol.to_string(),
                        first: first.clone(),
                        second: owner,
                    })
                }
                CollisionPolicy::Rename => {
                    let taken = &self.taken;
                    let identity = format!("{}.{}", owner, symbol);
                    let fresh = self.namer.fresh(symbol, &identity, &|n| taken.contains_key(n));
                    tracing::info!(package = %owner, %symbol, renamed = %fresh, "renamed colliding declaration");
                    self.renamed += 1;
                    fresh
                }
            },
        };
        self.taken.insert(name.clone(), owner);
        self.names.insert(key, name.clone());
        Ok(name)
    }

    /// Demand `symbol` of module `m`. None if the module has no such
    /// top-level name.
    fn demand(&mut self, m: usize, symbol: &str) -> TransformResult<Option<String>> {
        let Some(at) = self.modules[m].symbol(symbol) else {
            return Ok(None);
        };
        self.include(m, at)?;
        self.output_name(m, symbol).map(Some)
    }

    fn rename_defined(&self, m: usize, decl: &mut Decl) {
        let lookup = |ident: &mut Ident| {
            if let Some(name) = self.names.get(&(m, ident.name.clone())) {
                ident.name = name.clone();
            }
        };
        match decl {
            Decl::Func(func) if func.recv.is_none() && func.name.name != "init" => lookup(&mut func.name),
            Decl::Func(_) => {}
            Decl::Type(spec) => lookup(&mut spec.name),
            Decl::Var(group) | Decl::Const(group) => {
                for spec in &mut group.specs {
                    for name in spec.names.iter_mut().filter(|n| !n.is_blank()) {
                        lookup(name);
                    }
                }
            }
        }
    }
}

/// Top-level names a declaration claims in the unit. Methods and `init`
/// functions claim none.
fn defined_names(decl: &Decl) -> Vec<String> {
    match decl {
        Decl::Func(func) if func.recv.is_some() || func.name.name == "init" => Vec::new(),
        other => other.names(),
    }
}

/// Resolves references for code of one package (or of the input file).
struct Scope<'i, 'a> {
    inliner: &'i mut Inliner<'a>,
    module: Option<usize>,
}

impl SymbolResolver for Scope<'_, '_> {
    fn qualified(&mut self, import_path: &str, symbol: &str) -> TransformResult<String> {
        let m = self.inliner.module(import_path)?;
        match self.inliner.demand(m, symbol)? {
            Some(name) => Ok(name),
            None => {
                tracing::warn!(package = %import_path, %symbol, "package has no such top-level declaration");
                Ok(symbol.to_string())
            }
        }
    }

    fn unqualified(&mut self, name: &str) -> TransformResult<Option<String>> {
        match self.module {
            Some(m) if self.inliner.modules[m].is_symbol(name) => self.inliner.demand(m, name),
            _ => Ok(None),
        }
    }
}

/// Inline every allow-listed import of `file` in place.
pub fn convert_external_pkgs(
    file: &mut SourceFile,
    config: &InlineConfig,
    locator: &ModuleLocator,
    namer: Namer,
) -> TransformResult<InlineResult> {
    Inliner::new(config, locator, namer).inline(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClosurePolicy, GenericsConfig};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_package(cache: &Path, dir: &str, files: &[(&str, &str)]) {
        let dir = cache.join(dir);
        fs::create_dir_all(&dir).unwrap();
        for (name, source) in files {
            fs::write(dir.join(name), source).unwrap();
        }
    }

    fn cache() -> TempDir {
        let cache = tempfile::tempdir().unwrap();
        write_package(
            cache.path(),
            "github.com/acme/mathx@v1.2.0",
            &[(
                "mathx.go",
                "package mathx

import \"strconv\"

const Base = 10

type Pair struct {
	A, B int
}

func (p Pair) Sum() int { return add(p.A, p.B) }

func add(a, b int) int { return a + b }

func Show(n int) string { return strconv.Itoa(n) }

func Unused() {}
",
            )],
        );
        cache
    }

    fn inline_with(source: &str, config: &InlineConfig, cache: &Path) -> TransformResult<(String, InlineResult)> {
        let mut file = goder_parser::parse(source).unwrap();
        let locator = ModuleLocator::new(cache);
        let namer = Namer::new(&GenericsConfig::default());
        let result = convert_external_pkgs(&mut file, config, &locator, namer)?;
        Ok((goder_fmt::format_file(file), result))
    }

    const MAIN: &str = "package main

import (
	\"fmt\"

	\"github.com/acme/mathx\"
)

func main() {
	p := mathx.Pair{A: 1, B: 2}
	fmt.Println(mathx.Show(p.Sum()))
}
";

    #[test]
    fn test_reachable_closure() {
        let cache = cache();
        let (out, result) = inline_with(MAIN, &InlineConfig::default(), cache.path()).unwrap();

        assert!(!out.contains("mathx."));
        assert!(!out.contains("github.com/acme/mathx"));
        assert!(out.contains("p := Pair{A: 1, B: 2}"));
        assert!(out.contains("func (p Pair) Sum() int"));
        assert!(out.contains("func add(a, b int) int"));
        assert!(out.contains("\"strconv\""));
        assert!(!out.contains("Unused"));
        assert!(!out.contains("Base"));
        assert_eq!(result.packages_inlined, 1);
        assert_eq!(result.decls_inlined, 4);
    }

    #[test]
    fn test_whole_module_closure() {
        let cache = cache();
        let config = InlineConfig {
            policy: ClosurePolicy::WholeModule,
            ..Default::default()
        };
        let (out, result) = inline_with(MAIN, &config, cache.path()).unwrap();
        assert!(out.contains("func Unused()"));
        assert!(out.contains("const Base = 10"));
        assert_eq!(result.decls_inlined, 6);
    }

    #[test]
    fn test_collision_is_fatal_by_default() {
        let cache = cache();
        let source = "package main\n\nimport \"github.com/acme/mathx\"\n\nfunc add(a, b int) int { return a - b }\n\nfunc main() { println(mathx.Pair{}.Sum()) }\n";
        let err = inline_with(source, &InlineConfig::default(), cache.path()).unwrap_err();
        match err {
            TransformError::NameCollision { name, first, second } => {
                assert_eq!(name, "add");
                assert_eq!(first, "main");
                assert_eq!(second, "github.com/acme/mathx");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_collision_renamed_on_request() {
        let cache = cache();
        let config = InlineConfig {
            collisions: CollisionPolicy::Rename,
            ..Default::default()
        };
        let source = "package main\n\nimport \"github.com/acme/mathx\"\n\nfunc add(a, b int) int { return a - b }\n\nfunc main() { println(mathx.Pair{}.Sum(), add(1, 2)) }\n";
        let (out, result) = inline_with(source, &config, cache.path()).unwrap();
        assert_eq!(result.renamed, 1);
        assert!(out.contains("return a - b"));
        assert_eq!(out.matches("func add").count(), 2);
        assert!(!out.contains("return add(p.A, p.B)"));
    }

    #[test]
    fn test_missing_package_reports_hint() {
        let cache = tempfile::tempdir().unwrap();
        let err = inline_with(MAIN, &InlineConfig::default(), cache.path()).unwrap_err();
        assert_eq!(err.kind(), "ModuleNotFound");
        assert!(err.to_string().contains("go get \"github.com/acme/mathx\""));
    }

    #[test]
    fn test_closed_unit_is_unchanged() {
        let cache = cache();
        let (once, _) = inline_with(MAIN, &InlineConfig::default(), cache.path()).unwrap();
        let (twice, result) = inline_with(&once, &InlineConfig::default(), cache.path()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(result, InlineResult {
            input_decls: result.input_decls,
            ..Default::default()
        });
    }
}

//! Loading external packages
//!
//! A package is located in the module cache, every non-test source file in
//! its directory is parsed, and its top-level declarations are indexed by
//! name.

use crate::error::{TransformError, TransformResult};
use goder_parser::ast::*;
use goder_parser::{ParseError, Span};
use goder_pm::{is_external, source_files, Location, ModuleLocator};
use rustc_hash::FxHashMap;
use std::path::PathBuf;

/// Position of a declaration inside a [`LoadedModule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclRef {
    pub file: usize,
    pub decl: usize,
}

/// One parsed source file of an external package.
#[derive(Debug)]
pub struct ModuleFile {
    pub path: PathBuf,
    pub source: SourceFile,
    /// Explicit alias -> import path, for imports that are inlined as well.
    pub external: FxHashMap<String, String>,
    /// Inlined imports without an alias. Their local name is the package
    /// clause of the imported package, known only once it is loaded.
    pub unnamed: Vec<String>,
    /// Imports the unit has to carry when this file contributes code.
    pub carried: Vec<ImportSpec>,
}

/// A parsed external package.
#[derive(Debug)]
pub struct LoadedModule {
    pub import_path: String,
    pub location: Location,
    /// Name from the package clause.
    pub package: String,
    pub files: Vec<ModuleFile>,
    symbols: FxHashMap<String, DeclRef>,
    methods: FxHashMap<String, Vec<DeclRef>>,
    inits: Vec<DeclRef>,
}

impl LoadedModule {
    /// Locate and parse the package `import_path`.
    pub fn load(locator: &ModuleLocator, import_path: &str, hosts: &[String]) -> TransformResult<Self> {
        let location = locator.resolve(import_path)?;
        tracing::debug!(
            package = %import_path,
            version = %location.version,
            dir = %location.dir.display(),
            "loading external package"
        );

        let mut files = Vec::new();
        for path in source_files(&location.dir)? {
            let text = std::fs::read_to_string(&path)?;
            let source = match goder_parser::parse(&text) {
                Ok(source) => source,
                Err(errors) => {
                    return Err(TransformError::ExternalParseError {
                        package: import_path.to_string(),
                        file: path,
                        error: first_error(errors),
                    });
                }
            };
            if source.package.name == "main" || source.package.name.ends_with("_test") {
                tracing::debug!(file = %path.display(), "skipping file of another package");
                continue;
            }
            let (external, unnamed, carried) = split_imports(&source.imports, hosts);
            files.push(ModuleFile {
                path,
                source,
                external,
                unnamed,
                carried,
            });
        }

        let package = files
            .first()
            .map(|f| f.source.package.name.clone())
            .unwrap_or_else(|| default_package_name(import_path).to_string());

        let mut module = Self {
            import_path: import_path.to_string(),
            location,
            package,
            files,
            symbols: FxHashMap::default(),
            methods: FxHashMap::default(),
            inits: Vec::new(),
        };
        module.index();
        Ok(module)
    }

    fn index(&mut self) {
        let mut defined = Vec::new();
        for (f, file) in self.files.iter().enumerate() {
            for (d, decl) in file.source.decls.iter().enumerate() {
                let at = DeclRef { file: f, decl: d };
                match decl {
                    Decl::Func(func) if func.recv.is_none() && func.name.name == "init" => {
                        self.inits.push(at);
                    }
                    Decl::Func(func) => match &func.recv {
                        Some(recv) => self
                            .methods
                            .entry(recv.base_name().to_string())
                            .or_default()
                            .push(at),
                        None => defined.push((func.name.name.clone(), at)),
                    },
                    other => defined.extend(other.names().into_iter().map(|name| (name, at))),
                }
            }
        }
        for (name, at) in defined {
            self.define(name, at);
        }
    }

    fn define(&mut self, name: String, at: DeclRef) {
        if self.symbols.contains_key(&name) {
            // Usually the same symbol in files for different platforms.
            tracing::debug!(package = %self.import_path, %name, "ignoring second declaration");
            return;
        }
        self.symbols.insert(name, at);
    }

    pub fn symbol(&self, name: &str) -> Option<DeclRef> {
        self.symbols.get(name).copied()
    }

    pub fn is_symbol(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    /// Every top-level symbol, sorted.
    pub fn symbol_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.symbols.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn methods_of(&self, type_name: &str) -> &[DeclRef] {
        self.methods.get(type_name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn inits(&self) -> &[DeclRef] {
        &self.inits
    }

    /// Every declaration, in file order.
    pub fn all_decls(&self) -> Vec<DeclRef> {
        self.files
            .iter()
            .enumerate()
            .flat_map(|(f, file)| (0..file.source.decls.len()).map(move |d| DeclRef { file: f, decl: d }))
            .collect()
    }

    pub fn decl(&self, at: DeclRef) -> &Decl {
        &self.files[at.file].source.decls[at.decl]
    }

    pub fn file(&self, at: DeclRef) -> &ModuleFile {
        &self.files[at.file]
    }
}

/// Split a file's imports into inlined ones (aliased, then unaliased by
/// path) and carried ones.
fn split_imports(
    imports: &[ImportSpec],
    hosts: &[String],
) -> (FxHashMap<String, String>, Vec<String>, Vec<ImportSpec>) {
    let mut external = FxHashMap::default();
    let mut unnamed = Vec::new();
    let mut carried = Vec::new();
    for import in imports {
        if !is_external(&import.path, hosts) || import.name.as_deref() == Some(".") {
            carried.push(import.clone());
            continue;
        }
        match import.name.as_deref() {
            Some("_") => {}
            Some(alias) => {
                external.insert(alias.to_string(), import.path.clone());
            }
            None => unnamed.push(import.path.clone()),
        }
    }
    (external, unnamed, carried)
}

/// The error reported for a file that does not parse.
fn first_error(errors: Vec<ParseError>) -> ParseError {
    errors
        .into_iter()
        .next()
        .unwrap_or_else(|| ParseError::invalid_syntax("file does not parse", Span::dummy()))
}

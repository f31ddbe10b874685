//! Import normalization
//!
//! After declarations are copied between files the import list no longer
//! matches the code: specialized or inlined declarations may need packages
//! the file never imported, and removed declarations leave imports unused.
//! [`normalize_imports`] prunes unused imports, adds standard-library
//! imports for unbound qualifiers, and sorts the list into a standard
//! library group followed by everything else.

use goder_parser::ast::*;
use rustc_hash::FxHashSet;

/// Standard-library packages by the name code refers to them with.
const STD_PACKAGES: &[(&str, &str)] = &[
    ("atomic", "sync/atomic"),
    ("big", "math/big"),
    ("bits", "math/bits"),
    ("bufio", "bufio"),
    ("bytes", "bytes"),
    ("cmp", "cmp"),
    ("context", "context"),
    ("errors", "errors"),
    ("filepath", "path/filepath"),
    ("fmt", "fmt"),
    ("heap", "container/heap"),
    ("io", "io"),
    ("json", "encoding/json"),
    ("list", "container/list"),
    ("log", "log"),
    ("maps", "maps"),
    ("math", "math"),
    ("os", "os"),
    ("path", "path"),
    ("rand", "math/rand"),
    ("reflect", "reflect"),
    ("regexp", "regexp"),
    ("runtime", "runtime"),
    ("slices", "slices"),
    ("sort", "sort"),
    ("strconv", "strconv"),
    ("strings", "strings"),
    ("sync", "sync"),
    ("time", "time"),
    ("unicode", "unicode"),
    ("utf8", "unicode/utf8"),
];

/// Import path of the standard-library package usually referred to as
/// `name`.
pub fn std_package_path(name: &str) -> Option<&'static str> {
    STD_PACKAGES
        .binary_search_by(|(n, _)| n.cmp(&name))
        .ok()
        .map(|i| STD_PACKAGES[i].1)
}

/// What [`normalize_imports`] changed, by import path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportChanges {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

/// Bring the import list of `file` in line with the qualifiers it uses.
pub fn normalize_imports(file: &mut SourceFile) -> ImportChanges {
    let used = used_qualifiers(file);
    let declared: FxHashSet<String> = file.decls.iter().flat_map(|d| d.names()).collect();
    let mut changes = ImportChanges::default();

    let mut kept: Vec<ImportSpec> = Vec::new();
    for spec in std::mem::take(&mut file.imports) {
        let duplicate = kept
            .iter()
            .any(|k| k.path == spec.path && k.name == spec.name);
        if duplicate {
            continue;
        }
        if is_used(&spec, &used) {
            kept.push(spec);
        } else {
            tracing::debug!(path = %spec.path, "removing unused import");
            changes.removed.push(spec.path);
        }
    }

    let mut missing: Vec<&String> = used
        .iter()
        .filter(|q| !declared.contains(*q))
        .filter(|q| !kept.iter().any(|k| &k.local_name() == *q))
        .collect();
    missing.sort();
    for qualifier in missing {
        if let Some(path) = std_package_path(qualifier) {
            tracing::debug!(%path, "adding missing import");
            changes.added.push(path.to_string());
            kept.push(ImportSpec::new(path));
        }
    }

    kept.sort_by(|a, b| {
        (!is_std(&a.path), &a.path, &a.name).cmp(&(!is_std(&b.path), &b.path, &b.name))
    });
    file.imports = kept;
    changes
}

fn is_used(spec: &ImportSpec, used: &FxHashSet<String>) -> bool {
    match spec.name.as_deref() {
        Some("_") | Some(".") => true,
        Some(name) => used.contains(name),
        None => {
            let name = default_package_name(&spec.path);
            // The real package name of paths like `go-yaml` is unknown here.
            !is_identifier(name) || used.contains(name)
        }
    }
}

fn is_std(path: &str) -> bool {
    !path.split('/').next().is_some_and(|first| first.contains('.'))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Names used as package qualifiers (`fmt` in `fmt.Println`, `lo` in
/// `lo.Tuple2[int, string]`), ignoring selectors on names declared locally
/// in the same top-level declaration.
pub fn used_qualifiers(file: &SourceFile) -> FxHashSet<String> {
    let mut used = FxHashSet::default();
    for decl in &file.decls {
        let locals = local_names(decl);
        let mut finder = QualifierFinder {
            locals: &locals,
            used: &mut used,
        };
        finder.visit_decl(decl);
    }
    used
}

/// Names bound inside `decl`: receiver, parameters, results, locals and
/// function literal parameters. Scoping is ignored.
pub fn local_names(decl: &Decl) -> FxHashSet<String> {
    let mut locals = LocalNames::default();
    locals.visit_decl(decl);
    if let Decl::Func(func) = decl {
        locals.func_names(func);
    }
    locals.names
}

#[derive(Default)]
struct LocalNames {
    names: FxHashSet<String>,
}

impl LocalNames {
    fn add(&mut self, ident: &Ident) {
        self.names.insert(ident.name.clone());
    }

    fn add_fields(&mut self, sig: &Signature) {
        for field in sig.params.iter().chain(sig.results.iter()) {
            for name in &field.names {
                self.add(name);
            }
        }
    }

    fn func_names(&mut self, func: &FuncDecl) {
        if let Some(name) = func.recv.as_ref().and_then(|r| r.name.as_ref()) {
            self.add(name);
        }
        self.add_fields(&func.sig);
    }

    fn add_defined(&mut self, expr: &Expr) {
        if let Some(name) = expr.as_ident() {
            self.names.insert(name.to_string());
        }
    }
}

impl Visitor for LocalNames {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Assign(assign) if assign.op == AssignOp::Define => {
                for lhs in &assign.lhs {
                    self.add_defined(lhs);
                }
            }
            Stmt::Range(range) if range.define => {
                for part in [&range.key, &range.value].into_iter().flatten() {
                    self.add_defined(part);
                }
            }
            Stmt::TypeSwitch(switch) => {
                if let Some(binding) = &switch.binding {
                    self.add(binding);
                }
            }
            Stmt::Decl(Decl::Var(group)) | Stmt::Decl(Decl::Const(group)) => {
                for spec in &group.specs {
                    for name in &spec.names {
                        self.add(name);
                    }
                }
            }
            _ => {}
        }
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        if let ExprKind::FuncLit { sig, .. } = &expr.kind {
            self.add_fields(sig);
        }
        walk_expr(self, expr);
    }
}

struct QualifierFinder<'a> {
    locals: &'a FxHashSet<String>,
    used: &'a mut FxHashSet<String>,
}

impl Visitor for QualifierFinder<'_> {
    fn visit_expr(&mut self, expr: &Expr) {
        if let ExprKind::Selector { base, .. } = &expr.kind {
            if let Some(name) = base.as_ident() {
                if !self.locals.contains(name) {
                    self.used.insert(name.to_string());
                }
            }
        }
        walk_expr(self, expr);
    }

    fn visit_type_expr(&mut self, ty: &TypeExpr) {
        if let TypeExpr::Qualified { package, .. } = ty {
            self.used.insert(package.name.clone());
        }
        walk_type_expr(self, ty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(source: &str) -> (Vec<String>, ImportChanges) {
        let mut file = goder_parser::parse(source).unwrap();
        let changes = normalize_imports(&mut file);
        let paths = file.imports.iter().map(|i| i.path.clone()).collect();
        (paths, changes)
    }

    #[test]
    fn test_std_table_is_sorted() {
        assert!(STD_PACKAGES.windows(2).all(|w| w[0].0 < w[1].0));
        assert_eq!(std_package_path("strconv"), Some("strconv"));
        assert_eq!(std_package_path("rand"), Some("math/rand"));
        assert_eq!(std_package_path("lo"), None);
    }

    #[test]
    fn test_unused_import_removed() {
        let (paths, changes) = normalized(
            "package main\n\nimport (\n\t\"fmt\"\n\t\"github.com/samber/lo\"\n)\n\nfunc main() { fmt.Println() }\n",
        );
        assert_eq!(paths, vec!["fmt"]);
        assert_eq!(changes.removed, vec!["github.com/samber/lo"]);
    }

    #[test]
    fn test_missing_std_import_added() {
        let (paths, changes) = normalized(
            "package main\n\nimport \"fmt\"\n\nfunc main() { fmt.Println(strconv.Itoa(1)) }\n",
        );
        assert_eq!(paths, vec!["fmt", "strconv"]);
        assert_eq!(changes.added, vec!["strconv"]);
    }

    #[test]
    fn test_local_shadowing_is_not_a_qualifier() {
        let (paths, _) = normalized(
            "package main\n\ntype S struct{ N int }\n\nfunc f(strings S) int { return strings.N }\n",
        );
        assert!(paths.is_empty());
    }

    #[test]
    fn test_blank_and_dot_imports_kept_and_sorted() {
        let (paths, _) = normalized(
            "package main\n\nimport (\n\t\"github.com/x/y\"\n\t_ \"embed\"\n\t. \"math\"\n)\n\nfunc main() { y.Do() }\n",
        );
        assert_eq!(paths, vec!["embed", "math", "github.com/x/y"]);
    }

    #[test]
    fn test_qualified_type_counts_as_use() {
        let (paths, _) = normalized(
            "package main\n\nimport \"strings\"\n\nvar b strings.Builder\n",
        );
        assert_eq!(paths, vec!["strings"]);
    }
}

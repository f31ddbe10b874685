//! Unit assembly
//!
//! Last step of every transformation: make sure no two top-level
//! declarations share a name, then print the file with its imports
//! normalized.

use crate::error::{TransformError, TransformResult};
use goder_parser::ast::*;
use rustc_hash::FxHashMap;

/// Check the assembled file and render it.
pub fn assemble(file: SourceFile) -> TransformResult<String> {
    check_unique(&file.decls)?;
    Ok(goder_fmt::format_file(file))
}

fn check_unique(decls: &[Decl]) -> TransformResult<()> {
    let mut seen: FxHashMap<String, String> = FxHashMap::default();
    for decl in decls {
        if matches!(decl, Decl::Func(f) if f.recv.is_none() && f.name.name == "init") {
            continue;
        }
        for name in decl.names() {
            let this = describe(decl, &name);
            if let Some(first) = seen.insert(name.clone(), this.clone()) {
                return Err(TransformError::NameCollision {
                    name,
                    first,
                    second: this,
                });
            }
        }
    }
    Ok(())
}

fn describe(decl: &Decl, name: &str) -> String {
    let keyword = match decl {
        Decl::Func(_) => "func",
        Decl::Type(_) => "type",
        Decl::Var(_) => "var",
        Decl::Const(_) => "const",
    };
    format!("{} {}", keyword, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_formats_and_prunes_imports() {
        let file = goder_parser::parse(
            "package main\n\nimport (\n\t\"fmt\"\n\t\"os\"\n)\n\nfunc main() { fmt.Println(strings.ToUpper(\"a\")) }\n",
        )
        .unwrap();
        let out = assemble(file).unwrap();
        assert!(out.starts_with("package main\n\nimport (\n\t\"fmt\"\n\t\"strings\"\n)\n"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let file = goder_parser::parse("package main\n\nfunc Show() {}\n\nvar Show = 1\n").unwrap();
        let err = assemble(file).unwrap_err();
        assert_eq!(err.to_string(), "Show is declared by both func Show and var Show");
    }

    #[test]
    fn test_several_init_functions_allowed() {
        let file = goder_parser::parse("package main\n\nfunc init() {}\n\nfunc init() {}\n\nfunc main() {}\n").unwrap();
        assert!(assemble(file).is_ok());
    }
}

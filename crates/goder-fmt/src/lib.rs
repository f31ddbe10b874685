//! Goder Formatter
//!
//! Turns a syntax tree back into gofmt-style Go source, and keeps the
//! import list in step with the qualifiers the tree actually uses.
//!
//! ```rust
//! let file = goder_parser::parse("package main\nfunc main(){println(1+2)}\n").unwrap();
//! assert_eq!(
//!     goder_fmt::render(&file),
//!     "package main\n\nfunc main() {\n\tprintln(1 + 2)\n}\n"
//! );
//! ```

pub mod imports;
pub mod printer;

pub use imports::{local_names, normalize_imports, std_package_path, ImportChanges};
pub use printer::Printer;

use goder_parser::ast::SourceFile;
use goder_parser::ParseError;

/// Print a file as Go source.
pub fn render(file: &SourceFile) -> String {
    let mut printer = Printer::new();
    printer.source_file(file);
    printer.finish()
}

/// Normalize imports and print. The formatter entry point used on a fully
/// assembled unit.
pub fn format_file(mut file: SourceFile) -> String {
    normalize_imports(&mut file);
    render(&file)
}

/// Parse, normalize imports and print Go source text.
pub fn format_source(source: &str) -> Result<String, Vec<ParseError>> {
    let file = goder_parser::parse(source)?;
    Ok(format_file(file))
}

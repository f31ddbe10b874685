//! Diagnostic output on stderr.
//!
//! Uses `termcolor` for colored terminal output and respects `NO_COLOR` and
//! the `--color` flag.

use clap::ValueEnum;
use codespan_reporting::files::SimpleFiles;
use goder_compiler::diagnostic::{create_files, error_code};
use goder_compiler::{BindingIncomplete, Diagnostic, TransformError};
use std::io::Write;
use std::path::Path;
use termcolor::{ColorChoice, StandardStream};

/// Resolve `ColorChoice` from CLI flag and environment.
///
/// Priority: `NO_COLOR` env > `--color` flag > auto-detect TTY.
pub fn resolve_color_choice(flag: Option<&str>) -> ColorChoice {
    if std::env::var_os("NO_COLOR").is_some() {
        return ColorChoice::Never;
    }
    match flag {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    /// Annotated source snippets
    Human,
    /// One JSON object per line
    Json,
}

/// Writes warnings and fatal errors against the input file.
pub struct Reporter {
    stderr: StandardStream,
    format: MessageFormat,
    files: SimpleFiles<String, String>,
}

/// The input file is the only file diagnostics point into.
const INPUT: usize = 0;

impl Reporter {
    pub fn new(choice: ColorChoice, format: MessageFormat) -> Self {
        Self {
            stderr: StandardStream::stderr(choice),
            format,
            files: SimpleFiles::new(),
        }
    }

    pub fn add_source(&mut self, path: &Path, source: &str) {
        self.files = create_files(path, source);
    }

    pub fn warning(&mut self, warning: &BindingIncomplete) {
        let diagnostic = Diagnostic::from_binding_incomplete(warning, INPUT);
        self.emit(&diagnostic);
    }

    /// Report an error that ends the run.
    pub fn fatal(&mut self, err: &anyhow::Error) {
        let diagnostics = match err.downcast_ref::<TransformError>() {
            Some(inner) if err.chain().count() == 1 => Diagnostic::from_transform_error(inner, INPUT),
            Some(inner) => vec![Diagnostic::error(format!("{:#}", err)).with_code(error_code(inner))],
            None => vec![Diagnostic::error(format!("{:#}", err))],
        };
        for diagnostic in &diagnostics {
            self.emit(diagnostic);
        }
    }

    fn emit(&mut self, diagnostic: &Diagnostic) {
        match self.format {
            MessageFormat::Human => {
                if diagnostic.emit(&mut self.stderr, &self.files).is_err() {
                    let _ = writeln!(self.stderr, "{}", diagnostic.message());
                }
            }
            MessageFormat::Json => match diagnostic.to_json(&self.files) {
                Ok(line) => {
                    let _ = writeln!(self.stderr, "{}", line);
                }
                Err(err) => tracing::error!(%err, "failed to serialize diagnostic"),
            },
        }
    }
}

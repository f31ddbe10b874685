//! Diagnostic rendering
//!
//! Fatal errors and the non-fatal [`BindingIncomplete`] warnings are turned
//! into [`Diagnostic`]s, which render either as annotated source snippets
//! (codespan-reporting) or as JSON for tools.

use crate::error::TransformError;
use codespan_reporting::diagnostic::{Diagnostic as CsDiagnostic, Label, LabelStyle, Severity};
use codespan_reporting::files::{Files, SimpleFiles};
use codespan_reporting::term;
use codespan_reporting::term::termcolor::WriteColor;
use goder_parser::{CheckError, ParseError, Span};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A call site whose type-parameter binding could not be completed.
///
/// The specialization is still emitted, with the unbound parameters left in
/// place, so the output fails to compile at exactly that declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BindingIncomplete {
    /// The generic declaration being instantiated.
    pub callee: String,
    /// The specialization emitted anyway.
    pub specialized: String,
    /// Type parameters left unbound.
    pub missing: Vec<String>,
    /// Location of the call, when it lies in the input file.
    pub span: Option<Span>,
}

impl fmt::Display for BindingIncomplete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot infer {} in call to {}",
            self.missing.join(", "),
            self.callee
        )
    }
}

/// Error code for a diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCode(pub &'static str);

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        self.0
    }
}

/// A diagnostic message with source code context
pub struct Diagnostic {
    inner: CsDiagnostic<usize>,
    code: Option<ErrorCode>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            inner: CsDiagnostic::new(severity).with_message(message),
            code: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.inner = self.inner.with_code(code.0);
        self.code = Some(code);
        self
    }

    /// Add the main location. Synthesized spans (line 0) are skipped.
    pub fn with_primary_label(mut self, file_id: usize, span: Span, message: impl Into<String>) -> Self {
        if span.line > 0 {
            let label = Label::primary(file_id, span.start..span.end).with_message(message);
            self.inner.labels.push(label);
        }
        self
    }

    pub fn with_secondary_label(mut self, file_id: usize, span: Span, message: impl Into<String>) -> Self {
        if span.line > 0 {
            let label = Label::secondary(file_id, span.start..span.end).with_message(message);
            self.inner.labels.push(label);
        }
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.inner.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.inner.notes.push(format!("help: {}", help.into()));
        self
    }

    pub fn from_parse_error(error: &ParseError, file_id: usize) -> Self {
        let mut diag = Diagnostic::error(error.message.clone())
            .with_code(ErrorCode("ParseError"))
            .with_primary_label(file_id, error.span, "syntax error");
        if let Some(suggestion) = &error.suggestion {
            diag = diag.with_help(suggestion.clone());
        }
        diag
    }

    pub fn from_check_error(error: &CheckError, file_id: usize) -> Self {
        match error {
            CheckError::UndefinedName { span, .. } => Diagnostic::error(error.to_string())
                .with_code(ErrorCode("CheckError"))
                .with_primary_label(file_id, *span, "not found in this scope"),
            CheckError::DuplicateDeclaration {
                original,
                duplicate,
                ..
            } => Diagnostic::error(error.to_string())
                .with_code(ErrorCode("CheckError"))
                .with_primary_label(file_id, *duplicate, "redeclared here")
                .with_secondary_label(file_id, *original, "first declared here"),
        }
    }

    pub fn from_binding_incomplete(warning: &BindingIncomplete, file_id: usize) -> Self {
        let mut diag = Diagnostic::warning(warning.to_string())
            .with_code(ErrorCode("BindingIncomplete"))
            .with_note(format!(
                "{} still refers to {}",
                warning.specialized,
                warning.missing.join(", ")
            ))
            .with_help("instantiate the call explicitly, e.g. f[int](...)");
        if let Some(span) = warning.span {
            diag = diag.with_primary_label(file_id, span, "type arguments inferred here");
        }
        diag
    }

    /// Diagnostics for a fatal error. Parse and check errors produce one
    /// diagnostic per reported error, with labels into `file_id`.
    pub fn from_transform_error(error: &TransformError, file_id: usize) -> Vec<Self> {
        match error {
            TransformError::ParseError { errors } => errors
                .iter()
                .map(|e| Self::from_parse_error(e, file_id))
                .collect(),
            TransformError::CheckError { errors } => errors
                .iter()
                .map(|e| Self::from_check_error(e, file_id))
                .collect(),
            TransformError::ExternalParseError { error: inner, .. } => {
                vec![Diagnostic::error(error.to_string())
                    .with_code(error_code(error))
                    .with_note(format!("at line {}, column {}", inner.span.line, inner.span.column))]
            }
            TransformError::NameCollision { .. } => vec![Diagnostic::error(error.to_string())
                .with_code(error_code(error))
                .with_help("set `collisions = \"rename\"` under [inline] in goder.toml")],
            other => vec![Diagnostic::error(other.to_string()).with_code(error_code(other))],
        }
    }

    pub fn severity(&self) -> Severity {
        self.inner.severity
    }

    pub fn message(&self) -> &str {
        &self.inner.message
    }

    /// Render as an annotated snippet.
    pub fn emit(
        &self,
        writer: &mut dyn WriteColor,
        files: &SimpleFiles<String, String>,
    ) -> Result<(), codespan_reporting::files::Error> {
        let config = term::Config::default();
        term::emit(writer, &config, files, &self.inner)
    }

    pub fn inner(&self) -> &CsDiagnostic<usize> {
        &self.inner
    }

    /// Convert to JSON representation for editor and CI integration
    pub fn to_json(&self, files: &SimpleFiles<String, String>) -> Result<String, serde_json::Error> {
        serde_json::to_string(&JsonDiagnostic::from_diagnostic(self, files))
    }
}

/// JSON representation of a diagnostic
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonDiagnostic {
    pub code: Option<String>,
    pub severity: String,
    pub message: String,
    pub labels: Vec<JsonLabel>,
    pub notes: Vec<String>,
}

/// JSON representation of a diagnostic label
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonLabel {
    pub file: String,
    /// 1-indexed
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub message: Option<String>,
    /// `primary` or `secondary`
    pub style: String,
}

impl JsonDiagnostic {
    pub fn from_diagnostic(diag: &Diagnostic, files: &SimpleFiles<String, String>) -> Self {
        let severity = match diag.inner.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
            Severity::Help => "help",
            Severity::Bug => "bug",
        };

        let labels = diag
            .inner
            .labels
            .iter()
            .filter_map(|label| {
                let file = files.get(label.file_id).ok()?;
                let start = file.location((), label.range.start).ok()?;
                let end = file.location((), label.range.end).ok()?;
                Some(JsonLabel {
                    file: file.name().to_string(),
                    start_line: start.line_number,
                    start_column: start.column_number,
                    end_line: end.line_number,
                    end_column: end.column_number,
                    message: Some(label.message.clone()),
                    style: match label.style {
                        LabelStyle::Primary => "primary",
                        LabelStyle::Secondary => "secondary",
                    }
                    .to_string(),
                })
            })
            .collect();

        JsonDiagnostic {
            code: diag.code.as_ref().map(|c| c.0.to_string()),
            severity: severity.to_string(),
            message: diag.inner.message.clone(),
            labels,
            notes: diag.inner.notes.clone(),
        }
    }
}

/// Error code for a fatal error: its stable kind name.
pub fn error_code(error: &TransformError) -> ErrorCode {
    ErrorCode(error.kind())
}

/// Helper to create a SimpleFiles instance holding one source file
pub fn create_files(path: impl Into<PathBuf>, source: impl Into<String>) -> SimpleFiles<String, String> {
    let mut files = SimpleFiles::new();
    files.add(path.into().display().to_string(), source.into());
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use codespan_reporting::term::termcolor::NoColor;

    const SOURCE: &str = "package main\n\nfunc main() {\n\tfoo()\n}\n";

    fn foo_span() -> Span {
        let start = SOURCE.find("foo").unwrap();
        Span::new(start, start + 3, 4, 2)
    }

    #[test]
    fn test_check_error_renders_snippet() {
        let files = create_files("main.go", SOURCE);
        let error = CheckError::UndefinedName {
            name: "foo".to_string(),
            span: foo_span(),
        };
        let diag = Diagnostic::from_check_error(&error, 0);
        let mut out = NoColor::new(Vec::new());
        diag.emit(&mut out, &files).unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert!(text.contains("error[CheckError]: undefined: foo"));
        assert!(text.contains("main.go:4:2"));
        assert!(text.contains("not found in this scope"));
    }

    #[test]
    fn test_binding_incomplete_json() {
        let files = create_files("main.go", SOURCE);
        let warning = BindingIncomplete {
            callee: "Keys".to_string(),
            specialized: "KeysAbcdefgh".to_string(),
            missing: vec!["K".to_string(), "V".to_string()],
            span: Some(foo_span()),
        };
        let json = Diagnostic::from_binding_incomplete(&warning, 0)
            .to_json(&files)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["code"], "BindingIncomplete");
        assert_eq!(value["severity"], "warning");
        assert_eq!(value["message"], "cannot infer K, V in call to Keys");
        assert_eq!(value["labels"][0]["start_line"], 4);
        assert_eq!(value["labels"][0]["start_column"], 2);
    }

    #[test]
    fn test_synthesized_spans_have_no_labels() {
        let diag = Diagnostic::error("boom").with_primary_label(0, Span::dummy(), "here");
        assert!(diag.inner().labels.is_empty());
    }

    #[test]
    fn test_transform_error_codes() {
        let err = TransformError::SpecializationLimit { rounds: 3 };
        let diags = Diagnostic::from_transform_error(&err, 0);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity(), Severity::Error);
        assert!(diags[0].message().contains("3 rounds"));
        assert_eq!(diags[0].inner().code.as_deref(), Some("SpecializationLimit"));
    }
}

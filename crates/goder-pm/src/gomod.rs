//! go.mod parsing
//!
//! Only the directives goder needs are read: `module`, `go` and `require`
//! (single-line and block forms). Other directives are skipped, including
//! their blocks.

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while reading a go.mod file
#[derive(Debug, Error)]
pub enum GoModError {
    /// Failed to read the file
    #[error("Failed to read go.mod: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed directive
    #[error("go.mod:{line}: {message}")]
    Syntax {
        /// 1-based line number
        line: usize,
        message: String,
    },
}

/// One `require` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Require {
    pub path: String,
    pub version: String,
    /// Marked `// indirect`.
    pub indirect: bool,
}

/// The parts of a go.mod file goder uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GoMod {
    pub module: Option<String>,
    pub go: Option<String>,
    pub require: Vec<Require>,
}

impl GoMod {
    /// Parse go.mod source text.
    pub fn parse(source: &str) -> Result<Self, GoModError> {
        let mut gomod = GoMod::default();
        let mut block: Option<String> = None;

        for (index, raw) in source.lines().enumerate() {
            let line_no = index + 1;
            let (line, comment) = split_comment(raw);
            let line = line.trim();

            if let Some(directive) = &block {
                if line == ")" {
                    block = None;
                } else if !line.is_empty() && directive == "require" {
                    gomod
                        .require
                        .push(parse_require(line, comment, line_no)?);
                }
                continue;
            }

            if line.is_empty() {
                continue;
            }

            let (directive, rest) = match line.split_once(char::is_whitespace) {
                Some((d, r)) => (d, r.trim()),
                None => (line, ""),
            };

            if rest == "(" {
                block = Some(directive.to_string());
                continue;
            }

            match directive {
                "module" => gomod.module = Some(unquote(rest).to_string()),
                "go" => gomod.go = Some(rest.to_string()),
                "require" => gomod.require.push(parse_require(rest, comment, line_no)?),
                _ => {}
            }
        }

        if let Some(directive) = block {
            return Err(GoModError::Syntax {
                line: source.lines().count(),
                message: format!("unterminated {} block", directive),
            });
        }

        Ok(gomod)
    }

    /// Read and parse a go.mod file.
    pub fn from_file(path: &Path) -> Result<Self, GoModError> {
        let source = std::fs::read_to_string(path)?;
        Self::parse(&source)
    }

    /// The pinned requirement whose module path is the longest prefix of
    /// `import_path`.
    pub fn requirement_for(&self, import_path: &str) -> Option<&Require> {
        self.require
            .iter()
            .filter(|r| is_path_prefix(&r.path, import_path))
            .max_by_key(|r| r.path.len())
    }
}

fn parse_require(text: &str, comment: Option<&str>, line: usize) -> Result<Require, GoModError> {
    let mut parts = text.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(path), Some(version), None) => Ok(Require {
            path: unquote(path).to_string(),
            version: version.to_string(),
            indirect: comment.is_some_and(|c| c.trim() == "indirect"),
        }),
        _ => Err(GoModError::Syntax {
            line,
            message: format!("usage: require module/path v1.2.3, found {:?}", text),
        }),
    }
}

fn split_comment(line: &str) -> (&str, Option<&str>) {
    match line.find("//") {
        Some(pos) => (&line[..pos], Some(&line[pos + 2..])),
        None => (line, None),
    }
}

fn unquote(s: &str) -> &str {
    s.trim_matches('"')
}

/// `prefix` equals `path` or is followed by `/` in it.
pub(crate) fn is_path_prefix(prefix: &str, path: &str) -> bool {
    path == prefix
        || (path.starts_with(prefix) && path.as_bytes().get(prefix.len()) == Some(&b'/'))
}

/// Find the nearest go.mod, starting at `start_dir` and walking up.
pub fn find_go_mod(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir;

    loop {
        let candidate = current.join("go.mod");
        if candidate.is_file() {
            return Some(candidate);
        }

        current = current.parent()?;
    }
}

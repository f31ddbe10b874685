//! Module cache lookup
//!
//! The cache stores each module version in a directory named
//! `<escaped module path>@<version>`; packages are subdirectories of it.
//! [`ModuleLocator::locate`] walks an import path segment by segment,
//! entering the one versioned directory matching a segment (or the version
//! pinned by go.mod) and plain directories after that.

use crate::escape::escape_path;
use crate::gomod::{is_path_prefix, GoMod};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while locating a package
#[derive(Debug, Error)]
pub enum LocateError {
    /// No directory in the cache matches the import path
    #[error(
        "Package \"{path}\" not found in \"{}\". Please run following command.\n  $ {hint}",
        .cache.display()
    )]
    NotFound {
        /// Import path being located
        path: String,
        /// Module cache root that was searched
        cache: PathBuf,
        /// Command that would fetch the package
        hint: String,
    },

    /// Several cached versions match and none is pinned
    #[error(
        "Package \"{path}\" matches several cached module versions ({}); pin one in go.mod",
        display_candidates(.candidates)
    )]
    Ambiguous {
        /// Import path being located
        path: String,
        /// Matching versioned directories
        candidates: Vec<PathBuf>,
    },

    /// Neither GOMODCACHE, GOPATH nor a home directory is available
    #[error("Module cache not found: set GOMODCACHE or GOPATH")]
    NoCache,

    /// I/O error while listing the cache
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

fn display_candidates(candidates: &[PathBuf]) -> String {
    candidates
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Where an import path was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub import_path: String,
    /// Module path, without version.
    pub module: String,
    pub version: String,
    /// The versioned module root directory.
    pub module_dir: PathBuf,
    /// The package directory.
    pub dir: PathBuf,
}

/// Resolves import paths to package directories in a module cache.
#[derive(Debug, Clone)]
pub struct ModuleLocator {
    cache_root: PathBuf,
    /// Module path -> pinned version.
    pins: BTreeMap<String, String>,
}

impl ModuleLocator {
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
            pins: BTreeMap::new(),
        }
    }

    /// Locate the cache the way the go command does: `GOMODCACHE`, else the
    /// first `GOPATH` entry plus `pkg/mod`, else `~/go/pkg/mod`.
    pub fn from_env() -> Result<Self, LocateError> {
        cache_root_from(
            std::env::var_os("GOMODCACHE"),
            std::env::var_os("GOPATH"),
            dirs::home_dir(),
        )
        .map(Self::new)
        .ok_or(LocateError::NoCache)
    }

    /// Prefer the versions required by `gomod` when several are cached.
    pub fn with_pins(mut self, gomod: &GoMod) -> Self {
        for req in &gomod.require {
            self.pins.insert(req.path.clone(), req.version.clone());
        }
        self
    }

    pub fn pin(&mut self, module: impl Into<String>, version: impl Into<String>) {
        self.pins.insert(module.into(), version.into());
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Directory holding the package `import_path`.
    pub fn locate(&self, import_path: &str) -> Result<PathBuf, LocateError> {
        self.resolve(import_path).map(|loc| loc.dir)
    }

    /// Like [`locate`](Self::locate), also reporting the module and version.
    pub fn resolve(&self, import_path: &str) -> Result<Location, LocateError> {
        let segments: Vec<&str> = import_path.split('/').filter(|s| !s.is_empty()).collect();
        let mut dir = self.cache_root.clone();
        let mut module: Option<(String, String, PathBuf)> = None;

        for (i, segment) in segments.iter().enumerate() {
            let escaped = escape_path(segment);
            if module.is_some() {
                dir.push(&escaped);
                if !dir.is_dir() {
                    return Err(self.not_found(import_path));
                }
                continue;
            }

            let prefix = segments[..=i].join("/");
            if let Some(version) = self.pinned_version(&prefix, import_path) {
                let pinned = dir.join(format!("{}@{}", escaped, version));
                if pinned.is_dir() {
                    tracing::debug!(module = %prefix, %version, "using pinned module version");
                    module = Some((prefix, version.to_string(), pinned.clone()));
                    dir = pinned;
                    continue;
                }
            }

            let mut candidates = versioned_entries(&dir, &escaped)?;
            match candidates.len() {
                0 => {
                    dir.push(&escaped);
                    if !dir.is_dir() {
                        return Err(self.not_found(import_path));
                    }
                }
                1 => {
                    let found = candidates.remove(0);
                    let version = found
                        .file_name()
                        .and_then(|n| n.to_str())
                        .and_then(|n| n.split_once('@'))
                        .map(|(_, v)| v.to_string())
                        .unwrap_or_default();
                    module = Some((prefix, version, found.clone()));
                    dir = found;
                }
                _ => {
                    return Err(LocateError::Ambiguous {
                        path: import_path.to_string(),
                        candidates,
                    })
                }
            }
        }

        let Some((module, version, module_dir)) = module else {
            return Err(self.not_found(import_path));
        };
        tracing::debug!(%import_path, dir = %dir.display(), "located package");
        Ok(Location {
            import_path: import_path.to_string(),
            module,
            version,
            module_dir,
            dir,
        })
    }

    fn pinned_version(&self, prefix: &str, import_path: &str) -> Option<&str> {
        self.pins
            .get(prefix)
            .filter(|_| is_path_prefix(prefix, import_path))
            .map(String::as_str)
    }

    fn not_found(&self, import_path: &str) -> LocateError {
        LocateError::NotFound {
            path: import_path.to_string(),
            cache: self.cache_root.clone(),
            hint: format!("go get \"{}\"", import_path),
        }
    }
}

/// Entries of `dir` named `<segment>@<version>`, sorted.
fn versioned_entries(dir: &Path, segment: &str) -> Result<Vec<PathBuf>, LocateError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let prefix = format!("{}@", segment);
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let matches = name.to_str().is_some_and(|n| n.starts_with(&prefix));
        if matches && entry.path().is_dir() {
            found.push(entry.path());
        }
    }
    found.sort();
    Ok(found)
}

fn cache_root_from(
    gomodcache: Option<OsString>,
    gopath: Option<OsString>,
    home: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(cache) = gomodcache.filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(cache));
    }
    if let Some(gopath) = gopath.filter(|v| !v.is_empty()) {
        if let Some(first) = std::env::split_paths(&gopath).next() {
            return Some(first.join("pkg").join("mod"));
        }
    }
    home.map(|h| h.join("go").join("pkg").join("mod"))
}

/// Non-test Go source files of a package directory, sorted by name.
pub fn source_files(dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if path.is_file() && name.ends_with(".go") && !name.ends_with("_test.go") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_root_prefers_gomodcache() {
        let root = cache_root_from(
            Some("/cache".into()),
            Some("/gopath".into()),
            Some("/home/u".into()),
        );
        assert_eq!(root, Some(PathBuf::from("/cache")));
    }

    #[test]
    fn test_cache_root_from_gopath() {
        let root = cache_root_from(Some("".into()), Some("/gopath".into()), None);
        assert_eq!(root, Some(PathBuf::from("/gopath/pkg/mod")));
    }

    #[test]
    fn test_cache_root_from_home() {
        let root = cache_root_from(None, None, Some("/home/u".into()));
        assert_eq!(root, Some(PathBuf::from("/home/u/go/pkg/mod")));
        assert_eq!(cache_root_from(None, None, None), None);
    }

    #[test]
    fn test_not_found_message_has_hint() {
        let locator = ModuleLocator::new("/cache");
        let err = locator.not_found("github.com/samber/lo");
        let message = err.to_string();
        assert!(message.contains("not found in \"/cache\""));
        assert!(message.ends_with("$ go get \"github.com/samber/lo\""));
    }
}

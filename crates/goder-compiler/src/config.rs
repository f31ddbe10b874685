//! Transformation settings (goder.toml)
//!
//! ```toml
//! [inline]
//! hosts = ["github.com", "golang.org"]
//! policy = "reachable"
//! collisions = "error"
//!
//! [generics]
//! naming = "content-hash"
//! suffix_len = 8
//! max_rounds = 64
//! matching = "prefix"
//! ```

use goder_pm::DEFAULT_HOSTS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name searched for next to the input file and in its ancestors.
pub const CONFIG_FILE: &str = "goder.toml";

/// Errors that can occur while loading goder.toml
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Values that parse but cannot be used
    #[error("Invalid config: {0}")]
    ValidationError(String),
}

/// All settings of one transformation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub inline: InlineConfig,
    pub generics: GenericsConfig,
}

/// Settings of the external package inliner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InlineConfig {
    /// Import path hosts treated as external.
    pub hosts: Vec<String>,
    pub policy: ClosurePolicy,
    pub collisions: CollisionPolicy,
    /// Module cache to read instead of the one the environment names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mod_cache: Option<PathBuf>,
}

impl Default for InlineConfig {
    fn default() -> Self {
        Self {
            hosts: DEFAULT_HOSTS.iter().map(|h| h.to_string()).collect(),
            policy: ClosurePolicy::default(),
            collisions: CollisionPolicy::default(),
            mod_cache: None,
        }
    }
}

/// Which declarations of an external package are copied.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ClosurePolicy {
    /// Referenced symbols and everything they use.
    #[default]
    Reachable,
    /// Every declaration of every referenced package.
    WholeModule,
}

/// What happens when an inlined declaration reuses an existing name.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
    #[default]
    Error,
    /// Give the inlined declaration a fresh suffix.
    Rename,
}

/// Settings of the generic specializer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenericsConfig {
    pub naming: NamingStrategy,
    /// Letters appended to a specialized name.
    pub suffix_len: usize,
    /// Specialization rounds before giving up.
    pub max_rounds: usize,
    pub matching: TypeMatching,
}

impl Default for GenericsConfig {
    fn default() -> Self {
        Self {
            naming: NamingStrategy::default(),
            suffix_len: 8,
            max_rounds: 64,
            matching: TypeMatching::default(),
        }
    }
}

/// How a declared parameter type is compared with the type of an argument.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TypeMatching {
    /// Cut the common prefix off both texts; what remains of the declared
    /// type binds only if it is a type parameter.
    #[default]
    Prefix,
    /// Cut the prefix at an identifier boundary, then cut the common suffix
    /// too (`func(T) bool` against `func(int) bool` binds `T`).
    Refined,
}

/// How specialized declarations are named.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum NamingStrategy {
    /// Suffix derived from the declaration and its binding; identical
    /// instantiations share one declaration.
    #[default]
    ContentHash,
    /// Random suffix, one function specialization per call site.
    Random,
}

impl Config {
    /// Parse goder.toml contents.
    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&source)?;
        // A relative cache path is relative to the config file.
        if let (Some(cache), Some(dir)) = (&config.inline.mod_cache, path.parent()) {
            if cache.is_relative() {
                config.inline.mod_cache = Some(dir.join(cache));
            }
        }
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.generics.suffix_len == 0 {
            return Err(ConfigError::ValidationError(
                "generics.suffix_len must be at least 1".to_string(),
            ));
        }
        if self.generics.max_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "generics.max_rounds must be at least 1".to_string(),
            ));
        }
        if let Some(host) = self.inline.hosts.iter().find(|h| h.is_empty() || h.contains('/')) {
            return Err(ConfigError::ValidationError(format!(
                "inline.hosts entry {:?} is not a host name",
                host
            )));
        }
        Ok(())
    }
}

/// Find goder.toml in `start_dir` or one of its ancestors.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir;
    loop {
        let candidate = current.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        current = current.parent()?;
    }
}

//! Goder Compiler - Generic Specialization and Package Inlining
//!
//! Rewrites a single Go file so that it needs neither generics nor external
//! packages: generic declarations are replaced by one concrete declaration
//! per instantiation ([`monomorphize`]), and declarations used from
//! allow-listed external packages are copied into the file ([`inline`]).
//!
//! ```rust,no_run
//! use goder_compiler::{transform, Config, Mode};
//!
//! let source = std::fs::read_to_string("main.go").unwrap();
//! let output = transform(&source, Mode::Both, &Config::default()).unwrap();
//! print!("{}", output.source);
//! for diagnostic in &output.diagnostics {
//!     eprintln!("warning: {}", diagnostic);
//! }
//! ```

pub mod assemble;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod inline;
pub mod monomorphize;
pub mod naming;

pub use assemble::assemble;
pub use config::{
    find_config, ClosurePolicy, CollisionPolicy, Config, ConfigError, GenericsConfig, InlineConfig,
    NamingStrategy, TypeMatching, CONFIG_FILE,
};
pub use diagnostic::{BindingIncomplete, Diagnostic};
pub use error::{TransformError, TransformResult};
pub use inline::{convert_external_pkgs, InlineResult};
pub use monomorphize::{convert_generics, MonomorphizationResult, Monomorphizer};
pub use naming::Namer;

use goder_parser::checker::check;
use goder_pm::ModuleLocator;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which passes a transformation runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Specialize generics only.
    Generics,
    /// Inline external packages only.
    Inline,
    /// Inline external packages, then specialize generics.
    #[default]
    Both,
}

impl Mode {
    pub fn inlines(self) -> bool {
        matches!(self, Mode::Inline | Mode::Both)
    }

    pub fn specializes(self) -> bool {
        matches!(self, Mode::Generics | Mode::Both)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Generics => "generics",
            Mode::Inline => "inline",
            Mode::Both => "both",
        })
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generics" => Ok(Mode::Generics),
            "inline" => Ok(Mode::Inline),
            "both" => Ok(Mode::Both),
            other => Err(format!("unknown mode '{}' (expected generics, inline or both)", other)),
        }
    }
}

/// A transformed file and what happened along the way.
#[derive(Debug, Default)]
pub struct TransformOutput {
    /// The rendered file.
    pub source: String,
    /// Call sites whose binding stayed incomplete.
    pub diagnostics: Vec<BindingIncomplete>,
    pub inline: Option<InlineResult>,
    pub generics: Option<MonomorphizationResult>,
}

/// Main transformation entry point
pub struct Transformer {
    config: Config,
    locator: Option<ModuleLocator>,
    seed: Option<u64>,
}

impl Transformer {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            locator: None,
            seed: None,
        }
    }

    /// Read external packages through `locator` instead of the configured
    /// or environment module cache.
    pub fn with_locator(mut self, locator: ModuleLocator) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Make random specialization names reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn locator(&self) -> TransformResult<ModuleLocator> {
        if let Some(locator) = &self.locator {
            return Ok(locator.clone());
        }
        match &self.config.inline.mod_cache {
            Some(root) => Ok(ModuleLocator::new(root)),
            None => Ok(ModuleLocator::from_env()?),
        }
    }

    fn namer(&self) -> Namer {
        let namer = Namer::new(&self.config.generics);
        match self.seed {
            Some(seed) => namer.with_seed(seed),
            None => namer,
        }
    }

    /// Transform Go source text.
    pub fn transform(&self, source: &str, mode: Mode) -> TransformResult<TransformOutput> {
        let mut file = goder_parser::parse(source).map_err(|errors| TransformError::ParseError { errors })?;
        let input_decls = file.decls.len();
        let mut output = TransformOutput::default();
        tracing::debug!(%mode, decls = input_decls, "transforming");

        if mode.inlines() {
            if mode.specializes() {
                // External code is checked leniently later; the input itself
                // must be well-typed.
                check(&file).map_err(|errors| TransformError::CheckError { errors })?;
            }
            let locator = self.locator()?;
            let result = convert_external_pkgs(&mut file, &self.config.inline, &locator, self.namer())?;
            output.inline = Some(result);
        }

        if mode.specializes() {
            let mut monomorphizer = Monomorphizer::new(&self.config.generics).strict(!mode.inlines());
            if let Some(seed) = self.seed {
                monomorphizer = monomorphizer.with_seed(&self.config.generics, seed);
            }
            let mut result = monomorphizer.monomorphize(&mut file, input_decls)?;
            output.diagnostics = std::mem::take(&mut result.diagnostics);
            output.generics = Some(result);
        }

        output.source = assemble(file)?;
        Ok(output)
    }
}

/// Transform Go source text with `config`.
pub fn transform(source: &str, mode: Mode, config: &Config) -> TransformResult<TransformOutput> {
    Transformer::new(config.clone()).transform(source, mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("both".parse::<Mode>(), Ok(Mode::Both));
        assert_eq!(Mode::Generics.to_string(), "generics");
        assert!("all".parse::<Mode>().is_err());
        assert!(Mode::Both.inlines() && Mode::Both.specializes());
        assert!(!Mode::Inline.specializes());
    }

    #[test]
    fn test_parse_error_is_fatal() {
        let err = transform("package main\n\nfunc {", Mode::Generics, &Config::default()).unwrap_err();
        assert_eq!(err.kind(), "ParseError");
    }

    #[test]
    fn test_check_error_is_fatal() {
        let err = transform(
            "package main\n\nfunc main() {\n\tprintln(undefinedThing)\n}\n",
            Mode::Generics,
            &Config::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "CheckError");
    }
}

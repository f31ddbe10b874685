//! Configuration and module cache discovery for one input file.

use anyhow::Context;
use goder_compiler::{find_config, Config, Mode};
use goder_pm::{find_go_mod, GoMod, ModuleLocator};
use std::path::Path;

pub struct Settings {
    pub config: Config,
    /// Only built when the mode inlines.
    pub locator: Option<ModuleLocator>,
}

/// `--config`, else the nearest `goder.toml` above `input`, else defaults.
/// Version pins come from the nearest `go.mod`.
pub fn load(
    input: &Path,
    config_path: Option<&Path>,
    mod_cache: Option<&Path>,
    mode: Mode,
) -> anyhow::Result<Settings> {
    let start = input_dir(input);
    let config_path = config_path
        .map(Path::to_path_buf)
        .or_else(|| find_config(&start));

    let mut config = match &config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading configuration");
            Config::from_file(path)
                .map_err(goder_compiler::TransformError::from)
                .with_context(|| format!("invalid configuration {}", path.display()))?
        }
        None => Config::default(),
    };
    if let Some(cache) = mod_cache {
        config.inline.mod_cache = Some(cache.to_path_buf());
    }

    let locator = if mode.inlines() {
        Some(locator(&config, &start)?)
    } else {
        None
    };
    Ok(Settings { config, locator })
}

fn locator(config: &Config, start: &Path) -> anyhow::Result<ModuleLocator> {
    let locator = match &config.inline.mod_cache {
        Some(root) => ModuleLocator::new(root),
        None => ModuleLocator::from_env().map_err(goder_compiler::TransformError::from)?,
    };
    let Some(path) = find_go_mod(start) else {
        return Ok(locator);
    };
    let gomod = GoMod::from_file(&path).with_context(|| format!("failed to read {}", path.display()))?;
    tracing::debug!(path = %path.display(), "pinning module versions");
    Ok(locator.with_pins(&gomod))
}

fn input_dir(input: &Path) -> std::path::PathBuf {
    let dir = input
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf())
}

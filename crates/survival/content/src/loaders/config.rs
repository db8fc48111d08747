//! Engine configuration loader.

use std::path::Path;

use anyhow::Context;
use survival_core::{SurvivalConfig, ValidatedConfig};
use tracing::{error, info};

use crate::loaders::{LoadResult, read_file};

/// Loader for engine configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads, parses and validates a TOML config. Missing sections and
    /// fields take their reference defaults.
    pub fn load(path: &Path) -> LoadResult<ValidatedConfig> {
        let content = read_file(path)?;
        Self::parse(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(content: &str) -> LoadResult<ValidatedConfig> {
        let config: SurvivalConfig =
            toml::from_str(content).context("failed to parse config TOML")?;
        Ok(config.validate()?)
    }

    /// Hot-reload helper: returns the freshly loaded config, or `current`
    /// when the file cannot be read or fails validation.
    pub fn reload_or_keep(path: &Path, current: &ValidatedConfig) -> (ValidatedConfig, bool) {
        match Self::load(path) {
            Ok(config) => {
                info!(path = %path.display(), "config reloaded");
                (config, true)
            }
            Err(err) => {
                error!(path = %path.display(), error = %format!("{err:#}"), "config rejected, keeping last known good");
                (current.clone(), false)
            }
        }
    }

    /// Renders `config` as TOML, e.g. to seed a data directory.
    pub fn render(config: &SurvivalConfig) -> LoadResult<String> {
        toml::to_string_pretty(config).context("failed to serialize config TOML")
    }
}

//! Content factory for loading a whole data directory.

use std::path::{Path, PathBuf};

use survival_core::{AbilityCatalog, ValidatedConfig};
use tracing::debug;

use crate::loaders::{AbilityLoader, ConfigLoader, LoadResult};

/// Validated engine inputs read from one data directory.
#[derive(Debug, Clone)]
pub struct Content {
    pub config: ValidatedConfig,
    pub abilities: AbilityCatalog,
}

/// Loads engine content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml      (optional, reference policy when absent)
/// └── abilities.ron    (optional, reference catalog when absent)
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.toml")
    }

    pub fn abilities_path(&self) -> PathBuf {
        self.data_dir.join("abilities.ron")
    }

    pub fn load_config(&self) -> LoadResult<ValidatedConfig> {
        let path = self.config_path();
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using reference policy");
            return Ok(survival_core::SurvivalConfig::default().validate()?);
        }
        ConfigLoader::load(&path)
    }

    pub fn load_abilities(&self, config: &ValidatedConfig) -> LoadResult<AbilityCatalog> {
        let path = self.abilities_path();
        if !path.exists() {
            debug!(path = %path.display(), "no ability catalog, using reference catalog");
            let catalog = AbilityCatalog::reference();
            catalog.check_tiers(&config.progression().tier_levels)?;
            return Ok(catalog);
        }
        AbilityLoader::load_for(&path, config)
    }

    pub fn load(&self) -> LoadResult<Content> {
        let config = self.load_config()?;
        let abilities = self.load_abilities(&config)?;
        Ok(Content { config, abilities })
    }
}

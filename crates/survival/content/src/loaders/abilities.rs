//! Ability catalog loader.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use survival_core::{Ability, AbilityCatalog, ValidatedConfig};

use crate::loaders::{LoadResult, read_file};

/// Ability catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityFile {
    pub abilities: Vec<Ability>,
}

/// Loader for ability catalogs from RON files.
pub struct AbilityLoader;

impl AbilityLoader {
    pub fn load(path: &Path) -> LoadResult<AbilityCatalog> {
        let content = read_file(path)?;
        Self::parse(&content).with_context(|| format!("invalid ability catalog {}", path.display()))
    }

    pub fn parse(content: &str) -> LoadResult<AbilityCatalog> {
        let file: AbilityFile =
            ron::from_str(content).context("failed to parse ability catalog RON")?;
        Ok(AbilityCatalog::new(file.abilities)?)
    }

    /// Loads a catalog and checks every tier against `config`.
    pub fn load_for(path: &Path, config: &ValidatedConfig) -> LoadResult<AbilityCatalog> {
        let catalog = Self::load(path)?;
        catalog.check_tiers(&config.progression().tier_levels)?;
        Ok(catalog)
    }

    pub fn render(catalog: &AbilityCatalog) -> LoadResult<String> {
        let file = AbilityFile {
            abilities: catalog.iter().cloned().collect(),
        };
        ron::ser::to_string_pretty(&file, ron::ser::PrettyConfig::default())
            .context("failed to serialize ability catalog RON")
    }
}

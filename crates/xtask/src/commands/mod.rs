//! Command implementations for xtask
//!
//! Each command is a separate module that implements its own CLI args and execution logic.

mod check_config;
mod clean;
mod read_snapshot;
mod simulate;
mod xp_table;

pub use check_config::CheckConfig;
pub use clean::Clean;
pub use read_snapshot::ReadSnapshot;
pub use simulate::Simulate;
pub use xp_table::XpTable;

use std::path::Path;

use anyhow::Result;
use survival_content::ConfigLoader;
use survival_core::{SurvivalConfig, ValidatedConfig};

/// Loads `path`, or the reference policy when no path is given.
fn load_config(path: Option<&Path>) -> Result<ValidatedConfig> {
    match path {
        Some(path) => ConfigLoader::load(path),
        None => Ok(SurvivalConfig::default().validate()?),
    }
}

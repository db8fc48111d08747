//! Print the cumulative XP table of an engine config.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use console::style;

use super::load_config;

/// Print the cumulative XP table
#[derive(Parser)]
pub struct XpTable {
    /// Engine config (TOML); the reference policy when omitted
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Number of levels to print (defaults to every level)
    #[arg(short, long)]
    levels: Option<u32>,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

impl XpTable {
    pub fn execute(self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;
        let curve = config.curve();
        let tiers = &config.progression().tier_levels;
        let last = self
            .levels
            .map_or(curve.max_level(), |levels| levels.clamp(1, curve.max_level()));

        if self.json {
            let rows: Vec<_> = (1..=last)
                .map(|level| {
                    serde_json::json!({
                        "level": level,
                        "xp": curve.xp_for_level(level),
                        "tier": tiers.iter().position(|&t| t == level).map(|i| i + 1),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(());
        }

        println!(
            "{}",
            style(format!("{:>5}  {:>12}  {:>10}", "level", "total xp", "step")).bold()
        );
        let mut previous = 0;
        for level in 1..=last {
            let xp = curve.xp_for_level(level);
            let marker = tiers
                .iter()
                .position(|&t| t == level)
                .map(|i| style(format!("  tier {}", i + 1)).cyan().to_string())
                .unwrap_or_default();
            println!("{level:>5}  {xp:>12}  {:>10}{marker}", xp - previous);
            previous = xp;
        }
        Ok(())
    }
}

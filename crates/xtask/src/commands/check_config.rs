//! Validate engine config and ability catalog files
//!
//! Runs the same loaders the runtime uses, so a file that passes here is
//! accepted by `reload_config_from` as well.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use console::style;

use survival_content::{AbilityLoader, ConfigLoader};
use survival_core::{Profession, StatKind, ValidatedConfig};

/// Load and validate an engine config file
#[derive(Parser)]
pub struct CheckConfig {
    /// Engine config (TOML)
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Ability catalog (RON) to check against the config's tier levels
    #[arg(short, long, value_name = "PATH")]
    abilities: Option<PathBuf>,
}

impl CheckConfig {
    pub fn execute(self) -> Result<()> {
        let config = match ConfigLoader::load(&self.path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("{} {}", style("✗").red().bold(), self.path.display());
                return Err(err);
            }
        };
        println!("{} {}", style("✓").green().bold(), self.path.display());
        print_summary(&config);

        if let Some(path) = self.abilities {
            let catalog = AbilityLoader::load_for(&path, &config)?;
            println!();
            println!(
                "{} {} ({} abilities)",
                style("✓").green().bold(),
                path.display(),
                catalog.len()
            );
            for profession in Profession::ALL {
                let names: Vec<_> = catalog
                    .for_profession(profession)
                    .map(|ability| format!("T{} {}", ability.tier, ability.id))
                    .collect();
                println!("  {:<8} {}", profession, names.join(", "));
            }
        }
        Ok(())
    }
}

fn print_summary(config: &ValidatedConfig) {
    println!();
    println!("{}", style("Effects (enter / exit %):").bold().yellow());
    for stat in StatKind::ALL {
        let debuff = config.debuff_band(stat);
        let buff = config.buff_band(stat);
        println!(
            "  {:<7} debuff {:>5.1} / {:>5.1}   buff {:>5.1} / {:>5.1}",
            stat,
            debuff.enter(),
            debuff.exit(),
            buff.enter(),
            buff.exit()
        );
    }

    let vitals = config.vitals();
    println!();
    println!("{}", style("Depletion:").bold().yellow());
    for stat in StatKind::ALL {
        println!(
            "  {:<7} every {:>6} ms",
            stat,
            vitals.base_interval_ms.get(stat)
        );
    }
    println!("  floor   x{:.2}", vitals.min_depletion_multiplier);

    let progression = config.progression();
    let curve = config.curve();
    println!();
    println!("{}", style("Progression:").bold().yellow());
    println!(
        "  base {} xp, x{} per level, max level {} ({} xp)",
        progression.base_xp,
        progression.multiplier,
        curve.max_level(),
        curve.max_xp()
    );
    println!("  tiers at levels {:?}", progression.tier_levels);
}

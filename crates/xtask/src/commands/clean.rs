//! Clean stored player snapshots
//!
//! Safety: Always prompts for confirmation before deletion.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use crate::dirs;

/// Delete stored player snapshots
#[derive(Parser, Debug)]
pub struct Clean {
    /// Snapshot directory (defaults to the runtime's save directory)
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Only delete the snapshot of this player
    #[arg(short, long)]
    pub player: Option<u64>,

    /// Skip confirmation prompt (dangerous!)
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl Clean {
    pub fn execute(self) -> Result<()> {
        let dir = dirs::snapshot_dir(self.dir.clone());
        let targets: Vec<_> = dirs::list_snapshot_files(&dir)?
            .into_iter()
            .filter(|(player, _)| self.player.is_none_or(|id| player.0 == id))
            .collect();

        if targets.is_empty() {
            println!("{}", style("Nothing to clean - no snapshots found").dim());
            return Ok(());
        }

        println!("{}", style("Clean Player Snapshots").yellow().bold());
        println!();
        println!("The following will be deleted from {}:", style(dir.display()).dim());
        for (player, _) in &targets {
            println!("  {} {}", style("→").cyan(), style(player).bold());
        }
        println!();

        if !self.yes && !self.confirm()? {
            println!("{}", style("Cancelled").dim());
            return Ok(());
        }

        for (player, path) in targets {
            print!("Deleting {}... ", player);
            io::stdout().flush()?;

            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to delete: {}", path.display()))?;

            println!("{}", style("✓").green());
        }

        println!();
        println!("{}", style("✓ Cleanup complete!").green().bold());

        Ok(())
    }

    /// Prompt user for confirmation
    fn confirm(&self) -> Result<bool> {
        print!("{} ", style("Proceed? [y/N]").yellow().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        let input = input.trim().to_lowercase();
        Ok(input == "y" || input == "yes")
    }
}

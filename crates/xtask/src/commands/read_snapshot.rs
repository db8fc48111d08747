//! Read and inspect player snapshot files
//!
//! Loads `player_{id}.json` through the runtime's file repository and
//! displays it. Without a player id, lists every stored snapshot.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use survival_core::{PlayerId, StatKind};
use survival_runtime::{FileSnapshotRepository, PlayerSnapshot, SnapshotRepository};

use crate::dirs;

/// Read and inspect player snapshot files
#[derive(Parser)]
pub struct ReadSnapshot {
    /// Player id to read; lists all snapshots when omitted
    #[arg(value_name = "PLAYER")]
    player: Option<u64>,

    /// Snapshot directory (defaults to the runtime's save directory)
    #[arg(short, long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Stats, capacities, XP and abilities
    Summary,
    /// Full JSON output
    Json,
}

impl ReadSnapshot {
    pub fn execute(self) -> Result<()> {
        let dir = dirs::snapshot_dir(self.dir);

        let Some(player) = self.player.map(PlayerId) else {
            return list(&dir);
        };

        let repo = FileSnapshotRepository::new(&dir)
            .with_context(|| format!("Failed to open snapshot directory: {}", dir.display()))?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let snapshot = runtime
            .block_on(repo.load(player))?
            .with_context(|| {
                format!(
                    "No snapshot for {player}\n\nHint: run without a player id to list {}",
                    dir.display()
                )
            })?;

        println!(
            "{} {}",
            style("Snapshot File:").bold().cyan(),
            repo.snapshot_path(player).display()
        );
        println!("{} {}", style("Saved At:").bold().cyan(), snapshot.saved_at);
        println!();

        match self.format {
            OutputFormat::Summary => print_summary(&snapshot),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        }
        Ok(())
    }
}

fn list(dir: &std::path::Path) -> Result<()> {
    let files = dirs::list_snapshot_files(dir)?;
    if files.is_empty() {
        println!("{}", style(format!("No snapshots in {}", dir.display())).dim());
        return Ok(());
    }
    println!("{}", style(format!("Snapshots in {}:", dir.display())).bold());
    for (player, path) in files {
        let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        println!("  {:<12} {:>8} bytes", player.to_string(), size);
    }
    Ok(())
}

fn print_summary(snapshot: &PlayerSnapshot) {
    println!("{}", style("Vitals:").bold().yellow());
    for stat in StatKind::ALL {
        let capacity: f64 = snapshot.vitals.capacity.get(stat).values().sum();
        println!(
            "  {:<7} {:>6.1}  (capacity +{})",
            stat,
            snapshot.vitals.values.get(stat),
            capacity
        );
    }
    println!();

    println!("{}", style("Professions (xp):").bold().yellow());
    if snapshot.progression.xp.is_empty() {
        println!("  none");
    }
    for (profession, xp) in &snapshot.progression.xp {
        println!("  {:<8} {}", profession, xp);
    }
    println!();

    println!("{}", style("Unlocked Abilities:").bold().yellow());
    if snapshot.progression.unlocked.is_empty() {
        println!("  none");
    }
    for ability in &snapshot.progression.unlocked {
        println!("  {}", ability);
    }
}

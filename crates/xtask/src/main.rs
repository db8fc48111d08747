//! Development tasks for the survival engine
//!
//! This binary provides development utilities using the cargo-xtask pattern.
//! Run with: `cargo xtask <command>`

mod commands;
mod dirs;

use anyhow::Result;
use clap::Parser;
use commands::{CheckConfig, Clean, ReadSnapshot, Simulate, XpTable};
use tracing_subscriber::EnvFilter;

/// Development tasks for the survival engine
#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development tools for the survival engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Load and validate an engine config file
    CheckConfig(CheckConfig),

    /// Print the cumulative XP table
    XpTable(XpTable),

    /// Run a headless simulation with a manual clock
    Simulate(Simulate),

    /// Read and inspect player snapshot files
    ReadSnapshot(ReadSnapshot),

    /// Delete stored player snapshots
    Clean(Clean),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(tracing::Level::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::CheckConfig(cmd) => cmd.execute(),
        Command::XpTable(cmd) => cmd.execute(),
        Command::Simulate(cmd) => cmd.execute(),
        Command::ReadSnapshot(cmd) => cmd.execute(),
        Command::Clean(cmd) => cmd.execute(),
    }
}

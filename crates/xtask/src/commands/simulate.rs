//! Headless simulation on a manual clock.
//!
//! Starts `players` sessions on an in-memory runtime, advances the clock in
//! fixed steps and ticks after each one. Every player trains one profession;
//! odd players eat and drink when a stat runs low, even players never do, so
//! both the buff and the debuff paths show up in the report.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use survival_content::ContentFactory;
use survival_core::{ActivityState, OwnerId, PlayerId, Profession, StatKind};
use survival_runtime::{FixedActivity, ManualClock, RuntimeHandle, SurvivalRuntime, TickSummary};

/// Run a headless simulation with a manual clock
#[derive(Parser)]
pub struct Simulate {
    /// Number of simulated players
    #[arg(short, long, default_value_t = 4)]
    players: u64,

    /// Simulated duration in seconds
    #[arg(short, long, default_value_t = 3_600)]
    seconds: u64,

    /// Clock step between ticks, in milliseconds
    #[arg(long, default_value_t = 1_000)]
    step_ms: u64,

    /// Activity reported for every player
    #[arg(short, long, default_value = "walking")]
    activity: ActivityState,

    /// XP awarded to each player's profession per simulated second
    #[arg(long, default_value_t = 2.0)]
    xp_per_second: f64,

    /// Content directory (config.toml, abilities.ron); reference content when omitted
    #[arg(long, value_name = "DIR")]
    data: Option<PathBuf>,
}

impl Simulate {
    pub fn execute(self) -> Result<()> {
        if self.step_ms == 0 {
            anyhow::bail!("--step-ms must be positive");
        }
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("Failed to start async runtime")?;
        runtime.block_on(self.run())
    }

    async fn run(self) -> Result<()> {
        let clock = Arc::new(ManualClock::new(0));
        let mut builder = SurvivalRuntime::builder()
            .clock(clock.clone())
            .classifier(Arc::new(FixedActivity(self.activity)))
            .manual_ticks();
        if let Some(dir) = &self.data {
            builder = builder.content(ContentFactory::new(dir).load()?);
        }
        let runtime = builder.build().await?;
        let handle = runtime.handle();

        let players: Vec<_> = (1..=self.players).map(PlayerId).collect();
        for &player in &players {
            handle.start_session(player, OwnerId(player.0 % 2), 1.0)?;
        }

        let steps = self.seconds * 1_000 / self.step_ms;
        let xp_per_step = self.xp_per_second * self.step_ms as f64 / 1_000.0;
        let mut totals = TickSummary::default();
        let mut level_ups = 0;

        for _ in 0..steps {
            clock.advance(self.step_ms);
            let summary = handle.tick();
            totals.depleted += summary.depleted;
            totals.transitions += summary.transitions;
            totals.failed += summary.failed;

            for &player in &players {
                let profession = Profession::ALL[(player.0 as usize) % Profession::COUNT];
                if handle.award_xp(player, profession, xp_per_step)?.won_level_up {
                    level_ups += 1;
                }
                if player.0 % 2 == 1 {
                    eat_and_drink(&handle, player)?;
                }
            }
        }

        println!(
            "{}",
            style(format!(
                "=== {} players, {} s simulated ({} ticks) ===",
                players.len(),
                self.seconds,
                steps
            ))
            .bold()
            .green()
        );
        println!(
            "  depletion passes {}  transitions {}  level-ups {}  failed {}",
            totals.depleted, totals.transitions, level_ups, totals.failed
        );
        println!();

        for &player in &players {
            println!("{}", style(player).bold().yellow());
            for line in handle.hud(player)? {
                println!("  {:<12} {}", style(line.element).dim(), line.text);
            }
        }

        for &player in &players {
            handle.end_session(player).await?;
        }
        runtime.shutdown().await?;
        Ok(())
    }
}

fn eat_and_drink(handle: &RuntimeHandle, player: PlayerId) -> Result<()> {
    let vitals = handle.vitals(player)?;
    for stat in [StatKind::Hunger, StatKind::Thirst] {
        if vitals.get(stat).percent < 40.0 {
            handle.restore(player, stat, 50.0)?;
        }
    }
    Ok(())
}

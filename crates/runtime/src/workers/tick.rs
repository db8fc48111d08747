//! Tick worker that runs one simulation pass per interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace};

use crate::context::EngineContext;

/// Commands accepted by the tick worker.
pub(crate) enum Command {
    Shutdown,
}

pub(crate) struct TickWorker {
    ctx: Arc<EngineContext>,
    interval: Duration,
    command_rx: mpsc::Receiver<Command>,
}

impl TickWorker {
    pub(crate) fn new(
        ctx: Arc<EngineContext>,
        interval: Duration,
        command_rx: mpsc::Receiver<Command>,
    ) -> Self {
        Self {
            ctx,
            interval,
            command_rx,
        }
    }

    pub(crate) async fn run(mut self) {
        info!(target: "runtime::tick", interval_ms = self.interval.as_millis() as u64, "tick worker started");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let summary = self.ctx.tick_at(self.ctx.now());
                    trace!(target: "runtime::tick", ?summary, "tick");
                }
                cmd = self.command_rx.recv() => match cmd {
                    Some(Command::Shutdown) | None => break,
                },
            }
        }
        debug!(target: "runtime::tick", "tick worker stopped");
    }
}

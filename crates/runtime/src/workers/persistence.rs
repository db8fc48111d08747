//! Persistence worker for periodic and on-demand snapshot saves.
//!
//! Every `autosave_interval` the worker saves each reconciled session through
//! [`EngineContext::save_all`]. `SaveNow` runs the same pass immediately and
//! replies with its report. A final pass runs on shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::context::{EngineContext, SaveReport};

/// Commands accepted by the persistence worker.
pub(crate) enum Command {
    SaveNow { reply: oneshot::Sender<SaveReport> },
    Shutdown,
}

pub(crate) struct PersistenceWorker {
    ctx: Arc<EngineContext>,
    autosave_interval: Duration,
    command_rx: mpsc::Receiver<Command>,
}

impl PersistenceWorker {
    pub(crate) fn new(
        ctx: Arc<EngineContext>,
        autosave_interval: Duration,
        command_rx: mpsc::Receiver<Command>,
    ) -> Self {
        Self {
            ctx,
            autosave_interval,
            command_rx,
        }
    }

    pub(crate) async fn run(mut self) {
        info!(
            target: "runtime::persistence",
            autosave_secs = self.autosave_interval.as_secs(),
            "persistence worker started"
        );
        let mut autosave = tokio::time::interval(self.autosave_interval);
        autosave.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; nothing is loaded yet.
        autosave.tick().await;

        loop {
            tokio::select! {
                _ = autosave.tick() => {
                    self.save("autosave").await;
                }
                cmd = self.command_rx.recv() => match cmd {
                    Some(Command::SaveNow { reply }) => {
                        let report = self.save("requested").await;
                        let _ = reply.send(report);
                    }
                    Some(Command::Shutdown) | None => break,
                },
            }
        }

        self.save("shutdown").await;
        debug!(target: "runtime::persistence", "persistence worker stopped");
    }

    async fn save(&self, trigger: &'static str) -> SaveReport {
        let report = self.ctx.save_all().await;
        if report.failed > 0 {
            warn!(
                target: "runtime::persistence",
                trigger,
                saved = report.saved,
                failed = report.failed,
                "save pass finished with failures"
            );
        } else {
            debug!(
                target: "runtime::persistence",
                trigger,
                saved = report.saved,
                skipped = report.skipped,
                "save pass finished"
            );
        }
        report
    }
}

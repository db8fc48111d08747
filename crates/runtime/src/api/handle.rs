//! Cloneable façade for driving the runtime.
//!
//! [`RuntimeHandle`] exposes session lifecycle, host events, administrative
//! operations and read models. Engine calls go straight to the shared
//! [`EngineContext`]; saves that must run on the persistence worker go
//! through its command channel.
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};

use survival_core::{
    AwardOutcome, EffectKind, OwnerId, PlayerId, Profession, ProfessionProgress, StatKind,
    ValidatedConfig, VitalsView,
};

use super::errors::{Result, RuntimeError, WorkerKind};
use crate::context::{EngineContext, SaveReport, TickSummary};
use crate::events::{Event, EventBus, Topic};
use crate::hud::HudLine;
use crate::repository::PlayerSnapshot;
use crate::sessions::SessionToken;
use crate::workers::PersistenceCommand;

/// Client-facing handle to interact with the runtime.
#[derive(Clone)]
pub struct RuntimeHandle {
    ctx: Arc<EngineContext>,
    persist_tx: mpsc::Sender<PersistenceCommand>,
}

impl RuntimeHandle {
    pub(crate) fn new(ctx: Arc<EngineContext>, persist_tx: mpsc::Sender<PersistenceCommand>) -> Self {
        Self { ctx, persist_tx }
    }

    /// Starts a session. The player is playable immediately; the stored
    /// snapshot is reconciled in the background.
    pub fn start_session(
        &self,
        player: PlayerId,
        owner: OwnerId,
        host_speed: f64,
    ) -> Result<Arc<SessionToken>> {
        self.ctx.start_session(player, owner, host_speed)
    }

    /// Ends a session and returns the final snapshot.
    pub async fn end_session(&self, player: PlayerId) -> Result<PlayerSnapshot> {
        self.ctx.end_session(player).await
    }

    pub fn players(&self) -> Vec<PlayerId> {
        self.ctx.players()
    }

    /// Runs one simulation pass now, independent of the tick worker.
    pub fn tick(&self) -> TickSummary {
        self.ctx.tick_at(self.ctx.now())
    }

    pub fn restore(&self, player: PlayerId, stat: StatKind, amount: f64) -> Result<f64> {
        self.ctx.restore(player, stat, amount)
    }

    pub fn award_xp(
        &self,
        player: PlayerId,
        profession: Profession,
        amount: f64,
    ) -> Result<AwardOutcome> {
        self.ctx.award_xp(player, profession, amount)
    }

    // Administration

    pub fn set_stat(&self, player: PlayerId, stat: StatKind, value: f64) -> Result<f64> {
        self.ctx.set_stat(player, stat, value)
    }

    pub fn set_level(
        &self,
        player: PlayerId,
        profession: Profession,
        level: u32,
    ) -> Result<ProfessionProgress> {
        self.ctx.set_level(player, profession, level)
    }

    pub fn add_xp(&self, player: PlayerId, profession: Profession, amount: u64) -> Result<AwardOutcome> {
        self.ctx.add_xp(player, profession, amount)
    }

    pub fn reset_profession(
        &self,
        player: PlayerId,
        profession: Profession,
    ) -> Result<ProfessionProgress> {
        self.ctx.reset_profession(player, profession)
    }

    pub fn reload_config(&self, config: ValidatedConfig) -> Result<()> {
        self.ctx.reload_config(config)
    }

    /// Reloads from a TOML file; an invalid file keeps the current config.
    pub fn reload_config_from(&self, path: &Path) -> Result<bool> {
        self.ctx.reload_config_from(path)
    }

    // Read models

    pub fn config(&self) -> Arc<ValidatedConfig> {
        self.ctx.config()
    }

    /// False while the stored snapshot is still loading.
    pub fn is_loaded(&self, player: PlayerId) -> Result<bool> {
        self.ctx.is_loaded(player)
    }

    pub fn vitals(&self, player: PlayerId) -> Result<VitalsView> {
        self.ctx.vitals(player)
    }

    pub fn progress(&self, player: PlayerId, profession: Profession) -> Result<ProfessionProgress> {
        self.ctx.progress(player, profession)
    }

    pub fn active_effects(&self, player: PlayerId) -> Result<Vec<EffectKind>> {
        self.ctx.active_effects(player)
    }

    pub fn speed_multiplier(&self, player: PlayerId) -> Result<f64> {
        self.ctx.speed_multiplier(player)
    }

    pub fn depletion_multiplier(&self, player: PlayerId) -> Result<f64> {
        self.ctx.depletion_multiplier(player)
    }

    pub fn hud(&self, player: PlayerId) -> Result<Vec<HudLine>> {
        self.ctx.hud(player)
    }

    pub fn snapshot(&self, player: PlayerId) -> Result<PlayerSnapshot> {
        self.ctx.snapshot(player)
    }

    /// Asks the persistence worker to save every reconciled session now.
    pub async fn save_now(&self) -> Result<SaveReport> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.persist_tx
            .send(PersistenceCommand::SaveNow { reply: reply_tx })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed {
                worker: WorkerKind::Persistence,
            })?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Vitals` - depletion passes and restores
    /// - `Topic::Effects` - buff and debuff transitions
    /// - `Topic::Progression` - level-ups, unlocks and admin changes
    /// - `Topic::Session` - session lifecycle and save passes
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use survival_runtime::Topic;
    ///
    /// let mut effects = handle.subscribe(Topic::Effects);
    /// while let Ok(event) = effects.recv().await {
    ///     // react to the transition
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.ctx.event_bus().subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<Event>> {
        self.ctx.event_bus().subscribe_multiple(topics)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        self.ctx.event_bus()
    }
}

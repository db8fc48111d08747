//! Explicit dependency container behind the runtime.
//!
//! [`EngineContext`] owns one instance of every engine component and every
//! collaborator, wired together once by the builder. Workers and handles
//! share it through an `Arc`; nothing in the runtime reaches for globals.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, error, info, warn};

use survival_content::ConfigLoader;
use survival_core::{
    Ability, AbilityCatalog, AbilityUnlockSink, AwardOutcome, DepletionEngine, EffectCoordinator,
    EffectKind, Millis, ModifierDomain, ModifierRegistry, OwnerId, PlayerId, PlayerVitals,
    PresentationSink, Profession, ProfessionProgress, ProgressionEngine, ProgressionSnapshot,
    SpeedComposer, StatKind, UnlockReason, ValidatedConfig, VisibleEffect, VitalsView,
};

use crate::api::providers::{ActivityClassifier, Clock};
use crate::api::{Result, RuntimeError};
use crate::events::{EventBus, ProgressionEvent, SessionEvent, VitalsEvent};
use crate::hooks::{HookContext, HookRegistry};
use crate::hud::{CompositeHud, HudLine, HudView};
use crate::presentation::PresentationRouter;
use crate::repository::{PlayerSnapshot, SnapshotRepository};
use crate::sessions::{Session, SessionTable, SessionToken};

/// Aggregate result of one [`EngineContext::tick_at`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub players: usize,
    /// Players with at least one stat depleted this pass.
    pub depleted: usize,
    pub transitions: usize,
    /// Players whose tick was aborted by a critical hook.
    pub failed: usize,
}

/// Aggregate result of one [`EngineContext::save_all`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub saved: usize,
    pub failed: usize,
    /// Sessions not yet reconciled with storage; saving them would clobber
    /// the stored snapshot with defaults.
    pub skipped: usize,
}

/// Collaborators supplied by the builder.
pub(crate) struct Services {
    pub repository: Arc<dyn SnapshotRepository>,
    pub router: Arc<PresentationRouter>,
    pub hooks: HookRegistry,
    pub hud: CompositeHud,
    pub bus: EventBus,
    pub classifier: Arc<dyn ActivityClassifier>,
    pub clock: Arc<dyn Clock>,
    pub runtime: tokio::runtime::Handle,
}

/// Forwards ability unlocks into the modifier registries, the live session's
/// capacity and the presentation queue.
struct UnlockApplier {
    depletion: Arc<ModifierRegistry>,
    speed: Arc<ModifierRegistry>,
    sessions: Arc<SessionTable>,
    router: Arc<PresentationRouter>,
    bus: EventBus,
}

impl AbilityUnlockSink for UnlockApplier {
    fn on_unlock(&self, player: PlayerId, ability: &Ability, reason: UnlockReason) {
        ability.register_modifiers(player, &self.depletion, &self.speed);
        if let Some(session) = self.sessions.get(player) {
            let mut vitals = session.vitals();
            for (stat, source, amount) in ability.capacity_increases() {
                vitals.raise_max(stat, source, amount);
            }
        }

        if reason != UnlockReason::Restored {
            self.router.schedule_on_owner(
                player,
                VisibleEffect::AbilityUnlocked {
                    ability: ability.id.clone(),
                    name: ability.name.clone(),
                },
            );
        }
        self.bus.publish(ProgressionEvent::AbilityUnlocked {
            player,
            ability: ability.id.clone(),
            reason,
        });
    }

    fn on_revoke(&self, player: PlayerId, ability: &Ability) {
        ability.clear_modifiers(player, &self.depletion, &self.speed);
        if let Some(session) = self.sessions.get(player) {
            let mut vitals = session.vitals();
            for (stat, source, _) in ability.capacity_increases() {
                vitals.revoke_max(stat, source.as_str());
            }
        }
        self.bus.publish(ProgressionEvent::AbilityRevoked {
            player,
            ability: ability.id.clone(),
        });
    }
}

pub struct EngineContext {
    config: RwLock<Arc<ValidatedConfig>>,
    depletion: DepletionEngine,
    effects: EffectCoordinator,
    speed: SpeedComposer,
    progression: ProgressionEngine,
    sessions: Arc<SessionTable>,
    repository: Arc<dyn SnapshotRepository>,
    router: Arc<PresentationRouter>,
    hooks: HookRegistry,
    hud: CompositeHud,
    bus: EventBus,
    classifier: Arc<dyn ActivityClassifier>,
    clock: Arc<dyn Clock>,
    runtime: tokio::runtime::Handle,
}

impl EngineContext {
    pub(crate) fn new(
        config: ValidatedConfig,
        catalog: Arc<AbilityCatalog>,
        services: Services,
    ) -> Result<Self> {
        catalog.check_tiers(&config.progression().tier_levels)?;

        let depletion_registry = Arc::new(ModifierRegistry::new(ModifierDomain::Depletion));
        let speed_registry = Arc::new(ModifierRegistry::new(ModifierDomain::Speed));
        let sessions = Arc::new(SessionTable::new());

        let applier = Arc::new(UnlockApplier {
            depletion: Arc::clone(&depletion_registry),
            speed: Arc::clone(&speed_registry),
            sessions: Arc::clone(&sessions),
            router: Arc::clone(&services.router),
            bus: services.bus.clone(),
        });

        Ok(Self {
            depletion: DepletionEngine::new(&config, Arc::clone(&depletion_registry)),
            effects: EffectCoordinator::new(
                &config,
                depletion_registry,
                Arc::clone(&speed_registry),
            ),
            speed: SpeedComposer::new(&config, speed_registry),
            progression: ProgressionEngine::new(&config, catalog, applier),
            config: RwLock::new(Arc::new(config)),
            sessions,
            repository: services.repository,
            router: services.router,
            hooks: services.hooks,
            hud: services.hud,
            bus: services.bus,
            classifier: services.classifier,
            clock: services.clock,
            runtime: services.runtime,
        })
    }

    pub fn config(&self) -> Arc<ValidatedConfig> {
        Arc::clone(&self.config.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn now(&self) -> Millis {
        self.clock.now_ms()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn progression(&self) -> &ProgressionEngine {
        &self.progression
    }

    pub fn catalog(&self) -> &AbilityCatalog {
        self.progression.catalog()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn players(&self) -> Vec<PlayerId> {
        self.sessions.players()
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    /// Starts a session usable immediately from default vitals and spawns
    /// the background load of the stored snapshot.
    ///
    /// `host_speed` is the player's current movement speed on the host; it
    /// becomes the baseline the first time the engine modifies it.
    pub fn start_session(
        self: &Arc<Self>,
        player: PlayerId,
        owner: OwnerId,
        host_speed: f64,
    ) -> Result<Arc<SessionToken>> {
        let vitals = PlayerVitals::new(player, self.config().vitals(), self.now());
        let session = self.sessions.insert(owner, host_speed, vitals)?;
        self.router.assign(player, owner);
        info!(target: "runtime::sessions", %player, %owner, generation = session.token().generation(), "session started");
        self.bus.publish(SessionEvent::Started { player, owner });

        let task = self
            .runtime
            .spawn(Arc::clone(self).load_session(Arc::clone(&session)));
        session.set_load_task(task);
        Ok(Arc::clone(session.token()))
    }

    async fn load_session(self: Arc<Self>, session: Arc<Session>) {
        let player = session.player();
        match self.repository.load(player).await {
            Ok(Some(snapshot)) => {
                self.apply_loaded(&session, snapshot);
            }
            Ok(None) => {
                if session.token().is_active() {
                    session.mark_reconciled();
                }
                debug!(target: "runtime::persistence", %player, "no stored snapshot");
            }
            Err(e) => warn!(
                target: "runtime::persistence",
                %player,
                error = %e,
                "snapshot load failed; continuing with defaults"
            ),
        }
        session.load_finished();
    }

    /// Reconciles a loaded snapshot into the live session. Returns whether it
    /// was applied; loads for ended sessions are discarded.
    ///
    /// Runs under the session's reconcile guard, so the session cannot end
    /// (and no successor can start) between the token check and the
    /// progression restore.
    fn apply_loaded(&self, session: &Session, snapshot: PlayerSnapshot) -> bool {
        let _reconcile = session.reconcile_guard();
        let token = session.token();
        let player = token.player();
        if !token.is_active() {
            info!(target: "runtime::sessions", %player, generation = token.generation(), "discarding late snapshot load");
            self.bus.publish(SessionEvent::LoadDiscarded {
                player,
                generation: token.generation(),
            });
            return false;
        }

        {
            let mut vitals = session.vitals();
            let activity = vitals.activity();
            *vitals = PlayerVitals::from_snapshot(
                player,
                &snapshot.vitals,
                self.config().vitals(),
                self.now(),
            );
            vitals.set_activity(activity);
        }

        if self.progression.snapshot(player) != ProgressionSnapshot::default() {
            warn!(target: "runtime::sessions", %player, "stored progression replaces XP earned while loading");
        }
        self.progression.restore(player, &snapshot.progression);

        session.mark_reconciled();
        debug!(target: "runtime::sessions", %player, saved_at = %snapshot.saved_at, "snapshot reconciled");
        self.bus.publish(SessionEvent::Loaded { player });
        true
    }

    /// Ends the session: cancels a pending load, restores the original speed,
    /// forgets every per-player engine state and saves a final snapshot.
    ///
    /// Returns the final snapshot. A failed save is logged, not returned.
    pub async fn end_session(&self, player: PlayerId) -> Result<PlayerSnapshot> {
        let session = self.sessions.require(player)?;
        let snapshot = {
            let _reconcile = session.reconcile_guard();
            if !self.sessions.remove(&session) {
                return Err(RuntimeError::SessionNotFound { player });
            }

            // Waits out a tick in flight; later ticks see the inactive token.
            let vitals = {
                let vitals = session.vitals();
                self.effects.clear_player(player);
                self.speed.restore_original_speed(player, self.router.as_ref());
                self.depletion.modifiers().clear_subject(player);
                vitals.snapshot()
            };
            let snapshot = PlayerSnapshot::new(player, vitals, self.progression.snapshot(player));
            self.progression.remove_player(player);
            snapshot
        };
        self.router.release(player);
        info!(target: "runtime::sessions", %player, owner = %session.owner(), "session ended");
        self.bus.publish(SessionEvent::Ended { player });

        if session.is_reconciled() {
            if let Err(e) = self.repository.save(&snapshot).await {
                warn!(target: "runtime::persistence", %player, error = %e, "final save failed");
            }
        } else {
            warn!(
                target: "runtime::persistence",
                %player,
                "session ended before its snapshot loaded; final save skipped"
            );
        }
        Ok(snapshot)
    }

    fn snapshot_of(&self, session: &Session) -> PlayerSnapshot {
        let vitals = session.vitals().snapshot();
        PlayerSnapshot::new(
            session.player(),
            vitals,
            self.progression.snapshot(session.player()),
        )
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Runs one simulation pass over every session at engine time `now`.
    pub fn tick_at(&self, now: Millis) -> TickSummary {
        let mut summary = TickSummary::default();
        for session in self.sessions.all() {
            summary.players += 1;
            match self.tick_session(&session, now) {
                Ok((depleted, transitions)) => {
                    summary.depleted += usize::from(depleted);
                    summary.transitions += transitions;
                }
                Err(e) => {
                    summary.failed += 1;
                    error!(target: "runtime::tick", player = %session.player(), error = %e, "tick aborted");
                }
            }
        }
        summary
    }

    fn tick_session(&self, session: &Session, now: Millis) -> Result<(bool, usize)> {
        let player = session.player();
        let activity = self.classifier.classify(player);

        let (report, transitions, view) = {
            let mut vitals = session.vitals();
            if !session.token().is_active() {
                return Ok((false, 0));
            }
            vitals.set_activity(activity);
            let report = self.depletion.tick(&mut vitals, now);
            let transitions = self.effects.evaluate(&vitals);
            (report, transitions, vitals.view())
        };

        for transition in &transitions {
            self.hooks
                .dispatch(&HookContext::new(transition, &view, now))?;
            self.router
                .schedule_on_owner(player, VisibleEffect::Effect(*transition));
            self.bus.publish(*transition);
        }

        {
            let _vitals = session.vitals();
            if !session.token().is_active() {
                return Ok((!report.is_empty(), transitions.len()));
            }
            self.speed
                .apply_speed(player, session.host_speed(), self.router.as_ref());
        }

        if !report.is_empty() {
            self.router
                .schedule_on_owner(player, VisibleEffect::Vitals(view));
            self.bus.publish(VitalsEvent::Depleted {
                player,
                stats: report.depleted.iter().map(|(stat, _)| *stat).collect(),
                view,
            });
        }
        Ok((!report.is_empty(), transitions.len()))
    }

    // ------------------------------------------------------------------
    // Host events
    // ------------------------------------------------------------------

    /// Consumption: refills `stat`, clamped at its current max. Returns the
    /// new value.
    pub fn restore(&self, player: PlayerId, stat: StatKind, amount: f64) -> Result<f64> {
        let session = self.sessions.require(player)?;
        let (value, view) = {
            let mut vitals = session.vitals();
            let value = vitals.restore(stat, amount);
            (value, vitals.view())
        };
        self.router
            .schedule_on_owner(player, VisibleEffect::Vitals(view));
        self.bus
            .publish(VitalsEvent::Restored { player, stat, value });
        Ok(value)
    }

    /// Administrative stat set, clamped to `[0, max]`.
    pub fn set_stat(&self, player: PlayerId, stat: StatKind, value: f64) -> Result<f64> {
        let session = self.sessions.require(player)?;
        let (value, view) = {
            let mut vitals = session.vitals();
            let value = vitals.set(stat, value);
            (value, vitals.view())
        };
        self.router
            .schedule_on_owner(player, VisibleEffect::Vitals(view));
        self.bus
            .publish(VitalsEvent::Restored { player, stat, value });
        Ok(value)
    }

    /// Profession-relevant action detected by the host.
    pub fn award_xp(
        &self,
        player: PlayerId,
        profession: Profession,
        amount: f64,
    ) -> Result<AwardOutcome> {
        self.sessions.require(player)?;
        let outcome = self.progression.award_xp(player, profession, amount);
        self.announce_level_up(&outcome);
        Ok(outcome)
    }

    fn announce_level_up(&self, outcome: &AwardOutcome) {
        if !outcome.won_level_up {
            return;
        }
        self.router.schedule_on_owner(
            outcome.player,
            VisibleEffect::LevelUp {
                profession: outcome.profession,
                level: outcome.new_level,
            },
        );
        self.bus.publish(ProgressionEvent::LevelUp {
            player: outcome.player,
            profession: outcome.profession,
            old_level: outcome.old_level,
            new_level: outcome.new_level,
        });
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    pub fn set_level(
        &self,
        player: PlayerId,
        profession: Profession,
        level: u32,
    ) -> Result<ProfessionProgress> {
        self.sessions.require(player)?;
        let progress = self.progression.set_level(player, profession, level);
        self.announce_admin(player, &progress);
        Ok(progress)
    }

    /// Adds raw XP without the ability multiplier. Level-ups fire as for
    /// regular awards.
    pub fn add_xp(&self, player: PlayerId, profession: Profession, amount: u64) -> Result<AwardOutcome> {
        self.sessions.require(player)?;
        let outcome = self.progression.add_xp(player, profession, amount);
        self.announce_level_up(&outcome);
        Ok(outcome)
    }

    pub fn reset_profession(
        &self,
        player: PlayerId,
        profession: Profession,
    ) -> Result<ProfessionProgress> {
        self.sessions.require(player)?;
        self.progression.reset_profession(player, profession);
        let progress = self.progression.progress(player, profession);
        self.announce_admin(player, &progress);
        Ok(progress)
    }

    fn announce_admin(&self, player: PlayerId, progress: &ProfessionProgress) {
        self.bus.publish(ProgressionEvent::AdminChanged {
            player,
            profession: progress.profession,
            level: progress.level,
            xp: progress.xp,
        });
    }

    // ------------------------------------------------------------------
    // Read models
    // ------------------------------------------------------------------

    /// Whether the session has been reconciled with storage.
    pub fn is_loaded(&self, player: PlayerId) -> Result<bool> {
        Ok(self.sessions.require(player)?.is_reconciled())
    }

    pub fn vitals(&self, player: PlayerId) -> Result<VitalsView> {
        Ok(self.sessions.require(player)?.vitals().view())
    }

    pub fn progress(&self, player: PlayerId, profession: Profession) -> Result<ProfessionProgress> {
        self.sessions.require(player)?;
        Ok(self.progression.progress(player, profession))
    }

    pub fn active_effects(&self, player: PlayerId) -> Result<Vec<EffectKind>> {
        self.sessions.require(player)?;
        Ok(self.effects.active_effects(player))
    }

    pub fn speed_multiplier(&self, player: PlayerId) -> Result<f64> {
        self.sessions.require(player)?;
        Ok(self.speed.combined_multiplier(player))
    }

    pub fn depletion_multiplier(&self, player: PlayerId) -> Result<f64> {
        self.sessions.require(player)?;
        Ok(self.depletion.combined_depletion_multiplier(player))
    }

    pub fn hud(&self, player: PlayerId) -> Result<Vec<HudLine>> {
        let view = HudView {
            vitals: self.vitals(player)?,
            effects: self.effects.active_effects(player),
            speed_multiplier: self.speed.combined_multiplier(player),
            professions: Profession::ALL
                .into_iter()
                .map(|profession| self.progression.progress(player, profession))
                .collect(),
        };
        Ok(self.hud.render(&view))
    }

    pub fn snapshot(&self, player: PlayerId) -> Result<PlayerSnapshot> {
        let session = self.sessions.require(player)?;
        Ok(self.snapshot_of(&session))
    }

    // ------------------------------------------------------------------
    // Persistence and configuration
    // ------------------------------------------------------------------

    /// Saves every reconciled session. Failures are logged and counted.
    pub async fn save_all(&self) -> SaveReport {
        let sessions = self.sessions.all();
        let mut report = SaveReport::default();
        for session in &sessions {
            if !session.is_reconciled() {
                report.skipped += 1;
                continue;
            }
            let snapshot = self.snapshot_of(session);
            match self.repository.save(&snapshot).await {
                Ok(()) => report.saved += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(target: "runtime::persistence", player = %snapshot.player, error = %e, "autosave failed");
                }
            }
        }
        if report.skipped > 0 {
            debug!(target: "runtime::persistence", skipped = report.skipped, "sessions still loading");
        }
        self.bus.publish(SessionEvent::Saved {
            players: report.saved,
            failed: report.failed,
        });
        report
    }

    /// Swaps in a new configuration. Derived tables are rebuilt from it and
    /// stored XP is re-levelled against the new curve.
    pub fn reload_config(&self, config: ValidatedConfig) -> Result<()> {
        self.catalog()
            .check_tiers(&config.progression().tier_levels)?;
        self.depletion.reconfigure(&config);
        self.effects.reconfigure(&config);
        self.speed.reconfigure(&config);
        self.progression.reconfigure(&config);
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(config);
        info!(target: "runtime::config", "engine configuration reloaded");
        Ok(())
    }

    /// Reloads from a TOML file, keeping the current configuration when the
    /// file is missing or invalid. Returns whether a new config was applied.
    pub fn reload_config_from(&self, path: &Path) -> Result<bool> {
        let (config, reloaded) = ConfigLoader::reload_or_keep(path, &self.config());
        if reloaded {
            self.reload_config(config)?;
        }
        Ok(reloaded)
    }
}

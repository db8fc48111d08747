//! Shared harness for runtime integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, mpsc};

use survival_core::{
    AbilityCatalog, ActivityState, NoopUnlockSink, OwnerId, PlayerId, PlayerVitals, Profession,
    ProgressionEngine, StatKind, SurvivalConfig, ValidatedConfig, VisibleEffect,
};
use survival_runtime::repository::Result as RepoResult;
use survival_runtime::{
    FixedActivity, HostError, HostTarget, InMemorySnapshotRepo, ManualClock, PlayerSnapshot,
    RepositoryError, RuntimeBuilder, RuntimeHandle, SnapshotRepository, SurvivalRuntime,
};

pub const PLAYER: PlayerId = PlayerId(1);
pub const OWNER: OwnerId = OwnerId(7);
pub const HOST_SPEED: f64 = 0.1;

pub type Applied = (OwnerId, PlayerId, VisibleEffect);

/// Host target that forwards every applied effect to the test.
pub struct Recording(pub mpsc::UnboundedSender<Applied>);

#[async_trait]
impl HostTarget for Recording {
    async fn apply(
        &self,
        owner: OwnerId,
        player: PlayerId,
        effect: VisibleEffect,
    ) -> Result<(), HostError> {
        let _ = self.0.send((owner, player, effect));
        Ok(())
    }
}

/// Repository whose loads block until the test releases them.
#[derive(Default)]
pub struct GatedRepo {
    pub inner: InMemorySnapshotRepo,
    pub gate: Notify,
}

#[async_trait]
impl SnapshotRepository for GatedRepo {
    async fn load(&self, player: PlayerId) -> RepoResult<Option<PlayerSnapshot>> {
        self.gate.notified().await;
        self.inner.load(player).await
    }

    async fn save(&self, snapshot: &PlayerSnapshot) -> RepoResult<()> {
        self.inner.save(snapshot).await
    }

    async fn delete(&self, player: PlayerId) -> RepoResult<()> {
        self.inner.delete(player).await
    }

    async fn list_players(&self) -> RepoResult<Vec<PlayerId>> {
        self.inner.list_players().await
    }
}

/// Repository that loads nothing and rejects every save.
pub struct FailingRepo;

#[async_trait]
impl SnapshotRepository for FailingRepo {
    async fn load(&self, _player: PlayerId) -> RepoResult<Option<PlayerSnapshot>> {
        Ok(None)
    }

    async fn save(&self, _snapshot: &PlayerSnapshot) -> RepoResult<()> {
        Err(RepositoryError::CorruptedData("disk full".into()))
    }

    async fn delete(&self, _player: PlayerId) -> RepoResult<()> {
        Ok(())
    }

    async fn list_players(&self) -> RepoResult<Vec<PlayerId>> {
        Ok(Vec::new())
    }
}

pub struct Harness {
    pub runtime: SurvivalRuntime,
    pub handle: RuntimeHandle,
    pub clock: Arc<ManualClock>,
    pub applied: mpsc::UnboundedReceiver<Applied>,
}

pub fn engine_config() -> ValidatedConfig {
    SurvivalConfig::default().validate().expect("reference config is valid")
}

/// Builder with a manual clock, idle players, a recording host and no tick
/// worker. Returns the clock and the receiving end of the host target.
pub fn builder() -> (RuntimeBuilder, Arc<ManualClock>, mpsc::UnboundedReceiver<Applied>) {
    let clock = Arc::new(ManualClock::new(0));
    let (tx, rx) = mpsc::unbounded_channel();
    let builder = SurvivalRuntime::builder()
        .clock(clock.clone())
        .classifier(Arc::new(FixedActivity(ActivityState::Idle)))
        .host_target(Recording(tx))
        .manual_ticks();
    (builder, clock, rx)
}

pub async fn harness(repository: Arc<dyn SnapshotRepository>) -> Harness {
    let (builder, clock, applied) = builder();
    let runtime = builder
        .repository(repository)
        .build()
        .await
        .expect("runtime should build");
    Harness {
        handle: runtime.handle(),
        runtime,
        clock,
        applied,
    }
}

/// Waits until the player's stored snapshot has been reconciled.
pub async fn wait_loaded(handle: &RuntimeHandle, player: PlayerId) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !handle.is_loaded(player).expect("session should exist") {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("snapshot load should finish");
}

/// Collects every effect the host receives within `window`.
pub async fn drain(rx: &mut mpsc::UnboundedReceiver<Applied>, window: Duration) -> Vec<VisibleEffect> {
    let mut effects = Vec::new();
    while let Ok(Some((_, _, effect))) = tokio::time::timeout(window, rx.recv()).await {
        effects.push(effect);
    }
    effects
}

/// Stored state: hunger at 40 and farming at level 25 (green_thumb and
/// survivalist unlocked).
pub fn stored_snapshot(player: PlayerId) -> PlayerSnapshot {
    let config = engine_config();
    let mut vitals = PlayerVitals::new(player, config.vitals(), 0);
    vitals.set(StatKind::Hunger, 40.0);

    let progression = ProgressionEngine::new(
        &config,
        Arc::new(AbilityCatalog::reference()),
        Arc::new(NoopUnlockSink),
    );
    progression.add_xp(player, Profession::Farming, config.curve().xp_for_level(25));

    PlayerSnapshot::new(player, vitals.snapshot(), progression.snapshot(player))
}

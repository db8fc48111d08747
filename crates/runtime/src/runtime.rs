//! High-level runtime orchestrator.
//!
//! The runtime wires the engine context once, owns the background workers and
//! exposes a builder-based API. Clients interact with the running engine
//! through [`RuntimeHandle`].

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use survival_content::Content;
use survival_core::{AbilityCatalog, SurvivalConfig, ValidatedConfig};

use crate::api::providers::{ActivityClassifier, Clock, ReportedActivity, SystemClock};
use crate::api::{Result, RuntimeError, RuntimeHandle};
use crate::context::{EngineContext, Services};
use crate::events::EventBus;
use crate::hooks::HookRegistry;
use crate::hud::CompositeHud;
use crate::presentation::{HostTarget, LoggingHost, PresentationRouter};
use crate::repository::{FileSnapshotRepository, InMemorySnapshotRepo, SnapshotRepository};
use crate::workers::{PersistenceCommand, PersistenceWorker, TickCommand, TickWorker};

pub const TICK_MS_VAR: &str = "SURVIVAL_TICK_MS";
pub const AUTOSAVE_SECS_VAR: &str = "SURVIVAL_AUTOSAVE_SECS";
pub const SAVE_DIR_VAR: &str = "SURVIVAL_SAVE_DIR";

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub engine: ValidatedConfig,
    pub tick_interval: Duration,
    pub autosave_interval: Duration,
    /// Snapshot directory; `None` keeps snapshots in memory.
    pub save_dir: Option<PathBuf>,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
}

impl RuntimeConfig {
    pub fn new(engine: ValidatedConfig) -> Self {
        Self {
            engine,
            tick_interval: Duration::from_secs(1),
            autosave_interval: Duration::from_secs(300),
            save_dir: None,
            event_buffer_size: 100,
            command_buffer_size: 32,
        }
    }

    /// Reads tick cadence, autosave interval and save directory from the
    /// environment. Unset variables keep the defaults.
    pub fn from_env(engine: ValidatedConfig) -> Result<Self> {
        let mut config = Self::new(engine);
        if let Some(ms) = read_positive(TICK_MS_VAR)? {
            config.tick_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = read_positive(AUTOSAVE_SECS_VAR)? {
            config.autosave_interval = Duration::from_secs(secs);
        }
        if let Ok(dir) = env::var(SAVE_DIR_VAR) {
            config.save_dir = Some(if dir.is_empty() {
                default_save_dir()
            } else {
                PathBuf::from(dir)
            });
        }
        Ok(config)
    }

    pub fn with_save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_dir = Some(dir.into());
        self
    }
}

fn read_positive(var: &'static str) -> Result<Option<u64>> {
    match env::var(var) {
        Ok(value) => match value.trim().parse::<u64>() {
            Ok(parsed) if parsed > 0 => Ok(Some(parsed)),
            _ => Err(RuntimeError::InvalidEnv { var, value }),
        },
        Err(_) => Ok(None),
    }
}

/// Platform data directory for player snapshots.
///
/// Falls back to `./snapshots` when no home directory can be determined.
pub fn default_save_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "survival")
        .map(|dirs| dirs.data_dir().join("snapshots"))
        .unwrap_or_else(|| PathBuf::from("snapshots"))
}

/// Main runtime that owns the engine context and its workers.
///
/// [`RuntimeHandle`] provides a cloneable façade for clients.
pub struct SurvivalRuntime {
    handle: RuntimeHandle,
    tick_tx: Option<mpsc::Sender<TickCommand>>,
    persist_tx: mpsc::Sender<PersistenceCommand>,
    workers: Vec<JoinHandle<()>>,
}

impl SurvivalRuntime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Swaps in a validated engine configuration.
    pub fn reload_config(&self, config: ValidatedConfig) -> Result<()> {
        self.handle.reload_config(config)
    }

    /// Stops the workers. The persistence worker runs a final save pass
    /// before exiting; sessions stay open in the context.
    pub async fn shutdown(self) -> Result<()> {
        if let Some(tick_tx) = &self.tick_tx {
            let _ = tick_tx.send(TickCommand::Shutdown).await;
        }
        let _ = self.persist_tx.send(PersistenceCommand::Shutdown).await;

        for worker in self.workers {
            worker.await.map_err(RuntimeError::WorkerJoin)?;
        }
        info!("runtime shut down");
        Ok(())
    }
}

/// Builder for [`SurvivalRuntime`].
pub struct RuntimeBuilder {
    config: Option<RuntimeConfig>,
    catalog: Option<AbilityCatalog>,
    repository: Option<Arc<dyn SnapshotRepository>>,
    host_target: Option<Arc<dyn HostTarget>>,
    classifier: Option<Arc<dyn ActivityClassifier>>,
    clock: Option<Arc<dyn Clock>>,
    hooks: Option<HookRegistry>,
    hud: Option<CompositeHud>,
    tick_worker: bool,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: None,
            catalog: None,
            repository: None,
            host_target: None,
            classifier: None,
            clock: None,
            hooks: None,
            hud: None,
            tick_worker: true,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Engine config and ability catalog loaded from a data directory.
    pub fn content(mut self, content: Content) -> Self {
        let config = match self.config.take() {
            Some(mut config) => {
                config.engine = content.config;
                config
            }
            None => RuntimeConfig::new(content.config),
        };
        self.config = Some(config);
        self.catalog = Some(content.abilities);
        self
    }

    /// Ability catalog; the reference catalog is used when not set.
    pub fn catalog(mut self, catalog: AbilityCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Snapshot storage. Defaults to files under `save_dir` when configured,
    /// in-memory otherwise.
    pub fn repository(mut self, repository: Arc<dyn SnapshotRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn host_target(mut self, target: impl HostTarget + 'static) -> Self {
        self.host_target = Some(Arc::new(target));
        self
    }

    pub fn classifier(mut self, classifier: Arc<dyn ActivityClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replaces the default hooks ([`TransitionLogHook`](crate::hooks::TransitionLogHook)).
    pub fn hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn hud(mut self, hud: CompositeHud) -> Self {
        self.hud = Some(hud);
        self
    }

    /// Disables the tick worker; passes then run only through
    /// [`RuntimeHandle::tick`].
    pub fn manual_ticks(mut self) -> Self {
        self.tick_worker = false;
        self
    }

    /// Build the runtime. Must be called inside a tokio runtime.
    pub async fn build(self) -> Result<SurvivalRuntime> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(RuntimeError::MissingAsyncRuntime)?;
        let config = match self.config {
            Some(config) => config,
            None => RuntimeConfig::new(SurvivalConfig::default().validate()?),
        };

        let repository: Arc<dyn SnapshotRepository> = match (self.repository, &config.save_dir) {
            (Some(repository), _) => repository,
            (None, Some(dir)) => {
                debug!(target: "runtime::persistence", dir = %dir.display(), "using file snapshots");
                Arc::new(FileSnapshotRepository::new(dir)?)
            }
            (None, None) => Arc::new(InMemorySnapshotRepo::new()),
        };
        let target = self.host_target.unwrap_or_else(|| Arc::new(LoggingHost));

        let services = Services {
            repository,
            router: Arc::new(PresentationRouter::new(target)?),
            hooks: self.hooks.unwrap_or_else(HookRegistry::default_hooks),
            hud: self.hud.unwrap_or_else(CompositeHud::standard),
            bus: EventBus::with_capacity(config.event_buffer_size),
            classifier: self
                .classifier
                .unwrap_or_else(|| Arc::new(ReportedActivity::new())),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            runtime,
        };
        let catalog = Arc::new(self.catalog.unwrap_or_else(AbilityCatalog::reference));
        let ctx = Arc::new(EngineContext::new(config.engine.clone(), catalog, services)?);

        let mut workers = Vec::with_capacity(2);
        let tick_tx = if self.tick_worker {
            let (tick_tx, tick_rx) = mpsc::channel(config.command_buffer_size);
            let worker = TickWorker::new(Arc::clone(&ctx), config.tick_interval, tick_rx);
            workers.push(tokio::spawn(worker.run()));
            Some(tick_tx)
        } else {
            None
        };

        let (persist_tx, persist_rx) = mpsc::channel(config.command_buffer_size);
        let worker = PersistenceWorker::new(Arc::clone(&ctx), config.autosave_interval, persist_rx);
        workers.push(tokio::spawn(worker.run()));

        info!(
            tick_ms = config.tick_interval.as_millis() as u64,
            abilities = ctx.catalog().len(),
            "runtime started"
        );

        Ok(SurvivalRuntime {
            handle: RuntimeHandle::new(ctx, persist_tx.clone()),
            tick_tx,
            persist_tx,
            workers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment is process-global; keep every env assertion in one test.
    #[test]
    fn from_env_reads_overrides_and_rejects_garbage() {
        let engine = SurvivalConfig::default().validate().unwrap();
        unsafe {
            env::set_var(TICK_MS_VAR, "250");
            env::set_var(AUTOSAVE_SECS_VAR, "60");
            env::set_var(SAVE_DIR_VAR, "/tmp/survival-saves");
        }
        let config = RuntimeConfig::from_env(engine.clone()).unwrap();
        assert_eq!(config.tick_interval, Duration::from_millis(250));
        assert_eq!(config.autosave_interval, Duration::from_secs(60));
        assert_eq!(config.save_dir, Some(PathBuf::from("/tmp/survival-saves")));

        unsafe { env::set_var(TICK_MS_VAR, "fast") };
        assert!(matches!(
            RuntimeConfig::from_env(engine.clone()),
            Err(RuntimeError::InvalidEnv { var: TICK_MS_VAR, .. })
        ));
        unsafe { env::set_var(TICK_MS_VAR, "0") };
        assert!(RuntimeConfig::from_env(engine.clone()).is_err());

        unsafe {
            env::remove_var(TICK_MS_VAR);
            env::remove_var(AUTOSAVE_SECS_VAR);
            env::remove_var(SAVE_DIR_VAR);
        }
        let config = RuntimeConfig::from_env(engine).unwrap();
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert_eq!(config.save_dir, None);
    }
}

//! Runtime orchestration for the survival simulation.
//!
//! This crate wires the pure engine from `survival-core` to sessions, clocks,
//! storage and the host. Consumers build a [`SurvivalRuntime`], drive it
//! through [`RuntimeHandle`] and subscribe to events by topic.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`context`] is the explicit dependency container the workers share
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`hooks`] runs transition hooks after every buff/debuff change
//! - [`presentation`] and [`hud`] deliver visible effects to the host
//! - [`repository`] persists player snapshots between sessions
//! - `workers` keeps background tasks internal to the crate
pub mod api;
pub mod context;
pub mod events;
pub mod hooks;
pub mod hud;
pub mod presentation;
pub mod repository;
pub mod runtime;

mod sessions;
mod workers;

pub use api::{
    ActivityClassifier, Clock, FixedActivity, HostError, ManualClock, ReportedActivity, Result,
    RuntimeError, RuntimeHandle, SystemClock, WorkerKind,
};
pub use context::{EngineContext, SaveReport, TickSummary};
pub use events::{Event, EventBus, ProgressionEvent, SessionEvent, Topic, VitalsEvent};
pub use hooks::{
    CallbackHook, HookContext, HookCriticality, HookError, HookRegistry, TransitionHook,
    TransitionLogHook,
};
pub use hud::{CompositeHud, HudElement, HudLine, HudView};
pub use presentation::{HostTarget, LoggingHost, PresentationRouter};
pub use repository::{
    FileSnapshotRepository, InMemorySnapshotRepo, PlayerSnapshot, RepositoryError,
    SnapshotRepository,
};
pub use runtime::{RuntimeBuilder, RuntimeConfig, SurvivalRuntime, default_save_dir};
pub use sessions::SessionToken;

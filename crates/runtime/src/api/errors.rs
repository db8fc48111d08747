//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, repositories, configuration and
//! transition hooks so clients can bubble them up with consistent context.
use std::fmt;

use thiserror::Error;
use tokio::sync::oneshot;

use survival_core::{ConfigError, PlayerId};

pub use crate::hooks::HookError;
pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("no active session for {player}")]
    SessionNotFound { player: PlayerId },

    #[error("{player} already has an active session")]
    SessionAlreadyActive { player: PlayerId },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("environment variable {var}={value:?} is invalid")]
    InvalidEnv { var: &'static str, value: String },

    #[error("runtime must be built inside a tokio runtime")]
    MissingAsyncRuntime(#[source] tokio::runtime::TryCurrentError),

    #[error("{worker} worker command channel closed")]
    CommandChannelClosed { worker: WorkerKind },

    #[error("worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("critical hook `{hook}` failed")]
    CriticalHook {
        hook: &'static str,
        #[source]
        source: HookError,
    },
}

/// Background workers owned by the runtime.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WorkerKind {
    Tick,
    Persistence,
}

impl fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WorkerKind::Tick => "tick",
            WorkerKind::Persistence => "persistence",
        };
        write!(f, "{}", label)
    }
}

/// Failure reported by a [`HostTarget`](crate::presentation::HostTarget)
/// while applying a visible effect.
#[derive(Debug, Error)]
#[error("host target rejected effect: {reason}")]
pub struct HostError {
    pub reason: String,
}

impl HostError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

//! Public runtime API surface.
//!
//! This module gathers the types exposed to consumers of the runtime crate so
//! other layers can stay focused on orchestration, workers, or infrastructure.

pub mod errors;
pub mod handle;
pub mod providers;

pub use errors::{HostError, Result, RuntimeError, WorkerKind};
pub use handle::RuntimeHandle;
pub use providers::{
    ActivityClassifier, Clock, FixedActivity, ManualClock, ReportedActivity, SystemClock,
};

//! Background tasks owned by the runtime.
//!
//! The tick worker drives simulation passes on an interval; the persistence
//! worker autosaves every reconciled session and serves explicit save
//! requests. Both share the [`EngineContext`](crate::context::EngineContext)
//! and stop on a `Shutdown` command.

mod persistence;
mod tick;

pub(crate) use persistence::{Command as PersistenceCommand, PersistenceWorker};
pub(crate) use tick::{Command as TickCommand, TickWorker};

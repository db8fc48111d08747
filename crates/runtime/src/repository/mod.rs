//! Repository layer for per-player runtime data.
//!
//! Repositories hold the data that changes during play (vitals and
//! progression) between sessions. Static content (engine config, ability
//! catalogs) is loaded through `survival-content`, not here.

mod error;
mod file;
mod memory;
mod traits;
mod types;

pub use error::{RepositoryError, Result};
pub use file::FileSnapshotRepository;
pub use memory::InMemorySnapshotRepo;
pub use traits::SnapshotRepository;
pub use types::PlayerSnapshot;

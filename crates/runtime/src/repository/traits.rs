//! Repository contracts for saving and loading per-player state.

use async_trait::async_trait;

use survival_core::PlayerId;

use super::error::Result;
use super::types::PlayerSnapshot;

/// Repository for player snapshots.
///
/// Calls are made off the tick path: loads run in a background task per
/// session, saves from the persistence worker and on session end.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Load the stored snapshot of `player`, if any.
    async fn load(&self, player: PlayerId) -> Result<Option<PlayerSnapshot>>;

    /// Save (replace) the snapshot of `snapshot.player`.
    async fn save(&self, snapshot: &PlayerSnapshot) -> Result<()>;

    /// Delete the snapshot of `player`. Deleting a missing snapshot is not an
    /// error.
    async fn delete(&self, player: PlayerId) -> Result<()>;

    /// List all players with a stored snapshot, sorted.
    async fn list_players(&self) -> Result<Vec<PlayerId>>;
}

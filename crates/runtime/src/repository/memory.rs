//! In-memory SnapshotRepository implementation for tests and local runs.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use survival_core::PlayerId;

use super::{PlayerSnapshot, RepositoryError, Result, SnapshotRepository};

/// In-memory implementation of SnapshotRepository.
#[derive(Debug, Default)]
pub struct InMemorySnapshotRepo {
    snapshots: RwLock<BTreeMap<PlayerId, PlayerSnapshot>>,
}

impl InMemorySnapshotRepo {
    /// Create a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create pre-populated with `snapshots`.
    pub fn with_snapshots(snapshots: impl IntoIterator<Item = PlayerSnapshot>) -> Self {
        Self {
            snapshots: RwLock::new(
                snapshots
                    .into_iter()
                    .map(|snapshot| (snapshot.player, snapshot))
                    .collect(),
            ),
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SnapshotRepository for InMemorySnapshotRepo {
    async fn load(&self, player: PlayerId) -> Result<Option<PlayerSnapshot>> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(snapshots.get(&player).cloned())
    }

    async fn save(&self, snapshot: &PlayerSnapshot) -> Result<()> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        snapshots.insert(snapshot.player, snapshot.clone());
        Ok(())
    }

    async fn delete(&self, player: PlayerId) -> Result<()> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        snapshots.remove(&player);
        Ok(())
    }

    async fn list_players(&self) -> Result<Vec<PlayerId>> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(snapshots.keys().copied().collect())
    }
}

//! File-based SnapshotRepository implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use survival_core::PlayerId;

use super::{PlayerSnapshot, RepositoryError, Result, SnapshotRepository};

/// File-based implementation of SnapshotRepository.
///
/// Stores one pretty-printed JSON document per player as
/// `player_{id}.json`. Writes go to a temp file first and are renamed into
/// place, so a crash mid-save never leaves a truncated snapshot.
#[derive(Debug, Clone)]
pub struct FileSnapshotRepository {
    base_dir: PathBuf,
}

impl FileSnapshotRepository {
    /// Create a new file-based snapshot repository.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir).map_err(RepositoryError::Io)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get the path to a snapshot file.
    pub fn snapshot_path(&self, player: PlayerId) -> PathBuf {
        self.base_dir.join(format!("player_{}.json", player.0))
    }

    /// Player whose snapshot lives in `name`, if it is a snapshot file.
    pub fn parse_file_name(name: &str) -> Option<PlayerId> {
        name.strip_prefix("player_")?
            .strip_suffix(".json")?
            .parse()
            .ok()
            .map(PlayerId)
    }
}

#[async_trait]
impl SnapshotRepository for FileSnapshotRepository {
    async fn load(&self, player: PlayerId) -> Result<Option<PlayerSnapshot>> {
        let path = self.snapshot_path(player);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RepositoryError::Io(e)),
        };

        let snapshot: PlayerSnapshot =
            serde_json::from_slice(&bytes).map_err(|e| RepositoryError::Json(e.to_string()))?;
        if snapshot.player != player {
            return Err(RepositoryError::CorruptedData(format!(
                "{} holds a snapshot of {}",
                path.display(),
                snapshot.player
            )));
        }

        tracing::debug!("Loaded snapshot of {} from {}", player, path.display());
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &PlayerSnapshot) -> Result<()> {
        let path = self.snapshot_path(snapshot.player);
        let temp_path = path.with_extension("json.tmp");

        let bytes = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| RepositoryError::Json(e.to_string()))?;

        fs::write(&temp_path, bytes).await?;
        fs::rename(&temp_path, &path).await?;

        tracing::debug!("Saved snapshot of {} to {}", snapshot.player, path.display());
        Ok(())
    }

    async fn delete(&self, player: PlayerId) -> Result<()> {
        match fs::remove_file(self.snapshot_path(player)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RepositoryError::Io(e)),
        }
    }

    async fn list_players(&self) -> Result<Vec<PlayerId>> {
        let mut players = Vec::new();
        let mut entries = fs::read_dir(&self.base_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if let Some(player) = entry.file_name().to_str().and_then(Self::parse_file_name) {
                players.push(player);
            }
        }
        players.sort_unstable();
        Ok(players)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use survival_core::{PlayerVitals, Profession, StatKind, VitalsConfig};
    use tempfile::TempDir;

    fn snapshot(player: PlayerId) -> PlayerSnapshot {
        let mut vitals = PlayerVitals::new(player, &VitalsConfig::default(), 0);
        vitals.set(StatKind::Thirst, 42.5);
        let mut progression = survival_core::ProgressionSnapshot::default();
        progression.xp.insert(Profession::Mining, 1_234);
        PlayerSnapshot::new(player, vitals.snapshot(), progression)
    }

    #[tokio::test]
    async fn save_then_load_and_list() {
        let temp = TempDir::new().unwrap();
        let repo = FileSnapshotRepository::new(temp.path()).unwrap();

        assert_eq!(repo.load(PlayerId(7)).await.unwrap(), None);

        let saved = snapshot(PlayerId(7));
        repo.save(&saved).await.unwrap();
        repo.save(&snapshot(PlayerId(3))).await.unwrap();

        let loaded = repo.load(PlayerId(7)).await.unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(
            repo.list_players().await.unwrap(),
            vec![PlayerId(3), PlayerId(7)]
        );
        assert!(!repo.snapshot_path(PlayerId(7)).with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let repo = FileSnapshotRepository::new(temp.path()).unwrap();
        repo.save(&snapshot(PlayerId(1))).await.unwrap();

        repo.delete(PlayerId(1)).await.unwrap();
        repo.delete(PlayerId(1)).await.unwrap();
        assert!(repo.list_players().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn garbage_and_mismatched_files_are_errors() {
        let temp = TempDir::new().unwrap();
        let repo = FileSnapshotRepository::new(temp.path()).unwrap();

        std::fs::write(repo.snapshot_path(PlayerId(1)), b"not json").unwrap();
        assert!(matches!(
            repo.load(PlayerId(1)).await,
            Err(RepositoryError::Json(_))
        ));

        let other = serde_json::to_vec(&snapshot(PlayerId(5))).unwrap();
        std::fs::write(repo.snapshot_path(PlayerId(2)), other).unwrap();
        assert!(matches!(
            repo.load(PlayerId(2)).await,
            Err(RepositoryError::CorruptedData(_))
        ));
    }

    #[test]
    fn file_names_round_trip_to_player_ids() {
        assert_eq!(
            FileSnapshotRepository::parse_file_name("player_42.json"),
            Some(PlayerId(42))
        );
        assert_eq!(FileSnapshotRepository::parse_file_name("player_42.json.tmp"), None);
        assert_eq!(FileSnapshotRepository::parse_file_name("notes.txt"), None);
    }
}

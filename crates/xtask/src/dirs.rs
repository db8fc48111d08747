//! Platform-specific directory utilities
//!
//! Resolves where the runtime keeps player snapshots, honoring the same
//! environment override the runtime reads.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use survival_core::PlayerId;
use survival_runtime::FileSnapshotRepository;
use survival_runtime::runtime::SAVE_DIR_VAR;

/// Snapshot directory: `explicit`, else `SURVIVAL_SAVE_DIR`, else the
/// platform default
///
/// Follows platform conventions:
/// - macOS: `~/Library/Application Support/survival/snapshots`
/// - Linux: `~/.local/share/survival/snapshots` (or `$XDG_DATA_HOME/...`)
/// - Windows: `%APPDATA%\survival\data\snapshots`
/// - Fallback: `./snapshots`
pub fn snapshot_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| {
            std::env::var(SAVE_DIR_VAR)
                .ok()
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(survival_runtime::default_save_dir)
}

/// Players with a snapshot file in `dir`, sorted by id.
pub fn list_snapshot_files(dir: &Path) -> Result<Vec<(PlayerId, PathBuf)>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read snapshot directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if let Some(player) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(FileSnapshotRepository::parse_file_name)
        {
            files.push((player, path));
        }
    }
    files.sort_by_key(|(player, _)| *player);
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_only_snapshot_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["player_12.json", "player_3.json", "player_x.json", "notes.txt"] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }
        std::fs::write(dir.path().join("player_5.json.tmp"), "{}").unwrap();

        let players: Vec<_> = list_snapshot_files(dir.path())
            .unwrap()
            .into_iter()
            .map(|(player, _)| player)
            .collect();
        assert_eq!(players, vec![PlayerId(3), PlayerId(12)]);
    }

    #[test]
    fn explicit_directory_wins() {
        let dir = PathBuf::from("/srv/saves");
        assert_eq!(snapshot_dir(Some(dir.clone())), dir);
    }
}

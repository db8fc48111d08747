use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use survival_core::{PlayerId, ProgressionSnapshot, VitalsSnapshot};

/// Everything persisted for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub player: PlayerId,
    pub saved_at: DateTime<Utc>,
    pub vitals: VitalsSnapshot,
    #[serde(default)]
    pub progression: ProgressionSnapshot,
}

impl PlayerSnapshot {
    pub fn new(player: PlayerId, vitals: VitalsSnapshot, progression: ProgressionSnapshot) -> Self {
        Self {
            player,
            saved_at: Utc::now(),
            vitals,
            progression,
        }
    }
}

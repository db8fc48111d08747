//! Live player sessions.
//!
//! A session is usable the moment it starts: vitals come from the configured
//! defaults while the stored snapshot loads in the background. The load
//! carries the session's [`SessionToken`] and only applies if that token is
//! still active, so a load finishing after disconnect cannot resurrect the
//! player.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tokio::task::JoinHandle;

use survival_core::{OwnerId, PlayerId, PlayerVitals};

use crate::api::{Result, RuntimeError};

/// Identity of one session of one player.
#[derive(Debug)]
pub struct SessionToken {
    player: PlayerId,
    generation: u64,
    active: AtomicBool,
}

impl SessionToken {
    fn new(player: PlayerId, generation: u64) -> Self {
        Self {
            player,
            generation,
            active: AtomicBool::new(true),
        }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// Monotonic across every session the runtime has started.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn deactivate(&self) -> bool {
        self.active.swap(false, Ordering::AcqRel)
    }
}

#[derive(Debug)]
pub(crate) struct Session {
    token: Arc<SessionToken>,
    owner: OwnerId,
    host_speed: f64,
    vitals: Mutex<PlayerVitals>,
    load_task: Mutex<Option<JoinHandle<()>>>,
    /// Set once storage answered (snapshot applied, or nothing stored).
    reconciled: AtomicBool,
    /// Held while a loaded snapshot is applied and while the session ends.
    /// Taken before `vitals` whenever both are needed.
    reconcile: Mutex<()>,
}

impl Session {
    pub(crate) fn token(&self) -> &Arc<SessionToken> {
        &self.token
    }

    pub(crate) fn player(&self) -> PlayerId {
        self.token.player
    }

    pub(crate) fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Speed the host reported when the session started.
    pub(crate) fn host_speed(&self) -> f64 {
        self.host_speed
    }

    pub(crate) fn vitals(&self) -> MutexGuard<'_, PlayerVitals> {
        self.vitals.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_reconciled(&self) -> bool {
        self.reconciled.load(Ordering::Acquire)
    }

    pub(crate) fn mark_reconciled(&self) {
        self.reconciled.store(true, Ordering::Release);
    }

    pub(crate) fn reconcile_guard(&self) -> MutexGuard<'_, ()> {
        self.reconcile.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_load_task(&self, task: JoinHandle<()>) {
        let mut slot = self.load_task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.replace(task) {
            previous.abort();
        }
    }

    pub(crate) fn load_finished(&self) {
        self.load_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    fn cancel_load(&self) -> bool {
        match self
            .load_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }
}

/// All active sessions, keyed by player.
#[derive(Debug, Default)]
pub(crate) struct SessionTable {
    sessions: RwLock<HashMap<PlayerId, Arc<Session>>>,
    next_generation: AtomicU64,
}

impl SessionTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(
        &self,
        owner: OwnerId,
        host_speed: f64,
        vitals: PlayerVitals,
    ) -> Result<Arc<Session>> {
        let player = vitals.player();
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if sessions.contains_key(&player) {
            return Err(RuntimeError::SessionAlreadyActive { player });
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let session = Arc::new(Session {
            token: Arc::new(SessionToken::new(player, generation)),
            owner,
            host_speed,
            vitals: Mutex::new(vitals),
            load_task: Mutex::new(None),
            reconciled: AtomicBool::new(false),
            reconcile: Mutex::new(()),
        });
        sessions.insert(player, Arc::clone(&session));
        Ok(session)
    }

    pub(crate) fn get(&self, player: PlayerId) -> Option<Arc<Session>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&player)
            .cloned()
    }

    /// Like [`get`](Self::get), failing with `SessionNotFound`.
    pub(crate) fn require(&self, player: PlayerId) -> Result<Arc<Session>> {
        self.get(player)
            .ok_or(RuntimeError::SessionNotFound { player })
    }

    /// Removes `session` if it is still the player's current one, deactivates
    /// its token and aborts a pending load.
    pub(crate) fn remove(&self, session: &Arc<Session>) -> bool {
        let player = session.player();
        {
            let mut sessions = self
                .sessions
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            match sessions.get(&player) {
                Some(current) if Arc::ptr_eq(current, session) => {
                    sessions.remove(&player);
                }
                _ => return false,
            }
        }
        session.token.deactivate();
        if session.cancel_load() {
            tracing::debug!(%player, "cancelled pending snapshot load");
        }
        true
    }

    /// Snapshot of the current sessions, sorted by player.
    pub(crate) fn all(&self) -> Vec<Arc<Session>> {
        let mut sessions: Vec<_> = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        sessions.sort_by_key(|session| session.player());
        sessions
    }

    pub(crate) fn players(&self) -> Vec<PlayerId> {
        self.all().iter().map(|session| session.player()).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use survival_core::VitalsConfig;

    fn vitals(player: u64) -> PlayerVitals {
        PlayerVitals::new(PlayerId(player), &VitalsConfig::default(), 0)
    }

    #[test]
    fn tokens_deactivate_on_remove_and_generations_increase() {
        let table = SessionTable::new();
        let first = table.insert(OwnerId(1), 0.1, vitals(1)).unwrap();
        let token = Arc::clone(first.token());
        assert!(token.is_active());

        assert!(matches!(
            table.insert(OwnerId(1), 0.1, vitals(1)),
            Err(RuntimeError::SessionAlreadyActive { .. })
        ));

        assert!(table.remove(&first));
        assert!(!token.is_active());
        assert!(table.get(PlayerId(1)).is_none());

        let second = table.insert(OwnerId(1), 0.1, vitals(1)).unwrap();
        assert!(second.token().generation() > token.generation());
        assert!(second.token().is_active());
    }

    #[test]
    fn removing_an_ended_session_leaves_its_successor_alone() {
        let table = SessionTable::new();
        let first = table.insert(OwnerId(1), 0.1, vitals(1)).unwrap();
        assert!(table.remove(&first));
        let second = table.insert(OwnerId(1), 0.1, vitals(1)).unwrap();

        assert!(!table.remove(&first));
        assert!(second.token().is_active());
        assert!(table.get(PlayerId(1)).is_some());
    }

    #[test]
    fn require_reports_missing_sessions() {
        let table = SessionTable::new();
        assert!(matches!(
            table.require(PlayerId(4)),
            Err(RuntimeError::SessionNotFound { player: PlayerId(4) })
        ));
    }

    #[test]
    fn all_is_sorted_by_player() {
        let table = SessionTable::new();
        for player in [5, 2, 9] {
            table.insert(OwnerId(0), 0.1, vitals(player)).unwrap();
        }
        assert_eq!(table.players(), vec![PlayerId(2), PlayerId(5), PlayerId(9)]);
        assert_eq!(table.len(), 3);
    }
}

//! Per-owner single-writer presentation queues.
//!
//! The engine hands visible effects to [`PresentationRouter`] from whatever
//! thread it runs on. The router forwards each effect to an unbounded queue
//! owned by the player's [`OwnerId`]; one tokio task per owner drains its
//! queue in order and applies the effects through the [`HostTarget`]. No two
//! effects for the same owner are ever applied concurrently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use survival_core::{OwnerId, PlayerId, PresentationSink, VisibleEffect};

use crate::api::{HostError, Result, RuntimeError};

/// Host side of the presentation boundary.
#[async_trait]
pub trait HostTarget: Send + Sync {
    /// Applies one effect. Called from the owner's queue task only.
    async fn apply(
        &self,
        owner: OwnerId,
        player: PlayerId,
        effect: VisibleEffect,
    ) -> std::result::Result<(), HostError>;
}

/// Host target that only logs (headless runs).
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHost;

#[async_trait]
impl HostTarget for LoggingHost {
    async fn apply(
        &self,
        owner: OwnerId,
        player: PlayerId,
        effect: VisibleEffect,
    ) -> std::result::Result<(), HostError> {
        trace!(target: "runtime::presentation", %owner, %player, ?effect, "visible effect");
        Ok(())
    }
}

type Queued = (PlayerId, VisibleEffect);

struct OwnerQueue {
    tx: mpsc::UnboundedSender<Queued>,
    players: usize,
}

#[derive(Default)]
struct RouterState {
    owners: HashMap<OwnerId, OwnerQueue>,
    assignments: HashMap<PlayerId, OwnerId>,
}

/// [`PresentationSink`] that serializes effects per owner.
pub struct PresentationRouter {
    target: Arc<dyn HostTarget>,
    runtime: tokio::runtime::Handle,
    state: Mutex<RouterState>,
}

impl PresentationRouter {
    /// Must be called inside a tokio runtime; owner tasks are spawned on it.
    pub fn new(target: Arc<dyn HostTarget>) -> Result<Self> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(RuntimeError::MissingAsyncRuntime)?;
        Ok(Self {
            target,
            runtime,
            state: Mutex::new(RouterState::default()),
        })
    }

    fn state(&self) -> std::sync::MutexGuard<'_, RouterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Routes `player`'s effects to `owner`, moving it if it was assigned
    /// elsewhere.
    pub fn assign(&self, player: PlayerId, owner: OwnerId) {
        let mut state = self.state();
        if let Some(previous) = state.assignments.insert(player, owner) {
            if previous == owner {
                return;
            }
            Self::detach(&mut state, previous);
        }

        let RouterState { owners, .. } = &mut *state;
        let queue = owners.entry(owner).or_insert_with(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            self.runtime
                .spawn(drain_owner(owner, rx, Arc::clone(&self.target)));
            debug!(target: "runtime::presentation", %owner, "owner queue started");
            OwnerQueue { tx, players: 0 }
        });
        queue.players += 1;
    }

    /// Stops routing `player`. Effects already queued are still delivered;
    /// the owner's task exits once its last player is released.
    pub fn release(&self, player: PlayerId) -> Option<OwnerId> {
        let mut state = self.state();
        let owner = state.assignments.remove(&player)?;
        Self::detach(&mut state, owner);
        Some(owner)
    }

    fn detach(state: &mut RouterState, owner: OwnerId) {
        if let Some(queue) = state.owners.get_mut(&owner) {
            queue.players = queue.players.saturating_sub(1);
            if queue.players == 0 {
                state.owners.remove(&owner);
                debug!(target: "runtime::presentation", %owner, "owner queue closed");
            }
        }
    }

    pub fn owner_of(&self, player: PlayerId) -> Option<OwnerId> {
        self.state().assignments.get(&player).copied()
    }

    pub fn owner_count(&self) -> usize {
        self.state().owners.len()
    }
}

impl PresentationSink for PresentationRouter {
    fn schedule_on_owner(&self, player: PlayerId, effect: VisibleEffect) {
        let state = self.state();
        let Some(owner) = state.assignments.get(&player).copied() else {
            debug!(target: "runtime::presentation", %player, "dropping effect for unassigned player");
            return;
        };
        let sent = state
            .owners
            .get(&owner)
            .is_some_and(|queue| queue.tx.send((player, effect)).is_ok());
        if !sent {
            warn!(target: "runtime::presentation", %owner, %player, "owner queue is gone");
        }
    }
}

async fn drain_owner(
    owner: OwnerId,
    mut rx: mpsc::UnboundedReceiver<Queued>,
    target: Arc<dyn HostTarget>,
) {
    while let Some((player, effect)) = rx.recv().await {
        if let Err(e) = target.apply(owner, player, effect).await {
            warn!(target: "runtime::presentation", %owner, %player, error = %e, "host target failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Forwards every applied effect to a channel the test reads.
    struct Forwarding(mpsc::UnboundedSender<(OwnerId, PlayerId, VisibleEffect)>);

    #[async_trait]
    impl HostTarget for Forwarding {
        async fn apply(
            &self,
            owner: OwnerId,
            player: PlayerId,
            effect: VisibleEffect,
        ) -> std::result::Result<(), HostError> {
            let _ = self.0.send((owner, player, effect));
            Ok(())
        }
    }

    fn speed(speed: f64) -> VisibleEffect {
        VisibleEffect::Speed {
            speed,
            multiplier: 1.0,
        }
    }

    #[tokio::test]
    async fn effects_arrive_in_order_on_the_owner_queue() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let router = PresentationRouter::new(Arc::new(Forwarding(tx))).unwrap();
        router.assign(PlayerId(1), OwnerId(10));

        for i in 0..20 {
            router.schedule_on_owner(PlayerId(1), speed(i as f64));
        }
        for i in 0..20 {
            let (owner, player, effect) =
                tokio::time::timeout(Duration::from_secs(1), rx.recv())
                    .await
                    .unwrap()
                    .unwrap();
            assert_eq!((owner, player), (OwnerId(10), PlayerId(1)));
            assert_eq!(effect, speed(i as f64));
        }
    }

    #[tokio::test]
    async fn unassigned_players_are_dropped_and_queues_close_with_last_player() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let router = PresentationRouter::new(Arc::new(Forwarding(tx))).unwrap();

        router.schedule_on_owner(PlayerId(1), speed(1.0));
        router.assign(PlayerId(1), OwnerId(10));
        router.assign(PlayerId(2), OwnerId(10));
        assert_eq!(router.owner_count(), 1);

        router.schedule_on_owner(PlayerId(2), speed(2.0));
        assert_eq!(router.release(PlayerId(1)), Some(OwnerId(10)));
        assert_eq!(router.owner_count(), 1);
        router.release(PlayerId(2));
        assert_eq!(router.owner_count(), 0);

        // Queued before release, still delivered.
        let (_, player, effect) = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!((player, effect), (PlayerId(2), speed(2.0)));
    }

    #[tokio::test]
    async fn reassignment_moves_the_player() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let router = PresentationRouter::new(Arc::new(Forwarding(tx))).unwrap();
        router.assign(PlayerId(1), OwnerId(10));
        router.assign(PlayerId(1), OwnerId(11));
        assert_eq!(router.owner_of(PlayerId(1)), Some(OwnerId(11)));
        assert_eq!(router.owner_count(), 1);
    }

    #[test]
    fn building_outside_tokio_is_an_error() {
        assert!(matches!(
            PresentationRouter::new(Arc::new(LoggingHost)),
            Err(RuntimeError::MissingAsyncRuntime(_))
        ));
    }
}

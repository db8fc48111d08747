//! Ticks, effects, speed and progression through the runtime handle.

mod common;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc as std_mpsc};
use std::time::Duration;

use survival_core::{ActivityState, EffectKind, PlayerId, Profession, StatKind, VisibleEffect};
use survival_runtime::{
    ActivityClassifier, CallbackHook, Event, HookCriticality, HookError, HookRegistry,
    InMemorySnapshotRepo, ProgressionEvent, SnapshotRepository, Topic, TransitionHook,
};

use common::*;

/// Classifier whose first call blocks until the test releases it, holding
/// a tick between classification and evaluation.
struct Parking {
    armed: AtomicBool,
    entered: Mutex<std_mpsc::Sender<()>>,
    release: Mutex<std_mpsc::Receiver<()>>,
}

impl ActivityClassifier for Parking {
    fn classify(&self, _player: PlayerId) -> ActivityState {
        if self.armed.swap(false, Ordering::SeqCst) {
            let _ = self.entered.lock().unwrap().send(());
            let _ = self.release.lock().unwrap().recv();
        }
        ActivityState::Idle
    }
}

fn last_speed(effects: &[VisibleEffect]) -> Option<(f64, f64)> {
    effects.iter().rev().find_map(|effect| match effect {
        VisibleEffect::Speed { speed, multiplier } => Some((*speed, *multiplier)),
        _ => None,
    })
}

#[tokio::test]
async fn buffs_debuffs_and_speed_follow_the_vitals() {
    let repo = Arc::new(InMemorySnapshotRepo::new());
    let mut h = harness(repo.clone()).await;
    h.handle
        .start_session(PLAYER, OWNER, HOST_SPEED)
        .expect("session should start");
    wait_loaded(&h.handle, PLAYER).await;

    // ================================================================
    // Full stats: every buff enters and speed rises
    // ================================================================
    let summary = h.handle.tick();
    assert_eq!((summary.players, summary.transitions, summary.failed), (1, 3, 0));
    assert_eq!(
        h.handle.active_effects(PLAYER).expect("effects"),
        vec![EffectKind::WellFed, EffectKind::Hydrated, EffectKind::Rested]
    );
    let boosted = 1.05 * 1.05 * 1.1;
    let multiplier = h.handle.speed_multiplier(PLAYER).expect("speed");
    assert!((multiplier - boosted).abs() < 1e-9);

    let effects = drain(&mut h.applied, Duration::from_millis(50)).await;
    let (speed, _) = last_speed(&effects).expect("speed pushed");
    assert!((speed - HOST_SPEED * boosted).abs() < 1e-9);

    // ================================================================
    // Thirst drops: dehydration suppresses every buff
    // ================================================================
    h.handle
        .set_stat(PLAYER, StatKind::Thirst, 20.0)
        .expect("set stat");
    h.handle.tick();
    assert_eq!(
        h.handle.active_effects(PLAYER).expect("effects"),
        vec![EffectKind::Dehydrated]
    );
    assert!((h.handle.speed_multiplier(PLAYER).expect("speed") - 0.6).abs() < 1e-9);

    // Drinking back to 30% stays inside the band: still dehydrated.
    h.handle
        .restore(PLAYER, StatKind::Thirst, 10.0)
        .expect("restore");
    h.handle.tick();
    assert!(
        h.handle
            .active_effects(PLAYER)
            .expect("effects")
            .contains(&EffectKind::Dehydrated)
    );

    // ================================================================
    // Session end restores the host's original speed
    // ================================================================
    drain(&mut h.applied, Duration::from_millis(20)).await;
    let last = h.handle.end_session(PLAYER).await.expect("end session");
    assert_eq!(last.vitals.values.thirst, 30.0);

    let effects = drain(&mut h.applied, Duration::from_millis(50)).await;
    assert_eq!(last_speed(&effects), Some((HOST_SPEED, 1.0)));

    let stored = repo.load(PLAYER).await.expect("load").expect("saved");
    assert_eq!(stored.vitals.values.thirst, 30.0);
}

#[tokio::test]
async fn depletion_follows_the_clock() {
    let mut h = harness(Arc::new(InMemorySnapshotRepo::new())).await;
    h.handle
        .start_session(PLAYER, OWNER, HOST_SPEED)
        .expect("session should start");
    wait_loaded(&h.handle, PLAYER).await;

    assert_eq!(h.handle.tick().depleted, 0);

    // Reference thirst interval at idle is 27s.
    h.clock.advance(27_000);
    let summary = h.handle.tick();
    assert_eq!(summary.depleted, 1);
    let vitals = h.handle.vitals(PLAYER).expect("vitals");
    assert_eq!(vitals.thirst.value, 99.0);
    assert_eq!(vitals.hunger.value, 100.0);

    let effects = drain(&mut h.applied, Duration::from_millis(50)).await;
    assert!(
        effects
            .iter()
            .any(|effect| matches!(effect, VisibleEffect::Vitals(view) if view.thirst.value == 99.0))
    );
}

#[tokio::test]
async fn level_ups_unlock_abilities_and_capacity() {
    let mut h = harness(Arc::new(InMemorySnapshotRepo::new())).await;
    let mut progression = h.handle.subscribe(Topic::Progression);
    h.handle
        .start_session(PLAYER, OWNER, HOST_SPEED)
        .expect("session should start");
    wait_loaded(&h.handle, PLAYER).await;

    let xp = h.handle.config().curve().xp_for_level(25);
    let outcome = h
        .handle
        .add_xp(PLAYER, Profession::Mining, xp)
        .expect("add xp");
    assert!(outcome.won_level_up);
    assert_eq!((outcome.old_level, outcome.new_level), (1, 25));
    assert_eq!(outcome.unlocked.len(), 2);

    // stone_stomach: hunger capacity +15.
    assert_eq!(h.handle.vitals(PLAYER).expect("vitals").hunger.max, 115.0);

    let mut unlocked = 0;
    let mut level_ups = 0;
    while let Ok(event) = progression.try_recv() {
        match event {
            Event::Progression(ProgressionEvent::AbilityUnlocked { .. }) => unlocked += 1,
            Event::Progression(ProgressionEvent::LevelUp { new_level, .. }) => {
                assert_eq!(new_level, 25);
                level_ups += 1;
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
    assert_eq!((unlocked, level_ups), (2, 1));

    let effects = drain(&mut h.applied, Duration::from_millis(50)).await;
    assert!(effects.contains(&VisibleEffect::LevelUp {
        profession: Profession::Mining,
        level: 25,
    }));
    assert_eq!(
        effects
            .iter()
            .filter(|effect| matches!(effect, VisibleEffect::AbilityUnlocked { .. }))
            .count(),
        2
    );

    let hud = h.handle.hud(PLAYER).expect("hud");
    assert!(hud.iter().any(|line| line.text == "mining 25"));
}

#[tokio::test]
async fn admin_operations_grant_and_revoke() {
    let h = harness(Arc::new(InMemorySnapshotRepo::new())).await;
    let mut progression = h.handle.subscribe(Topic::Progression);
    h.handle
        .start_session(PLAYER, OWNER, HOST_SPEED)
        .expect("session should start");
    wait_loaded(&h.handle, PLAYER).await;

    let progress = h
        .handle
        .set_level(PLAYER, Profession::Cooking, 50)
        .expect("set level");
    assert_eq!(progress.level, 50);
    // iron_gut: hunger and thirst capacity +10.
    let vitals = h.handle.vitals(PLAYER).expect("vitals");
    assert_eq!((vitals.hunger.max, vitals.thirst.max), (110.0, 110.0));
    // efficient_metabolism.
    assert!((h.handle.depletion_multiplier(PLAYER).expect("multiplier") - 0.9).abs() < 1e-9);

    let progress = h
        .handle
        .reset_profession(PLAYER, Profession::Cooking)
        .expect("reset");
    assert_eq!((progress.level, progress.xp), (1, 0));
    let vitals = h.handle.vitals(PLAYER).expect("vitals");
    assert_eq!((vitals.hunger.max, vitals.thirst.max), (100.0, 100.0));
    assert_eq!(h.handle.depletion_multiplier(PLAYER).expect("multiplier"), 1.0);

    let mut admin = Vec::new();
    let mut revoked = 0;
    while let Ok(event) = progression.try_recv() {
        match event {
            Event::Progression(ProgressionEvent::AdminChanged { level, .. }) => admin.push(level),
            Event::Progression(ProgressionEvent::AbilityRevoked { .. }) => revoked += 1,
            _ => {}
        }
    }
    assert_eq!(admin, vec![50, 1]);
    assert_eq!(revoked, 3);
}

#[tokio::test]
async fn critical_hook_failure_aborts_the_players_tick() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    let veto = CallbackHook::new("veto", move |_| {
        counted.fetch_add(1, Ordering::SeqCst);
        Err(HookError::failed("rejected"))
    })
    .with_criticality(HookCriticality::Critical);
    let hooks = HookRegistry::new(vec![Arc::new(veto) as Arc<dyn TransitionHook>]);

    let (builder, _clock, _applied) = builder();
    let runtime = builder
        .repository(Arc::new(InMemorySnapshotRepo::new()))
        .hooks(hooks)
        .build()
        .await
        .expect("runtime should build");
    let handle = runtime.handle();
    handle
        .start_session(PLAYER, OWNER, HOST_SPEED)
        .expect("session should start");
    wait_loaded(&handle, PLAYER).await;

    let summary = handle.tick();
    assert_eq!((summary.players, summary.failed, summary.transitions), (1, 1, 0));
    // The first transition reached the hook; the rest were never dispatched.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    // The coordinator had already recorded the transitions.
    assert_eq!(handle.active_effects(PLAYER).expect("effects").len(), 3);

    runtime.shutdown().await.expect("clean shutdown");
}

#[tokio::test]
async fn config_reload_keeps_sessions_running() {
    let h = harness(Arc::new(InMemorySnapshotRepo::new())).await;
    h.handle
        .start_session(PLAYER, OWNER, HOST_SPEED)
        .expect("session should start");
    h.handle
        .add_xp(PLAYER, Profession::Logging, 100)
        .expect("add xp");
    assert_eq!(
        h.handle
            .progress(PLAYER, Profession::Logging)
            .expect("progress")
            .level,
        2
    );

    let mut config = survival_core::SurvivalConfig::default();
    config.progression.base_xp = 200.0;
    h.handle
        .reload_config(config.validate().expect("valid config"))
        .expect("reload");
    assert_eq!(h.handle.config().progression().base_xp, 200.0);
    assert_eq!(
        h.handle
            .progress(PLAYER, Profession::Logging)
            .expect("progress")
            .level,
        1
    );

    let missing = std::path::Path::new("/nonexistent/survival.toml");
    assert!(!h.handle.reload_config_from(missing).expect("reload"));
    assert_eq!(h.handle.config().progression().base_xp, 200.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn tick_in_flight_during_end_session_leaves_no_state_behind() {
    let (entered_tx, entered_rx) = std_mpsc::channel();
    let (release_tx, release_rx) = std_mpsc::channel();
    let parking = Arc::new(Parking {
        armed: AtomicBool::new(false),
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    });

    let (builder, _clock, _applied) = builder();
    let runtime = builder
        .repository(Arc::new(InMemorySnapshotRepo::new()))
        .classifier(parking.clone())
        .build()
        .await
        .expect("runtime should build");
    let handle = runtime.handle();
    handle
        .start_session(PLAYER, OWNER, HOST_SPEED)
        .expect("session should start");
    wait_loaded(&handle, PLAYER).await;
    handle
        .set_stat(PLAYER, StatKind::Thirst, 10.0)
        .expect("set stat");

    parking.armed.store(true, Ordering::SeqCst);
    let ticking = handle.clone();
    let tick = tokio::task::spawn_blocking(move || ticking.tick());
    tokio::task::spawn_blocking(move || entered_rx.recv())
        .await
        .expect("join")
        .expect("tick should reach the classifier");

    handle.end_session(PLAYER).await.expect("end session");
    release_tx.send(()).expect("release tick");
    let summary = tick.await.expect("tick task");
    assert_eq!(summary.transitions, 0);

    handle
        .start_session(PLAYER, OWNER, HOST_SPEED)
        .expect("session should restart");
    assert_eq!(handle.active_effects(PLAYER).expect("effects"), Vec::new());
    assert_eq!(handle.speed_multiplier(PLAYER).expect("speed"), 1.0);

    runtime.shutdown().await.expect("clean shutdown");
}

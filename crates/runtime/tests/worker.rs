//! Runtime worker tests: commands over the handle, paused tokio time.

mod common;

use std::sync::Arc;

use common::*;
use encounter::EncounterState;
use runtime::{
    FileSaveRepository, HookEvent, InstanceHost, Runtime, RuntimeConfig, RuntimeError,
    SaveRepository, Simulation,
};
use tempfile::TempDir;

fn config() -> RuntimeConfig {
    RuntimeConfig {
        tick: ms(100),
        ..RuntimeConfig::default()
    }
}

fn start_lair(log: &SharedLog, repo: Arc<FileSaveRepository>) -> Runtime {
    let instance =
        InstanceHost::open("bwl", lair_layout(), repo).expect("lair layout is valid");
    let simulation = Simulation::new(registry(), Box::new(log.clone()))
        .with_instance(instance)
        .with_seed(Some(11));
    Runtime::start(simulation, &config())
}

#[tokio::test(start_paused = true)]
async fn test_worker_runs_fight_and_persists_kill() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let repo = Arc::new(
        FileSaveRepository::new(temp_dir.path()).expect("Failed to create save repository"),
    );
    let log = SharedLog::default();
    let runtime = start_lair(&log, Arc::clone(&repo));
    let handle = runtime.handle();

    handle
        .spawn("boss_razorgore", RAZOR, Some(0))
        .await
        .expect("spawn should succeed");
    handle
        .notify(RAZOR, HookEvent::EnterCombat { target: TANK })
        .await
        .expect("notify should succeed");

    tokio::time::sleep(ms(2_500)).await;

    let snapshot = handle.snapshot().await.expect("snapshot should succeed");
    assert!(snapshot.ticks > 0);
    assert!(snapshot.elapsed_ms >= 2_000);
    assert_eq!(snapshot.actors.len(), 1);
    assert!(snapshot.actors[0].in_combat);

    let instance = snapshot.instance.expect("instance snapshot");
    assert_eq!(instance.id, "bwl");
    assert_eq!(
        instance.states,
        vec![EncounterState::InProgress, EncounterState::NotStarted]
    );
    assert!(instance.gate_closed);
    assert!(log.casts_by(RAZOR).contains(&CLEAVE));

    handle
        .notify(RAZOR, HookEvent::Death { killer: Some(TANK) })
        .await
        .expect("notify should succeed");

    let simulation = runtime.shutdown().await.expect("worker should stop cleanly");
    assert_eq!(
        simulation
            .instance()
            .and_then(|instance| instance.boss_state(0)),
        Some(EncounterState::Done)
    );
    assert_eq!(
        repo.load("bwl").expect("save should be readable").as_deref(),
        Some("BWL 3 0 a=3")
    );
}

#[tokio::test(start_paused = true)]
async fn test_worker_reports_command_errors() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let repo = Arc::new(
        FileSaveRepository::new(temp_dir.path()).expect("Failed to create save repository"),
    );
    let log = SharedLog::default();
    let runtime = start_lair(&log, repo);
    let handle = runtime.handle();

    let err = handle
        .spawn("boss_onyxia", RAZOR, Some(0))
        .await
        .expect_err("unknown script");
    assert!(matches!(err, RuntimeError::UnknownScript(_)));

    let err = handle
        .notify(VENT, HookEvent::Evade)
        .await
        .expect_err("unknown actor");
    assert!(matches!(err, RuntimeError::UnknownActor(_)));

    handle
        .spawn("go_flame_vent", VENT, None)
        .await
        .expect("spawn should succeed");
    assert!(handle.despawn(VENT).await.expect("despawn should succeed"));
    assert!(!handle.despawn(VENT).await.expect("despawn should succeed"));

    // Nothing changed, nothing to write
    assert!(!handle.flush().await.expect("flush should succeed"));

    runtime.shutdown().await.expect("worker should stop cleanly");

    let err = handle.snapshot().await.expect_err("worker is gone");
    assert!(matches!(err, RuntimeError::CommandChannelClosed));
}

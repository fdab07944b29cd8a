// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::proc::mock::MockRunner;
use tmx_core::{FakeClock, MuxConfig};
use tmx_storage::MemoryStore;

struct Fixture {
    supervisor: SessionSupervisor,
    store: Arc<dyn StateStore>,
    runner: Arc<MockRunner>,
}

fn fixture_with(runner: MockRunner, config: MuxConfig) -> Fixture {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
    let runner = Arc::new(runner);
    let handle = ConfigHandle::new(config, std::path::PathBuf::from("/nonexistent/config.toml"));
    let supervisor = SessionSupervisor::new(
        Arc::clone(&store),
        Arc::clone(&runner) as Arc<dyn ProcessRunner>,
        Arc::new(TtydBackend),
        Arc::new(FakeClock::new()),
        handle,
    );
    Fixture { supervisor, store, runner }
}

fn fixture() -> Fixture {
    fixture_with(MockRunner::new(), MuxConfig::default())
}

fn start(dir: &str) -> StartOptions {
    StartOptions { name: None, dir: dir.into(), path: None }
}

#[tokio::test]
async fn start_allocates_port_path_and_records_session() {
    let f = fixture();
    let session = f.supervisor.start_session(start("/tmp/demo")).await.unwrap();

    assert_eq!(session.name, "demo");
    assert_eq!(session.port, 7601);
    assert_eq!(session.path, "/demo");
    assert_eq!(f.store.sessions().unwrap().len(), 1);

    let spawned = f.runner.spawned();
    assert_eq!(spawned.len(), 1);
    assert!(spawned[0].args.join(" ").contains("--base-path /ttyd-mux/demo"));
}

#[tokio::test]
async fn second_session_skips_taken_port() {
    let f = fixture();
    f.supervisor.start_session(start("/tmp/one")).await.unwrap();
    let second = f.supervisor.start_session(start("/tmp/two")).await.unwrap();
    assert_eq!(second.port, 7602);
}

#[tokio::test]
async fn weird_names_are_sanitized() {
    let f = fixture();
    let options = StartOptions {
        name: Some("weird name!".into()),
        dir: "/tmp".into(),
        path: None,
    };
    let session = f.supervisor.start_session(options).await.unwrap();
    assert_eq!(session.name, "weird_name_");
    assert_eq!(session.path, "/weird_name_");
}

#[tokio::test]
async fn reserved_names_are_rejected() {
    let f = fixture();
    let options = StartOptions { name: Some("api".into()), dir: "/tmp".into(), path: None };
    assert!(matches!(
        f.supervisor.start_session(options).await,
        Err(SupervisorError::InvalidName(_))
    ));
}

#[tokio::test]
async fn double_start_conflicts() {
    let f = fixture();
    f.supervisor.start_session(start("/tmp/demo")).await.unwrap();
    assert!(matches!(
        f.supervisor.start_session(start("/tmp/demo")).await,
        Err(SupervisorError::AlreadyRunning(name)) if name == "demo"
    ));
}

#[tokio::test]
async fn explicit_path_collision_conflicts() {
    let f = fixture();
    f.supervisor.start_session(start("/tmp/demo")).await.unwrap();
    let options = StartOptions {
        name: Some("other".into()),
        dir: "/tmp/other".into(),
        path: Some("/demo".into()),
    };
    assert!(matches!(
        f.supervisor.start_session(options).await,
        Err(SupervisorError::PathInUse(path)) if path == "/demo"
    ));
}

#[tokio::test]
async fn relative_path_is_rejected() {
    let f = fixture();
    let options = StartOptions {
        name: Some("demo".into()),
        dir: "/tmp".into(),
        path: Some("demo".into()),
    };
    assert!(matches!(
        f.supervisor.start_session(options).await,
        Err(SupervisorError::InvalidPath(_))
    ));
}

#[tokio::test]
async fn spawn_failure_surfaces_and_records_nothing() {
    let f = fixture_with(MockRunner::new().fail_spawn(), MuxConfig::default());
    assert!(matches!(
        f.supervisor.start_session(start("/tmp/demo")).await,
        Err(SupervisorError::Spawn(_))
    ));
    assert!(f.store.sessions().unwrap().is_empty());
}

#[tokio::test]
async fn readiness_timeout_rolls_back_and_kills() {
    let config = MuxConfig { start_timeout_ms: 150, ..MuxConfig::default() };
    let f = fixture_with(MockRunner::new().with_dead_port(7601), config);

    let err = f.supervisor.start_session(start("/tmp/demo")).await.unwrap_err();
    assert!(matches!(err, SupervisorError::StartFailed { port: 7601, .. }));
    assert!(f.store.sessions().unwrap().is_empty());
    assert!(f.runner.killed().iter().any(|(_, sig)| *sig == Signal::SIGKILL));
}

#[tokio::test]
async fn stop_signals_removes_record_and_optionally_tmux() {
    let f = fixture();
    let session = f.supervisor.start_session(start("/tmp/demo")).await.unwrap();

    f.supervisor.stop_session("demo", StopOptions { kill_tmux: true }).await.unwrap();

    assert!(f.store.sessions().unwrap().is_empty());
    assert!(f.runner.killed().iter().any(|(pid, sig)| *pid == session.pid && *sig == Signal::SIGTERM));
    let commands = f.runner.commands();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].0, "tmux");
    assert_eq!(commands[0].1, vec!["kill-session", "-t", "demo"]);
}

#[tokio::test]
async fn stop_unknown_session_is_not_found() {
    let f = fixture();
    assert!(matches!(
        f.supervisor.stop_session("ghost", StopOptions::default()).await,
        Err(SupervisorError::NotFound(_))
    ));
}

#[tokio::test]
async fn list_hides_and_prunes_dead_sessions() {
    let f = fixture();
    let session = f.supervisor.start_session(start("/tmp/demo")).await.unwrap();
    f.supervisor.start_session(start("/tmp/other")).await.unwrap();

    f.runner.mark_dead(session.pid);

    let live = f.supervisor.list_sessions().unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].name, "other");
    // the record itself is gone too
    assert_eq!(f.store.sessions().unwrap().len(), 1);
}

#[tokio::test]
async fn revalidation_partitions_by_liveness() {
    let f = fixture();
    let dead = f.supervisor.start_session(start("/tmp/dead")).await.unwrap();
    f.supervisor.start_session(start("/tmp/live")).await.unwrap();
    f.runner.mark_dead(dead.pid);

    let result = f.supervisor.revalidate_sessions().unwrap();
    assert_eq!(result.valid.len(), 1);
    assert_eq!(result.removed.len(), 1);
    assert_eq!(result.removed[0].name, "dead");
}

#[tokio::test]
async fn a_crashed_backend_does_not_block_its_name() {
    let f = fixture();
    let session = f.supervisor.start_session(start("/tmp/demo")).await.unwrap();
    f.runner.mark_dead(session.pid);

    // same name starts cleanly because the stale record is pruned
    let restarted = f.supervisor.start_session(start("/tmp/demo")).await.unwrap();
    assert_eq!(restarted.name, "demo");
}

#[tokio::test]
async fn stop_all_stops_everything() {
    let f = fixture();
    f.supervisor.start_session(start("/tmp/one")).await.unwrap();
    f.supervisor.start_session(start("/tmp/two")).await.unwrap();

    let stopped = f.supervisor.stop_all_sessions(StopOptions::default()).await.unwrap();
    assert_eq!(stopped, 2);
    assert!(f.store.sessions().unwrap().is_empty());
}

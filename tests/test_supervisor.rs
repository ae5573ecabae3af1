//! Supervisor lifecycle and command handling.

mod common;

use common::{test_config, FakeSource, RecordingSink};
use degen_hunter::control::{Command, Supervisor, SupervisorError};
use degen_hunter::hunter::{DegenHunter, SqliteLedger};
use std::sync::Arc;

async fn supervisor() -> (Supervisor, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    let ledger = Arc::new(SqliteLedger::in_memory().await.expect("in-memory ledger"));
    let hunter = Arc::new(DegenHunter::new(
        test_config(),
        Arc::new(FakeSource::new()),
        sink.clone(),
        ledger,
    ));
    (Supervisor::new(hunter), sink)
}

#[tokio::test]
async fn test_start_stop_lifecycle() {
    let (mut supervisor, sink) = supervisor().await;
    assert!(!supervisor.is_running());

    supervisor.start().unwrap();
    assert!(supervisor.is_running());
    assert!(matches!(supervisor.start(), Err(SupervisorError::AlreadyRunning)));

    let status = supervisor.status().await;
    assert!(status.running);
    assert!(status.uptime.is_some());

    supervisor.stop().await.unwrap();
    assert!(!supervisor.is_running());
    assert!(matches!(supervisor.stop().await, Err(SupervisorError::NotRunning)));

    let status = supervisor.status().await;
    assert!(!status.running);
    assert!(status.uptime.is_none());
    assert!(sink.count_containing("Degen Coin Hunter Stopped") >= 1);
}

#[tokio::test]
async fn test_restart_from_stopped_starts() {
    let (mut supervisor, _sink) = supervisor().await;

    supervisor.restart().await.unwrap();
    assert!(supervisor.is_running());

    supervisor.restart().await.unwrap();
    assert!(supervisor.is_running());

    supervisor.stop().await.unwrap();
}

#[tokio::test]
async fn test_command_replies() {
    let (mut supervisor, _sink) = supervisor().await;

    let reply = supervisor.handle(Command::parse("/status")).await;
    assert!(reply.contains("STOPPED"));

    let reply = supervisor.handle(Command::parse("/stop")).await;
    assert!(reply.contains("not running"));

    let reply = supervisor.handle(Command::parse("start")).await;
    assert!(reply.contains("started"));
    let reply = supervisor.handle(Command::parse("start")).await;
    assert!(reply.contains("already running"));

    let reply = supervisor.handle(Command::parse("/status")).await;
    assert!(reply.contains("RUNNING"));

    let reply = supervisor.handle(Command::parse("/stop")).await;
    assert!(reply.contains("stopped"));

    let reply = supervisor.handle(Command::parse("/config")).await;
    assert!(reply.contains("Min Degen Score: 50"));

    let reply = supervisor.handle(Command::parse("what")).await;
    assert!(reply.contains("Unknown command"));
}

#[tokio::test]
async fn test_track_uses_default_thresholds() {
    let (mut supervisor, _sink) = supervisor().await;

    let reply = supervisor.handle(Command::parse("/track 0xabc PEPE 1.0")).await;
    assert!(reply.contains("Tracking $PEPE"));

    let positions = supervisor.positions().await;
    assert_eq!(positions.len(), 1);
    assert!((positions[0].stop_loss - 0.8).abs() < 1e-12);
    assert!((positions[0].take_profit - 2.0).abs() < 1e-12);

    let reply = supervisor.handle(Command::parse("/track 0xabc PEPE 2.0 -10 50")).await;
    assert!(reply.contains("replaced previous thresholds"));

    let reply = supervisor.handle(Command::parse("/positions")).await;
    assert!(reply.contains("Tracked Positions (1)"));

    let status = supervisor.status().await;
    assert_eq!(status.tracked_positions, 1);

    let reply = supervisor.handle(Command::parse("/untrack 0xabc")).await;
    assert!(reply.contains("Stopped tracking $PEPE"));
    let reply = supervisor.handle(Command::parse("/untrack 0xabc")).await;
    assert!(reply.contains("is not tracked"));
}

#[tokio::test]
async fn test_track_rejects_invalid_input() {
    let (mut supervisor, _sink) = supervisor().await;

    let reply = supervisor.handle(Command::parse("/track 0xabc X 0")).await;
    assert!(reply.contains("entry price must be positive"));

    let reply = supervisor.handle(Command::parse("/track 0xabc X 1.0 10 50")).await;
    assert!(reply.contains("stop-loss percentage must be negative"));

    let reply = supervisor.handle(Command::parse("/track 0xabc")).await;
    assert!(reply.contains("Usage:"));

    assert!(supervisor.positions().await.is_empty());
}

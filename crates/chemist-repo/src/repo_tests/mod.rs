// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chemist_core::{FakeClock, InMemoryMetricsSink};

fn test_repo() -> (
    Arc<Repository>,
    RepoCommandReceiver,
    Arc<FakeClock>,
    Arc<InMemoryMetricsSink>,
) {
    let clock = Arc::new(FakeClock::new());
    let metrics = Arc::new(InMemoryMetricsSink::new());
    let (repo, rx) = Repository::new(
        RepoConfig::default(),
        clock.clone() as Arc<dyn Clock>,
        metrics.clone() as Arc<dyn MetricsSink>,
    );
    (repo, rx, clock, metrics)
}

#[tokio::test]
async fn cold_discovery_reaches_unmonitored_and_emits_monitor() {
    let (repo, mut rx, clock, _metrics) = test_repo();
    let target = Target::new("u1");
    repo.platform_handler(PlatformEvent::NewTarget {
        target: target.clone(),
        time: clock.now_ms(),
    })
    .await;

    assert_eq!(repo.target_state(&TargetUri::new("u1")), TargetState::Unmonitored);
    assert!(repo.states()[&TargetState::Unmonitored].contains_key(&TargetUri::new("u1")));

    let cmd = rx.recv().await.expect("command expected");
    assert_eq!(cmd, RepoCommand::Monitor(target));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn happy_path_monitoring_reaches_monitored_with_expected_commands() {
    let (repo, mut rx, clock, _metrics) = test_repo();
    let flask = Flask::new("f1", "10.0.0.1:9000");
    let target = Target::new("u1");

    repo.platform_handler(PlatformEvent::NewFlask {
        flask: flask.clone(),
        time: clock.now_ms(),
    })
    .await;
    repo.platform_handler(PlatformEvent::NewTarget {
        target: target.clone(),
        time: clock.now_ms(),
    })
    .await;
    repo.platform_handler(PlatformEvent::Assigned {
        flask_id: flask.id.clone(),
        target: target.clone(),
        time: clock.now_ms(),
    })
    .await;
    repo.platform_handler(PlatformEvent::Monitored {
        flask_id: flask.id.clone(),
        uri: target.uri.clone(),
        time: clock.now_ms(),
    })
    .await;

    assert_eq!(repo.target_state(&target.uri), TargetState::Monitored);

    assert_eq!(rx.recv().await, Some(RepoCommand::Telemetry(flask)));
    assert_eq!(rx.recv().await, Some(RepoCommand::Monitor(target)));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn double_assignment_from_distinct_flasks_reaches_double_assigned() {
    let (repo, _rx, clock, _metrics) = test_repo();
    let target = Target::new("u1");
    repo.platform_handler(PlatformEvent::NewTarget {
        target: target.clone(),
        time: clock.now_ms(),
    })
    .await;
    repo.platform_handler(PlatformEvent::Assigned {
        flask_id: FlaskId::new("f1"),
        target: target.clone(),
        time: clock.now_ms(),
    })
    .await;
    repo.platform_handler(PlatformEvent::Assigned {
        flask_id: FlaskId::new("f2"),
        target: target.clone(),
        time: clock.now_ms(),
    })
    .await;

    assert_eq!(repo.target_state(&target.uri), TargetState::DoubleAssigned);
    let states = repo.states();
    let occupied: Vec<_> = states
        .iter()
        .filter(|(_, bucket)| bucket.contains_key(&target.uri))
        .collect();
    assert_eq!(occupied.len(), 1);
}

#[tokio::test]
async fn flask_death_emits_telemetry_then_reassign_work() {
    let (repo, mut rx, clock, _metrics) = test_repo();
    let flask = Flask::new("f1", "10.0.0.1:9000");
    repo.platform_handler(PlatformEvent::NewFlask {
        flask: flask.clone(),
        time: clock.now_ms(),
    })
    .await;
    repo.platform_handler(PlatformEvent::TerminatedFlask {
        flask_id: flask.id.clone(),
        time: clock.now_ms(),
    })
    .await;

    assert_eq!(rx.recv().await, Some(RepoCommand::Telemetry(flask.clone())));
    assert_eq!(rx.recv().await, Some(RepoCommand::ReassignWork(flask.id)));
}

#[tokio::test]
async fn ghost_telemetry_is_non_destructive_and_logs_an_incident() {
    let (repo, mut rx, clock, _metrics) = test_repo();
    repo.platform_handler(PlatformEvent::Monitored {
        flask_id: FlaskId::new("f1"),
        uri: TargetUri::new("u-unknown"),
        time: clock.now_ms(),
    })
    .await;

    assert_eq!(repo.target_state(&TargetUri::new("u-unknown")), TargetState::Unknown);
    assert!(rx.try_recv().is_err());
    assert_eq!(repo.errors().len(), 1);
}

#[tokio::test]
async fn history_overflow_caps_at_configured_capacity() {
    let clock = Arc::new(FakeClock::at(0));
    let metrics = Arc::new(InMemoryMetricsSink::new());
    let (repo, _rx) = Repository::new(
        RepoConfig::default(),
        clock.clone() as Arc<dyn Clock>,
        metrics as Arc<dyn MetricsSink>,
    );
    for _ in 0..2100 {
        let time = clock.advance(1);
        repo.platform_handler(PlatformEvent::NoOp { time }).await;
    }

    let history = repo.historical_platform_events();
    assert_eq!(history.len(), 2000);
    assert_eq!(history.first().unwrap().time(), 101);
    assert_eq!(history.last().unwrap().time(), 2100);
}

#[tokio::test]
async fn gauges_agree_with_bucket_sizes() {
    let (repo, _rx, clock, metrics) = test_repo();
    repo.platform_handler(PlatformEvent::NewTarget {
        target: Target::new("u1"),
        time: clock.now_ms(),
    })
    .await;
    repo.platform_handler(PlatformEvent::NewTarget {
        target: Target::new("u2"),
        time: clock.now_ms(),
    })
    .await;

    assert_eq!(metrics.gauge(TargetState::Unmonitored), 2);
    assert_eq!(metrics.gauge(TargetState::Unknown), 0);
}

#[tokio::test]
async fn terminated_target_is_idempotent() {
    let (repo, _rx, clock, _metrics) = test_repo();
    let target = Target::new("u1");
    repo.platform_handler(PlatformEvent::NewTarget {
        target: target.clone(),
        time: clock.now_ms(),
    })
    .await;
    repo.platform_handler(PlatformEvent::TerminatedTarget {
        uri: target.uri.clone(),
        time: clock.now_ms(),
    })
    .await;
    let after_first = repo.target_state(&target.uri);
    repo.platform_handler(PlatformEvent::TerminatedTarget {
        uri: target.uri.clone(),
        time: clock.now_ms(),
    })
    .await;
    assert_eq!(repo.target_state(&target.uri), after_first);
    assert_eq!(after_first, TargetState::Unknown);
}

#[tokio::test]
async fn investigation_escalates_to_fin_after_attempt_threshold() {
    let (repo, _rx, clock, _metrics) = test_repo();
    let target = Target::new("u1");
    repo.platform_handler(PlatformEvent::NewTarget {
        target: target.clone(),
        time: clock.now_ms(),
    })
    .await;
    for _ in 0..RepoConfig::default().lifecycle.investigate_attempt_threshold {
        repo.platform_handler(PlatformEvent::Problem {
            flask_id: FlaskId::new("f1"),
            uri: target.uri.clone(),
            message: "scrape timeout".to_string(),
            time: clock.now_ms(),
        })
        .await;
    }
    assert_eq!(repo.target_state(&target.uri), TargetState::Fin);
}

#[tokio::test]
async fn assigned_targets_fails_for_unregistered_flask() {
    let (repo, _rx, _clock, _metrics) = test_repo();
    let err = repo.assigned_targets(&FlaskId::new("ghost")).unwrap_err();
    assert_eq!(err, QueryError::InstanceNotFound(FlaskId::new("ghost")));
}

#[tokio::test]
async fn merge_existing_distribution_writes_synthetic_monitored_state() {
    let (repo, _rx, _clock, _metrics) = test_repo();
    let mut updates = HashMap::new();
    updates.insert(FlaskId::new("f1"), vec![Target::new("u1")]);

    let merged = repo.merge_existing_distribution(updates);
    assert_eq!(merged[&FlaskId::new("f1")].len(), 1);
    assert_eq!(repo.target_state(&TargetUri::new("u1")), TargetState::Monitored);
}

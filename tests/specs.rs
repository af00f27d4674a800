//! Behavioral specifications for the chemist control-plane ledger.
//!
//! Black-box against the `chemist-repo` public API: no crate here reaches
//! into `RepositoryInner` or the lifecycle engine directly.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashMap;
use std::sync::Arc;

use chemist_core::{Clock, FakeClock, Flask, FlaskId, MetricsSink, NoopMetricsSink, PlatformEvent, RepoCommand, RepoConfig, Target, TargetState, TargetUri};
use chemist_repo::Repository;

fn repo() -> (Arc<Repository>, chemist_repo::RepoCommandReceiver, Arc<FakeClock>) {
    let clock = Arc::new(FakeClock::new());
    let (repo, rx) = Repository::new(
        RepoConfig::default(),
        clock.clone() as Arc<dyn Clock>,
        Arc::new(NoopMetricsSink) as Arc<dyn MetricsSink>,
    );
    (repo, rx, clock)
}

#[tokio::test]
async fn cold_discovery() {
    let (repo, mut rx, clock) = repo();
    let target = Target::new("u1");
    repo.platform_handler(PlatformEvent::NewTarget {
        target: target.clone(),
        time: clock.now_ms(),
    })
    .await;

    assert_eq!(repo.target_state(&target.uri), TargetState::Unmonitored);
    assert_eq!(rx.recv().await, Some(RepoCommand::Monitor(target)));
}

#[tokio::test]
async fn full_assignment_lifecycle_across_flask_handoff() {
    let (repo, mut rx, clock) = repo();
    let f1 = Flask::new("f1", "10.0.0.1:9000");
    let target = Target::new("u1");

    repo.platform_handler(PlatformEvent::NewFlask { flask: f1.clone(), time: clock.now_ms() })
        .await;
    repo.platform_handler(PlatformEvent::NewTarget { target: target.clone(), time: clock.now_ms() })
        .await;
    repo.platform_handler(PlatformEvent::Assigned {
        flask_id: f1.id.clone(),
        target: target.clone(),
        time: clock.now_ms(),
    })
    .await;
    repo.platform_handler(PlatformEvent::Monitored {
        flask_id: f1.id.clone(),
        uri: target.uri.clone(),
        time: clock.now_ms(),
    })
    .await;

    assert_eq!(repo.target_state(&target.uri), TargetState::Monitored);
    assert_eq!(rx.recv().await, Some(RepoCommand::Telemetry(f1)));
    assert_eq!(rx.recv().await, Some(RepoCommand::Monitor(target.clone())));

    // Unmonitoring returns it to the pool, and a second confirmation
    // under a different flask reaches DoubleMonitored.
    repo.platform_handler(PlatformEvent::Unmonitored {
        flask_id: FlaskId::new("f1"),
        uri: target.uri.clone(),
        time: clock.now_ms(),
    })
    .await;
    assert_eq!(repo.target_state(&target.uri), TargetState::Unmonitored);
}

#[tokio::test]
async fn double_assignment_and_tie_break_on_confirmation() {
    let (repo, _rx, clock) = repo();
    let target = Target::new("u1");
    repo.platform_handler(PlatformEvent::NewTarget { target: target.clone(), time: clock.now_ms() })
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

    repo.platform_handler(PlatformEvent::Monitored {
        flask_id: FlaskId::new("f2"),
        uri: target.uri.clone(),
        time: clock.now_ms(),
    })
    .await;
    assert_eq!(repo.target_state(&target.uri), TargetState::Monitored);
}

#[tokio::test]
async fn flask_death_triggers_reassignment() {
    let (repo, mut rx, clock) = repo();
    let f1 = Flask::new("f1", "10.0.0.1:9000");
    repo.platform_handler(PlatformEvent::NewFlask { flask: f1.clone(), time: clock.now_ms() })
        .await;
    repo.platform_handler(PlatformEvent::TerminatedFlask { flask_id: f1.id.clone(), time: clock.now_ms() })
        .await;

    assert_eq!(rx.recv().await, Some(RepoCommand::Telemetry(f1.clone())));
    assert_eq!(rx.recv().await, Some(RepoCommand::ReassignWork(f1.id)));
}

#[tokio::test]
async fn ghost_telemetry_leaves_the_ledger_untouched() {
    let (repo, mut rx, clock) = repo();
    repo.platform_handler(PlatformEvent::Problem {
        flask_id: FlaskId::new("f1"),
        uri: TargetUri::new("u-unknown"),
        message: "boom".to_string(),
        time: clock.now_ms(),
    })
    .await;

    assert_eq!(repo.target_state(&TargetUri::new("u-unknown")), TargetState::Unknown);
    assert!(rx.try_recv().is_err());
    assert_eq!(repo.errors().len(), 1);
}

#[tokio::test]
async fn history_is_capped_and_sorted_by_time() {
    let clock = Arc::new(FakeClock::at(0));
    let (repo, _rx) = Repository::new(
        RepoConfig::default(),
        clock.clone() as Arc<dyn Clock>,
        Arc::new(NoopMetricsSink) as Arc<dyn MetricsSink>,
    );
    for _ in 0..2100 {
        let time = clock.advance(1);
        repo.platform_handler(PlatformEvent::NoOp { time }).await;
    }
    let history = repo.historical_platform_events();
    assert_eq!(history.len(), 2000);
    assert!(history.windows(2).all(|w| w[0].time() <= w[1].time()));
}

#[tokio::test]
async fn merge_existing_distribution_bootstraps_pre_existing_assignment() {
    let (repo, _rx, _clock) = repo();
    let mut updates = HashMap::new();
    updates.insert(FlaskId::new("f1"), vec![Target::new("u1"), Target::new("u2")]);

    let merged = repo.merge_existing_distribution(updates);
    assert_eq!(merged[&FlaskId::new("f1")].len(), 2);
    assert_eq!(repo.target_state(&TargetUri::new("u1")), TargetState::Monitored);
    assert_eq!(repo.target_state(&TargetUri::new("u2")), TargetState::Monitored);
}

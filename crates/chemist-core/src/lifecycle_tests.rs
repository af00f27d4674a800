// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::target::Target;

fn cfg() -> LifecycleConfig {
    LifecycleConfig::default()
}

fn assert_transition(
    from: TargetState,
    flask: Option<&FlaskId>,
    input: LifecycleInput,
    to: TargetState,
) {
    let event = step(CurrentTarget::new(from, flask), input, &cfg());
    match event {
        Some(RepoEvent::StateChange { from: f, to: t, .. }) => {
            assert_eq!(f, from);
            assert_eq!(t, to);
        }
        other => panic!("expected StateChange({:?} -> {:?}), got {:?}", from, to, other),
    }
}

#[test]
fn discovery_moves_unknown_to_unmonitored() {
    assert_transition(
        TargetState::Unknown,
        None,
        LifecycleInput::Discovery(Target::new("u1"), 1),
        TargetState::Unmonitored,
    );
}

#[test]
fn assignment_moves_unmonitored_to_assigned() {
    let f1 = FlaskId::new("f1");
    assert_transition(
        TargetState::Unmonitored,
        None,
        LifecycleInput::Assignment(Target::new("u1"), f1, 1),
        TargetState::Assigned,
    );
}

#[test]
fn confirmation_moves_assigned_to_monitored() {
    let f1 = FlaskId::new("f1");
    assert_transition(
        TargetState::Assigned,
        Some(&f1),
        LifecycleInput::Confirmation(Target::new("u1"), f1.clone(), 1),
        TargetState::Monitored,
    );
}

#[yare::parameterized(
    different_flask = { FlaskId::new("f2"), true },
    same_flask      = { FlaskId::new("f1"), false },
)]
fn double_assignment_requires_a_different_flask(incoming: FlaskId, expect_transition: bool) {
    let f1 = FlaskId::new("f1");
    let event = step(
        CurrentTarget::new(TargetState::Assigned, Some(&f1)),
        LifecycleInput::Assignment(Target::new("u1"), incoming, 1),
        &cfg(),
    );
    if expect_transition {
        assert!(matches!(
            event,
            Some(RepoEvent::StateChange { to: TargetState::DoubleAssigned, .. })
        ));
    } else {
        assert_eq!(event, None);
    }
}

#[test]
fn double_confirmation_from_different_flask_moves_monitored_to_double_monitored() {
    let f1 = FlaskId::new("f1");
    let f2 = FlaskId::new("f2");
    assert_transition(
        TargetState::Monitored,
        Some(&f1),
        LifecycleInput::Confirmation(Target::new("u1"), f2, 1),
        TargetState::DoubleMonitored,
    );
}

#[test]
fn duplicate_confirmation_from_same_flask_is_a_no_op() {
    let f1 = FlaskId::new("f1");
    let event = step(
        CurrentTarget::new(TargetState::Monitored, Some(&f1)),
        LifecycleInput::Confirmation(Target::new("u1"), f1.clone(), 1),
        &cfg(),
    );
    assert_eq!(event, None);
}

#[test]
fn unmonitoring_moves_monitored_to_unmonitored() {
    let f1 = FlaskId::new("f1");
    assert_transition(
        TargetState::Monitored,
        Some(&f1),
        LifecycleInput::Unmonitoring(Target::new("u1"), f1.clone(), 1),
        TargetState::Unmonitored,
    );
}

#[test]
fn double_assigned_confirmation_keeps_the_confirming_flask() {
    let f1 = FlaskId::new("f1");
    let f2 = FlaskId::new("f2");
    let event = step(
        CurrentTarget::new(TargetState::DoubleAssigned, Some(&f1)),
        LifecycleInput::Confirmation(Target::new("u1"), f2.clone(), 1),
        &cfg(),
    );
    match event {
        Some(RepoEvent::StateChange { to, msg, .. }) => {
            assert_eq!(to, TargetState::Monitored);
            assert_eq!(msg.flask, Some(f2));
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[yare::parameterized(
    unknown = { TargetState::Unknown },
    unmonitored = { TargetState::Unmonitored },
    assigned = { TargetState::Assigned },
    monitored = { TargetState::Monitored },
    problematic = { TargetState::Problematic },
    double_assigned = { TargetState::DoubleAssigned },
    double_monitored = { TargetState::DoubleMonitored },
    unmonitorable = { TargetState::Unmonitorable },
)]
fn investigate_moves_any_non_fin_state_to_investigating(from: TargetState) {
    assert_transition(
        from,
        None,
        LifecycleInput::Investigate(Target::new("u1"), 1, 0),
        TargetState::Investigating,
    );
}

#[test]
fn investigate_on_fin_is_ignored() {
    let event = step(
        CurrentTarget::new(TargetState::Fin, None),
        LifecycleInput::Investigate(Target::new("u1"), 1, 0),
        &cfg(),
    );
    assert_eq!(event, None);
}

#[test]
fn confirmation_while_investigating_recovers_to_monitored() {
    let f1 = FlaskId::new("f1");
    assert_transition(
        TargetState::Investigating,
        None,
        LifecycleInput::Confirmation(Target::new("u1"), f1, 1),
        TargetState::Monitored,
    );
}

#[test]
fn repeated_investigate_below_threshold_self_loops_on_investigating() {
    assert_transition(
        TargetState::Investigating,
        None,
        LifecycleInput::Investigate(Target::new("u1"), 1, 1),
        TargetState::Investigating,
    );
}

#[test]
fn investigate_at_threshold_reaches_fin() {
    let config = LifecycleConfig {
        investigate_attempt_threshold: 3,
        unmonitorable_after_attempts: None,
    };
    let event = step(
        CurrentTarget::new(TargetState::Investigating, None),
        LifecycleInput::Investigate(Target::new("u1"), 1, 3),
        &config,
    );
    assert!(matches!(
        event,
        Some(RepoEvent::StateChange { to: TargetState::Fin, .. })
    ));
}

#[test]
fn investigate_past_unmonitorable_threshold_overrides_fin() {
    let config = LifecycleConfig {
        investigate_attempt_threshold: 3,
        unmonitorable_after_attempts: Some(5),
    };
    let event = step(
        CurrentTarget::new(TargetState::Investigating, None),
        LifecycleInput::Investigate(Target::new("u1"), 1, 5),
        &config,
    );
    assert!(matches!(
        event,
        Some(RepoEvent::StateChange { to: TargetState::Unmonitorable, .. })
    ));
}

#[test]
fn unlisted_combination_returns_none() {
    // Unmonitored + Confirmation is not in the transition table.
    let event = step(
        CurrentTarget::new(TargetState::Unmonitored, None),
        LifecycleInput::Confirmation(Target::new("u1"), FlaskId::new("f1"), 1),
        &cfg(),
    );
    assert_eq!(event, None);
}

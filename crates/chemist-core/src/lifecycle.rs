// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-target lifecycle state machine.
//!
//! `step` is a pure function: given where a target currently stands and
//! an incoming lifecycle input, it returns the `RepoEvent` to apply, or
//! `None` if the combination is not meaningful (the event is still written
//! to the audit history by the caller — `step` itself never touches any
//! shared state).

use crate::flask::Flask;
use crate::id::FlaskId;
use crate::state::TargetState;
use crate::target::Target;
use serde::{Deserialize, Serialize};

/// Tag identifying which lifecycle input produced a [`LifecycleMsg`].
///
/// Carried alongside the message payload purely for audit/display; the
/// state machine itself dispatches on [`LifecycleInput`], not this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleMsgKind {
    Discovery,
    Assignment,
    Confirmation,
    Unmonitoring,
    Investigate,
}

/// Payload carried by a [`RepoEvent::StateChange`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleMsg {
    pub target: Target,
    pub flask: Option<FlaskId>,
    pub time: u64,
    pub kind: LifecycleMsgKind,
}

/// The abstract event fed into the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleInput {
    Discovery(Target, u64),
    Assignment(Target, FlaskId, u64),
    Confirmation(Target, FlaskId, u64),
    Unmonitoring(Target, FlaskId, u64),
    /// `attempt` is the investigation attempt counter, bumped by the caller
    /// each time a `Problem` is reported for a target already under
    /// investigation.
    Investigate(Target, u64, u32),
}

impl LifecycleInput {
    fn target(&self) -> &Target {
        match self {
            LifecycleInput::Discovery(t, _) => t,
            LifecycleInput::Assignment(t, _, _) => t,
            LifecycleInput::Confirmation(t, _, _) => t,
            LifecycleInput::Unmonitoring(t, _, _) => t,
            LifecycleInput::Investigate(t, _, _) => t,
        }
    }

    fn time(&self) -> u64 {
        match self {
            LifecycleInput::Discovery(_, t) => *t,
            LifecycleInput::Assignment(_, _, t) => *t,
            LifecycleInput::Confirmation(_, _, t) => *t,
            LifecycleInput::Unmonitoring(_, _, t) => *t,
            LifecycleInput::Investigate(_, t, _) => *t,
        }
    }

    fn flask(&self) -> Option<&FlaskId> {
        match self {
            LifecycleInput::Discovery(_, _) => None,
            LifecycleInput::Assignment(_, f, _) => Some(f),
            LifecycleInput::Confirmation(_, f, _) => Some(f),
            LifecycleInput::Unmonitoring(_, f, _) => Some(f),
            LifecycleInput::Investigate(_, _, _) => None,
        }
    }

    fn kind(&self) -> LifecycleMsgKind {
        match self {
            LifecycleInput::Discovery(..) => LifecycleMsgKind::Discovery,
            LifecycleInput::Assignment(..) => LifecycleMsgKind::Assignment,
            LifecycleInput::Confirmation(..) => LifecycleMsgKind::Confirmation,
            LifecycleInput::Unmonitoring(..) => LifecycleMsgKind::Unmonitoring,
            LifecycleInput::Investigate(..) => LifecycleMsgKind::Investigate,
        }
    }

    fn into_msg(self) -> LifecycleMsg {
        let time = self.time();
        let kind = self.kind();
        let flask = self.flask().cloned();
        let target = match self {
            LifecycleInput::Discovery(t, _) => t,
            LifecycleInput::Assignment(t, _, _) => t,
            LifecycleInput::Confirmation(t, _, _) => t,
            LifecycleInput::Unmonitoring(t, _, _) => t,
            LifecycleInput::Investigate(t, _, _) => t,
        };
        LifecycleMsg {
            target,
            flask,
            time,
            kind,
        }
    }
}

/// Output of the lifecycle engine, applied to the state store by the
/// repo-event processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoEvent {
    StateChange {
        from: TargetState,
        to: TargetState,
        msg: LifecycleMsg,
    },
    NewFlask(Flask),
}

/// The target's current state together with the flask (if any) on record
/// from the last applied `StateChange`.
///
/// The transition table's "different flask" qualifier on the
/// Assigned/Monitored rows can only be evaluated against the flask
/// recorded on the *previous* transition — so this type widens "current
/// state" just enough to make the table implementable while keeping
/// `step` a pure function of its arguments only.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentTarget<'a> {
    pub state: TargetState,
    pub flask: Option<&'a FlaskId>,
}

impl<'a> CurrentTarget<'a> {
    pub fn new(state: TargetState, flask: Option<&'a FlaskId>) -> Self {
        Self { state, flask }
    }

    pub fn unknown() -> Self {
        Self {
            state: TargetState::Unknown,
            flask: None,
        }
    }
}

/// Policy constants for the lifecycle engine.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleConfig {
    /// Attempt count at which an investigation gives up and the target
    /// reaches the terminal `Fin` state.
    pub investigate_attempt_threshold: u32,
    /// If set, an investigation attempt reaching this count routes to
    /// `Unmonitorable` instead of `Fin`. Left disabled (`None`) by default
    /// so behavior matches the transition table literally.
    pub unmonitorable_after_attempts: Option<u32>,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            investigate_attempt_threshold: 3,
            unmonitorable_after_attempts: None,
        }
    }
}

/// Advance the state machine by one lifecycle input.
///
/// Returns `None` for combinations not named by the transition table — the
/// caller still records the raw event in history, but no `RepoEvent` is
/// produced and no state changes.
pub fn step(
    current: CurrentTarget<'_>,
    input: LifecycleInput,
    config: &LifecycleConfig,
) -> Option<RepoEvent> {
    use TargetState::*;

    let to = match (current.state, &input) {
        (Unknown, LifecycleInput::Discovery(..)) => Unmonitored,

        (Unmonitored, LifecycleInput::Assignment(..)) => Assigned,

        (Assigned, LifecycleInput::Confirmation(..)) => Monitored,
        (Assigned, LifecycleInput::Assignment(_, flask, _)) => {
            if current.flask.is_some() && current.flask != Some(flask) {
                DoubleAssigned
            } else {
                // Same flask re-announcing assignment: idempotent, no-op.
                return None;
            }
        }

        (Monitored, LifecycleInput::Confirmation(_, flask, _)) => {
            if current.flask.is_some() && current.flask != Some(flask) {
                DoubleMonitored
            } else {
                return None;
            }
        }
        (Monitored, LifecycleInput::Unmonitoring(..)) => Unmonitored,

        (DoubleAssigned, LifecycleInput::Confirmation(..)) => Monitored,

        // Investigating re-entry and escalation both route through
        // Investigate; check before the generic "any non-Fin" arm below.
        (Investigating, LifecycleInput::Confirmation(..)) => Monitored,
        (Investigating, LifecycleInput::Investigate(_, _, attempt)) => {
            if config
                .unmonitorable_after_attempts
                .is_some_and(|threshold| *attempt >= threshold)
            {
                Unmonitorable
            } else if *attempt >= config.investigate_attempt_threshold {
                Fin
            } else {
                // Still within budget: re-affirm Investigating. A genuine
                // self-transition, not a no-op — it is written to history
                // with the bumped attempt count.
                Investigating
            }
        }

        (state, LifecycleInput::Investigate(..)) if !state.is_terminal() => Investigating,

        _ => return None,
    };

    Some(RepoEvent::StateChange {
        from: current.state,
        to,
        msg: input.into_msg(),
    })
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound platform events and outbound repo commands.

use crate::flask::Flask;
use crate::id::{FlaskId, TargetUri};
use crate::target::Target;
use serde::{Deserialize, Serialize};

/// A discovery or telemetry event arriving from outside the Repository.
///
/// Platform discovery and flask telemetry transport are both owned by the
/// enclosing service — this is the shape their output takes once it
/// reaches `platform_handler`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PlatformEvent {
    NewTarget { target: Target, time: u64 },
    NewFlask { flask: Flask, time: u64 },
    TerminatedFlask { flask_id: FlaskId, time: u64 },
    TerminatedTarget { uri: TargetUri, time: u64 },
    Monitored { flask_id: FlaskId, uri: TargetUri, time: u64 },
    Unmonitored { flask_id: FlaskId, uri: TargetUri, time: u64 },
    Problem { flask_id: FlaskId, uri: TargetUri, message: String, time: u64 },
    Assigned { flask_id: FlaskId, target: Target, time: u64 },
    NoOp { time: u64 },
}

impl PlatformEvent {
    pub fn time(&self) -> u64 {
        match self {
            PlatformEvent::NewTarget { time, .. }
            | PlatformEvent::NewFlask { time, .. }
            | PlatformEvent::TerminatedFlask { time, .. }
            | PlatformEvent::TerminatedTarget { time, .. }
            | PlatformEvent::Monitored { time, .. }
            | PlatformEvent::Unmonitored { time, .. }
            | PlatformEvent::Problem { time, .. }
            | PlatformEvent::Assigned { time, .. }
            | PlatformEvent::NoOp { time } => *time,
        }
    }
}

/// An outbound directive for the sharding component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepoCommand {
    /// Sharding should select a flask and emit an `Assigned` platform event.
    Monitor(Target),
    /// Sharding should open a telemetry receive channel to this flask.
    Telemetry(Flask),
    /// Sharding should redistribute the targets previously owned by this flask.
    ReassignWork(FlaskId),
}

/// An out-of-band error recorded against a flask.
///
/// A stored, inspectable record, distinct from the `thiserror` exception
/// types that propagate via `Result`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub source: FlaskId,
    pub cause: String,
    pub time: u64,
}

impl Incident {
    pub fn new(source: impl Into<FlaskId>, cause: impl Into<String>, time: u64) -> Self {
        Self {
            source: source.into(),
            cause: cause.into(),
            time,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;

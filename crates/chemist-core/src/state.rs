// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-target lifecycle state enum.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a single target.
///
/// `Fin` is terminal: once reached, no further lifecycle input produces a
/// transition (see `step` in `lifecycle.rs`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetState {
    Unknown,
    Unmonitored,
    Assigned,
    Monitored,
    Problematic,
    DoubleAssigned,
    DoubleMonitored,
    Investigating,
    Unmonitorable,
    Fin,
}

impl TargetState {
    /// Every variant, in a stable order — used to seed empty gauge buckets
    /// and to iterate `stateMaps` exhaustively.
    pub const ALL: [TargetState; 10] = [
        TargetState::Unknown,
        TargetState::Unmonitored,
        TargetState::Assigned,
        TargetState::Monitored,
        TargetState::Problematic,
        TargetState::DoubleAssigned,
        TargetState::DoubleMonitored,
        TargetState::Investigating,
        TargetState::Unmonitorable,
        TargetState::Fin,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, TargetState::Fin)
    }
}

impl Default for TargetState {
    fn default() -> Self {
        TargetState::Unknown
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetState::Unknown => write!(f, "unknown"),
            TargetState::Unmonitored => write!(f, "unmonitored"),
            TargetState::Assigned => write!(f, "assigned"),
            TargetState::Monitored => write!(f, "monitored"),
            TargetState::Problematic => write!(f, "problematic"),
            TargetState::DoubleAssigned => write!(f, "double_assigned"),
            TargetState::DoubleMonitored => write!(f, "double_monitored"),
            TargetState::Investigating => write!(f, "investigating"),
            TargetState::Unmonitorable => write!(f, "unmonitorable"),
            TargetState::Fin => write!(f, "fin"),
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;

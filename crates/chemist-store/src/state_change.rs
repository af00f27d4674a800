// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The stored index entry for a target's most recent transition.

use chemist_core::{LifecycleMsg, TargetState};
use serde::{Deserialize, Serialize};

/// A target's most recent lifecycle transition, as held in the `targets`
/// and `stateMaps` indices.
///
/// Identity is `(target URI, seq)`: the URI comes from `msg.target.uri`,
/// `seq` is a monotonically increasing counter assigned by
/// [`crate::RepositoryInner`] on apply — the lifecycle engine itself has
/// no notion of sequencing, only of the pair of states it transitioned
/// between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub from: TargetState,
    pub to: TargetState,
    pub msg: LifecycleMsg,
    pub seq: u64,
}

#[cfg(test)]
#[path = "state_change_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The four state cells, collapsed behind a single owner struct.
//!
//! `targets`, `state_maps`, `distribution`, and `flasks` are mutated only
//! through the methods here, each of which preserves the cross-cell
//! invariants in one step: a target lives in `targets` and in exactly one
//! bucket of `state_maps`; a flask referenced by `distribution` exists in
//! `flasks`.

use chemist_core::{Flask, FlaskId, LifecycleMsg, Target, TargetState, TargetUri};
use std::collections::HashMap;

use crate::state_change::StateChange;

/// The state store. Not internally synchronized — callers (the Repository)
/// own the single mutex that serializes access.
///
/// Always construct via [`RepositoryInner::new`], not `Default::default()`
/// — `new` seeds every `state_maps` bucket so gauge reads never have to
/// special-case a missing state.
#[derive(Debug)]
pub struct RepositoryInner {
    targets: HashMap<TargetUri, StateChange>,
    state_maps: HashMap<TargetState, HashMap<TargetUri, StateChange>>,
    distribution: HashMap<FlaskId, HashMap<TargetUri, Target>>,
    flasks: HashMap<FlaskId, Flask>,
    next_seq: u64,
    /// Investigation attempt counters, keyed by target URI.
    ///
    /// Not one of the data-model cells — `LifecycleMsg` has no attempt
    /// field, so the running count has to live somewhere the platform
    /// handler can read before calling into the lifecycle engine. Cleared
    /// whenever a target leaves the `Investigating` state.
    investigate_attempts: HashMap<TargetUri, u32>,
}

impl RepositoryInner {
    pub fn new() -> Self {
        let mut state_maps = HashMap::with_capacity(TargetState::ALL.len());
        for state in TargetState::ALL {
            state_maps.insert(state, HashMap::new());
        }
        Self {
            targets: HashMap::new(),
            state_maps,
            distribution: HashMap::new(),
            flasks: HashMap::new(),
            next_seq: 0,
            investigate_attempts: HashMap::new(),
        }
    }

    /// Bump and return the investigation attempt counter for `uri`,
    /// starting at 1 on first call.
    pub fn bump_investigate_attempt(&mut self, uri: &TargetUri) -> u32 {
        let attempt = self.investigate_attempts.entry(uri.clone()).or_insert(0);
        *attempt += 1;
        *attempt
    }

    /// Clear the investigation attempt counter for `uri`, once it leaves
    /// the `Investigating` state.
    pub fn reset_investigate_attempt(&mut self, uri: &TargetUri) {
        self.investigate_attempts.remove(uri);
    }

    /// Apply a lifecycle transition: move the target from whichever bucket
    /// it previously sat in to `to`, recording the new `StateChange` in
    /// both `targets` and the destination bucket.
    pub fn apply_state_change(
        &mut self,
        from: TargetState,
        to: TargetState,
        msg: LifecycleMsg,
    ) -> StateChange {
        let uri = msg.target.uri.clone();
        self.next_seq += 1;
        let sc = StateChange {
            from,
            to,
            msg,
            seq: self.next_seq,
        };
        if let Some(bucket) = self.state_maps.get_mut(&from) {
            bucket.remove(&uri);
        }
        self.state_maps.entry(to).or_default().insert(uri.clone(), sc.clone());
        self.targets.insert(uri, sc.clone());
        sc
    }

    /// Write a synthetic transition directly into the indices, bypassing
    /// the lifecycle engine. Used by `merge_existing_distribution`'s
    /// bootstrap path.
    pub fn apply_synthetic_state_change(
        &mut self,
        from: TargetState,
        to: TargetState,
        msg: LifecycleMsg,
    ) -> StateChange {
        self.apply_state_change(from, to, msg)
    }

    /// Delete a target from the ledger entirely. Idempotent: a second call
    /// for the same URI returns `None` and changes nothing.
    pub fn remove_target(&mut self, uri: &TargetUri) -> Option<StateChange> {
        let sc = self.targets.remove(uri)?;
        if let Some(bucket) = self.state_maps.get_mut(&sc.to) {
            bucket.remove(uri);
        }
        self.investigate_attempts.remove(uri);
        Some(sc)
    }

    /// Register (or re-register) a flask with an empty assignment set if
    /// not already present. Idempotent overwrite, same as `apply_state_change`.
    pub fn register_flask(&mut self, flask: Flask) {
        self.distribution.entry(flask.id.clone()).or_default();
        self.flasks.insert(flask.id.clone(), flask);
    }

    /// Handle flask termination. Deliberately does *not* remove the flask
    /// from `flasks`/`distribution` — the source does not either, leaving
    /// that to a subsequent reassignment; preserved rather than guessed at.
    pub fn mark_flask_terminated(&mut self, _id: &FlaskId) {}

    pub fn target_state(&self, uri: &TargetUri) -> TargetState {
        self.targets
            .get(uri)
            .map(|sc| sc.to)
            .unwrap_or_default()
    }

    /// The flask on record from the target's last applied `StateChange`,
    /// if any.
    pub fn current_flask(&self, uri: &TargetUri) -> Option<FlaskId> {
        self.targets.get(uri).and_then(|sc| sc.msg.flask.clone())
    }

    pub fn instance(&self, uri: &TargetUri) -> Option<Target> {
        self.targets.get(uri).map(|sc| sc.msg.target.clone())
    }

    pub fn flask(&self, id: &FlaskId) -> Option<Flask> {
        self.flasks.get(id).cloned()
    }

    pub fn is_flask_registered(&self, id: &FlaskId) -> bool {
        self.flasks.contains_key(id)
    }

    /// Snapshot of every state bucket.
    pub fn states(&self) -> HashMap<TargetState, HashMap<TargetUri, StateChange>> {
        self.state_maps.clone()
    }

    /// Per-state bucket sizes, for refreshing the metrics gauges.
    pub fn state_counts(&self) -> HashMap<TargetState, usize> {
        self.state_maps
            .iter()
            .map(|(state, bucket)| (*state, bucket.len()))
            .collect()
    }

    pub fn distribution(&self) -> HashMap<FlaskId, Vec<Target>> {
        self.distribution
            .iter()
            .map(|(id, targets)| (id.clone(), targets.values().cloned().collect()))
            .collect()
    }

    pub fn assigned_targets(&self, flask_id: &FlaskId) -> Option<Vec<Target>> {
        if !self.is_flask_registered(flask_id) {
            return None;
        }
        Some(
            self.distribution
                .get(flask_id)
                .map(|targets| targets.values().cloned().collect())
                .unwrap_or_default(),
        )
    }

    pub fn unassigned_targets(&self) -> Vec<Target> {
        self.state_maps
            .get(&TargetState::Unmonitored)
            .map(|bucket| bucket.values().map(|sc| sc.msg.target.clone()).collect())
            .unwrap_or_default()
    }

    pub fn unmonitorable_targets(&self) -> Vec<TargetUri> {
        self.state_maps
            .get(&TargetState::Unmonitorable)
            .map(|bucket| bucket.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Union `updates` into the distribution, per flask, by target URI.
    pub fn merge_distribution(
        &mut self,
        updates: HashMap<FlaskId, Vec<Target>>,
    ) -> HashMap<FlaskId, Vec<Target>> {
        for (flask_id, targets) in updates {
            let entry = self.distribution.entry(flask_id).or_default();
            for target in targets {
                entry.insert(target.uri.clone(), target);
            }
        }
        self.distribution()
    }
}

#[cfg(test)]
#[path = "inner_tests.rs"]
mod tests;

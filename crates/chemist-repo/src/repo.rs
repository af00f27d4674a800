// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Repository: the concurrent, in-memory ledger tying the lifecycle
//! engine, the state store, and the outbound command stream together.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use chemist_core::{
    step, Clock, CurrentTarget, Flask, FlaskId, Incident, LifecycleInput, LifecycleMsg,
    LifecycleMsgKind, MetricsSink, PlatformEvent, QueryError, RepoCommand, RepoConfig, RepoEvent,
    Target, TargetState, TargetUri,
};
use chemist_store::{RepositoryInner, RingBuffer, StateChange};

use crate::error::PlatformHandlerError;

/// Receiving half of the outbound `RepoCommand` stream. Dropping the
/// [`Repository`] closes the channel, after which `recv` observes
/// end-of-stream.
pub struct RepoCommandReceiver(mpsc::UnboundedReceiver<RepoCommand>);

impl RepoCommandReceiver {
    pub async fn recv(&mut self) -> Option<RepoCommand> {
        self.0.recv().await
    }

    /// Non-blocking poll, for asserting that nothing was enqueued.
    pub fn try_recv(&mut self) -> Result<RepoCommand, mpsc::error::TryRecvError> {
        self.0.try_recv()
    }
}

/// The control-plane ledger.
///
/// All mutation is serialized through a single `parking_lot::Mutex`
/// guarding the four state cells (collapsed into [`RepositoryInner`]); see
/// the crate-level notes on the concurrency model. Readers take the lock,
/// clone a snapshot, and release it — no caller ever holds a live
/// reference into the store.
pub struct Repository {
    inner: Mutex<RepositoryInner>,
    platform_history: RingBuffer<PlatformEvent>,
    repo_history: RingBuffer<RepoEvent>,
    error_history: RingBuffer<Incident>,
    commands: mpsc::UnboundedSender<RepoCommand>,
    metrics: Arc<dyn MetricsSink>,
    clock: Arc<dyn Clock>,
    config: RepoConfig,
}

impl Repository {
    pub fn new(
        config: RepoConfig,
        clock: Arc<dyn Clock>,
        metrics: Arc<dyn MetricsSink>,
    ) -> (Arc<Self>, RepoCommandReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let repo = Arc::new(Self {
            inner: Mutex::new(RepositoryInner::new()),
            platform_history: RingBuffer::new(config.platform_history_capacity),
            repo_history: RingBuffer::new(config.repo_history_capacity),
            error_history: RingBuffer::new(config.error_history_capacity),
            commands: tx,
            metrics,
            clock,
            config,
        });
        (repo, RepoCommandReceiver(rx))
    }

    fn current_of(&self, uri: &TargetUri) -> (TargetState, Option<FlaskId>) {
        let inner = self.inner.lock();
        (inner.target_state(uri), inner.current_flask(uri))
    }

    // -- inbound --

    /// Sole entry point for platform discovery and flask telemetry.
    ///
    /// Never propagates a failure to the caller: any error during dispatch
    /// is logged, recorded as an [`Incident`], and counted, matching the
    /// requirement that losing one upstream event must not take down the
    /// ledger.
    pub async fn platform_handler(&self, event: PlatformEvent) {
        self.platform_history.push(event.clone());
        if let Err(err) = self.dispatch_platform_event(event).await {
            tracing::error!(error = %err, "platform event handler failed");
            self.error_sink(Incident::new("repository", err.to_string(), self.clock.now_ms()));
            self.metrics.incr_platform_event_failures();
        }
    }

    async fn dispatch_platform_event(
        &self,
        event: PlatformEvent,
    ) -> Result<(), PlatformHandlerError> {
        match event {
            PlatformEvent::NewTarget { target, time } => {
                self.run_lifecycle(&target.uri.clone(), LifecycleInput::Discovery(target, time))
                    .await;
            }

            PlatformEvent::NewFlask { flask, time: _ } => {
                self.process_repo_event(RepoEvent::NewFlask(flask.clone()))
                    .await;
                let _ = self.commands.send(RepoCommand::Telemetry(flask));
            }

            PlatformEvent::TerminatedFlask { flask_id, time: _ } => {
                self.inner.lock().mark_flask_terminated(&flask_id);
                let _ = self.commands.send(RepoCommand::ReassignWork(flask_id));
            }

            PlatformEvent::TerminatedTarget { uri, time: _ } => {
                let removed = self.inner.lock().remove_target(&uri);
                if removed.is_some() {
                    self.refresh_gauges();
                }
            }

            PlatformEvent::Monitored {
                flask_id,
                uri,
                time,
            } => {
                let known = self.inner.lock().instance(&uri);
                match known {
                    Some(target) => {
                        self.run_lifecycle(
                            &uri,
                            LifecycleInput::Confirmation(target, flask_id, time),
                        )
                        .await;
                    }
                    None => self.record_unknown_target_telemetry(&uri, &flask_id, time),
                }
            }

            PlatformEvent::Unmonitored {
                flask_id,
                uri,
                time,
            } => {
                let known = self.inner.lock().instance(&uri);
                match known {
                    Some(target) => {
                        self.run_lifecycle(
                            &uri,
                            LifecycleInput::Unmonitoring(target, flask_id, time),
                        )
                        .await;
                    }
                    None => self.record_unknown_target_telemetry(&uri, &flask_id, time),
                }
            }

            PlatformEvent::Problem {
                flask_id,
                uri,
                message,
                time,
            } => {
                let known = self.inner.lock().instance(&uri);
                match known {
                    Some(target) => {
                        let attempt = self.inner.lock().bump_investigate_attempt(&uri);
                        tracing::warn!(uri = %uri, flask = %flask_id, %message, attempt, "problem reported");
                        self.run_lifecycle(&uri, LifecycleInput::Investigate(target, time, attempt))
                            .await;
                    }
                    None => self.record_unknown_target_telemetry(&uri, &flask_id, time),
                }
            }

            PlatformEvent::Assigned {
                flask_id,
                target,
                time,
            } => {
                self.run_lifecycle(
                    &target.uri.clone(),
                    LifecycleInput::Assignment(target, flask_id, time),
                )
                .await;
            }

            PlatformEvent::NoOp { time: _ } => {}
        }
        Ok(())
    }

    async fn run_lifecycle(&self, uri: &TargetUri, input: LifecycleInput) {
        let (state, flask) = self.current_of(uri);
        let current = CurrentTarget::new(state, flask.as_ref());
        match step(current, input, &self.config.lifecycle) {
            Some(repo_event) => self.process_repo_event(repo_event).await,
            None => tracing::warn!(uri = %uri, "lifecycle engine returned no transition"),
        }
    }

    fn record_unknown_target_telemetry(&self, uri: &TargetUri, flask_id: &FlaskId, time: u64) {
        tracing::error!(uri = %uri, flask = %flask_id, "telemetry referenced unknown target, dropping");
        self.error_sink(Incident::new(
            flask_id.clone(),
            format!("unknown target: {uri}"),
            time,
        ));
    }

    /// Record an out-of-band error.
    pub fn error_sink(&self, incident: Incident) {
        self.error_history.push(incident);
    }

    /// Accept the set of metric keys discovered on a target. Reserved for
    /// future use.
    pub fn key_sink(&self, _uri: TargetUri, _keys: HashSet<String>) {}

    /// Apply a `RepoEvent` produced by the lifecycle engine to the state
    /// store, refresh gauges, and enqueue any resulting outbound command.
    pub async fn process_repo_event(&self, event: RepoEvent) {
        self.repo_history.push(event.clone());
        match event {
            RepoEvent::StateChange { from, to, msg } => {
                let uri = msg.target.uri.clone();
                let sc = {
                    let mut inner = self.inner.lock();
                    if to != TargetState::Investigating {
                        inner.reset_investigate_attempt(&uri);
                    }
                    inner.apply_state_change(from, to, msg)
                };
                self.refresh_gauges();
                tracing::info!(uri = %uri, %from, %to, "state transition applied");
                if to == TargetState::Unmonitored {
                    let _ = self.commands.send(RepoCommand::Monitor(sc.msg.target.clone()));
                }
                // DoubleAssigned / DoubleMonitored outbound command policy is an
                // intentional extension point left for the sharding component to
                // define, not invented here.
            }
            RepoEvent::NewFlask(flask) => {
                self.inner.lock().register_flask(flask);
            }
        }
    }

    fn refresh_gauges(&self) {
        let counts = self.inner.lock().state_counts();
        for (state, count) in counts {
            self.metrics.set_state_gauge(state, count);
        }
    }

    // -- query / audit surface --

    pub fn states(&self) -> HashMap<TargetState, HashMap<TargetUri, StateChange>> {
        self.inner.lock().states()
    }

    pub fn historical_platform_events(&self) -> Vec<PlatformEvent> {
        let mut events = self.platform_history.snapshot();
        events.sort_by_key(|e| e.time());
        events
    }

    pub fn historical_repo_events(&self) -> Vec<RepoEvent> {
        self.repo_history.snapshot()
    }

    pub fn errors(&self) -> Vec<Incident> {
        self.error_history.snapshot()
    }

    pub fn instance(&self, uri: &TargetUri) -> Option<Target> {
        self.inner.lock().instance(uri)
    }

    pub fn flask(&self, id: &FlaskId) -> Option<Flask> {
        self.inner.lock().flask(id)
    }

    pub fn target_state(&self, uri: &TargetUri) -> TargetState {
        self.inner.lock().target_state(uri)
    }

    pub fn distribution(&self) -> HashMap<FlaskId, Vec<Target>> {
        self.inner.lock().distribution()
    }

    pub fn assigned_targets(&self, flask_id: &FlaskId) -> Result<Vec<Target>, QueryError> {
        self.inner
            .lock()
            .assigned_targets(flask_id)
            .ok_or_else(|| QueryError::InstanceNotFound(flask_id.clone()))
    }

    pub fn unassigned_targets(&self) -> Vec<Target> {
        self.inner.lock().unassigned_targets()
    }

    pub fn unmonitorable_targets(&self) -> Vec<TargetUri> {
        self.inner.lock().unmonitorable_targets()
    }

    /// Union `updates` into the distribution by flask/target URI.
    pub fn merge_distribution(
        &self,
        updates: HashMap<FlaskId, Vec<Target>>,
    ) -> HashMap<FlaskId, Vec<Target>> {
        self.inner.lock().merge_distribution(updates)
    }

    /// Bootstrap path: write a synthetic `Unknown → Monitored` transition
    /// for every target in `updates` directly into the indices, bypassing
    /// the lifecycle engine, then merge into the distribution. Used on
    /// startup when a pre-existing assignment is learned from elsewhere.
    pub fn merge_existing_distribution(
        &self,
        updates: HashMap<FlaskId, Vec<Target>>,
    ) -> HashMap<FlaskId, Vec<Target>> {
        let now = self.clock.now_ms();
        let mut inner = self.inner.lock();
        for (flask_id, targets) in &updates {
            for target in targets {
                let msg = LifecycleMsg {
                    target: target.clone(),
                    flask: Some(flask_id.clone()),
                    time: now,
                    kind: LifecycleMsgKind::Confirmation,
                };
                inner.apply_synthetic_state_change(TargetState::Unknown, TargetState::Monitored, msg);
            }
        }
        inner.merge_distribution(updates)
    }
}

#[cfg(test)]
#[path = "repo_tests/mod.rs"]
mod tests;

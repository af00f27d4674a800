// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Observability sink interface.
//!
//! Exporting metrics to any particular backend is out of scope — this is
//! only the in-process interface the Repository calls into, lifting what
//! would otherwise be global gauge/counter state to a constructor
//! parameter so tests can observe it without touching real metrics
//! infrastructure.

use crate::state::TargetState;

/// Per-state gauges and failure counters the Repository reports into.
pub trait MetricsSink: Send + Sync {
    /// Set the gauge for `state` to the current size of its bucket.
    fn set_state_gauge(&self, state: TargetState, count: usize);
    /// A platform event's handler dispatch threw and was swallowed.
    fn incr_platform_event_failures(&self);
}

/// Discards every observation. The default when no sink is supplied.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn set_state_gauge(&self, _state: TargetState, _count: usize) {}
    fn incr_platform_event_failures(&self) {}
}

#[cfg(any(test, feature = "test-support"))]
pub use in_memory::InMemoryMetricsSink;

#[cfg(any(test, feature = "test-support"))]
mod in_memory {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Records every observation for assertions against gauge agreement.
    #[derive(Debug, Default)]
    pub struct InMemoryMetricsSink {
        gauges: Mutex<HashMap<TargetState, usize>>,
        platform_event_failures: AtomicU64,
    }

    impl InMemoryMetricsSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn gauge(&self, state: TargetState) -> usize {
            self.gauges.lock().get(&state).copied().unwrap_or(0)
        }

        pub fn platform_event_failures(&self) -> u64 {
            self.platform_event_failures.load(Ordering::SeqCst)
        }
    }

    impl MetricsSink for InMemoryMetricsSink {
        fn set_state_gauge(&self, state: TargetState, count: usize) {
            self.gauges.lock().insert(state, count);
        }

        fn incr_platform_event_failures(&self) {
            self.platform_event_failures.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;

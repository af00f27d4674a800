// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn noop_sink_accepts_any_observation() {
    let sink = NoopMetricsSink;
    sink.set_state_gauge(TargetState::Monitored, 5);
    sink.incr_platform_event_failures();
}

#[test]
fn in_memory_sink_records_gauges_and_failures() {
    let sink = InMemoryMetricsSink::new();
    sink.set_state_gauge(TargetState::Unmonitored, 3);
    sink.set_state_gauge(TargetState::Monitored, 7);
    assert_eq!(sink.gauge(TargetState::Unmonitored), 3);
    assert_eq!(sink.gauge(TargetState::Monitored), 7);
    assert_eq!(sink.gauge(TargetState::Fin), 0);

    sink.incr_platform_event_failures();
    sink.incr_platform_event_failures();
    assert_eq!(sink.platform_event_failures(), 2);
}

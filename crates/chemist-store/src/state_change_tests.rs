// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chemist_core::{LifecycleMsgKind, Target};

#[test]
fn state_change_carries_from_to_and_sequence() {
    let sc = StateChange {
        from: TargetState::Unknown,
        to: TargetState::Unmonitored,
        msg: LifecycleMsg {
            target: Target::new("u1"),
            flask: None,
            time: 1,
            kind: LifecycleMsgKind::Discovery,
        },
        seq: 1,
    };
    assert_eq!(sc.from, TargetState::Unknown);
    assert_eq!(sc.to, TargetState::Unmonitored);
    assert_eq!(sc.seq, 1);
}

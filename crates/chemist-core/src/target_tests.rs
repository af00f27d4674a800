// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_target_has_no_keys() {
    let t = Target::new("u1");
    assert_eq!(t.uri, TargetUri::new("u1"));
    assert!(t.keys.is_empty());
}

#[test]
fn target_equality_is_structural() {
    let mut a = Target::new("u1");
    let b = Target::new("u1");
    assert_eq!(a, b);
    a.keys.insert("cpu".to_string());
    assert_ne!(a, b);
}

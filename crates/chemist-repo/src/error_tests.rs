// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn unknown_target_displays_the_uri() {
    let err = PlatformHandlerError::UnknownTarget("u-ghost".to_string());
    assert_eq!(err.to_string(), "unknown target referenced by telemetry: u-ghost");
}

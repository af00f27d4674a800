// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Internal-only error modeling for the platform handler's catch point.

use thiserror::Error;

/// Models "any exception during platform event dispatch" so that
/// [`crate::Repository::platform_handler`] has something concrete to
/// catch and log rather than reaching for `std::panic::catch_unwind`.
///
/// No caller of `platform_handler` ever observes this type: it is caught,
/// logged via `tracing::error!`, turned into an `Incident`, and the
/// `platform_event_failures` counter is incremented. The handler itself
/// always returns `()`.
#[derive(Debug, Error)]
pub enum PlatformHandlerError {
    #[error("unknown target referenced by telemetry: {0}")]
    UnknownTarget(String),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exception types that propagate via `Result`.
//!
//! Kept distinct from [`crate::event::Incident`], the data-model `Error`
//! entity that is *stored*, never returned from a function.

use crate::id::FlaskId;
use thiserror::Error;

/// Errors surfaced by the query/audit surface.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("flask not registered: {0}")]
    InstanceNotFound(FlaskId),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

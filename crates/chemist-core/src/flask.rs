// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A collector worker.

use crate::id::FlaskId;
use serde::{Deserialize, Serialize};

/// A collector worker scraping target endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flask {
    pub id: FlaskId,
    /// Address the flask can be reached at for telemetry.
    pub address: String,
}

impl Flask {
    pub fn new(id: impl Into<FlaskId>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
        }
    }
}

#[cfg(test)]
#[path = "flask_tests.rs"]
mod tests;

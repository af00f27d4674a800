// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A monitored target and its discovery metadata.

use crate::id::TargetUri;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A monitored process, addressed by URI.
///
/// `keys` is the set of metric keys discovered on this target (opaque to
/// the Repository — populated via `key_sink`, never interpreted here).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub uri: TargetUri,
    #[serde(default)]
    pub keys: HashSet<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Target {
    pub fn new(uri: impl Into<TargetUri>) -> Self {
        Self {
            uri: uri.into(),
            keys: HashSet::new(),
            metadata: HashMap::new(),
        }
    }
}

#[cfg(test)]
#[path = "target_tests.rs"]
mod tests;

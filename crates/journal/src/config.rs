// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal configuration
//!
//! Read from TOML, either at the top level or under a `[journal]` table:
//!
//! ```toml
//! [journal]
//! base_id = "agent-7"
//! mode = "recording"
//! trace = true
//! ```

use crate::context::JournalMode;
use crate::error::JournalError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JournalConfig {
    /// Opaque prefix of every journal id in the tree
    pub base_id: Option<String>,
    pub mode: JournalMode,
    /// Wrap the keeper in tracing
    pub trace: bool,
}

#[derive(Deserialize)]
struct Document {
    journal: JournalConfig,
}

impl JournalConfig {
    pub fn from_toml(source: &str) -> Result<Self, JournalError> {
        let table: toml::Table = toml::from_str(source)?;
        if table.contains_key("journal") {
            let document: Document = toml::from_str(source)?;
            return Ok(document.journal);
        }
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, JournalError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml(&source)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

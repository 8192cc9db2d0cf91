// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Call records and their line encoding
//!
//! Each record is written as one JSON line carrying a CRC32 checksum of the
//! serialized record, so a durable store can detect torn or corrupted writes.

use crate::error::JournalError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use weave_core::{CallInput, FiberId, JournalId};

/// One captured side-effect invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideEffectRecord {
    pub effect_id: String,
    #[serde(default)]
    pub input: CallInput,
    pub result: Value,
    /// 0 for effects called by the recorded function, +1 per enclosing effect
    #[serde(default, skip_serializing_if = "is_zero")]
    pub level: u32,
}

fn is_zero(level: &u32) -> bool {
    *level == 0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Succeed,
    Fail,
}

/// A callback or errback of one chain stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDescriptor {
    pub name: String,
    #[serde(default)]
    pub input: CallInput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDescriptor {
    pub callback: Option<StepDescriptor>,
    pub errback: Option<StepDescriptor>,
}

/// What a recorded call produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallOutput {
    /// The function returned a plain value
    Value { value: Value },
    /// The function returned a continuation chain
    Fiber {
        disposition: Disposition,
        value: Value,
        stages: Vec<StageDescriptor>,
    },
}

impl CallOutput {
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value {
            value: value.into(),
        }
    }

    /// The plain value, if the call did not return a chain
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            CallOutput::Value { value } => Some(value),
            CallOutput::Fiber { .. } => None,
        }
    }
}

/// The unit stored by a journal keeper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    /// Order in which the call's section opened
    pub sequence: u64,
    pub instance_id: JournalId,
    pub entry_id: String,
    pub fiber_id: FiberId,
    pub fiber_depth: u32,
    #[serde(default)]
    pub input: CallInput,
    #[serde(default)]
    pub side_effects: Vec<SideEffectRecord>,
    pub output: CallOutput,
}

impl CallRecord {
    /// CRC32 of the serialized record
    pub fn checksum(&self) -> u32 {
        // CallRecord only holds strings, integers and JSON values, which always serialize
        let json = serde_json::to_string(self).unwrap_or_default();
        crc32fast::hash(json.as_bytes())
    }

    /// Serialize to one JSON line with checksum
    pub fn to_line(&self) -> Result<String, JournalError> {
        let line = RecordLine {
            checksum: self.checksum(),
            record: self.clone(),
        };
        Ok(serde_json::to_string(&line)?)
    }

    /// Parse a line written by [`CallRecord::to_line`], verifying its checksum
    pub fn from_line(line: &str) -> Result<Self, JournalError> {
        let line: RecordLine = serde_json::from_str(line.trim())?;
        if line.record.checksum() != line.checksum {
            return Err(JournalError::Corrupt {
                sequence: line.record.sequence,
            });
        }
        Ok(line.record)
    }
}

#[derive(Serialize, Deserialize)]
struct RecordLine {
    checksum: u32,
    record: CallRecord,
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;

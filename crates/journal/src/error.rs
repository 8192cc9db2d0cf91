// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the journal engine

use thiserror::Error;
use weave_core::{Failure, InputError, JournalId};

/// Errors raised while recording, replaying or configuring recorders
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("duplicate entry id {entry_id} declared on {type_name}")]
    DuplicateEntry { type_name: String, entry_id: String },
    #[error("{type_name} has no recorded entry {entry_id}")]
    UnknownEntry { type_name: String, entry_id: String },
    #[error("recorder not found: {0}")]
    NotFound(JournalId),
    #[error("journal id {0} is already taken by a live recorder")]
    IdInUse(JournalId),
    #[error("reentrant call to non-reentrant entry {entry_id}")]
    Reentrant { entry_id: String },
    #[error("recorded call {entry_id} returned an unsupported {shape}")]
    RecordingResult { entry_id: String, shape: &'static str },
    #[error("side effect {effect_id} returned an unsupported {shape}")]
    SideEffectResult { effect_id: String, shape: &'static str },
    #[error("replay mismatch: {0}")]
    Replay(String),
    #[error("recorder {0} is in replay mode")]
    ReplayMode(JournalId),
    #[error("recorder {0} is already executing a call on this stack")]
    Busy(JournalId),
    #[error("no recorder is executing in this context")]
    NoRecorder,
    #[error("journal keeper is gone")]
    KeeperGone,
    #[error("expected a plain value, got a {0}")]
    NotAValue(&'static str),
    #[error("corrupt record at sequence {sequence}")]
    Corrupt { sequence: u64 },
    #[error("input error: {0}")]
    Input(#[from] InputError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Failed(#[from] Failure),
}

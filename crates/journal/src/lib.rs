// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! weave-journal: journal and replay engine for recorder trees
//!
//! Records every recorded-method call on a tree of recorders, including calls
//! that complete through continuation chains and calls that perform side
//! effects, so the exact call history can be replayed after a restart
//! without firing any live effect.

pub mod config;
pub mod context;
pub mod effect;
pub mod entry;
pub mod error;
pub mod fiber;
pub mod keeper;
pub mod outcome;
pub mod record;
pub mod recorder;
pub mod replay;
pub mod traced;

pub use config::JournalConfig;
pub use context::{Context, FiberInfo, JournalMode};
pub use effect::SideEffect;
pub use entry::{EntrySpec, EntryTable, Nested};
pub use error::JournalError;
pub use fiber::{Fiber, Step};
pub use keeper::{InMemoryJournalKeeper, JournalKeeper};
pub use outcome::Outcome;
pub use record::{
    CallOutput, CallRecord, Disposition, SideEffectRecord, StageDescriptor, StepDescriptor,
};
pub use recorder::{
    call, BoundMethod, Handle, Journaled, KeeperRef, Recorder, RecorderParent, RecorderRoot,
    RecorderSnapshot, Replayed,
};
pub use replay::{replay_records, verify_journal, Divergence, ReplayReport};
pub use traced::TracedJournalKeeper;

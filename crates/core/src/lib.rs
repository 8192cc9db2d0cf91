// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! weave-core: building blocks for the weave journal
//!
//! This crate provides:
//! - Hierarchical journal identifiers, fiber identifiers and the atomic
//!   child-index generator
//! - The call input model captured in journal records
//! - A single-threaded turn queue and one-shot deferred results used by
//!   continuation chains
//! - A clock abstraction for testable time handling

pub mod clock;
pub mod deferred;
pub mod error;
pub mod id;
pub mod input;
pub mod reactor;

pub use clock::{Clock, FakeClock, SystemClock};
pub use deferred::Deferred;
pub use error::{Failure, InputError};
pub use id::{FiberId, IdGenerator, JournalId};
pub use input::CallInput;
pub use reactor::Reactor;
pub use serde_json::Value;

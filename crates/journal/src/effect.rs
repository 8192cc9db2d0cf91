// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Side-effect wrappers for non-deterministic primitives
//!
//! Free functions are wrapped with [`SideEffect`]; closures and methods go
//! through [`Context::side_effect`] directly.

use crate::context::Context;
use crate::error::JournalError;
use crate::outcome::Outcome;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;
use weave_core::{CallInput, Clock};

pub type EffectFn = fn(&mut Context, &CallInput) -> Result<Outcome, JournalError>;

/// A free function marked as a side effect
#[derive(Clone, Copy)]
pub struct SideEffect {
    id: &'static str,
    body: EffectFn,
}

impl SideEffect {
    pub const fn new(id: &'static str, body: EffectFn) -> Self {
        Self { id, body }
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn call(&self, cx: &mut Context, input: CallInput) -> Result<Value, JournalError> {
        let body = self.body;
        let recorded = input.clone();
        cx.side_effect(self.id, recorded, move |cx| body(cx, &input))
    }
}

impl std::fmt::Debug for SideEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SideEffect").field("id", &self.id).finish()
    }
}

pub const NOW: &str = "weave::effects::now";
pub const UNIQUE_ID: &str = "weave::effects::unique_id";

/// Current time from `clock`, memoized in the journal
pub fn now(cx: &mut Context, clock: &impl Clock) -> Result<DateTime<Utc>, JournalError> {
    let value = cx.side_effect(NOW, CallInput::new(), |_| Outcome::json(&clock.now()))?;
    Ok(serde_json::from_value(value)?)
}

/// Fresh random identifier, memoized in the journal
pub fn unique_id(cx: &mut Context) -> Result<Uuid, JournalError> {
    let value = cx.side_effect(UNIQUE_ID, CallInput::new(), |_| {
        Ok(Outcome::value(Uuid::new_v4().to_string()))
    })?;
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
#[path = "effect_tests.rs"]
mod tests;

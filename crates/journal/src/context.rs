// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Explicit recording context
//!
//! Every recorded call and every chain stage receives a `&mut Context`. It
//! carries the active fiber identity and, inside a recording section, the
//! side-effect buffer. Nothing is kept in globals or thread-locals, so
//! interleaved top-level calls never see each other's state.

use crate::error::JournalError;
use crate::outcome::Outcome;
use crate::record::SideEffectRecord;
use crate::recorder::{BoundMethod, Journaled};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::rc::Rc;
use weave_core::{CallInput, FiberId};

/// Whether recorders capture live calls or are being rebuilt from a journal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalMode {
    #[default]
    Recording,
    Replay,
}

/// Fiber identity and the depth calls made from here are recorded at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiberInfo {
    pub fiber_id: FiberId,
    pub depth: u32,
}

impl FiberInfo {
    /// A new fiber at depth 0
    pub fn fresh() -> Self {
        Self {
            fiber_id: FiberId::generate(),
            depth: 0,
        }
    }

    /// Same fiber, one level deeper
    pub fn nested(&self) -> Self {
        Self {
            fiber_id: self.fiber_id.clone(),
            depth: self.depth + 1,
        }
    }
}

pub struct Context {
    state: State,
    recorder: Option<Rc<dyn Journaled>>,
}

enum State {
    /// Outside any journal activity
    Detached,
    /// Running a stage of a continuation chain. `bound` is set when the chain
    /// was returned by a recorded call, whose section it continues.
    Chain { fiber: FiberInfo, bound: bool },
    /// Inside a recording or replay section
    Section(Section),
}

struct Section {
    fiber: FiberInfo,
    effects: Effects,
    effect_level: u32,
}

enum Effects {
    Recording(Vec<SideEffectRecord>),
    Replay {
        pending: VecDeque<SideEffectRecord>,
        consumed: Vec<SideEffectRecord>,
    },
}

#[derive(Clone, Copy)]
enum EffectMode {
    Passthrough,
    Recording,
    Replay,
}

impl Context {
    /// Context for code running outside any recorded call
    pub fn new() -> Self {
        Self {
            state: State::Detached,
            recorder: None,
        }
    }

    /// A standalone recording section on a fresh fiber
    pub fn recording() -> Self {
        Self::section(FiberInfo::fresh(), Effects::Recording(Vec::new()))
    }

    /// A standalone replay section fed with recorded side effects
    pub fn replaying(side_effects: Vec<SideEffectRecord>) -> Self {
        Self::section(
            FiberInfo::fresh(),
            Effects::Replay {
                pending: side_effects.into(),
                consumed: Vec::new(),
            },
        )
    }

    pub(crate) fn recording_as(fiber: FiberInfo) -> Self {
        Self::section(fiber, Effects::Recording(Vec::new()))
    }

    pub(crate) fn chain(fiber: FiberInfo, bound: bool) -> Self {
        Self {
            state: State::Chain { fiber, bound },
            recorder: None,
        }
    }

    fn section(fiber: FiberInfo, effects: Effects) -> Self {
        Self {
            state: State::Section(Section {
                fiber,
                effects,
                effect_level: 0,
            }),
            recorder: None,
        }
    }

    /// Mode of the open section, if any
    pub fn mode(&self) -> Option<JournalMode> {
        match &self.state {
            State::Section(Section {
                effects: Effects::Recording(_),
                ..
            }) => Some(JournalMode::Recording),
            State::Section(Section {
                effects: Effects::Replay { .. },
                ..
            }) => Some(JournalMode::Replay),
            State::Detached | State::Chain { .. } => None,
        }
    }

    pub fn fiber(&self) -> Option<&FiberInfo> {
        match &self.state {
            State::Detached => None,
            State::Chain { fiber, .. } => Some(fiber),
            State::Section(section) => Some(&section.fiber),
        }
    }

    /// Recorder whose recorded method is executing
    pub fn recorder(&self) -> Option<&Rc<dyn Journaled>> {
        self.recorder.as_ref()
    }

    /// `method` of the executing recorder, for use as a chain stage
    pub fn method(&self, method: &str) -> Result<BoundMethod, JournalError> {
        let recorder = self.recorder.clone().ok_or(JournalError::NoRecorder)?;
        Ok(BoundMethod::new(recorder, method))
    }

    /// Swap the executing recorder, returning the previous one
    pub(crate) fn enter_recorder(
        &mut self,
        recorder: Option<Rc<dyn Journaled>>,
    ) -> Option<Rc<dyn Journaled>> {
        std::mem::replace(&mut self.recorder, recorder)
    }

    pub fn in_section(&self) -> bool {
        matches!(self.state, State::Section(_))
    }

    /// Fiber of the recorded call whose chain is running, if any
    pub(crate) fn bound_fiber(&self) -> Option<&FiberInfo> {
        match &self.state {
            State::Chain { fiber, bound: true } => Some(fiber),
            State::Chain { bound: false, .. } | State::Detached | State::Section(_) => None,
        }
    }

    /// Side effects captured so far by a recording section
    pub fn side_effects(&self) -> &[SideEffectRecord] {
        match &self.state {
            State::Section(Section {
                effects: Effects::Recording(effects),
                ..
            }) => effects,
            State::Section(Section {
                effects: Effects::Replay { consumed, .. },
                ..
            }) => consumed,
            State::Detached | State::Chain { .. } => &[],
        }
    }

    /// Recorded side effects a replay section has not consumed yet
    pub fn remaining(&self) -> usize {
        match &self.state {
            State::Section(Section {
                effects: Effects::Replay { pending, .. },
                ..
            }) => pending.len(),
            _ => 0,
        }
    }

    /// Close the section, returning captured (recording) or consumed (replay) side effects
    pub fn into_side_effects(self) -> Vec<SideEffectRecord> {
        match self.state {
            State::Section(Section {
                effects: Effects::Recording(effects),
                ..
            }) => effects,
            State::Section(Section {
                effects: Effects::Replay { consumed, .. },
                ..
            }) => consumed,
            State::Detached | State::Chain { .. } => Vec::new(),
        }
    }

    /// Run `body` as the side effect `effect_id`.
    ///
    /// Outside a section the body runs untouched. While recording it runs and
    /// its result is appended to the section. While replaying it does not run;
    /// the next recorded entry is returned instead.
    pub fn side_effect<F>(
        &mut self,
        effect_id: &str,
        input: CallInput,
        body: F,
    ) -> Result<Value, JournalError>
    where
        F: FnOnce(&mut Context) -> Result<Outcome, JournalError>,
    {
        match self.effect_mode() {
            EffectMode::Passthrough => settle(effect_id, body(self)?),
            EffectMode::Recording => self.record_effect(effect_id, input, body),
            EffectMode::Replay => self.replay_effect(effect_id, &input),
        }
    }

    fn effect_mode(&self) -> EffectMode {
        match &self.state {
            State::Section(Section {
                effects: Effects::Recording(_),
                ..
            }) => EffectMode::Recording,
            State::Section(Section {
                effects: Effects::Replay { .. },
                ..
            }) => EffectMode::Replay,
            State::Detached | State::Chain { .. } => EffectMode::Passthrough,
        }
    }

    fn record_effect<F>(
        &mut self,
        effect_id: &str,
        input: CallInput,
        body: F,
    ) -> Result<Value, JournalError>
    where
        F: FnOnce(&mut Context) -> Result<Outcome, JournalError>,
    {
        let State::Section(Section {
            effects: Effects::Recording(effects),
            effect_level,
            ..
        }) = &mut self.state
        else {
            return Err(JournalError::Replay(format!(
                "side effect {effect_id} recorded outside a recording section"
            )));
        };
        let index = effects.len();
        effects.push(SideEffectRecord {
            effect_id: effect_id.to_string(),
            input,
            result: Value::Null,
            level: *effect_level,
        });
        *effect_level += 1;

        let result = body(self).and_then(|outcome| settle(effect_id, outcome));

        if let State::Section(section) = &mut self.state {
            section.effect_level = section.effect_level.saturating_sub(1);
            if let Effects::Recording(effects) = &mut section.effects {
                match &result {
                    Ok(value) => {
                        if let Some(entry) = effects.get_mut(index) {
                            entry.result = value.clone();
                        }
                    }
                    Err(_) => effects.truncate(index),
                }
            }
        }
        result
    }

    fn replay_effect(&mut self, effect_id: &str, input: &CallInput) -> Result<Value, JournalError> {
        let State::Section(Section {
            effects: Effects::Replay { pending, consumed },
            ..
        }) = &mut self.state
        else {
            return Err(JournalError::Replay(format!(
                "side effect {effect_id} replayed outside a replay section"
            )));
        };
        let Some(entry) = pending.pop_front() else {
            return Err(JournalError::Replay(format!(
                "no recorded side effect left for {effect_id}"
            )));
        };
        if entry.effect_id != effect_id || &entry.input != input {
            return Err(JournalError::Replay(format!(
                "expected side effect {} {:?}, got {effect_id} {:?}",
                entry.effect_id, entry.input, input
            )));
        }

        let result = entry.result.clone();
        let level = entry.level;
        consumed.push(entry);
        while pending.front().is_some_and(|next| next.level > level) {
            if let Some(nested) = pending.pop_front() {
                consumed.push(nested);
            }
        }
        Ok(result)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("mode", &self.mode())
            .field("fiber", &self.fiber())
            .field("side_effects", &self.side_effects().len())
            .finish()
    }
}

/// A side effect must produce a plain value
pub(crate) fn settle(effect_id: &str, outcome: Outcome) -> Result<Value, JournalError> {
    match outcome {
        Outcome::Value(value) => Ok(value),
        other => Err(JournalError::SideEffectResult {
            effect_id: effect_id.to_string(),
            shape: other.shape(),
        }),
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;

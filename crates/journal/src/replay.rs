// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replaying a whole journal
//!
//! Records are replayed in the order their sections opened, which is the order
//! the deterministic bodies originally ran in.

use crate::error::JournalError;
use crate::keeper::JournalKeeper;
use crate::record::{CallOutput, SideEffectRecord};
use serde_json::Value;
use std::collections::BTreeMap;
use weave_core::JournalId;

/// A replayed call or recorder that did not match its recording
#[derive(Debug, Clone, PartialEq)]
pub enum Divergence {
    SideEffects {
        sequence: u64,
        expected: Vec<SideEffectRecord>,
        actual: Vec<SideEffectRecord>,
    },
    Output {
        sequence: u64,
        expected: CallOutput,
        actual: CallOutput,
    },
    State {
        journal_id: JournalId,
        expected: Value,
        actual: Value,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayReport {
    pub replayed: usize,
    pub divergences: Vec<Divergence>,
}

impl ReplayReport {
    pub fn is_consistent(&self) -> bool {
        self.divergences.is_empty()
    }
}

/// Replay every record against the recorders as they are now
pub fn replay_records(keeper: &dyn JournalKeeper) -> Result<ReplayReport, JournalError> {
    let mut report = ReplayReport::default();
    for record in keeper.get_records() {
        let recorder = keeper.lookup(&record.instance_id)?;
        let replayed = recorder.replay(
            &record.entry_id,
            record.input.clone(),
            record.side_effects.clone(),
        )?;
        report.replayed += 1;

        if replayed.side_effects != record.side_effects {
            report.divergences.push(Divergence::SideEffects {
                sequence: record.sequence,
                expected: record.side_effects,
                actual: replayed.side_effects,
            });
        }
        if replayed.output != record.output {
            report.divergences.push(Divergence::Output {
                sequence: record.sequence,
                expected: record.output,
                actual: replayed.output,
            });
        }
    }
    tracing::info!(
        replayed = report.replayed,
        divergences = report.divergences.len(),
        "journal replayed"
    );
    Ok(report)
}

/// Full round trip: capture every recorder's state, reset all of them,
/// replay the journal and compare outputs, side effects and final states
pub fn verify_journal(keeper: &dyn JournalKeeper) -> Result<ReplayReport, JournalError> {
    let recorders = keeper.iter_recorders();
    let mut expected = BTreeMap::new();
    for recorder in &recorders {
        expected.insert(recorder.journal_id().clone(), recorder.snapshot_state()?);
        recorder.reset_state()?;
    }

    let mut report = replay_records(keeper)?;

    for recorder in &recorders {
        let actual = recorder.snapshot_state()?;
        let journal_id = recorder.journal_id().clone();
        match expected.remove(&journal_id) {
            Some(expected) if expected != actual => report.divergences.push(Divergence::State {
                journal_id,
                expected,
                actual,
            }),
            _ => {}
        }
    }
    if !report.is_consistent() {
        tracing::warn!(divergences = report.divergences.len(), "journal diverged on replay");
    }
    Ok(report)
}

#[cfg(test)]
#[path = "replay_tests.rs"]
mod tests;

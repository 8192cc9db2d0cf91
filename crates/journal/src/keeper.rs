// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal keeper: the persistence and lookup boundary

use crate::error::JournalError;
use crate::record::CallRecord;
use crate::recorder::Journaled;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use weave_core::{IdGenerator, JournalId};

/// Stores call records and resolves journal ids to live recorders.
///
/// The keeper owns the arena of recorders of every tree built on it, along
/// with each node's child-id generator.
pub trait JournalKeeper {
    /// Add or replace the recorder at its journal id
    fn register(&self, recorder: Rc<dyn Journaled>);

    /// Child-id generator of the node at `journal_id`, created on first use
    fn generator(&self, journal_id: &JournalId) -> IdGenerator;

    /// Sequence number for a section that is opening
    fn next_sequence(&self) -> u64;

    /// Append a record for a section that closed
    fn record(&self, record: CallRecord) -> Result<(), JournalError>;

    fn lookup(&self, journal_id: &JournalId) -> Result<Rc<dyn Journaled>, JournalError>;

    /// Whether a recorder is registered at `journal_id`
    fn contains(&self, journal_id: &JournalId) -> bool;

    /// Registered recorders in journal id order
    fn iter_recorders(&self) -> Vec<Rc<dyn Journaled>>;

    /// Records in the order their sections opened
    fn get_records(&self) -> Vec<CallRecord>;
}

/// Keeper holding everything in memory
#[derive(Default)]
pub struct InMemoryJournalKeeper {
    recorders: RefCell<BTreeMap<JournalId, Rc<dyn Journaled>>>,
    generators: RefCell<HashMap<JournalId, IdGenerator>>,
    records: RefCell<Vec<CallRecord>>,
    sequence: AtomicU64,
}

impl InMemoryJournalKeeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeper preloaded with `records`; new sections continue after the
    /// highest sequence seen
    pub fn with_records(records: Vec<CallRecord>) -> Self {
        let last = records.iter().map(|r| r.sequence).max().unwrap_or(0);
        Self {
            records: RefCell::new(records),
            sequence: AtomicU64::new(last),
            ..Self::default()
        }
    }

    /// Rebuild from lines written by [`InMemoryJournalKeeper::export_lines`].
    /// Blank lines are skipped.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Result<Self, JournalError> {
        let records = lines
            .into_iter()
            .filter(|line| !line.trim().is_empty())
            .map(CallRecord::from_line)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::with_records(records))
    }

    /// Every record as a checksummed JSON line, in section-open order
    pub fn export_lines(&self) -> Result<Vec<String>, JournalError> {
        self.get_records().iter().map(CallRecord::to_line).collect()
    }

    /// Sequence numbers in the order records were flushed
    pub fn flush_order(&self) -> Vec<u64> {
        self.records.borrow().iter().map(|r| r.sequence).collect()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    /// Drop all records, keeping recorders and generators
    pub fn clear_records(&self) {
        self.records.borrow_mut().clear();
    }
}

impl JournalKeeper for InMemoryJournalKeeper {
    fn register(&self, recorder: Rc<dyn Journaled>) {
        let journal_id = recorder.journal_id().clone();
        let replaced = self
            .recorders
            .borrow_mut()
            .insert(journal_id.clone(), recorder)
            .is_some();
        tracing::trace!(%journal_id, replaced, "recorder registered");
    }

    fn generator(&self, journal_id: &JournalId) -> IdGenerator {
        self.generators
            .borrow_mut()
            .entry(journal_id.clone())
            .or_default()
            .clone()
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn record(&self, record: CallRecord) -> Result<(), JournalError> {
        tracing::trace!(sequence = record.sequence, entry_id = %record.entry_id, "record appended");
        self.records.borrow_mut().push(record);
        Ok(())
    }

    fn lookup(&self, journal_id: &JournalId) -> Result<Rc<dyn Journaled>, JournalError> {
        self.recorders
            .borrow()
            .get(journal_id)
            .cloned()
            .ok_or_else(|| JournalError::NotFound(journal_id.clone()))
    }

    fn contains(&self, journal_id: &JournalId) -> bool {
        self.recorders.borrow().contains_key(journal_id)
    }

    fn iter_recorders(&self) -> Vec<Rc<dyn Journaled>> {
        self.recorders.borrow().values().cloned().collect()
    }

    fn get_records(&self) -> Vec<CallRecord> {
        let mut records = self.records.borrow().clone();
        records.sort_by_key(|r| r.sequence);
        records
    }
}

#[cfg(test)]
#[path = "keeper_tests.rs"]
mod tests;

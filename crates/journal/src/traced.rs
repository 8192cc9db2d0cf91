// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced keeper wrapper for consistent observability

use crate::error::JournalError;
use crate::keeper::JournalKeeper;
use crate::record::CallRecord;
use crate::recorder::Journaled;
use std::rc::Rc;
use weave_core::{IdGenerator, JournalId};

/// Wrapper that adds tracing to any JournalKeeper
pub struct TracedJournalKeeper<K: ?Sized> {
    inner: Rc<K>,
}

impl<K: ?Sized> TracedJournalKeeper<K> {
    pub fn new(inner: Rc<K>) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &Rc<K> {
        &self.inner
    }
}

impl<K: JournalKeeper + ?Sized> JournalKeeper for TracedJournalKeeper<K> {
    fn register(&self, recorder: Rc<dyn Journaled>) {
        let span = tracing::info_span!("keeper.register", journal_id = %recorder.journal_id());
        let _guard = span.enter();

        tracing::info!(
            type_name = recorder.type_name(),
            parent = ?recorder.journal_parent().map(|p| p.to_string()),
            "registering"
        );
        self.inner.register(recorder);
    }

    fn generator(&self, journal_id: &JournalId) -> IdGenerator {
        let generator = self.inner.generator(journal_id);
        tracing::trace!(%journal_id, next = generator.peek(), "generator");
        generator
    }

    fn next_sequence(&self) -> u64 {
        self.inner.next_sequence()
    }

    fn record(&self, record: CallRecord) -> Result<(), JournalError> {
        let span = tracing::info_span!(
            "keeper.record",
            sequence = record.sequence,
            instance_id = %record.instance_id,
            entry_id = %record.entry_id,
        );
        let _guard = span.enter();

        tracing::info!(
            fiber_id = %record.fiber_id,
            fiber_depth = record.fiber_depth,
            side_effects = record.side_effects.len(),
            "recording"
        );
        let result = self.inner.record(record);
        if let Err(e) = &result {
            tracing::error!(error = %e, "record failed");
        }
        result
    }

    fn lookup(&self, journal_id: &JournalId) -> Result<Rc<dyn Journaled>, JournalError> {
        let result = self.inner.lookup(journal_id);
        match &result {
            Ok(recorder) => tracing::debug!(%journal_id, type_name = recorder.type_name(), "found"),
            Err(e) => tracing::warn!(%journal_id, error = %e, "lookup failed"),
        }
        result
    }

    fn contains(&self, journal_id: &JournalId) -> bool {
        self.inner.contains(journal_id)
    }

    fn iter_recorders(&self) -> Vec<Rc<dyn Journaled>> {
        self.inner.iter_recorders()
    }

    fn get_records(&self) -> Vec<CallRecord> {
        let records = self.inner.get_records();
        tracing::debug!(count = records.len(), "records read");
        records
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;

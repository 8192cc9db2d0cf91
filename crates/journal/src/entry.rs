// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recorded-method tables
//!
//! Each recorder type declares its recorded methods once. The resulting
//! table maps entry ids to handlers, is checked for collisions, and is cached
//! per concrete type for the life of the process.

use crate::context::Context;
use crate::error::JournalError;
use crate::outcome::Outcome;
use crate::recorder::Recorder;
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, OnceLock};
use weave_core::CallInput;

pub type Handler<R> =
    Arc<dyn Fn(&mut R, &mut Context, CallInput) -> Result<Outcome, JournalError> + Send + Sync>;

/// How one recorded method is registered
#[derive(Debug, Clone)]
pub struct EntrySpec {
    method: &'static str,
    entry_id: Option<String>,
    reentrant: bool,
}

impl EntrySpec {
    pub fn method(method: &'static str) -> Self {
        Self {
            method,
            entry_id: None,
            reentrant: true,
        }
    }

    /// Override the default `<type path>::<method>` entry id
    pub fn with_id(mut self, entry_id: impl Into<String>) -> Self {
        self.entry_id = Some(entry_id.into());
        self
    }

    /// Refuse calls made while another section of the same fiber is open
    pub fn non_reentrant(mut self) -> Self {
        self.reentrant = false;
        self
    }
}

pub struct Entry<R> {
    entry_id: String,
    method: String,
    reentrant: bool,
    handler: Handler<R>,
}

impl<R> Entry<R> {
    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn is_reentrant(&self) -> bool {
        self.reentrant
    }

    pub(crate) fn call(
        &self,
        state: &mut R,
        cx: &mut Context,
        input: CallInput,
    ) -> Result<Outcome, JournalError> {
        (self.handler)(state, cx, input)
    }
}

impl<R> Clone for Entry<R> {
    fn clone(&self) -> Self {
        Self {
            entry_id: self.entry_id.clone(),
            method: self.method.clone(),
            reentrant: self.reentrant,
            handler: self.handler.clone(),
        }
    }
}

/// Flat entry-id table of one concrete recorder type
pub struct EntryTable<R> {
    type_name: &'static str,
    entries: BTreeMap<String, Entry<R>>,
    methods: BTreeMap<String, String>,
    duplicates: Vec<String>,
}

impl<R: Recorder> EntryTable<R> {
    fn empty() -> Self {
        Self {
            type_name: std::any::type_name::<R>(),
            entries: BTreeMap::new(),
            methods: BTreeMap::new(),
            duplicates: Vec::new(),
        }
    }

    fn build() -> Result<Self, JournalError> {
        let mut table = Self::empty();
        R::declare(&mut table);
        match table.duplicates.first() {
            Some(entry_id) => Err(JournalError::DuplicateEntry {
                type_name: table.type_name.to_string(),
                entry_id: entry_id.clone(),
            }),
            None => Ok(table),
        }
    }

    /// Register `method` under its default entry id
    pub fn recorded<F>(&mut self, method: &'static str, handler: F) -> &mut Self
    where
        F: Fn(&mut R, &mut Context, CallInput) -> Result<Outcome, JournalError>
            + Send
            + Sync
            + 'static,
    {
        self.recorded_as(EntrySpec::method(method), handler)
    }

    pub fn recorded_as<F>(&mut self, spec: EntrySpec, handler: F) -> &mut Self
    where
        F: Fn(&mut R, &mut Context, CallInput) -> Result<Outcome, JournalError>
            + Send
            + Sync
            + 'static,
    {
        let entry_id = spec
            .entry_id
            .unwrap_or_else(|| format!("{}::{}", self.type_name, spec.method));
        self.insert(
            Entry {
                entry_id,
                method: spec.method.to_string(),
                reentrant: spec.reentrant,
                handler: Arc::new(handler),
            },
            true,
        );
        self
    }

    /// Fold in every entry of `B`, reached through `project`.
    ///
    /// Methods declared on this type take precedence over inherited methods of
    /// the same name; inherited entry ids stay addressable.
    pub fn inherit<B: Recorder>(&mut self, project: fn(&mut R) -> &mut B) -> &mut Self {
        let mut base = EntryTable::<B>::empty();
        B::declare(&mut base);
        self.duplicates.append(&mut base.duplicates);
        for entry in base.entries.into_values() {
            let handler = entry.handler;
            self.insert(
                Entry {
                    entry_id: entry.entry_id,
                    method: entry.method,
                    reentrant: entry.reentrant,
                    handler: Arc::new(move |state: &mut R, cx: &mut Context, input: CallInput| {
                        handler(project(state), cx, input)
                    }),
                },
                false,
            );
        }
        self
    }

    fn insert(&mut self, entry: Entry<R>, own: bool) {
        if self.entries.contains_key(&entry.entry_id) {
            self.duplicates.push(entry.entry_id.clone());
            return;
        }
        if own {
            self.methods
                .insert(entry.method.clone(), entry.entry_id.clone());
        } else {
            self.methods
                .entry(entry.method.clone())
                .or_insert_with(|| entry.entry_id.clone());
        }
        self.entries.insert(entry.entry_id.clone(), entry);
    }
}

impl<R> EntryTable<R> {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn by_id(&self, entry_id: &str) -> Result<&Entry<R>, JournalError> {
        self.entries
            .get(entry_id)
            .ok_or_else(|| JournalError::UnknownEntry {
                type_name: self.type_name.to_string(),
                entry_id: entry_id.to_string(),
            })
    }

    pub fn by_method(&self, method: &str) -> Result<&Entry<R>, JournalError> {
        let entry_id = self
            .methods
            .get(method)
            .ok_or_else(|| JournalError::UnknownEntry {
                type_name: self.type_name.to_string(),
                entry_id: method.to_string(),
            })?;
        self.by_id(entry_id)
    }

    /// Entry id a method is recorded under
    pub fn entry_id_of(&self, method: &str) -> Option<&str> {
        self.methods.get(method).map(String::as_str)
    }

    pub fn entry_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

type Tables = Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

static TABLES: OnceLock<Tables> = OnceLock::new();

/// The entry table of `R`, built and validated on first use
pub fn entries<R: Recorder>() -> Result<Arc<EntryTable<R>>, JournalError> {
    let tables = TABLES.get_or_init(Tables::default);
    let cached = tables
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .get(&TypeId::of::<R>())
        .cloned();
    if let Some(table) = cached.and_then(|t| t.downcast::<EntryTable<R>>().ok()) {
        return Ok(table);
    }

    let table = Arc::new(EntryTable::<R>::build()?);
    tracing::debug!(
        type_name = table.type_name(),
        entries = table.len(),
        "registered recorder type"
    );
    tables
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .insert(TypeId::of::<R>(), table.clone());
    Ok(table)
}

/// Synchronous method-to-method calls inside an open section
pub trait Nested: Recorder {
    /// Call one of this recorder's own methods without opening a new section.
    ///
    /// Fails with a reentrancy error if the target is non-reentrant and a
    /// section is open.
    fn nested(
        &mut self,
        cx: &mut Context,
        method: &str,
        input: CallInput,
    ) -> Result<Outcome, JournalError> {
        let table = entries::<Self>()?;
        let entry = table.by_method(method)?;
        if cx.in_section() && !entry.is_reentrant() {
            return Err(JournalError::Reentrant {
                entry_id: entry.entry_id().to_string(),
            });
        }
        let outcome = entry.call(self, cx, input)?;
        reject_deferred(entry.entry_id(), outcome)
    }
}

impl<R: Recorder> Nested for R {}

/// Recorded functions return plain values or chains, never bare placeholders
pub(crate) fn reject_deferred(entry_id: &str, outcome: Outcome) -> Result<Outcome, JournalError> {
    match outcome {
        Outcome::Deferred(_) => Err(JournalError::RecordingResult {
            entry_id: entry_id.to_string(),
            shape: "deferred",
        }),
        other => Ok(other),
    }
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;

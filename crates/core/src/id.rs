// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal identifiers and their generators

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Hierarchical address of a recorder within its tree.
///
/// An optional opaque base supplied to the root, followed by one positive
/// integer per level. Serialized as a flat array: `["agent", 1, 2]` or `[1, 2]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "Vec<IdPart>", try_from = "Vec<IdPart>")]
pub struct JournalId {
    base: Option<String>,
    path: Vec<u64>,
}

impl JournalId {
    /// Identifier of a tree root
    pub fn root(base: Option<String>) -> Self {
        Self {
            base,
            path: Vec::new(),
        }
    }

    /// This identifier with one integer appended
    pub fn child(&self, index: u64) -> Self {
        let mut path = self.path.clone();
        path.push(index);
        Self {
            base: self.base.clone(),
            path,
        }
    }

    /// This identifier with its last integer removed, or `None` at the root
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.path.split_last()?;
        Some(Self {
            base: self.base.clone(),
            path: rest.to_vec(),
        })
    }

    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    pub fn path(&self) -> &[u64] {
        &self.path
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// True if `other` is this identifier with exactly one integer appended
    pub fn is_parent_of(&self, other: &JournalId) -> bool {
        other.parent().as_ref() == Some(self)
    }
}

impl fmt::Display for JournalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::with_capacity(self.path.len() + 1);
        if let Some(base) = &self.base {
            parts.push(base.clone());
        }
        parts.extend(self.path.iter().map(u64::to_string));
        if parts.is_empty() {
            return write!(f, "<root>");
        }
        write!(f, "{}", parts.join("."))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum IdPart {
    Index(u64),
    Base(String),
}

impl From<JournalId> for Vec<IdPart> {
    fn from(id: JournalId) -> Self {
        id.base
            .map(IdPart::Base)
            .into_iter()
            .chain(id.path.into_iter().map(IdPart::Index))
            .collect()
    }
}

impl TryFrom<Vec<IdPart>> for JournalId {
    type Error = String;

    fn try_from(parts: Vec<IdPart>) -> Result<Self, Self::Error> {
        let mut id = JournalId::default();
        for (position, part) in parts.into_iter().enumerate() {
            match part {
                IdPart::Base(base) if position == 0 => id.base = Some(base),
                IdPart::Base(base) => {
                    return Err(format!("base `{base}` must lead the journal id"));
                }
                IdPart::Index(0) => return Err("journal id indices start at 1".to_string()),
                IdPart::Index(index) => id.path.push(index),
            }
        }
        Ok(id)
    }
}

/// Identity shared by one externally-initiated call and its continuation chain
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FiberId(String);

impl FiberId {
    /// Mint a fresh fiber id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FiberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sequential child-index generator.
///
/// Clones share the same counter, so a node restored from a snapshot keeps
/// handing out fresh indices.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    counter: Arc<AtomicU64>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            counter: Arc::new(AtomicU64::new(first)),
        }
    }

    /// Allocate the next index
    pub fn next(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Make sure `index` is never handed out again. Never moves backwards.
    pub fn advance_past(&self, index: u64) {
        self.counter.fetch_max(index.saturating_add(1), Ordering::SeqCst);
    }

    /// Index the next call to [`IdGenerator::next`] will return
    pub fn peek(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;

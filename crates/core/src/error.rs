// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors shared by the journal building blocks

use std::error::Error;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// A call argument was missing or had the wrong shape
#[derive(Debug, Error)]
pub enum InputError {
    #[error("missing argument {0}")]
    Missing(String),
    #[error("argument {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure disposition carried through a continuation chain.
///
/// Cheap to clone; the original error can be recovered with
/// [`Failure::downcast_ref`].
#[derive(Clone)]
pub struct Failure {
    error: Rc<dyn Error + 'static>,
}

impl Failure {
    pub fn new<E: Error + 'static>(error: E) -> Self {
        Self {
            error: Rc::new(error),
        }
    }

    /// Failure carrying only a message
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(Message(message.into()))
    }

    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.error.downcast_ref::<E>()
    }

    pub fn is<E: Error + 'static>(&self) -> bool {
        self.error.is::<E>()
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failure({:?})", self.error)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl Error for Failure {}

#[derive(Debug, Error)]
#[error("{0}")]
struct Message(String);

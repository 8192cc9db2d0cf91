// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! What a recorded function, side effect or chain stage returns

use crate::error::JournalError;
use crate::fiber::Fiber;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use weave_core::Deferred;

pub enum Outcome {
    /// Completed synchronously
    Value(Value),
    /// Completes through a continuation chain the caller drives
    Fiber(Fiber),
    /// Completes when the placeholder resolves. Only chain stages may return this.
    Deferred(Deferred),
}

impl Outcome {
    pub fn value(value: impl Into<Value>) -> Self {
        Outcome::Value(value.into())
    }

    /// Plain value from anything serializable
    pub fn json<T: Serialize>(value: &T) -> Result<Self, JournalError> {
        Ok(Outcome::Value(serde_json::to_value(value)?))
    }

    pub fn none() -> Self {
        Outcome::Value(Value::Null)
    }

    pub fn shape(&self) -> &'static str {
        match self {
            Outcome::Value(_) => "value",
            Outcome::Fiber(_) => "fiber",
            Outcome::Deferred(_) => "deferred",
        }
    }

    pub fn into_value(self) -> Result<Value, JournalError> {
        match self {
            Outcome::Value(value) => Ok(value),
            other => Err(JournalError::NotAValue(other.shape())),
        }
    }

    /// Decode a plain value
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, JournalError> {
        Ok(serde_json::from_value(self.into_value()?)?)
    }

    pub fn into_fiber(self) -> Option<Fiber> {
        match self {
            Outcome::Fiber(fiber) => Some(fiber),
            Outcome::Value(_) | Outcome::Deferred(_) => None,
        }
    }
}

impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        Outcome::Value(value)
    }
}

impl From<Fiber> for Outcome {
    fn from(fiber: Fiber) -> Self {
        Outcome::Fiber(fiber)
    }
}

impl From<Deferred> for Outcome {
    fn from(deferred: Deferred) -> Self {
        Outcome::Deferred(deferred)
    }
}

impl std::fmt::Debug for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Outcome::Fiber(fiber) => f.debug_tuple("Fiber").field(fiber).finish(),
            Outcome::Deferred(deferred) => f.debug_tuple("Deferred").field(deferred).finish(),
        }
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Call arguments as captured in the journal

use crate::error::InputError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Positional and keyword arguments of one call.
///
/// Empty argument lists and empty keyword maps are equivalent to "none", so
/// `CallInput::new()` matches a recorded call made without arguments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallInput {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub kwargs: BTreeMap<String, Value>,
}

impl CallInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Set a keyword argument
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    /// Copy of this input with `value` inserted as the first positional argument
    pub fn with_leading(&self, value: Value) -> Self {
        let mut args = Vec::with_capacity(self.args.len() + 1);
        args.push(value);
        args.extend(self.args.iter().cloned());
        Self {
            args,
            kwargs: self.kwargs.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }

    /// Decode the positional argument at `index`
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> Result<T, InputError> {
        let value = self
            .args
            .get(index)
            .ok_or_else(|| InputError::Missing(format!("#{index}")))?;
        decode(&format!("#{index}"), value)
    }

    /// Decode the keyword argument `name`, or `None` if it was not passed
    pub fn get_kwarg<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, InputError> {
        self.kwargs
            .get(name)
            .map(|value| decode(name, value))
            .transpose()
    }

    /// Decode a positional argument, falling back to a keyword of the same name
    pub fn param<T: DeserializeOwned>(&self, index: usize, name: &str) -> Result<T, InputError> {
        match self.get_kwarg(name)? {
            Some(value) => Ok(value),
            None if index < self.args.len() => self.get(index),
            None => Err(InputError::Missing(name.to_string())),
        }
    }
}

fn decode<T: DeserializeOwned>(name: &str, value: &Value) -> Result<T, InputError> {
    serde_json::from_value(value.clone()).map_err(|source| InputError::Decode {
        name: name.to_string(),
        source,
    })
}

#[cfg(test)]
#[path = "input_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot placeholder for a result that arrives later

use crate::error::Failure;
use crate::reactor::Reactor;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

type Waiter = Box<dyn FnOnce(Result<Value, Failure>)>;

#[derive(Default)]
struct State {
    result: Option<Result<Value, Failure>>,
    waiters: Vec<Waiter>,
}

/// Unresolved asynchronous result.
///
/// Resolves at most once; later resolutions are ignored. Clones observe the
/// same result.
#[derive(Clone, Default)]
pub struct Deferred {
    state: Rc<RefCell<State>>,
}

impl Deferred {
    pub fn new() -> Self {
        Self::default()
    }

    /// Already resolved with `value`
    pub fn succeed(value: impl Into<Value>) -> Self {
        let deferred = Self::new();
        deferred.resolve(Ok(value.into()));
        deferred
    }

    /// Already resolved with `failure`
    pub fn fail(failure: Failure) -> Self {
        let deferred = Self::new();
        deferred.resolve(Err(failure));
        deferred
    }

    /// Resolves with `result` on the reactor's next turn
    pub fn later(reactor: &Reactor, result: Result<Value, Failure>) -> Self {
        let deferred = Self::new();
        let pending = deferred.clone();
        reactor.call_later(move || pending.resolve(result));
        deferred
    }

    /// Resolve and notify waiters. No-op if already resolved.
    pub fn resolve(&self, result: Result<Value, Failure>) {
        let waiters = {
            let mut state = self.state.borrow_mut();
            if state.result.is_some() {
                return;
            }
            state.result = Some(result.clone());
            std::mem::take(&mut state.waiters)
        };
        for waiter in waiters {
            waiter(result.clone());
        }
    }

    /// Run `waiter` with the result, immediately if already resolved
    pub fn when_resolved(&self, waiter: impl FnOnce(Result<Value, Failure>) + 'static) {
        let resolved = self.state.borrow().result.clone();
        match resolved {
            Some(result) => waiter(result),
            None => self.state.borrow_mut().waiters.push(Box::new(waiter)),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.state.borrow().result.is_some()
    }

    /// The result, if resolved
    pub fn result(&self) -> Option<Result<Value, Failure>> {
        self.state.borrow().result.clone()
    }
}

impl std::fmt::Debug for Deferred {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred")
            .field("result", &self.state.borrow().result)
            .finish()
    }
}

#[cfg(test)]
#[path = "deferred_tests.rs"]
mod tests;

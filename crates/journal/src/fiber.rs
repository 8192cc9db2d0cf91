// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Continuation chains
//!
//! A [`Fiber`] is an ordered list of stages with a trigger. Starting it runs
//! the stages in order on the current turn until a stage returns a
//! [`Deferred`] (for example [`Step::suspend`]), at which point the rest of
//! the chain continues when that placeholder resolves. A stage returning
//! another fiber chains it: the outer chain waits for the inner one.
//!
//! Stages run with a [`Context`] carrying the fiber identity the chain was
//! bound to, so recorded calls made after a suspension keep the fiber id and
//! depth of the call that returned the chain.
//! A chain nobody bound runs its stages like any top-level caller.

use crate::context::{Context, FiberInfo};
use crate::outcome::Outcome;
use crate::record::{CallOutput, Disposition, StageDescriptor, StepDescriptor};
use crate::recorder::BoundMethod;
use serde_json::Value;
use std::collections::VecDeque;
use weave_core::{CallInput, Deferred, Failure, Reactor};

type Callback = Box<dyn FnOnce(&mut Context, Value) -> Result<Outcome, Failure>>;
type Errback = Box<dyn FnOnce(&mut Context, Failure) -> Result<Outcome, Failure>>;
pub(crate) type Observer = Box<dyn FnOnce(&Result<Value, Failure>)>;

/// Descriptor name of [`Step::suspend`]
pub const SUSPEND: &str = "weave::suspend";

/// One callback or errback
pub struct Step {
    descriptor: StepDescriptor,
    action: Action,
}

enum Action {
    Call(BoundMethod),
    Func(Callback),
    Handler(Errback),
    Suspend,
}

impl Step {
    /// Invoke a recorded method with the current value prepended to `extra`
    pub fn call(method: BoundMethod, extra: CallInput) -> Self {
        Self {
            descriptor: StepDescriptor {
                name: method.qualified_name(),
                input: extra,
            },
            action: Action::Call(method),
        }
    }

    /// Run a named closure with the current value
    pub fn func<F>(name: impl Into<String>, func: F) -> Self
    where
        F: FnOnce(&mut Context, Value) -> Result<Outcome, Failure> + 'static,
    {
        Self {
            descriptor: StepDescriptor {
                name: name.into(),
                input: CallInput::new(),
            },
            action: Action::Func(Box::new(func)),
        }
    }

    /// Run a named closure with the current failure
    pub fn handler<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: FnOnce(&mut Context, Failure) -> Result<Outcome, Failure> + 'static,
    {
        Self {
            descriptor: StepDescriptor {
                name: name.into(),
                input: CallInput::new(),
            },
            action: Action::Handler(Box::new(handler)),
        }
    }

    /// Pass the current result through unchanged on the reactor's next turn
    pub fn suspend() -> Self {
        Self {
            descriptor: StepDescriptor {
                name: SUSPEND.to_string(),
                input: CallInput::new(),
            },
            action: Action::Suspend,
        }
    }

    pub fn descriptor(&self) -> &StepDescriptor {
        &self.descriptor
    }

    fn execute(
        self,
        cx: &mut Context,
        reactor: &Reactor,
        current: Result<Value, Failure>,
    ) -> Result<Outcome, Failure> {
        let Step { descriptor, action } = self;
        match (action, current) {
            (Action::Suspend, current) => Ok(Outcome::Deferred(Deferred::later(reactor, current))),
            (Action::Call(method), current) => {
                let value = current.unwrap_or_else(|failure| Value::String(failure.to_string()));
                method
                    .call(cx, descriptor.input.with_leading(value))
                    .map_err(Failure::new)
            }
            (Action::Func(func), Ok(value)) => func(cx, value),
            (Action::Func(func), Err(failure)) => func(cx, Value::String(failure.to_string())),
            (Action::Handler(handler), Err(failure)) => handler(cx, failure),
            (Action::Handler(_), Ok(value)) => Ok(Outcome::Value(value)),
        }
    }
}

struct Stage {
    callback: Option<Step>,
    errback: Option<Step>,
}

impl Stage {
    fn describe(&self) -> StageDescriptor {
        StageDescriptor {
            callback: self.callback.as_ref().map(|s| s.descriptor.clone()),
            errback: self.errback.as_ref().map(|s| s.descriptor.clone()),
        }
    }
}

enum Trigger {
    Succeed(Value),
    Fail(Failure),
}

pub struct Fiber {
    trigger: Trigger,
    stages: Vec<Stage>,
    binding: Option<FiberInfo>,
    observers: Vec<Observer>,
}

impl Fiber {
    /// An empty chain that succeeds with `null` unless triggered otherwise
    pub fn new() -> Self {
        Self {
            trigger: Trigger::Succeed(Value::Null),
            stages: Vec::new(),
            binding: None,
            observers: Vec::new(),
        }
    }

    /// Add a stage that runs on success
    pub fn then(mut self, callback: Step) -> Self {
        self.stages.push(Stage {
            callback: Some(callback),
            errback: None,
        });
        self
    }

    /// Add a stage that runs on failure
    pub fn recover(mut self, errback: Step) -> Self {
        self.stages.push(Stage {
            callback: None,
            errback: Some(errback),
        });
        self
    }

    /// Add a stage with both paths
    pub fn both(mut self, callback: Step, errback: Step) -> Self {
        self.stages.push(Stage {
            callback: Some(callback),
            errback: Some(errback),
        });
        self
    }

    pub fn succeed(mut self, value: impl Into<Value>) -> Self {
        self.trigger = Trigger::Succeed(value.into());
        self
    }

    pub fn fail(mut self, failure: Failure) -> Self {
        self.trigger = Trigger::Fail(failure);
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Fiber identity the stages will run under, once bound by a recorded call
    pub fn binding(&self) -> Option<&FiberInfo> {
        self.binding.as_ref()
    }

    /// Trigger and stage descriptors, as stored in a call record
    pub fn describe(&self) -> CallOutput {
        let (disposition, value) = match &self.trigger {
            Trigger::Succeed(value) => (Disposition::Succeed, value.clone()),
            Trigger::Fail(failure) => (Disposition::Fail, Value::String(failure.to_string())),
        };
        CallOutput::Fiber {
            disposition,
            value,
            stages: self.stages.iter().map(Stage::describe).collect(),
        }
    }

    pub(crate) fn bind(&mut self, fiber: FiberInfo) {
        self.binding = Some(fiber);
    }

    /// Run `observer` when the chain reaches its terminal disposition
    pub(crate) fn observe(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    /// Drive the chain. The returned placeholder resolves with the terminal
    /// disposition.
    pub fn start(self, reactor: &Reactor) -> Deferred {
        self.start_from(reactor, None)
    }

    fn start_from(self, reactor: &Reactor, parent: Option<FiberInfo>) -> Deferred {
        let (fiber, bound) = match self.binding.or(parent) {
            Some(fiber) => (fiber, true),
            None => (FiberInfo::fresh(), false),
        };
        tracing::trace!(fiber_id = %fiber.fiber_id, depth = fiber.depth, bound, stages = self.stages.len(), "starting fiber");
        let done = Deferred::new();
        let current = match self.trigger {
            Trigger::Succeed(value) => Ok(value),
            Trigger::Fail(failure) => Err(failure),
        };
        advance(Run {
            stages: self.stages.into(),
            current,
            cx: Context::chain(fiber, bound),
            reactor: reactor.clone(),
            observers: self.observers,
            done: done.clone(),
        });
        done
    }
}

impl Default for Fiber {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Fiber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fiber")
            .field("output", &self.describe())
            .field("binding", &self.binding)
            .finish()
    }
}

struct Run {
    stages: VecDeque<Stage>,
    current: Result<Value, Failure>,
    cx: Context,
    reactor: Reactor,
    observers: Vec<Observer>,
    done: Deferred,
}

fn advance(mut run: Run) {
    while let Some(stage) = run.stages.pop_front() {
        let step = if run.current.is_ok() {
            stage.callback
        } else {
            stage.errback
        };
        let Some(step) = step else {
            continue;
        };
        let current = std::mem::replace(&mut run.current, Ok(Value::Null));
        let pending = match step.execute(&mut run.cx, &run.reactor, current) {
            Ok(Outcome::Value(value)) => {
                run.current = Ok(value);
                continue;
            }
            Err(failure) => {
                run.current = Err(failure);
                continue;
            }
            Ok(Outcome::Deferred(pending)) => pending,
            Ok(Outcome::Fiber(inner)) => {
                let parent = run.cx.bound_fiber().cloned();
                inner.start_from(&run.reactor, parent)
            }
        };
        pending.when_resolved(move |result| {
            run.current = result;
            advance(run);
        });
        return;
    }

    for observer in run.observers {
        observer(&run.current);
    }
    run.done.resolve(run.current);
}

#[cfg(test)]
#[path = "fiber_tests.rs"]
mod tests;

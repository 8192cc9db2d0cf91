//! Test helpers for behavioral specifications.

#![allow(dead_code)]

pub use serde_json::{json, Value};
pub use std::rc::Rc;
pub use weave_core::{CallInput, Failure, Reactor};
pub use weave_journal::{
    effect, CallOutput, CallRecord, Context, Disposition, EntrySpec, EntryTable, Fiber,
    Handle, InMemoryJournalKeeper, JournalError, JournalKeeper, JournalMode, Nested, Outcome,
    Recorder, RecorderRoot, SideEffect, Step,
};

/// A recorder tree on an in-memory keeper, plus a reactor to drive chains
pub struct World {
    pub keeper: Rc<InMemoryJournalKeeper>,
    pub root: RecorderRoot,
    pub reactor: Reactor,
}

impl World {
    pub fn new() -> Self {
        let keeper = Rc::new(InMemoryJournalKeeper::new());
        let root = RecorderRoot::new(keeper.clone(), Some("spec"));
        Self {
            keeper,
            root,
            reactor: Reactor::new(),
        }
    }

    pub fn kitchen(&self) -> Handle<Kitchen> {
        Handle::new(&self.root, Kitchen::default()).unwrap()
    }

    /// Call `method` from outside any section
    pub fn call<R: Recorder>(&self, handle: &Handle<R>, method: &str, input: CallInput) -> Outcome {
        handle.invoke(&mut Context::new(), method, input).unwrap()
    }

    /// Start a chain and run the reactor until it is idle
    pub fn drive(&self, outcome: Outcome) -> Result<Value, Failure> {
        let done = match outcome {
            Outcome::Fiber(chain) => chain.start(&self.reactor),
            Outcome::Value(value) => return Ok(value),
            Outcome::Deferred(deferred) => deferred,
        };
        self.reactor.run();
        done.result().expect("chain did not finish")
    }

    pub fn records(&self) -> Vec<CallRecord> {
        self.keeper.get_records()
    }
}

pub fn spam_entry() -> String {
    format!("{}::spam", std::any::type_name::<Kitchen>())
}

fn toast(_cx: &mut Context, input: &CallInput) -> Result<Outcome, JournalError> {
    let slices: u32 = input.get(0)?;
    Ok(Outcome::value(format!("{slices} slices of toast")))
}

pub const TOAST: SideEffect = SideEffect::new("kitchen.toast", toast);

/// Spam served with whatever is at hand
#[derive(Default)]
pub struct Kitchen {
    pub servings: Vec<String>,
    pub bacon_fried: u32,
}

impl Recorder for Kitchen {
    fn declare(entries: &mut EntryTable<Self>) {
        entries
            .recorded("spam", Kitchen::spam)
            .recorded_as(
                EntrySpec::method("async_spam").with_id("bacon"),
                Kitchen::async_spam,
            )
            .recorded("with_bacon", Kitchen::with_bacon)
            .recorded("with_toast", Kitchen::with_toast)
            .recorded("stamped", Kitchen::stamped)
            .recorded("rush", Kitchen::rush)
            .recorded_as(EntrySpec::method("plate").non_reentrant(), Kitchen::plate)
            .recorded("plate_twice", Kitchen::plate_twice)
            .recorded("plate_later", Kitchen::plate_later);
    }

    fn snapshot_state(&self) -> Value {
        json!(self.servings)
    }

    fn reset_state(&mut self) {
        self.servings.clear();
    }
}

impl Kitchen {
    fn spam(&mut self, _cx: &mut Context, input: CallInput) -> Result<Outcome, JournalError> {
        let side: String = input.param(0, "accompaniment")?;
        let serving = format!("spam and {side}");
        self.servings.push(serving.clone());
        Ok(Outcome::value(serving))
    }

    fn async_spam(&mut self, cx: &mut Context, input: CallInput) -> Result<Outcome, JournalError> {
        let side: String = input.get(0)?;
        Ok(Fiber::new()
            .succeed(side)
            .then(Step::suspend())
            .then(Step::call(cx.method("spam")?, CallInput::new()))
            .into())
    }

    fn with_bacon(&mut self, cx: &mut Context, input: CallInput) -> Result<Outcome, JournalError> {
        let side: String = input.get(0)?;
        let fried = &mut self.bacon_fried;
        let bacon = cx.side_effect("bacon", input.clone(), |_| {
            *fried += 1;
            Ok(Outcome::value(format!("bacon and {side}")))
        })?;
        let serving = format!("spam with {}", bacon.as_str().unwrap_or_default());
        self.servings.push(serving.clone());
        Ok(Outcome::value(serving))
    }

    fn with_toast(&mut self, cx: &mut Context, input: CallInput) -> Result<Outcome, JournalError> {
        let toast = TOAST.call(cx, input)?;
        let serving = format!("spam with {}", toast.as_str().unwrap_or_default());
        self.servings.push(serving.clone());
        Ok(Outcome::value(serving))
    }

    /// Labels the serving with a journaled id
    fn stamped(&mut self, cx: &mut Context, _input: CallInput) -> Result<Outcome, JournalError> {
        let ticket = effect::unique_id(cx)?;
        let serving = format!("spam #{ticket}");
        self.servings.push(serving.clone());
        Ok(Outcome::value(serving))
    }

    /// Chains `count` suspended `rush` calls, each one level deeper
    fn rush(&mut self, cx: &mut Context, input: CallInput) -> Result<Outcome, JournalError> {
        let count: u32 = input.get(0)?;
        if count == 0 {
            return Ok(Outcome::value("served"));
        }
        Ok(Fiber::new()
            .succeed(count - 1)
            .then(Step::suspend())
            .then(Step::call(cx.method("rush")?, CallInput::new()))
            .into())
    }

    fn plate(&mut self, _cx: &mut Context, _input: CallInput) -> Result<Outcome, JournalError> {
        self.servings.push("plate".to_string());
        Ok(Outcome::value(self.servings.len()))
    }

    fn plate_twice(&mut self, cx: &mut Context, input: CallInput) -> Result<Outcome, JournalError> {
        self.nested(cx, "plate", input.clone())?;
        self.nested(cx, "plate", input)
    }

    /// Goes `count` chains deep, then plates after a suspension
    fn plate_later(&mut self, cx: &mut Context, input: CallInput) -> Result<Outcome, JournalError> {
        let count: u32 = input.get(0)?;
        let next = if count == 0 {
            Step::call(cx.method("plate")?, CallInput::new())
        } else {
            Step::call(cx.method("plate_later")?, CallInput::new())
        };
        Ok(Fiber::new()
            .succeed(count.saturating_sub(1))
            .then(Step::suspend())
            .then(next)
            .into())
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recorders, the recorder tree and the recorded-call wrapper
//!
//! A recorder is a piece of domain state plus a position in a tree of journal
//! ids. The keeper owns every node of the tree; nodes only know their parent's
//! id and hold the keeper weakly. The root holds the keeper strongly.
//!
//! Calling a recorded method from outside any section, or from a chain stage,
//! opens a recording section: the handler runs with a fresh section context,
//! its side effects are captured, and one [`CallRecord`] is handed to the
//! keeper when the call closes. Calls made from inside an open section run
//! directly as part of that section and are not recorded on their own.
//! Non-reentrant entries refuse both those nested calls and calls from the
//! chain of a recorded call; a chain the caller started itself is just another
//! top-level caller.

use crate::config::JournalConfig;
use crate::context::{Context, FiberInfo, JournalMode};
use crate::entry::{entries, reject_deferred, Entry, EntryTable};
use crate::error::JournalError;
use crate::keeper::JournalKeeper;
use crate::outcome::Outcome;
use crate::record::{CallOutput, CallRecord, SideEffectRecord};
use crate::traced::TracedJournalKeeper;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;
use weave_core::{CallInput, Failure, IdGenerator, JournalId};

/// Domain state tracked by the journal
pub trait Recorder: Sized + 'static {
    /// List the recorded methods of this type
    fn declare(entries: &mut EntryTable<Self>);

    /// Serializable view of the state, compared after replay
    fn snapshot_state(&self) -> Value {
        Value::Null
    }

    /// Return to the state the recorder had when it was created
    fn reset_state(&mut self) {}
}

/// Anything new recorders can be created under
pub trait RecorderParent {
    fn journal_id(&self) -> &JournalId;
    fn journal_keeper(&self) -> Result<Rc<dyn JournalKeeper>, JournalError>;
    fn journal_mode(&self) -> JournalMode;
    /// Allocate the next child id
    fn generate_identifier(&self) -> JournalId;
}

/// Type-erased view of a recorder, as stored in the keeper's arena
pub trait Journaled {
    fn journal_id(&self) -> &JournalId;
    fn journal_parent(&self) -> Option<&JournalId>;
    fn type_name(&self) -> &'static str;
    fn journal_mode(&self) -> JournalMode;
    /// Entry id `method` is recorded under
    fn entry_id_of(&self, method: &str) -> Option<String>;
    fn invoke(
        &self,
        cx: &mut Context,
        method: &str,
        input: CallInput,
    ) -> Result<Outcome, JournalError>;
    fn record(
        &self,
        cx: &mut Context,
        entry_id: &str,
        input: CallInput,
    ) -> Result<Outcome, JournalError>;
    fn replay(
        &self,
        entry_id: &str,
        input: CallInput,
        side_effects: Vec<SideEffectRecord>,
    ) -> Result<Replayed, JournalError>;
    fn snapshot_state(&self) -> Result<Value, JournalError>;
    fn reset_state(&self) -> Result<(), JournalError>;
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

/// Result of replaying one call
#[derive(Debug, Clone, PartialEq)]
pub struct Replayed {
    /// Recorded side effects the call consumed, in order
    pub side_effects: Vec<SideEffectRecord>,
    pub output: CallOutput,
}

struct Node<R: Recorder> {
    this: Weak<Node<R>>,
    journal_id: JournalId,
    parent: Option<JournalId>,
    keeper: Weak<dyn JournalKeeper>,
    mode: Cell<JournalMode>,
    children: IdGenerator,
    table: Arc<EntryTable<R>>,
    state: RefCell<R>,
}

impl<R: Recorder> Node<R> {
    fn keeper(&self) -> Result<Rc<dyn JournalKeeper>, JournalError> {
        self.keeper.upgrade().ok_or(JournalError::KeeperGone)
    }

    fn as_journaled(&self) -> Option<Rc<dyn Journaled>> {
        self.this.upgrade().map(|node| node as Rc<dyn Journaled>)
    }

    fn run(
        &self,
        cx: &mut Context,
        entry: &Entry<R>,
        input: CallInput,
    ) -> Result<Outcome, JournalError> {
        if cx.in_section() {
            if !entry.is_reentrant() {
                return Err(self.reentrant(entry));
            }
            let mut state = self.borrow_state()?;
            let outer = cx.enter_recorder(self.as_journaled());
            let outcome = entry.call(&mut state, cx, input);
            cx.enter_recorder(outer);
            return reject_deferred(entry.entry_id(), outcome?);
        }

        let fiber = match cx.bound_fiber() {
            Some(_) if !entry.is_reentrant() => return Err(self.reentrant(entry)),
            Some(fiber) => fiber.clone(),
            None => FiberInfo::fresh(),
        };
        if self.mode.get() == JournalMode::Replay {
            return Err(JournalError::ReplayMode(self.journal_id.clone()));
        }
        self.record_section(fiber, entry, input)
    }

    fn record_section(
        &self,
        fiber: FiberInfo,
        entry: &Entry<R>,
        input: CallInput,
    ) -> Result<Outcome, JournalError> {
        let keeper = self.keeper()?;
        let sequence = keeper.next_sequence();
        let span = tracing::debug_span!(
            "section",
            journal_id = %self.journal_id,
            entry_id = entry.entry_id(),
            fiber_id = %fiber.fiber_id,
            depth = fiber.depth,
            sequence,
        );
        let _guard = span.enter();

        let mut section = Context::recording_as(fiber.clone());
        section.enter_recorder(self.as_journaled());
        let outcome = {
            let mut state = self.borrow_state()?;
            entry.call(&mut state, &mut section, input.clone())?
        };
        let mut record = CallRecord {
            sequence,
            instance_id: self.journal_id.clone(),
            entry_id: entry.entry_id().to_string(),
            fiber_id: fiber.fiber_id.clone(),
            fiber_depth: fiber.depth,
            input,
            side_effects: section.into_side_effects(),
            output: CallOutput::Value { value: Value::Null },
        };

        match outcome {
            Outcome::Value(value) => {
                record.output = CallOutput::Value {
                    value: value.clone(),
                };
                tracing::debug!("section closed");
                keeper.record(record)?;
                Ok(Outcome::Value(value))
            }
            Outcome::Fiber(mut chain) => {
                record.output = chain.describe();
                chain.bind(fiber.nested());
                let keeper = Rc::downgrade(&keeper);
                chain.observe(Box::new(move |result: &Result<Value, Failure>| {
                    tracing::debug!(
                        sequence = record.sequence,
                        entry_id = %record.entry_id,
                        failed = result.is_err(),
                        "chain section closed"
                    );
                    flush(&keeper, record);
                }));
                Ok(Outcome::Fiber(chain))
            }
            Outcome::Deferred(_) => Err(JournalError::RecordingResult {
                entry_id: entry.entry_id().to_string(),
                shape: "deferred",
            }),
        }
    }

    fn borrow_state(&self) -> Result<std::cell::RefMut<'_, R>, JournalError> {
        self.state
            .try_borrow_mut()
            .map_err(|_| JournalError::Busy(self.journal_id.clone()))
    }

    fn reentrant(&self, entry: &Entry<R>) -> JournalError {
        tracing::debug!(journal_id = %self.journal_id, entry_id = entry.entry_id(), "reentrant call refused");
        JournalError::Reentrant {
            entry_id: entry.entry_id().to_string(),
        }
    }
}

fn flush(keeper: &Weak<dyn JournalKeeper>, record: CallRecord) {
    let Some(keeper) = keeper.upgrade() else {
        tracing::warn!(
            sequence = record.sequence,
            entry_id = %record.entry_id,
            "journal keeper dropped before chain finished, record lost"
        );
        return;
    };
    if let Err(e) = keeper.record(record) {
        tracing::error!(error = %e, "failed to flush chain record");
    }
}

impl<R: Recorder> Journaled for Node<R> {
    fn journal_id(&self) -> &JournalId {
        &self.journal_id
    }

    fn journal_parent(&self) -> Option<&JournalId> {
        self.parent.as_ref()
    }

    fn type_name(&self) -> &'static str {
        self.table.type_name()
    }

    fn journal_mode(&self) -> JournalMode {
        self.mode.get()
    }

    fn entry_id_of(&self, method: &str) -> Option<String> {
        self.table.entry_id_of(method).map(str::to_string)
    }

    fn invoke(
        &self,
        cx: &mut Context,
        method: &str,
        input: CallInput,
    ) -> Result<Outcome, JournalError> {
        let entry = self.table.by_method(method)?;
        self.run(cx, entry, input)
    }

    fn record(
        &self,
        cx: &mut Context,
        entry_id: &str,
        input: CallInput,
    ) -> Result<Outcome, JournalError> {
        let entry = self.table.by_id(entry_id)?;
        self.run(cx, entry, input)
    }

    fn replay(
        &self,
        entry_id: &str,
        input: CallInput,
        side_effects: Vec<SideEffectRecord>,
    ) -> Result<Replayed, JournalError> {
        let entry = self.table.by_id(entry_id)?;
        let mut cx = Context::replaying(side_effects);
        cx.enter_recorder(self.as_journaled());
        let outcome = {
            let mut state = self.borrow_state()?;
            entry.call(&mut state, &mut cx, input)?
        };
        let output = match outcome {
            Outcome::Value(value) => CallOutput::Value { value },
            // never started, so stages and observers are dropped unrun
            Outcome::Fiber(chain) => chain.describe(),
            Outcome::Deferred(_) => {
                return Err(JournalError::RecordingResult {
                    entry_id: entry_id.to_string(),
                    shape: "deferred",
                })
            }
        };
        Ok(Replayed {
            side_effects: cx.into_side_effects(),
            output,
        })
    }

    fn snapshot_state(&self) -> Result<Value, JournalError> {
        let state = self
            .state
            .try_borrow()
            .map_err(|_| JournalError::Busy(self.journal_id.clone()))?;
        Ok(state.snapshot_state())
    }

    fn reset_state(&self) -> Result<(), JournalError> {
        self.borrow_state()?.reset_state();
        Ok(())
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// Typed handle to a recorder in the tree
pub struct Handle<R: Recorder> {
    node: Rc<Node<R>>,
}

impl<R: Recorder> Clone for Handle<R> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
        }
    }
}

impl<R: Recorder> Handle<R> {
    /// Create a recorder under `parent` and register it with the keeper.
    ///
    /// Fails if `R` declares colliding entry ids.
    pub fn new<P: RecorderParent + ?Sized>(parent: &P, state: R) -> Result<Self, JournalError> {
        let table = entries::<R>()?;
        let keeper = parent.journal_keeper()?;
        let journal_id = parent.generate_identifier();
        if keeper.contains(&journal_id) {
            return Err(JournalError::IdInUse(journal_id));
        }
        let handle = Self::attach(
            &keeper,
            journal_id,
            Some(parent.journal_id().clone()),
            parent.journal_mode(),
            table,
            state,
        );
        tracing::debug!(journal_id = %handle.journal_id(), type_name = handle.node.table.type_name(), "recorder created");
        Ok(handle)
    }

    /// Re-register a recorder at the id captured in `snapshot`, replacing
    /// any recorder the keeper holds there.
    ///
    /// Child generators live in the keeper. The parent's generator is moved
    /// past the restored index, so restoring into a fresh keeper never hands
    /// the same id to a new sibling. The mode is taken from the parent when
    /// the keeper knows it, otherwise it is the default.
    pub fn restore(snapshot: &RecorderSnapshot, state: R) -> Result<Self, JournalError> {
        let table = entries::<R>()?;
        let keeper = snapshot.keeper.0.clone();
        let journal_id = snapshot.journal_id.clone();
        if let (Some(parent), Some(&index)) = (journal_id.parent(), journal_id.path().last()) {
            keeper.generator(&parent).advance_past(index);
        }
        let mode = match &snapshot.parent_id {
            Some(parent) if !parent.is_root() => keeper
                .lookup(parent)
                .map(|p| p.journal_mode())
                .unwrap_or_default(),
            _ => JournalMode::default(),
        };
        let handle = Self::attach(
            &keeper,
            journal_id,
            snapshot.parent_id.clone(),
            mode,
            table,
            state,
        );
        tracing::debug!(journal_id = %handle.journal_id(), ?mode, "recorder restored");
        Ok(handle)
    }

    fn attach(
        keeper: &Rc<dyn JournalKeeper>,
        journal_id: JournalId,
        parent: Option<JournalId>,
        mode: JournalMode,
        table: Arc<EntryTable<R>>,
        state: R,
    ) -> Self {
        let node = Rc::new_cyclic(|this| Node {
            this: this.clone(),
            children: keeper.generator(&journal_id),
            journal_id,
            parent,
            keeper: Rc::downgrade(keeper),
            mode: Cell::new(mode),
            table,
            state: RefCell::new(state),
        });
        keeper.register(node.clone());
        Self { node }
    }

    /// Downcast a recorder looked up from the keeper
    pub fn from_dyn(recorder: Rc<dyn Journaled>) -> Option<Self> {
        recorder
            .into_any()
            .downcast::<Node<R>>()
            .ok()
            .map(|node| Self { node })
    }

    pub fn journal_id(&self) -> &JournalId {
        &self.node.journal_id
    }

    pub fn journal_parent(&self) -> Option<&JournalId> {
        self.node.parent.as_ref()
    }

    pub fn journal_keeper(&self) -> Result<Rc<dyn JournalKeeper>, JournalError> {
        self.node.keeper()
    }

    pub fn journal_mode(&self) -> JournalMode {
        self.node.mode.get()
    }

    pub fn set_journal_mode(&self, mode: JournalMode) {
        self.node.mode.set(mode);
    }

    /// The enclosing recorder, resolved through the keeper
    pub fn parent(&self) -> Result<Option<Rc<dyn Journaled>>, JournalError> {
        match &self.node.parent {
            Some(parent) if !parent.is_root() => Ok(Some(self.node.keeper()?.lookup(parent)?)),
            _ => Ok(None),
        }
    }

    /// Read access to the domain state
    pub fn state(&self) -> Ref<'_, R> {
        self.node.state.borrow()
    }

    pub fn entries(&self) -> &EntryTable<R> {
        &self.node.table
    }

    /// Call the recorded method `method`
    pub fn invoke(
        &self,
        cx: &mut Context,
        method: &str,
        input: CallInput,
    ) -> Result<Outcome, JournalError> {
        Journaled::invoke(&*self.node, cx, method, input)
    }

    /// Call the recorded function registered as `entry_id`
    pub fn record(
        &self,
        cx: &mut Context,
        entry_id: &str,
        input: CallInput,
    ) -> Result<Outcome, JournalError> {
        Journaled::record(&*self.node, cx, entry_id, input)
    }

    /// Re-run `entry_id` against recorded side effects without any live effect
    pub fn replay(
        &self,
        entry_id: &str,
        input: CallInput,
        side_effects: Vec<SideEffectRecord>,
    ) -> Result<Replayed, JournalError> {
        Journaled::replay(&*self.node, entry_id, input, side_effects)
    }

    /// `method` bound to this recorder, for use as a chain stage
    pub fn method(&self, method: &str) -> BoundMethod {
        BoundMethod {
            target: self.node.clone(),
            method: method.to_string(),
        }
    }

    pub fn snapshot(&self) -> Result<RecorderSnapshot, JournalError> {
        Ok(RecorderSnapshot {
            journal_id: self.node.journal_id.clone(),
            parent_id: self.node.parent.clone(),
            keeper: KeeperRef(self.node.keeper()?),
        })
    }

    pub fn as_journaled(&self) -> Rc<dyn Journaled> {
        self.node.clone()
    }
}

impl<R: Recorder> RecorderParent for Handle<R> {
    fn journal_id(&self) -> &JournalId {
        Handle::journal_id(self)
    }

    fn journal_keeper(&self) -> Result<Rc<dyn JournalKeeper>, JournalError> {
        Handle::journal_keeper(self)
    }

    fn journal_mode(&self) -> JournalMode {
        Handle::journal_mode(self)
    }

    fn generate_identifier(&self) -> JournalId {
        self.node.journal_id.child(self.node.children.next())
    }
}

impl<R: Recorder> std::fmt::Debug for Handle<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("journal_id", &self.node.journal_id)
            .field("type_name", &self.node.table.type_name())
            .finish()
    }
}

/// Root of a recorder tree; owns the keeper
pub struct RecorderRoot {
    journal_id: JournalId,
    keeper: Rc<dyn JournalKeeper>,
    children: IdGenerator,
    mode: Cell<JournalMode>,
}

impl RecorderRoot {
    pub fn new(keeper: Rc<dyn JournalKeeper>, base_id: Option<&str>) -> Self {
        let journal_id = JournalId::root(base_id.map(str::to_string));
        Self {
            children: keeper.generator(&journal_id),
            journal_id,
            keeper,
            mode: Cell::new(JournalMode::default()),
        }
    }

    /// Root configured from `config`, wrapping the keeper in tracing if asked
    pub fn from_config(keeper: Rc<dyn JournalKeeper>, config: &JournalConfig) -> Self {
        let keeper: Rc<dyn JournalKeeper> = if config.trace {
            Rc::new(TracedJournalKeeper::new(keeper))
        } else {
            keeper
        };
        let root = Self::new(keeper, config.base_id.as_deref());
        root.set_journal_mode(config.mode);
        root
    }

    pub fn restore(snapshot: &RecorderSnapshot) -> Self {
        Self::new(snapshot.keeper.0.clone(), snapshot.journal_id.base())
    }

    pub fn snapshot(&self) -> RecorderSnapshot {
        RecorderSnapshot {
            journal_id: self.journal_id.clone(),
            parent_id: None,
            keeper: KeeperRef(self.keeper.clone()),
        }
    }

    pub fn keeper(&self) -> &Rc<dyn JournalKeeper> {
        &self.keeper
    }

    pub fn set_journal_mode(&self, mode: JournalMode) {
        self.mode.set(mode);
    }
}

impl RecorderParent for RecorderRoot {
    fn journal_id(&self) -> &JournalId {
        &self.journal_id
    }

    fn journal_keeper(&self) -> Result<Rc<dyn JournalKeeper>, JournalError> {
        Ok(self.keeper.clone())
    }

    fn journal_mode(&self) -> JournalMode {
        self.mode.get()
    }

    fn generate_identifier(&self) -> JournalId {
        self.journal_id.child(self.children.next())
    }
}

/// Structural snapshot of a tree node. The child counter is not part of it.
///
/// The keeper reference is not serialized; a stored snapshot is bound to a
/// keeper again with [`RecorderSnapshot::from_value`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecorderSnapshot {
    pub journal_id: JournalId,
    pub parent_id: Option<JournalId>,
    #[serde(skip)]
    pub keeper: KeeperRef,
}

#[derive(Deserialize)]
struct StoredSnapshot {
    journal_id: JournalId,
    parent_id: Option<JournalId>,
}

impl RecorderSnapshot {
    /// Read a serialized snapshot, attaching it to `keeper`
    pub fn from_value(value: Value, keeper: Rc<dyn JournalKeeper>) -> Result<Self, JournalError> {
        let stored: StoredSnapshot = serde_json::from_value(value)?;
        Ok(Self {
            journal_id: stored.journal_id,
            parent_id: stored.parent_id,
            keeper: KeeperRef(keeper),
        })
    }

    pub fn from_json(json: &str, keeper: Rc<dyn JournalKeeper>) -> Result<Self, JournalError> {
        Self::from_value(serde_json::from_str(json)?, keeper)
    }
}

/// Opaque shared reference to a keeper, compared by identity
#[derive(Clone)]
pub struct KeeperRef(Rc<dyn JournalKeeper>);

impl KeeperRef {
    pub fn keeper(&self) -> &Rc<dyn JournalKeeper> {
        &self.0
    }
}

impl PartialEq for KeeperRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::as_ptr(&self.0).cast::<()>() == Rc::as_ptr(&other.0).cast::<()>()
    }
}

impl std::fmt::Debug for KeeperRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeeperRef({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

/// A recorded method bound to its recorder
#[derive(Clone)]
pub struct BoundMethod {
    target: Rc<dyn Journaled>,
    method: String,
}

impl BoundMethod {
    pub fn new(target: Rc<dyn Journaled>, method: impl Into<String>) -> Self {
        Self {
            target,
            method: method.into(),
        }
    }

    pub fn call(&self, cx: &mut Context, input: CallInput) -> Result<Outcome, JournalError> {
        self.target.invoke(cx, &self.method, input)
    }

    /// Entry id if registered, otherwise `<type path>::<method>`
    pub fn qualified_name(&self) -> String {
        self.target
            .entry_id_of(&self.method)
            .unwrap_or_else(|| format!("{}::{}", self.target.type_name(), self.method))
    }

    pub fn target(&self) -> &Rc<dyn Journaled> {
        &self.target
    }
}

impl std::fmt::Debug for BoundMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundMethod")
            .field("target", self.target.journal_id())
            .field("method", &self.method)
            .finish()
    }
}

/// Invoke a bound recorded method
pub fn call(cx: &mut Context, method: &BoundMethod, input: CallInput) -> Result<Outcome, JournalError> {
    method.call(cx, input)
}

#[cfg(test)]
#[path = "recorder_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-threaded turn queue
//!
//! Work scheduled with [`Reactor::call_later`] runs on a later turn, never
//! inside the call that scheduled it. This is the only place a continuation
//! chain can suspend.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

type Task = Box<dyn FnOnce()>;

#[derive(Clone, Default)]
pub struct Reactor {
    queue: Rc<RefCell<VecDeque<Task>>>,
    turns: Rc<Cell<u64>>,
}

impl Reactor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` for a later turn
    pub fn call_later(&self, task: impl FnOnce() + 'static) {
        self.queue.borrow_mut().push_back(Box::new(task));
    }

    /// Run one scheduled task. Returns false if nothing was pending.
    pub fn run_once(&self) -> bool {
        let task = self.queue.borrow_mut().pop_front();
        match task {
            Some(task) => {
                self.turns.set(self.turns.get() + 1);
                task();
                true
            }
            None => false,
        }
    }

    /// Run until the queue is empty, including tasks scheduled while running.
    /// Returns the number of tasks run.
    pub fn run(&self) -> usize {
        let mut ran = 0;
        while self.run_once() {
            ran += 1;
        }
        ran
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Total tasks run since creation
    pub fn turns(&self) -> u64 {
        self.turns.get()
    }
}

impl std::fmt::Debug for Reactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reactor")
            .field("pending", &self.pending())
            .field("turns", &self.turns())
            .finish()
    }
}

#[cfg(test)]
#[path = "reactor_tests.rs"]
mod tests;

//! Registry of pending entries
//!
//! Maps task identity to its live timer. Every read and write goes through
//! one mutex so check-cancel-insert sequences cannot interleave.

use crate::error::{Result, SchedulerError};
use crate::task::{Task, TaskId};
use crate::timer::Timer;
use ahash::AHashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

/// Outcome of installing a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Installed {
    /// No entry existed for the task
    Fresh,
    /// An older entry was replaced; `cancelled` is false when the old timer
    /// had already started running
    Replaced { cancelled: bool },
}

struct RegistryState {
    entries: AHashMap<TaskId, Arc<Timer>>,
    next_timer_id: u64,
    shut_down: bool,
}

/// Pending entries keyed by task identity
pub struct Registry {
    state: Mutex<RegistryState>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState {
                entries: AHashMap::new(),
                next_timer_id: 1,
                shut_down: false,
            }),
        }
    }

    /// Install a new timer for `task`, replacing any existing entry
    ///
    /// `dispatch` hands the timer to the execution context and runs while
    /// the lock is held, so a closed registry never dispatches. If it fails
    /// the registry is left untouched.
    pub fn install<F>(&self, task: &Task, deadline: Instant, dispatch: F) -> Result<Installed>
    where
        F: FnOnce(Arc<Timer>) -> Result<()>,
    {
        let mut state = self.state.lock();
        if state.shut_down {
            return Err(SchedulerError::ShutDown);
        }

        let timer_id = state.next_timer_id;
        let timer = Timer::new(timer_id, task.clone(), deadline);
        dispatch(Arc::clone(&timer))?;
        state.next_timer_id += 1;

        let installed = match state.entries.insert(task.id(), timer) {
            Some(previous) => Installed::Replaced {
                cancelled: previous.cancel(),
            },
            None => Installed::Fresh,
        };

        Ok(installed)
    }

    /// Remove the entry for `id` and request cancellation of its timer
    ///
    /// Returns the removed timer, if any.
    pub fn remove(&self, id: TaskId) -> Option<Arc<Timer>> {
        let timer = self.state.lock().entries.remove(&id)?;
        timer.cancel();
        Some(timer)
    }

    /// Remove the entry for `id` only if it still refers to `timer_id`
    pub fn remove_if_current(&self, id: TaskId, timer_id: u64) -> bool {
        let mut state = self.state.lock();
        match state.entries.get(&id) {
            Some(timer) if timer.id() == timer_id => {
                state.entries.remove(&id);
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.state.lock().entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().shut_down
    }

    /// Mark the registry shut down and cancel every pending entry
    ///
    /// Returns the drained timers; empty if it was already closed.
    pub fn close(&self) -> Vec<Arc<Timer>> {
        let mut state = self.state.lock();
        if state.shut_down {
            return Vec::new();
        }
        state.shut_down = true;

        let drained: Vec<Arc<Timer>> = state.entries.drain().map(|(_, timer)| timer).collect();
        for timer in &drained {
            timer.cancel();
        }
        drained
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

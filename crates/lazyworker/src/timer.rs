//! Timer records for pending entries
//!
//! A timer moves through `Scheduled -> Running -> Done` when it fires, or
//! `Scheduled -> Cancelled` when cancelled first. Cancellation only wins
//! while the timer is still `Scheduled`; once the worker has claimed it the
//! running task is left alone.

use crate::task::Task;
use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

const SCHEDULED: u8 = 0;
const RUNNING: u8 = 1;
const DONE: u8 = 2;
const CANCELLED: u8 = 3;

/// Lifecycle state of a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// Waiting for its deadline
    Scheduled,
    /// Claimed by the worker, task executing
    Running,
    /// Task finished (normally or by panic)
    Done,
    /// Cancelled before it started
    Cancelled,
}

impl TimerState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            SCHEDULED => Self::Scheduled,
            RUNNING => Self::Running,
            DONE => Self::Done,
            _ => Self::Cancelled,
        }
    }
}

/// A single scheduled firing of a task
#[derive(Debug)]
pub struct Timer {
    /// Unique per scheduler, increasing in submission order
    id: u64,
    task: Task,
    deadline: Instant,
    state: AtomicU8,
}

impl Timer {
    pub(crate) fn new(id: u64, task: Task, deadline: Instant) -> Arc<Self> {
        Arc::new(Self {
            id,
            task,
            deadline,
            state: AtomicU8::new(SCHEDULED),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn state(&self) -> TimerState {
        TimerState::from_raw(self.state.load(Ordering::Acquire))
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == TimerState::Cancelled
    }

    /// Request cancellation
    ///
    /// Returns `false` if the worker already claimed the timer.
    pub fn cancel(&self) -> bool {
        self.transition(SCHEDULED, CANCELLED)
    }

    /// Claim the timer for execution; fails if it was cancelled
    pub(crate) fn begin(&self) -> bool {
        self.transition(SCHEDULED, RUNNING)
    }

    pub(crate) fn finish(&self) {
        self.state.store(DONE, Ordering::Release);
    }

    fn transition(&self, from: u8, to: u8) -> bool {
        self.state
            .compare_exchange(from, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Heap entry ordering timers by deadline, then by submission order
///
/// `BinaryHeap` is a max-heap, so the ordering is reversed to pop the
/// earliest deadline first.
#[derive(Debug)]
pub(crate) struct Queued(pub Arc<Timer>);

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other
            .0
            .deadline
            .cmp(&self.0.deadline)
            .then_with(|| other.0.id.cmp(&self.0.id))
    }
}

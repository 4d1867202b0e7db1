//! The debounce scheduler
//!
//! Submitting a task arms a timer for it. Submitting the same task again
//! before the timer fires cancels the old timer and arms a new one, so the
//! task runs once, `delay` after the most recent submission.
//!
//! Cancellation is best effort: it prevents a firing that has not started,
//! but a task already running on the worker is never interrupted.

use crate::config::{PostShutdown, SchedulerConfig};
use crate::error::{Result, SchedulerError};
use crate::registry::{Installed, Registry};
use crate::task::{Task, TaskId};
use crate::worker::{Worker, WorkerContext};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Details of a task that panicked on the worker
#[derive(Debug, Clone)]
pub struct TaskPanic {
    pub task: TaskId,
    pub message: String,
}

/// Callback invoked on the worker thread after a task panics
pub type PanicHandler = Arc<dyn Fn(&TaskPanic) + Send + Sync>;

/// Live counters shared with the worker
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub submitted: AtomicU64,
    pub replaced: AtomicU64,
    pub cancelled: AtomicU64,
    pub fired: AtomicU64,
    pub panicked: AtomicU64,
}

/// Point-in-time snapshot of scheduler activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Accepted submissions
    pub submitted: u64,
    /// Submissions that replaced a pending entry
    pub replaced: u64,
    /// Pending entries removed by `cancel`
    pub cancelled: u64,
    /// Tasks that ran to completion
    pub fired: u64,
    /// Tasks that panicked
    pub panicked: u64,
}

/// Builder for a configured [`Scheduler`]
#[derive(Default)]
pub struct SchedulerBuilder {
    config: SchedulerConfig,
    panic_handler: Option<PanicHandler>,
}

impl SchedulerBuilder {
    /// Replace the whole configuration
    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    pub fn post_shutdown(mut self, policy: PostShutdown) -> Self {
        self.config.post_shutdown = policy;
        self
    }

    pub fn purge_threshold(mut self, threshold: usize) -> Self {
        self.config.purge_threshold = threshold;
        self
    }

    /// Lower the worker thread's priority (on by default)
    pub fn low_priority(mut self, enabled: bool) -> Self {
        self.config.low_priority = enabled;
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    /// Observe task panics (called on the worker thread)
    pub fn panic_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&TaskPanic) + Send + Sync + 'static,
    {
        self.panic_handler = Some(Arc::new(handler));
        self
    }

    /// Spawn the worker and return the scheduler
    pub fn build(self) -> Result<Scheduler> {
        let registry = Arc::new(Registry::new());
        let counters = Arc::new(Counters::default());

        let worker = Worker::spawn(
            &self.config.thread_name_prefix,
            self.config.stack_size,
            WorkerContext {
                registry: Arc::clone(&registry),
                counters: Arc::clone(&counters),
                panic_handler: self.panic_handler,
                purge_threshold: self.config.purge_threshold,
                low_priority: self.config.low_priority,
            },
        )?;

        Ok(Scheduler {
            registry,
            counters,
            worker,
            post_shutdown: self.config.post_shutdown,
        })
    }
}

/// Debounced delayed-task scheduler
///
/// Holds at most one pending timer per task identity. All operations are
/// safe to call from any thread and never wait for a task to run.
pub struct Scheduler {
    registry: Arc<Registry>,
    counters: Arc<Counters>,
    worker: Worker,
    post_shutdown: PostShutdown,
}

impl Scheduler {
    /// Create a scheduler with the default configuration
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a scheduler and immediately submit `task`
    pub fn with_task(task: &Task, delay: Duration) -> Result<Self> {
        let scheduler = Self::new()?;
        scheduler.submit(task, delay)?;
        Ok(scheduler)
    }

    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::default()
    }

    /// Run `task` once after `delay`
    ///
    /// If `task` is already pending its timer is cancelled and replaced, so
    /// the delay counts from this call. A zero delay fires as soon as the
    /// worker is free.
    pub fn submit(&self, task: &Task, delay: Duration) -> Result<()> {
        let deadline = deadline_after(delay);
        let installed = match self
            .registry
            .install(task, deadline, |timer| self.worker.dispatch(timer))
        {
            Ok(installed) => installed,
            Err(SchedulerError::ShutDown) if self.post_shutdown == PostShutdown::Ignore => {
                debug!(task = %task.id(), "Ignoring submit after shutdown");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        self.counters.submitted.fetch_add(1, Ordering::Relaxed);
        match installed {
            Installed::Fresh => {
                debug!(task = %task.id(), ?delay, "Scheduled task");
            }
            Installed::Replaced { cancelled } => {
                self.counters.replaced.fetch_add(1, Ordering::Relaxed);
                debug!(task = %task.id(), ?delay, cancelled, "Rescheduled task");
            }
        }
        Ok(())
    }

    /// Like [`submit`](Self::submit) with the delay in milliseconds
    ///
    /// Negative delays are rejected with [`SchedulerError::InvalidDelay`].
    pub fn submit_millis(&self, task: &Task, delay_ms: i64) -> Result<()> {
        let millis = u64::try_from(delay_ms).map_err(|_| SchedulerError::InvalidDelay(delay_ms))?;
        self.submit(task, Duration::from_millis(millis))
    }

    /// Cancel the pending entry for `task`, if any
    ///
    /// Returns `true` if an entry was removed. A task that has already
    /// started running is not interrupted; unknown tasks are a no-op.
    pub fn cancel(&self, task: &Task) -> bool {
        match self.registry.remove(task.id()) {
            Some(timer) => {
                self.counters.cancelled.fetch_add(1, Ordering::Relaxed);
                debug!(task = %task.id(), timer = timer.id(), "Cancelled task");
                true
            }
            None => false,
        }
    }

    /// Whether `task` currently has a pending entry
    ///
    /// Advisory only: the answer may be stale as soon as it is returned.
    pub fn is_pending(&self, task: &Task) -> bool {
        self.registry.contains(task.id())
    }

    /// Number of pending entries (advisory)
    pub fn pending_count(&self) -> usize {
        self.registry.len()
    }

    /// Cancel all pending entries and stop the worker
    ///
    /// Idempotent. Waits for a task that is currently running to finish,
    /// unless called from within a task on this scheduler's worker.
    pub fn shutdown(&self) {
        let drained = self.registry.close();
        if !drained.is_empty() {
            debug!(worker = %self.worker.name(), cancelled = drained.len(), "Cancelled pending tasks");
        }
        self.worker.stop();
    }

    pub fn is_shutdown(&self) -> bool {
        self.registry.is_closed()
    }

    /// Worker thread name
    pub fn name(&self) -> &str {
        self.worker.name()
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            submitted: self.counters.submitted.load(Ordering::Relaxed),
            replaced: self.counters.replaced.load(Ordering::Relaxed),
            cancelled: self.counters.cancelled.load(Ordering::Relaxed),
            fired: self.counters.fired.load(Ordering::Relaxed),
            panicked: self.counters.panicked.load(Ordering::Relaxed),
        }
    }
}

/// Absolute deadline for `delay`, clamped for delays `Instant` cannot hold
fn deadline_after(delay: Duration) -> Instant {
    const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);
    let now = Instant::now();
    now.checked_add(delay)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("name", &self.worker.name())
            .field("pending", &self.pending_count())
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}

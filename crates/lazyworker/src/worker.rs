//! Background execution context
//!
//! Each scheduler owns one worker thread. The worker keeps a delay queue
//! (min-heap by deadline) fed through a command channel and fires due
//! timers one at a time, so tasks never run concurrently with each other.

use crate::error::{Result, SchedulerError};
use crate::registry::Registry;
use crate::scheduler::{Counters, PanicHandler, TaskPanic};
use crate::timer::{Queued, Timer};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::BinaryHeap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Instant;
use thread_priority::ThreadPriority;
use tracing::{debug, error, info, warn};

/// Process-wide worker sequence, used in thread names
static WORKER_SEQ: AtomicUsize = AtomicUsize::new(0);

/// Messages from the scheduler to its worker
pub(crate) enum Command {
    /// Add a timer to the delay queue
    Schedule(Arc<Timer>),
    /// Drop the queue and exit
    Stop,
}

/// State shared between the scheduler and its worker thread
pub(crate) struct WorkerContext {
    pub registry: Arc<Registry>,
    pub counters: Arc<Counters>,
    pub panic_handler: Option<PanicHandler>,
    pub purge_threshold: usize,
    pub low_priority: bool,
}

/// Handle to a running worker thread
pub(crate) struct Worker {
    name: String,
    tx: Sender<Command>,
    handle: Mutex<Option<JoinHandle<()>>>,
    thread_id: ThreadId,
}

impl Worker {
    /// Spawn the worker thread
    pub fn spawn(prefix: &str, stack_size: Option<usize>, ctx: WorkerContext) -> Result<Self> {
        let seq = WORKER_SEQ.fetch_add(1, Ordering::Relaxed) + 1;
        let name = format!("{} #{}", prefix, seq);
        let (tx, rx) = crossbeam_channel::unbounded();

        let mut builder = thread::Builder::new().name(name.clone());
        if let Some(size) = stack_size {
            builder = builder.stack_size(size);
        }

        let handle = builder
            .spawn(move || ctx.run(rx))
            .map_err(SchedulerError::Spawn)?;
        let thread_id = handle.thread().id();

        info!(worker = %name, "Started worker thread");

        Ok(Self {
            name,
            tx,
            handle: Mutex::new(Some(handle)),
            thread_id,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hand a timer to the delay queue
    pub fn dispatch(&self, timer: Arc<Timer>) -> Result<()> {
        self.tx
            .send(Command::Schedule(timer))
            .map_err(|_| SchedulerError::WorkerUnavailable)
    }

    /// Stop the worker and wait for it to exit
    ///
    /// A task that is already running is allowed to finish. When called from
    /// the worker thread itself the thread is detached instead of joined.
    /// Calling it again is a no-op.
    pub fn stop(&self) {
        let Some(handle) = self.handle.lock().take() else {
            return;
        };

        if self.tx.send(Command::Stop).is_err() {
            warn!(worker = %self.name, "Worker channel already closed");
        }

        if thread::current().id() == self.thread_id {
            debug!(worker = %self.name, "Stop requested from worker thread; detaching");
            return;
        }

        if handle.join().is_err() {
            warn!(worker = %self.name, "Worker thread terminated abnormally");
        }
    }
}

/// Decides when to sweep cancelled timers out of the delay queue
///
/// After each sweep the trigger rises to twice the surviving queue length,
/// so a queue full of live timers is not rescanned on every push.
struct Purger {
    threshold: usize,
    trigger: usize,
}

impl Purger {
    fn new(threshold: usize) -> Self {
        Self {
            threshold,
            trigger: threshold,
        }
    }

    /// Sweep if the queue has outgrown the trigger; returns the number purged
    fn maybe_purge(&mut self, queue: &mut BinaryHeap<Queued>) -> Option<usize> {
        if self.threshold == 0 || queue.len() <= self.trigger {
            return None;
        }

        let before = queue.len();
        queue.retain(|q| !q.0.is_cancelled());
        self.trigger = self.threshold.max(2 * queue.len());
        Some(before - queue.len())
    }
}

impl WorkerContext {
    fn run(self, rx: Receiver<Command>) {
        if self.low_priority {
            lower_current_thread_priority();
        }

        let mut queue: BinaryHeap<Queued> = BinaryHeap::new();
        let mut purger = Purger::new(self.purge_threshold);

        loop {
            while queue.peek().is_some_and(|q| q.0.is_cancelled()) {
                queue.pop();
            }

            let command = match queue.peek().map(|q| q.0.deadline()) {
                None => match rx.recv() {
                    Ok(command) => command,
                    Err(_) => break,
                },
                Some(deadline) => {
                    let now = Instant::now();
                    if deadline <= now {
                        if let Some(Queued(timer)) = queue.pop() {
                            self.fire(&timer);
                        }
                        continue;
                    }
                    match rx.recv_timeout(deadline - now) {
                        Ok(command) => command,
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            };

            match command {
                Command::Schedule(timer) => {
                    queue.push(Queued(timer));
                    if let Some(purged) = purger.maybe_purge(&mut queue) {
                        debug!(purged, remaining = queue.len(), "Purged cancelled timers");
                    }
                }
                Command::Stop => break,
            }
        }

        info!(dropped = queue.len(), "Worker thread exiting");
    }

    /// Run one due timer, containing any panic
    fn fire(&self, timer: &Arc<Timer>) {
        if !timer.begin() {
            return;
        }

        let task = timer.task();
        let task_id = task.id();
        debug!(task = %task_id, timer = timer.id(), "Firing task");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| task.run()));
        timer.finish();
        self.registry.remove_if_current(task_id, timer.id());

        match outcome {
            Ok(()) => {
                self.counters.fired.fetch_add(1, Ordering::Relaxed);
            }
            Err(payload) => {
                self.counters.panicked.fetch_add(1, Ordering::Relaxed);
                let report = TaskPanic {
                    task: task_id,
                    message: panic_message(payload.as_ref()),
                };
                error!(task = %task_id, message = %report.message, "Task panicked");
                self.report(&report);
            }
        }
    }

    fn report(&self, report: &TaskPanic) {
        let Some(handler) = &self.panic_handler else {
            return;
        };
        if panic::catch_unwind(AssertUnwindSafe(|| handler(report))).is_err() {
            error!(task = %report.task, "Panic handler panicked");
        }
    }
}

fn lower_current_thread_priority() {
    match thread_priority::set_current_thread_priority(ThreadPriority::Min) {
        Ok(()) => debug!("Lowered worker thread priority"),
        Err(e) => debug!(error = ?e, "Could not lower worker thread priority"),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

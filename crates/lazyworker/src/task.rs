//! Identity-keyed units of work

use std::fmt;
use std::sync::Arc;

/// Identity of a [`Task`]
///
/// Derived from the address of the task's shared allocation. Clones of a
/// task report the same id; two tasks built from identical closures do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(usize);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task@{:#x}", self.0)
    }
}

/// A zero-argument callable submitted to a scheduler
///
/// Equality is identity: a task equals its clones and nothing else.
#[derive(Clone)]
pub struct Task {
    func: Arc<dyn Fn() + Send + Sync>,
}

impl Task {
    /// Wrap a callable in a new task with a fresh identity
    pub fn new<F>(func: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self { func: Arc::new(func) }
    }

    /// Identity used as the registry key
    pub fn id(&self) -> TaskId {
        TaskId(Arc::as_ptr(&self.func) as *const () as usize)
    }

    /// Invoke the callable on the current thread
    pub(crate) fn run(&self) {
        (self.func)()
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Task {}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Task").field(&self.id()).finish()
    }
}

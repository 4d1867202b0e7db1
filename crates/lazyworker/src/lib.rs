//! Debounced delayed-task scheduling
//!
//! This crate provides:
//! - Identity-keyed tasks (clones share one identity)
//! - At most one pending timer per task; resubmission resets the delay
//! - Best-effort cancellation and pending queries
//! - A single background worker per scheduler that fires tasks one at a time
//! - A lazily created process-wide shared scheduler

pub mod config;
pub mod error;
pub(crate) mod registry;
pub mod scheduler;
pub mod shared;
pub mod task;
pub(crate) mod timer;
mod worker;

// Re-exports
pub use config::{PostShutdown, SchedulerConfig};
pub use error::{Result, SchedulerError};
pub use scheduler::{PanicHandler, Scheduler, SchedulerBuilder, SchedulerStats, TaskPanic};
pub use shared::shared;
pub use task::{Task, TaskId};

//! Process-wide shared scheduler
//!
//! Created on first access with the default configuration and kept for the
//! life of the process. There is no teardown hook beyond calling
//! [`Scheduler::shutdown`] on it; once shut down it stays shut down.
//! Prefer owning a [`Scheduler`] directly where that is practical.

use crate::error::Result;
use crate::scheduler::Scheduler;
use parking_lot::{const_mutex, Mutex};
use std::sync::OnceLock;

static SHARED: OnceLock<Scheduler> = OnceLock::new();

/// Serializes construction so a failed spawn can be retried later
static INIT: Mutex<()> = const_mutex(());

/// Get the shared scheduler, creating it on first call
pub fn shared() -> Result<&'static Scheduler> {
    if let Some(scheduler) = SHARED.get() {
        return Ok(scheduler);
    }

    let _guard = INIT.lock();
    if let Some(scheduler) = SHARED.get() {
        return Ok(scheduler);
    }

    let scheduler = Scheduler::builder()
        .thread_name_prefix("lazy-worker-shared")
        .build()?;
    Ok(SHARED.get_or_init(|| scheduler))
}

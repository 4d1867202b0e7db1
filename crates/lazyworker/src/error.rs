//! Error types for the scheduler

use thiserror::Error;

/// Errors returned by scheduler operations
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Submission after `shutdown()` with the reject policy
    #[error("scheduler is shut down")]
    ShutDown,

    /// A negative millisecond delay was supplied
    #[error("invalid delay: {0}ms (must be non-negative)")]
    InvalidDelay(i64),

    /// The worker thread could not be created
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The worker's command channel is closed
    #[error("worker thread is no longer accepting timers")]
    WorkerUnavailable,

    /// Configuration text could not be parsed
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration could not be rendered as TOML
    #[error("failed to render configuration: {0}")]
    ConfigRender(#[from] toml::ser::Error),

    /// Configuration file could not be read
    #[error("failed to read configuration file: {0}")]
    ConfigIo(#[source] std::io::Error),
}

/// Result type for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;

//! Scheduler configuration
//!
//! All fields have defaults, so an empty TOML document is a valid config:
//!
//! ```toml
//! thread_name_prefix = "lazy-worker"
//! post_shutdown = "reject"
//! purge_threshold = 1024
//! low_priority = true
//! ```

use crate::error::{Result, SchedulerError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What `submit` does once the scheduler has been shut down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostShutdown {
    /// Return [`SchedulerError::ShutDown`]
    #[default]
    Reject,
    /// Drop the submission and return `Ok(())`
    Ignore,
}

/// Configuration for a [`Scheduler`](crate::Scheduler)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Worker thread name prefix; the thread is named `"<prefix> #<seq>"`
    pub thread_name_prefix: String,

    /// Behavior of `submit` after shutdown
    pub post_shutdown: PostShutdown,

    /// Purge cancelled timers from the delay queue once it grows past this
    /// many entries (0 disables purging)
    pub purge_threshold: usize,

    /// Run the worker at the lowest thread priority the platform allows
    pub low_priority: bool,

    /// Worker thread stack size in bytes (platform default if unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_size: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            thread_name_prefix: "lazy-worker".to_string(),
            post_shutdown: PostShutdown::Reject,
            purge_threshold: 1024,
            low_priority: true,
            stack_size: None,
        }
    }
}

impl SchedulerConfig {
    /// Parse a config from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a config from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(SchedulerError::ConfigIo)?;
        Self::from_toml_str(&text)
    }

    /// Render the config as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }
}

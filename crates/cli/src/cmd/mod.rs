//! CLI command implementations

pub mod burst;
pub mod config;

use anyhow::{Context, Result};
use lazyworker::SchedulerConfig;
use std::path::Path;

/// Load the config file if given, otherwise defaults
pub fn load_config(path: Option<&Path>) -> Result<SchedulerConfig> {
    match path {
        Some(path) => SchedulerConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(SchedulerConfig::default()),
    }
}

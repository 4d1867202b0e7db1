//! Show the effective configuration

use anyhow::{Context, Result};
use lazyworker::SchedulerConfig;
use owo_colors::OwoColorize;

pub fn run(config: &SchedulerConfig) -> Result<()> {
    println!("{}", "Scheduler Configuration".bold());
    let text = config
        .to_toml_string()
        .context("Failed to render configuration")?;
    println!("{}", text);
    println!("{}", "Valid values:".dimmed());
    println!("  post_shutdown: \"reject\" | \"ignore\"");
    println!("  purge_threshold: 0 disables purging of cancelled timers");
    println!("  low_priority: true | false");
    Ok(())
}

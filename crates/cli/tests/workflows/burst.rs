//! `lazyw burst` end to end

use crate::lazyw;
use anyhow::Result;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_burst_fires_each_task_once() -> Result<()> {
    let dir = TempDir::new()?;

    let result = lazyw!(
        dir.path(),
        "burst",
        "--keys",
        "3",
        "--bursts",
        "5",
        "--interval-ms",
        "10",
        "--delay-ms",
        "150"
    )
    .assert_success()?;

    assert_eq!(result.parse_fire_counts(), vec![1, 1, 1]);
    assert!(result.contains_stdout("submitted = 15"));
    assert!(result.contains_stdout("replaced = 12"));
    Ok(())
}

#[test]
fn test_burst_with_ignore_config() -> Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(
        dir.path().join("lazyw.toml"),
        "post_shutdown = \"ignore\"\npurge_threshold = 2\n",
    )?;

    let result = lazyw!(
        dir.path(),
        "--config",
        "lazyw.toml",
        "burst",
        "--keys",
        "1",
        "--bursts",
        "8",
        "--interval-ms",
        "5",
        "--delay-ms",
        "100"
    )
    .assert_success()?;

    assert_eq!(result.parse_fire_counts(), vec![1]);
    Ok(())
}

#[test]
fn test_burst_rejects_bad_config() -> Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("bad.toml"), "post_shutdown = \"explode\"\n")?;

    let result = lazyw!(dir.path(), "--config", "bad.toml", "burst").assert_failure()?;
    assert!(result.contains_stderr("Failed to load config"));
    Ok(())
}

#[test]
fn test_burst_waits_out_delay_and_logs_resubmits() -> Result<()> {
    let dir = TempDir::new()?;

    let result = lazyw!(
        dir.path(),
        "burst",
        "--keys",
        "1",
        "--bursts",
        "3",
        "--interval-ms",
        "10",
        "--delay-ms",
        "200"
    )
    .env("RUST_LOG", "lazyworker=debug")
    .assert_success()?;

    assert_eq!(result.parse_fire_counts(), vec![1]);
    assert!(result.duration >= Duration::from_millis(200));
    assert!(result.contains_stderr("Rescheduled task"));
    assert!(!result.contains_stdout("Rescheduled task"));
    Ok(())
}

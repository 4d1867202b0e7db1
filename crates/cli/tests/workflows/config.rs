//! `lazyw config` end to end

use crate::lazyw;
use anyhow::Result;
use tempfile::TempDir;

#[test]
fn test_config_prints_defaults() -> Result<()> {
    let dir = TempDir::new()?;

    let result = lazyw!(dir.path(), "config").assert_success()?;

    assert!(result.contains_stdout("thread_name_prefix = \"lazy-worker\""));
    assert!(result.contains_stdout("post_shutdown = \"reject\""));
    assert!(result.contains_stdout("purge_threshold = 1024"));
    assert!(result.contains_stdout("low_priority = true"));
    Ok(())
}

#[test]
fn test_config_reflects_file() -> Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("custom.toml"), "thread_name_prefix = \"ui\"\n")?;

    let result = lazyw!(dir.path(), "--config", "custom.toml", "config").assert_success()?;

    assert!(result.contains_stdout("thread_name_prefix = \"ui\""));
    Ok(())
}

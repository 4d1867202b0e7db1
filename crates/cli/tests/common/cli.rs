//! CLI command execution helpers with automatic timing
//!
//! Wraps the `lazyw` binary, measures execution time and provides
//! assertion helpers.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

/// CLI command builder with timing
pub struct LazywCommand {
    binary_path: PathBuf,
    working_dir: PathBuf,
    args: Vec<String>,
    env: HashMap<String, String>,
}

impl LazywCommand {
    /// Create a new command in the given working directory
    pub fn new(working_dir: impl AsRef<Path>) -> Self {
        Self {
            binary_path: PathBuf::from(env!("CARGO_BIN_EXE_lazyw")),
            working_dir: working_dir.as_ref().to_path_buf(),
            args: Vec::new(),
            env: HashMap::new(),
        }
    }

    /// Add command arguments
    pub fn args(&mut self, args: &[&str]) -> &mut Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// Set environment variable
    pub fn env(&mut self, key: &str, value: &str) -> &mut Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Execute command and return result with timing
    pub fn execute(&self) -> Result<CommandResult> {
        let start = Instant::now();

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .envs(&self.env)
            .output()
            .context("Failed to execute command")?;

        Ok(CommandResult {
            stdout: strip_ansi(&String::from_utf8_lossy(&output.stdout)),
            stderr: strip_ansi(&String::from_utf8_lossy(&output.stderr)),
            exit_code: output.status.code().unwrap_or(-1),
            duration: start.elapsed(),
        })
    }

    /// Execute and assert success
    pub fn assert_success(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if !result.success() {
            anyhow::bail!(
                "Command failed (exit code: {}):\nArgs: {:?}\nStdout: {}\nStderr: {}",
                result.exit_code,
                self.args,
                result.stdout,
                result.stderr
            );
        }

        Ok(result)
    }

    /// Execute and expect failure
    pub fn assert_failure(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if result.success() {
            anyhow::bail!(
                "Command should have failed but succeeded:\nArgs: {:?}\nStdout: {}",
                self.args,
                result.stdout
            );
        }

        Ok(result)
    }
}

/// Command execution result with timing
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn contains_stdout(&self, text: &str) -> bool {
        self.stdout.contains(text)
    }

    pub fn contains_stderr(&self, text: &str) -> bool {
        self.stderr.contains(text)
    }

    /// Per-task fire counts from `burst` output, in task order
    pub fn parse_fire_counts(&self) -> Vec<usize> {
        self.stdout.lines().filter_map(parse_fire_count).collect()
    }
}

/// Remove SGR color sequences (`ESC [ ... m`)
pub fn strip_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Parse a `  task   N: COUNT` line
pub fn parse_fire_count(line: &str) -> Option<usize> {
    let rest = line.trim().strip_prefix("task")?;
    let (_, count) = rest.split_once(':')?;
    count.trim().parse().ok()
}

/// Macro for convenient command construction
///
/// Usage:
/// ```
/// lazyw!(dir, "burst", "--keys", "2").assert_success()?;
/// ```
#[macro_export]
macro_rules! lazyw {
    ($dir:expr, $($arg:expr),*) => {{
        let mut cmd = $crate::common::cli::LazywCommand::new($dir);
        cmd.args(&[$($arg),*]);
        cmd
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fire_count_parsing() {
        assert_eq!(parse_fire_count("  task   0: 1"), Some(1));
        assert_eq!(parse_fire_count("  task  12: 3"), Some(3));
        assert_eq!(parse_fire_count("Fire counts"), None);
        assert_eq!(parse_fire_count("  submitted = 4"), None);
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\u{1b}[36msubmitted\u{1b}[39m = 4"), "submitted = 4");
        assert_eq!(strip_ansi("plain"), "plain");
    }

    #[test]
    fn test_fire_counts_from_output() {
        let result = CommandResult {
            stdout: "Fire counts\n  task   0: 1\n  task   1: 1\n\nStats\n".to_string(),
            stderr: String::new(),
            exit_code: 0,
            duration: Duration::from_millis(10),
        };

        assert_eq!(result.parse_fire_counts(), vec![1, 1]);
    }
}

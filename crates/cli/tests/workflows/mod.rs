//! Workflow integration tests
//!
//! Run the `lazyw` binary end to end and validate its output.

pub mod burst;
pub mod config;

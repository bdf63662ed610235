//! GenAIL script runner.
//!
//! Reads one [`envelope::RunRequest`], interprets its script statement by
//! statement against the tool catalog, and produces one
//! [`genail_core::result::ExecutionResult`].

pub mod config;
pub mod driver;
pub mod envelope;
pub mod interpreter;

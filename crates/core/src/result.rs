//! The single JSON envelope produced by every run.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::value::Variables;

/// Outcome of one script execution.
///
/// The same shape is emitted for top-level failures, with empty output and
/// artifacts, zero tool calls and exactly one error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Accumulated `print` / `generate` output.
    pub stdout: String,
    /// Final variable bindings.
    pub artifacts: Map<String, JsonValue>,
    /// One `"<line>: <message>"` entry per failed statement.
    pub errors: Vec<String>,
    /// Number of tool dispatches, including ones that later failed.
    pub tool_calls: u32,
}

impl ExecutionResult {
    /// Aggregate the final interpreter state.
    pub fn collect(
        stdout: String,
        variables: Variables,
        errors: Vec<String>,
        tool_calls: u32,
    ) -> Self {
        let artifacts = variables
            .into_iter()
            .map(|(name, value)| (name, JsonValue::from(value)))
            .collect();
        Self {
            stdout,
            artifacts,
            errors,
            tool_calls,
        }
    }

    /// Envelope for a run that aborted before any statement executed.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            artifacts: Map::new(),
            errors: vec![message.into()],
            tool_calls: 0,
        }
    }
}

//! Resource ceilings applied to a single script execution.

use std::time::Duration;

/// Default maximum script size in bytes.
pub const DEFAULT_SCRIPT_LIMIT_BYTES: usize = 51_200;

/// Default maximum number of tool dispatches per run.
pub const DEFAULT_TOOL_CALL_LIMIT: u32 = 20;

/// Default maximum output size in bytes.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 65_536;

/// Default per-call network timeout, also the advisory wall-clock budget.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Ceilings fixed at construction for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionLimits {
    pub max_script_bytes: usize,
    pub max_tool_calls: u32,
    pub max_output_bytes: usize,
    pub timeout: Duration,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            max_script_bytes: DEFAULT_SCRIPT_LIMIT_BYTES,
            max_tool_calls: DEFAULT_TOOL_CALL_LIMIT,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

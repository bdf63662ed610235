//! Runner input envelope and top-level errors.

use genail_tools::transport::TransportError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Endpoints supplied by the caller for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub ipfs_gateway: Option<String>,
    #[serde(default)]
    pub rpc_url: Option<String>,
}

/// The single JSON object read on stdin.
///
/// Unknown keys (for example `mode`) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    #[serde(default)]
    pub script: String,
    /// Initial variable bindings.
    #[serde(default)]
    pub vars: Option<Map<String, JsonValue>>,
    #[serde(default)]
    pub tool_config: Option<ToolConfig>,
    #[serde(default)]
    pub allow_llm: Option<bool>,
    /// Per-call network timeout; `0` or absent means the configured default.
    #[serde(default)]
    pub timeout_s: Option<u64>,
}

impl RunRequest {
    /// Parse raw stdin. Blank input is treated as `{}`.
    pub fn parse(raw: &str) -> Result<Self, RunError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(raw)?)
    }
}

/// Failures that abort a run before any statement executes.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The input envelope is not the expected JSON object.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] serde_json::Error),

    /// The script exceeds the configured byte ceiling.
    #[error("script too large")]
    ScriptTooLarge {
        /// Script size in bytes.
        size: usize,
        /// Configured ceiling in bytes.
        limit: usize,
    },

    /// `tool_config` lacks one of the required endpoints.
    #[error("tool_config missing api_base_url or ipfs_gateway")]
    MissingToolConfig,

    /// The HTTP client could not be constructed.
    #[error("failed to initialise HTTP client: {0}")]
    Transport(#[from] TransportError),
}

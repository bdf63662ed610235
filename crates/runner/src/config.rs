use std::str::FromStr;
use std::time::Duration;

use genail_core::limits::{
    ExecutionLimits, DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_SCRIPT_LIMIT_BYTES,
    DEFAULT_TIMEOUT_SECS, DEFAULT_TOOL_CALL_LIMIT,
};
use genail_tools::generation::{GenerationConfig, DEFAULT_ENDPOINT, DEFAULT_MODEL};

/// Process-wide runner configuration, fixed for one invocation.
///
/// Malformed numeric values fall back to their defaults instead of aborting:
/// the runner must always be able to emit its result envelope.
#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    /// Script, tool-call, output and timeout ceilings.
    pub limits: ExecutionLimits,
    /// Allow loopback and private-network hosts (development only).
    pub allow_private_network: bool,
    /// Text-generation endpoint, model and credential.
    pub generation: GenerationConfig,
}

impl RunnerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                                      |
    /// |--------------------------------|----------------------------------------------|
    /// | `GENAIL_SCRIPT_LIMIT_BYTES`    | `51200`                                      |
    /// | `GENAIL_TOOL_CALL_LIMIT`       | `20`                                         |
    /// | `GENAIL_MAX_OUTPUT_BYTES`      | `65536`                                      |
    /// | `GENAIL_TIMEOUT_S`             | `10`                                         |
    /// | `GENAIL_ALLOW_PRIVATE_NETWORK` | `false`                                      |
    /// | `GENAIL_MODEL`                 | `gpt-4o-mini`                                |
    /// | `GENAIL_LLM_URL`               | `https://api.openai.com/v1/chat/completions` |
    /// | `OPENAI_API_KEY`               | unset                                        |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let limits = ExecutionLimits {
            max_script_bytes: parse_or(
                &lookup,
                "GENAIL_SCRIPT_LIMIT_BYTES",
                DEFAULT_SCRIPT_LIMIT_BYTES,
            ),
            max_tool_calls: parse_or(&lookup, "GENAIL_TOOL_CALL_LIMIT", DEFAULT_TOOL_CALL_LIMIT),
            max_output_bytes: parse_or(
                &lookup,
                "GENAIL_MAX_OUTPUT_BYTES",
                DEFAULT_MAX_OUTPUT_BYTES,
            ),
            timeout: Duration::from_secs(parse_or(
                &lookup,
                "GENAIL_TIMEOUT_S",
                DEFAULT_TIMEOUT_SECS,
            )),
        };

        let allow_private_network = lookup("GENAIL_ALLOW_PRIVATE_NETWORK")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));

        let generation = GenerationConfig {
            endpoint: lookup("GENAIL_LLM_URL").unwrap_or_else(|| DEFAULT_ENDPOINT.into()),
            model: lookup("GENAIL_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
            api_key: lookup("OPENAI_API_KEY").filter(|k| !k.is_empty()),
        };

        Self {
            limits,
            allow_private_network,
            generation,
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring malformed configuration value");
            default
        }),
        None => default,
    }
}

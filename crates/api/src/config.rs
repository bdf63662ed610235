use std::time::Duration;

use genail_runner::config::RunnerConfig;
use genail_runner::envelope::ToolConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Record service every run talks to.
    pub api_base_url: String,
    /// Gateway for `ipfs://` evidence URIs.
    pub ipfs_gateway: String,
    /// JSON-RPC endpoint; empty when unset.
    pub rpc_url: String,
    /// Server-side switch for `generate`; requests can only narrow it.
    pub allow_llm: bool,
    /// Wall-clock limit for one run in milliseconds (default: `10000`).
    pub runner_timeout_ms: u64,
    /// Ceilings and generation settings handed to every run.
    pub runner: RunnerConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                 |
    /// |---------------------------|-------------------------|
    /// | `HOST`                    | `0.0.0.0`               |
    /// | `PORT`                    | `3000`                  |
    /// | `CORS_ORIGINS`            | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                    |
    /// | `API_BASE_URL`            | `http://localhost:8080` |
    /// | `IPFS_GATEWAY`            | `https://ipfs.io`       |
    /// | `RPC_URL`                 | empty                   |
    /// | `ALLOW_LLM_SUMMARIZATION` | `false`                 |
    /// | `GENAIL_TIMEOUT_MS`       | `10000`                 |
    ///
    /// The `GENAIL_*` runner variables are read by [`RunnerConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let api_base_url =
            std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".into());
        let ipfs_gateway =
            std::env::var("IPFS_GATEWAY").unwrap_or_else(|_| "https://ipfs.io".into());
        let rpc_url = std::env::var("RPC_URL").unwrap_or_default();

        let allow_llm = std::env::var("ALLOW_LLM_SUMMARIZATION")
            .is_ok_and(|v| v.trim().eq_ignore_ascii_case("true"));

        let runner_timeout_ms: u64 = std::env::var("GENAIL_TIMEOUT_MS")
            .unwrap_or_else(|_| "10000".into())
            .parse()
            .expect("GENAIL_TIMEOUT_MS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            api_base_url,
            ipfs_gateway,
            rpc_url,
            allow_llm,
            runner_timeout_ms,
            runner: RunnerConfig::from_env(),
        }
    }

    /// Endpoints attached to every run request.
    pub fn tool_config(&self) -> ToolConfig {
        ToolConfig {
            api_base_url: Some(self.api_base_url.clone()),
            ipfs_gateway: Some(self.ipfs_gateway.clone()),
            rpc_url: Some(self.rpc_url.clone()).filter(|url| !url.is_empty()),
        }
    }

    pub fn runner_timeout(&self) -> Duration {
        Duration::from_millis(self.runner_timeout_ms)
    }

    /// Per-call network timeout: the run limit rounded up to whole seconds.
    pub fn runner_timeout_secs(&self) -> u64 {
        self.runner_timeout_ms.div_ceil(1000)
    }
}

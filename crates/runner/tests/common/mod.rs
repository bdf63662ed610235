//! Shared fixtures for runner integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use genail_runner::config::RunnerConfig;
use genail_runner::envelope::{RunRequest, ToolConfig};
use genail_tools::transport::{Transport, TransportError};
use reqwest::Url;
use serde_json::{json, Value as JsonValue};

/// One request seen by [`StubTransport`].
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: &'static str,
    pub url: String,
    pub body: Option<JsonValue>,
    pub bearer: Option<String>,
}

/// In-memory transport answering by URL path.
///
/// Paths without a canned response answer `{"ok": true}`; paths registered
/// with [`StubTransport::fail`] answer with a 502.
#[derive(Default)]
pub struct StubTransport {
    responses: Vec<(String, JsonValue)>,
    failures: Vec<String>,
    seen: Mutex<Vec<SeenRequest>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, path: &str, body: JsonValue) -> Self {
        self.responses.push((path.to_string(), body));
        self
    }

    pub fn fail(mut self, path: &str) -> Self {
        self.failures.push(path.to_string());
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    fn answer(&self, url: &Url) -> Result<JsonValue, TransportError> {
        let path = url.path();
        if self.failures.iter().any(|p| p == path) {
            return Err(TransportError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            });
        }
        Ok(self
            .responses
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, body)| body.clone())
            .unwrap_or_else(|| json!({"ok": true})))
    }
}

impl Transport for StubTransport {
    async fn get_json(
        &self,
        mut url: Url,
        query: Vec<(&'static str, String)>,
    ) -> Result<JsonValue, TransportError> {
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        self.seen.lock().unwrap().push(SeenRequest {
            method: "GET",
            url: url.to_string(),
            body: None,
            bearer: None,
        });
        self.answer(&url)
    }

    async fn post_json(
        &self,
        url: Url,
        body: JsonValue,
        bearer: Option<String>,
    ) -> Result<JsonValue, TransportError> {
        self.seen.lock().unwrap().push(SeenRequest {
            method: "POST",
            url: url.to_string(),
            body: Some(body),
            bearer,
        });
        self.answer(&url)
    }
}

/// Default configuration with a small tool budget and a test credential.
pub fn test_config() -> RunnerConfig {
    let mut config = RunnerConfig::default();
    config.limits.max_tool_calls = 3;
    config.generation.api_key = Some("sk-test".to_string());
    config
}

/// A request against the stub record service and gateway.
pub fn request(script: &str) -> RunRequest {
    RunRequest {
        script: script.to_string(),
        tool_config: Some(ToolConfig {
            api_base_url: Some("https://mmv.test/api".to_string()),
            ipfs_gateway: Some("https://ipfs.test".to_string()),
            rpc_url: Some("https://rpc.test".to_string()),
        }),
        ..RunRequest::default()
    }
}

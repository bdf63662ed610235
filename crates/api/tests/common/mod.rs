#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use genail_api::config::ServerConfig;
use genail_api::router::build_app_router;
use genail_api::state::AppState;
use genail_runner::config::RunnerConfig;
use genail_tools::transport::{Transport, TransportError};
use http_body_util::BodyExt;
use reqwest::Url;
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin and stub endpoint hosts.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        api_base_url: "https://mmv.test".to_string(),
        ipfs_gateway: "https://ipfs.test".to_string(),
        rpc_url: String::new(),
        allow_llm: false,
        runner_timeout_ms: 2_000,
        runner: RunnerConfig::default(),
    }
}

/// Answers every request with the same body, optionally after a delay or
/// by panicking.
#[derive(Default)]
pub struct StubTransport {
    pub body: JsonValue,
    pub delay: Option<Duration>,
    pub panics: bool,
    seen: Mutex<Vec<String>>,
}

impl StubTransport {
    pub fn answering(body: JsonValue) -> Self {
        Self {
            body,
            ..Self::default()
        }
    }

    pub fn delayed(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn panicking() -> Self {
        Self {
            panics: true,
            ..Self::default()
        }
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }

    async fn answer(&self, url: Url) -> Result<JsonValue, TransportError> {
        self.seen.lock().unwrap().push(url.to_string());
        if self.panics {
            panic!("stub transport asked to panic");
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.body.clone())
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
        self.answer(url).await
    }

    async fn post_json(
        &self,
        url: Url,
        _body: JsonValue,
        _bearer: Option<String>,
    ) -> Result<JsonValue, TransportError> {
        self.answer(url).await
    }
}

/// Build the full application router with the given config and transport.
///
/// Uses the same `build_app_router` as `main.rs`, so tests exercise the
/// production middleware stack.
pub fn build_test_app(config: ServerConfig, transport: Arc<StubTransport>) -> Router {
    let state = AppState::new(Arc::new(config.clone()), transport);
    build_app_router(state, &config)
}

/// Router with default config answering `{"ok": true}`.
pub fn default_app() -> Router {
    build_test_app(test_config(), Arc::new(StubTransport::answering(json!({"ok": true}))))
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: JsonValue) -> Response<Body> {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: String) -> Response<Body> {
    app.oneshot(
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> JsonValue {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert the status and return the parsed body.
pub async fn expect_json(response: Response<Body>, status: StatusCode) -> JsonValue {
    assert_eq!(response.status(), status);
    body_json(response).await
}

//! Handlers for running GenAIL scripts over HTTP.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use genail_core::result::ExecutionResult;
use genail_runner::driver;
use genail_runner::envelope::RunRequest;
use genail_tools::transport::Transport;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{AppError, AppResult};
use crate::router::REQUEST_ID_HEADER;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Endpoints and flags the script editor needs to show.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptsConfigResponse {
    pub api_base_url: String,
    pub ipfs_gateway: String,
    pub rpc_url: String,
    pub allow_llm: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/scripts/config
pub async fn get_config<T: Transport + 'static>(
    State(state): State<AppState<T>>,
) -> Json<ScriptsConfigResponse> {
    let config = &state.config;
    Json(ScriptsConfigResponse {
        api_base_url: config.api_base_url.clone(),
        ipfs_gateway: config.ipfs_gateway.clone(),
        rpc_url: config.rpc_url.clone(),
        allow_llm: config.allow_llm,
    })
}

/// POST /api/scripts/run
///
/// Body: `{script, vars?, mode?, allow_llm?}`. Endpoints and the timeout
/// always come from server configuration; `allow_llm` can only be narrowed by
/// the request.
pub async fn run_script<T: Transport + 'static>(
    State(state): State<AppState<T>>,
    headers: HeaderMap,
    payload: Result<Json<JsonValue>, JsonRejection>,
) -> AppResult<Json<ExecutionResult>> {
    let Json(body) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let config = &state.config;

    let script = body
        .get("script")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| AppError::BadRequest("script must be a string".to_string()))?;
    if script.len() > config.runner.limits.max_script_bytes {
        return Err(AppError::BadRequest("script too large".to_string()));
    }

    let allow_llm = config.allow_llm
        && body
            .get("allow_llm")
            .and_then(JsonValue::as_bool)
            .unwrap_or(false);

    let request = RunRequest {
        script: script.to_string(),
        vars: body.get("vars").and_then(JsonValue::as_object).cloned(),
        tool_config: Some(config.tool_config()),
        allow_llm: Some(allow_llm),
        timeout_s: Some(config.runner_timeout_secs()),
    };

    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let started = Instant::now();

    let task_config = Arc::clone(&state.config);
    let transport = Arc::clone(&state.transport);
    let mut task = tokio::spawn(async move {
        driver::run_with_transport(request, &task_config.runner, transport).await
    });

    let outcome = tokio::time::timeout(config.runner_timeout(), &mut task).await;
    let duration_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(Ok(result)) => {
            tracing::info!(
                %request_id,
                duration_ms,
                tool_calls = result.tool_calls,
                errors = result.errors.len(),
                "Script run completed"
            );
            Ok(Json(result))
        }
        Ok(Err(err)) => {
            tracing::error!(%request_id, duration_ms, error = %err, "Script run failed");
            Err(AppError::InternalError(err.to_string()))
        }
        Err(_) => {
            task.abort();
            tracing::warn!(%request_id, duration_ms, "Script run timed out");
            Err(AppError::Timeout)
        }
    }
}

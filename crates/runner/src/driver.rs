//! Turns one [`RunRequest`] into one [`ExecutionResult`].
//!
//! Top-level failures (oversized script, incomplete `tool_config`, HTTP client
//! construction) abort before any statement runs and are folded into the
//! standard envelope, so callers always get a result back.

use std::sync::Arc;
use std::time::{Duration, Instant};

use genail_core::result::ExecutionResult;
use genail_core::value::{Value, Variables};
use genail_tools::egress::EgressPolicy;
use genail_tools::generation::TextGenerator;
use genail_tools::registry::{ToolContext, ToolRegistry};
use genail_tools::transport::{HttpTransport, Transport};
use uuid::Uuid;

use crate::config::RunnerConfig;
use crate::envelope::{RunError, RunRequest};
use crate::interpreter::Interpreter;

/// A validated request, ready to execute.
#[derive(Debug)]
struct PreparedRun {
    script: String,
    context: ToolContext,
    variables: Variables,
    allow_llm: bool,
    timeout: Duration,
}

/// Run `request` over real HTTP.
pub async fn run(request: RunRequest, config: &RunnerConfig) -> ExecutionResult {
    let prepared = match prepare(request, config) {
        Ok(prepared) => prepared,
        Err(err) => return abort(err),
    };
    let transport = match HttpTransport::new(prepared.timeout) {
        Ok(transport) => Arc::new(transport),
        Err(err) => return abort(RunError::from(err)),
    };
    execute(prepared, config, transport).await
}

/// Run `request` against a caller-supplied transport.
pub async fn run_with_transport<T: Transport>(
    request: RunRequest,
    config: &RunnerConfig,
    transport: Arc<T>,
) -> ExecutionResult {
    match prepare(request, config) {
        Ok(prepared) => execute(prepared, config, transport).await,
        Err(err) => abort(err),
    }
}

fn abort(err: RunError) -> ExecutionResult {
    tracing::warn!(error = %err, "Run aborted before execution");
    ExecutionResult::failure(err.to_string())
}

fn prepare(request: RunRequest, config: &RunnerConfig) -> Result<PreparedRun, RunError> {
    let size = request.script.len();
    let limit = config.limits.max_script_bytes;
    if size > limit {
        return Err(RunError::ScriptTooLarge { size, limit });
    }

    let tool_config = request.tool_config.unwrap_or_default();
    let api_base_url = trimmed(tool_config.api_base_url).ok_or(RunError::MissingToolConfig)?;
    let ipfs_gateway = trimmed(tool_config.ipfs_gateway).ok_or(RunError::MissingToolConfig)?;
    let rpc_url = trimmed(tool_config.rpc_url);

    let endpoints = [
        Some(api_base_url.as_str()),
        Some(ipfs_gateway.as_str()),
        rpc_url.as_deref(),
    ];
    let egress = EgressPolicy::from_endpoints(
        endpoints.into_iter().flatten(),
        config.allow_private_network,
    );

    let variables = request
        .vars
        .unwrap_or_default()
        .into_iter()
        .map(|(name, value)| (name, Value::from(value)))
        .collect();

    let timeout = match request.timeout_s {
        Some(secs) if secs > 0 => Duration::from_secs(secs),
        _ => config.limits.timeout,
    };

    Ok(PreparedRun {
        script: request.script,
        context: ToolContext {
            api_base_url,
            ipfs_gateway,
            rpc_url,
            egress,
        },
        variables,
        allow_llm: request.allow_llm.unwrap_or(false),
        timeout,
    })
}

async fn execute<T: Transport>(
    prepared: PreparedRun,
    config: &RunnerConfig,
    transport: Arc<T>,
) -> ExecutionResult {
    let run_id = Uuid::new_v4();
    let started = Instant::now();
    tracing::info!(
        %run_id,
        script_bytes = prepared.script.len(),
        allow_llm = prepared.allow_llm,
        allowed_hosts = ?prepared.context.egress.allowed_hosts(),
        "Starting script run"
    );

    let generator = prepared
        .allow_llm
        .then(|| TextGenerator::new(config.generation.clone(), Arc::clone(&transport)));
    let tools = ToolRegistry::new(prepared.context, transport, config.limits.max_tool_calls);

    let result = Interpreter::new(tools, generator, config.limits.max_output_bytes)
        .with_variables(prepared.variables)
        .run(&prepared.script)
        .await;

    let elapsed = started.elapsed();
    tracing::info!(
        %run_id,
        duration_ms = elapsed.as_millis() as u64,
        tool_calls = result.tool_calls,
        errors = result.errors.len(),
        "Script run finished"
    );
    if exceeded_budget(elapsed, config) {
        tracing::warn!(
            %run_id,
            budget_ms = config.limits.timeout.as_millis() as u64,
            "Script run exceeded its time budget"
        );
    }

    result
}

/// Runs are measured against the configured `GENAIL_TIMEOUT_S`, not the
/// per-request HTTP timeout.
fn exceeded_budget(elapsed: Duration, config: &RunnerConfig) -> bool {
    elapsed > config.limits.timeout
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

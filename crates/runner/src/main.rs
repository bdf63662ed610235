use std::io::{Read, Write};

use genail_core::result::ExecutionResult;
use genail_runner::config::RunnerConfig;
use genail_runner::driver;
use genail_runner::envelope::RunRequest;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Reads a run request on stdin and writes exactly one result envelope to
/// stdout. Always exits 0.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();

    // stdout carries the envelope, so logs go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "genail_runner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = RunnerConfig::from_env();
    tracing::debug!(?config, "Loaded runner configuration");

    let result = match read_request() {
        Ok(request) => {
            // Spawned so a panic inside the run still yields an envelope.
            match tokio::spawn(async move { driver::run(request, &config).await }).await {
                Ok(result) => result,
                Err(err) => {
                    tracing::error!(error = %err, "Run task failed");
                    ExecutionResult::failure(format!("runner failed: {err}"))
                }
            }
        }
        Err(message) => {
            tracing::warn!(error = %message, "Rejected run input");
            ExecutionResult::failure(message)
        }
    };

    write_result(&result);
}

fn read_request() -> Result<RunRequest, String> {
    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .map_err(|e| format!("invalid input: {e}"))?;
    RunRequest::parse(&raw).map_err(|e| e.to_string())
}

fn write_result(result: &ExecutionResult) {
    let body = serde_json::to_string(result).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to serialize result");
        r#"{"stdout":"","artifacts":{},"errors":["failed to serialize result"],"tool_calls":0}"#
            .to_string()
    });
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = stdout.write_all(body.as_bytes()).and_then(|()| stdout.flush()) {
        tracing::error!(error = %e, "Failed to write result");
    }
}

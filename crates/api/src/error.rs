use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use genail_core::result::ExecutionResult;

/// Application-level error type for HTTP handlers.
///
/// Every variant renders as the standard run envelope with a single error,
/// so clients parse success and failure the same way.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The request body was rejected before any script ran.
    #[error("{0}")]
    BadRequest(String),

    /// The run did not finish within `GENAIL_TIMEOUT_MS`.
    #[error("runner timed out")]
    Timeout,

    /// The run task failed without producing a result.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Timeout => (StatusCode::GATEWAY_TIMEOUT, self.to_string()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "runner failed".to_string())
            }
        };

        (status, Json(ExecutionResult::failure(message))).into_response()
    }
}

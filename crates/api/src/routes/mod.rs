pub mod health;
pub mod scripts;

use axum::Router;
use genail_tools::transport::Transport;

use crate::state::AppState;

/// Routes mounted under `/api`.
///
/// ```text
/// /scripts    script config and execution
/// ```
pub fn api_routes<T: Transport + 'static>() -> Router<AppState<T>> {
    Router::new().nest("/scripts", scripts::router())
}

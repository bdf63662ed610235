//! Route definitions for the script runner endpoints.

use axum::routing::{get, post};
use axum::Router;
use genail_tools::transport::Transport;

use crate::handlers::scripts;
use crate::state::AppState;

/// Routes mounted at `/api/scripts`.
///
/// ```text
/// GET    /config                    -> get_config
/// POST   /run                       -> run_script
/// ```
pub fn router<T: Transport + 'static>() -> Router<AppState<T>> {
    Router::new()
        .route("/config", get(scripts::get_config::<T>))
        .route("/run", post(scripts::run_script::<T>))
}

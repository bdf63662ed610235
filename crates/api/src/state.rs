use std::sync::Arc;

use genail_tools::transport::{HttpTransport, Transport};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Generic over the transport so tests can run scripts without a network.
pub struct AppState<T = HttpTransport> {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// HTTP client shared by every script run.
    pub transport: Arc<T>,
}

impl<T: Transport> AppState<T> {
    pub fn new(config: Arc<ServerConfig>, transport: Arc<T>) -> Self {
        Self { config, transport }
    }
}

// Manual impl: cloning only bumps the `Arc`s, so `T` itself need not be `Clone`.
impl<T> Clone for AppState<T> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            transport: Arc::clone(&self.transport),
        }
    }
}

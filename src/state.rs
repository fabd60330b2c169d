//! Shared application state for request handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::proxy::BackendClient;

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
///
/// Everything here is read-only after startup; `reqwest::Client` is itself an
/// `Arc` around its connection pool.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Present only when `/api/*` is forwarded to another server.
    pub backend: Option<BackendClient>,
}

impl AppState {
    /// Creates the application state, building the backend client if one is configured.
    pub fn new(config: AppConfig) -> Result<Self, reqwest::Error> {
        let backend = match &config.frontend {
            Some(frontend) => match &frontend.backend_url {
                Some(url) => Some(BackendClient::new(
                    url,
                    frontend.timeout_seconds,
                    frontend.max_body_bytes,
                )?),
                None => None,
            },
            None => None,
        };

        Ok(Self {
            config: Arc::new(config),
            backend,
        })
    }
}

//! HTTP route handlers.
//!
//! The router shape depends on the configured role:
//! - API: `/api/data` answered locally
//! - Gateway: everything under `/api` forwarded to the backend
//! - With a `[frontend]` section, all unmatched paths go to the SPA service
//!
//! Request tracing is enabled via middleware that assigns a request ID to
//! each incoming request, allowing correlation of all logs within a request.

pub mod api;
pub mod health;

use axum::{
    middleware,
    routing::{any, get},
    Router,
};

use crate::http::cors::cors_layer;
use crate::http::static_files::create_spa_service;
use crate::middleware::request_id_layer;
use crate::proxy;
use crate::state::AppState;

/// Creates the Axum router for the configured role.
pub fn create_router(state: AppState) -> Router {
    let api_routes = if state.backend.is_some() {
        Router::new()
            .route("/api", any(proxy::forward))
            .route("/api/{*path}", any(proxy::forward))
    } else {
        Router::new().route("/api/data", get(api::data))
    };

    // Health check - always local, never proxied
    let health_routes: Router<AppState> = Router::new().route("/health", get(health::health));

    let mut router = Router::new().merge(api_routes).merge(health_routes);

    if let Some(frontend) = &state.config.frontend {
        router = router.fallback_service(create_spa_service(frontend));
    }

    let mut router = router.with_state(state.clone());

    if let Some(cors) = cors_layer(&state.config.cors) {
        router = router.layer(cors);
    }

    // Request ID middleware - outermost, so the span covers CORS handling too
    router.layer(middleware::from_fn(request_id_layer))
}

//! The greeting endpoint.

use axum::Json;
use serde::Serialize;

/// Fixed greeting returned by `GET /api/data`.
pub const GREETING_MESSAGE: &str = "Hello from Spring Boot API!";

/// Response body for the greeting endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponse {
    pub message: String,
}

impl ApiResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `GET /api/data`: always the same greeting, whatever the request carries.
pub async fn data() -> Json<ApiResponse> {
    tracing::debug!("Serving greeting");
    Json(ApiResponse::new(GREETING_MESSAGE))
}

//! Health check endpoint for container orchestration.
//!
//! Provides a simple liveness probe that returns 200 OK when the process is running.

/// Health check handler.
///
/// This is a liveness probe: it only checks that the process can respond to
/// HTTP. In the gateway role it does not contact the backend.
pub async fn health() -> &'static str {
    "ok"
}

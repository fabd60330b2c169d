use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Errors surfaced to HTTP clients from the proxy path.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Backend unreachable, timed out, or the connection broke mid-response
    #[error("{0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Failed to read request body: {0}")]
    Body(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Body(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Upstream(e) => {
                tracing::error!(error = %e, "Error while proxying request");
            }
            AppError::Internal(_) => {
                tracing::error!("Internal error: {:?}", self);
            }
            _ => {
                tracing::warn!(status = status.as_u16(), error = %self, "Rejected proxied request");
            }
        }

        (status, self.to_string()).into_response()
    }
}

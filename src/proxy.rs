//! Forwarding of `/api/*` requests to the backend service.
//!
//! The gateway role sits in front of the API server the same way the frontend
//! dev server does in a split deployment: the browser talks to one origin and
//! API calls are relayed upstream with their method, path, query, headers and
//! body intact. Upstream responses, including 4xx/5xx, are passed through
//! unchanged; only transport failures become local errors.

use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::response::Response;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONNECTION, CONTENT_LENGTH, HOST};
use http_body_util::LengthLimitError;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::{RequestId, REQUEST_ID_HEADER};
use crate::state::AppState;

/// Headers that describe a single connection and must not be relayed.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// HTTP client bound to one backend base URL.
#[derive(Clone, Debug)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
    max_body_bytes: usize,
}

impl BackendClient {
    pub fn new(
        base_url: &str,
        timeout_seconds: u64,
        max_body_bytes: usize,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            // Redirects are the browser's business
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_body_bytes,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upstream URL for a request path plus query, e.g. `/api/data?x=1`.
    pub fn upstream_url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url, path_and_query)
    }

    /// Relay one request upstream and convert the reply into an axum response.
    pub async fn forward(&self, request: Request) -> Result<Response, AppError> {
        let (parts, body) = request.into_parts();

        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let url = self.upstream_url(path_and_query);

        let body = to_bytes(body, self.max_body_bytes).await.map_err(|e| {
            let inner = e.into_inner();
            if inner.is::<LengthLimitError>() {
                AppError::PayloadTooLarge(self.max_body_bytes)
            } else {
                AppError::Body(inner.to_string())
            }
        })?;

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        headers.remove(HOST);
        headers.remove(CONTENT_LENGTH);
        // The backend must log under the id the client was given, not a rejected one
        if let Some(RequestId(id)) = parts.extensions.get::<RequestId>() {
            if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
                headers.insert(REQUEST_ID_HEADER.clone(), value);
            }
        }

        tracing::debug!(method = %parts.method, upstream = %url, "Forwarding request");

        let upstream = self
            .client
            .request(parts.method, &url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let status = upstream.status();
        let mut response_headers = upstream.headers().clone();
        strip_hop_by_hop(&mut response_headers);
        response_headers.remove(CONTENT_LENGTH);
        let bytes = upstream.bytes().await?;

        tracing::debug!(status = status.as_u16(), bytes = bytes.len(), "Upstream responded");

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = status;
        *response.headers_mut() = response_headers;
        Ok(response)
    }
}

/// Remove hop-by-hop headers, including any named in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in &listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
}

/// Handler for `/api` and `/api/{*path}` in the gateway role.
#[instrument(name = "proxy::forward", skip_all)]
pub async fn forward(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, AppError> {
    let backend = state
        .backend
        .as_ref()
        .ok_or_else(|| AppError::Internal("no backend configured".to_string()))?;
    backend.forward(request).await
}

//! Cross-origin policy for browser clients.
//!
//! The API is normally called from a frontend served on another origin during
//! development. When enabled, only the configured origins receive
//! `Access-Control-Allow-Origin`; other origins get no CORS headers and the
//! browser refuses the response. When disabled, no CORS layer is installed.

use http::{HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

use crate::config::CorsConfig;
use crate::middleware::REQUEST_ID_HEADER;

/// Build the CORS layer, or `None` when the policy is disabled.
///
/// Origins are validated when the configuration is loaded; any that still fail
/// to convert into a header value are skipped.
pub fn cors_layer(config: &CorsConfig) -> Option<CorsLayer> {
    if !config.enabled {
        return None;
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
            .allow_headers(AllowHeaders::mirror_request())
            .expose_headers([REQUEST_ID_HEADER.clone()]),
    )
}

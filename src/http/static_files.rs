//! Static file serving for the built frontend.
//!
//! Files under the dist directory are served as-is with a long-lived
//! Cache-Control header. Any path that does not name a file falls back to
//! `index.html` with status 200, so client-side routes like `/about` load the
//! app instead of a 404. The fallback document is always marked `no-cache`,
//! and so are its 404/405 error responses, which the fallback also produces
//! for non-GET requests.

use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeader;

use crate::config::{FrontendConfig, CACHE_CONTROL_INDEX, CACHE_CONTROL_STATIC};

/// Service type returned by [`create_spa_service`].
pub type SpaService =
    SetResponseHeader<ServeDir<SetResponseHeader<ServeFile, HeaderValue>>, HeaderValue>;

/// Create the single-page-app service for a frontend configuration.
///
/// Directory requests (including `/`) are not mapped to their own
/// `index.html`; they take the fallback path so the entry document always
/// carries `no-cache`.
pub fn create_spa_service(frontend: &FrontendConfig) -> SpaService {
    let index = SetResponseHeader::overriding(
        ServeFile::new(frontend.index_path()),
        CACHE_CONTROL,
        HeaderValue::from_static(CACHE_CONTROL_INDEX),
    );

    let dist = ServeDir::new(&frontend.dist_dir)
        .append_index_html_on_directories(false)
        .call_fallback_on_method_not_allowed(true)
        .fallback(index);

    SetResponseHeader::if_not_present(
        dist,
        CACHE_CONTROL,
        HeaderValue::from_static(CACHE_CONTROL_STATIC),
    )
}

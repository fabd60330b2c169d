//! greeting-api: a greeting REST endpoint with an optional frontend gateway.
//!
//! The same binary runs as the API server (`GET /api/data`), as a gateway that
//! serves a built single-page app and forwards `/api/*` to a backend, or as
//! both at once. See [`config::ServiceRole`].

pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod proxy;
pub mod routes;
pub mod state;

pub use config::AppConfig;
pub use error::AppError;
pub use routes::create_router;
pub use state::AppState;

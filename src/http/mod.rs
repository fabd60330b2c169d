//! HTTP server plumbing.
//!
//! This module provides the pieces around the route handlers:
//! - **server**: plain HTTP or manual-certificate HTTPS startup
//! - **shutdown**: graceful drain on SIGTERM/SIGINT, certificate reload on SIGHUP
//! - **cors**: the configurable cross-origin policy
//! - **static_files**: the built frontend with single-page-app fallback

pub mod cors;
mod server;
mod shutdown;
pub mod static_files;

pub use server::{start_server, ServerError};

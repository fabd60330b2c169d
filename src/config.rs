//! Configuration loading and constants.
//!
//! Loads application configuration from a TOML file and defines the constants
//! used for Cache-Control headers, request correlation, proxy limits and default
//! paths. `AppConfig` is the root configuration struct containing all settings.
//! Every section has defaults, so an empty file yields a working API server.

use std::fmt;
use std::path::Path;

use const_format::formatcp;
use http::HeaderValue;
use serde::Deserialize;

// =============================================================================
// HTTP Response Cache Control
// =============================================================================

/// Built frontend assets (hashed JS/CSS bundles, images)
pub const HTTP_CACHE_STATIC_MAX_AGE: u32 = 86400;

/// Cache-Control for files served out of the dist directory
pub const CACHE_CONTROL_STATIC: &str = formatcp!("public, max-age={}", HTTP_CACHE_STATIC_MAX_AGE);

/// index.html must always be revalidated so new deployments are picked up
pub const CACHE_CONTROL_INDEX: &str = "no-cache";

// =============================================================================
// Proxy Constants
// =============================================================================

/// Environment variable overriding `frontend.backend_url`
pub const BACKEND_API_ENV: &str = "BACKEND_API";

/// Default upstream timeout for proxied API requests
pub const DEFAULT_PROXY_TIMEOUT_SECS: u64 = 30;

/// Default limit on proxied request bodies (2 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// =============================================================================
// Default Paths and Strings
// =============================================================================

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "greeting_api=debug,tower_http=debug";

/// Origin of the local frontend dev server
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

/// Default directory holding the built single-page application
pub const DEFAULT_DIST_DIR: &str = "dist";

/// Entry document served for client-side routes
pub const INDEX_FILE: &str = "index.html";

/// Seconds in-flight requests get to finish after SIGTERM/SIGINT
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 30;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub http: HttpServerConfig,
    /// Cross-origin policy for browser clients
    #[serde(default)]
    pub cors: CorsConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Frontend serving and API proxying. Absent means API-only.
    #[serde(default)]
    pub frontend: Option<FrontendConfig>,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "HttpServerConfig::default_host")]
    pub host: String,
    #[serde(default = "HttpServerConfig::default_port")]
    pub port: u16,
    #[serde(default = "HttpServerConfig::default_shutdown_grace")]
    pub shutdown_grace_seconds: u64,
    #[serde(default)]
    pub tls: TlsConfig,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            shutdown_grace_seconds: Self::default_shutdown_grace(),
            tls: TlsConfig::default(),
        }
    }
}

impl HttpServerConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_shutdown_grace() -> u64 {
        DEFAULT_SHUTDOWN_GRACE_SECS
    }
}

/// TLS termination mode
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// Plain HTTP (development, or behind a reverse proxy)
    #[default]
    None,
    /// User-provided certificate and key files, reloaded on SIGHUP
    Manual,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TlsConfig {
    #[serde(default)]
    pub mode: TlsMode,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

/// Cross-origin policy. Disabling it removes the CORS layer entirely.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "CorsConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default = "CorsConfig::default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            allowed_origins: Self::default_allowed_origins(),
        }
    }
}

impl CorsConfig {
    fn default_enabled() -> bool {
        true
    }

    fn default_allowed_origins() -> Vec<String> {
        vec![DEFAULT_CORS_ORIGIN.to_string()]
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

/// Frontend gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FrontendConfig {
    /// Directory with the built SPA (must contain index.html)
    #[serde(default = "FrontendConfig::default_dist_dir")]
    pub dist_dir: String,
    /// When set, `/api/*` is forwarded here instead of answered locally
    pub backend_url: Option<String>,
    /// Upstream timeout in seconds
    #[serde(default = "FrontendConfig::default_timeout")]
    pub timeout_seconds: u64,
    /// Largest request body forwarded upstream
    #[serde(default = "FrontendConfig::default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl FrontendConfig {
    fn default_dist_dir() -> String {
        DEFAULT_DIST_DIR.to_string()
    }

    fn default_timeout() -> u64 {
        DEFAULT_PROXY_TIMEOUT_SECS
    }

    fn default_max_body_bytes() -> usize {
        DEFAULT_MAX_BODY_BYTES
    }

    /// Path of the SPA entry document
    pub fn index_path(&self) -> std::path::PathBuf {
        Path::new(&self.dist_dir).join(INDEX_FILE)
    }
}

/// Which of the deployment roles this process plays, derived from config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceRole {
    /// Answers `/api/data` only
    Api,
    /// Serves the SPA and proxies `/api/*` to a backend
    Gateway,
    /// Answers `/api/data` and serves the SPA from the same origin
    Combined,
}

impl fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceRole::Api => "api",
            ServiceRole::Gateway => "gateway",
            ServiceRole::Combined => "combined",
        };
        f.write_str(name)
    }
}

impl AppConfig {
    /// Load from a TOML file, apply the `BACKEND_API` override and validate.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: AppConfig = toml::from_str(&contents)?;
        config.apply_backend_override(std::env::var(BACKEND_API_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the configured backend URL. Ignored without a `[frontend]` section.
    pub fn apply_backend_override(&mut self, backend_url: Option<String>) {
        let Some(url) = backend_url.filter(|u| !u.trim().is_empty()) else {
            return;
        };
        if let Some(frontend) = self.frontend.as_mut() {
            frontend.backend_url = Some(url);
        }
    }

    pub fn role(&self) -> ServiceRole {
        match &self.frontend {
            None => ServiceRole::Api,
            Some(f) if f.backend_url.is_some() => ServiceRole::Gateway,
            Some(_) => ServiceRole::Combined,
        }
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.port == 0 {
            return Err(ConfigError::Validation("http.port must be non-zero".to_string()));
        }

        if self.http.tls.mode == TlsMode::Manual
            && (self.http.tls.cert_path.is_none() || self.http.tls.key_path.is_none())
        {
            return Err(ConfigError::Validation(
                "http.tls.mode = \"manual\" requires cert_path and key_path".to_string(),
            ));
        }

        if self.cors.enabled {
            for origin in &self.cors.allowed_origins {
                validate_origin(origin)?;
            }
        }

        if let Some(frontend) = &self.frontend {
            if let Some(url) = &frontend.backend_url {
                validate_backend_url(url)?;
            }
            if frontend.timeout_seconds == 0 {
                return Err(ConfigError::Validation(
                    "frontend.timeout_seconds must be non-zero".to_string(),
                ));
            }
        }

        Ok(())
    }
}

fn validate_origin(origin: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::Validation(format!("Invalid CORS origin: {:?}", origin));

    HeaderValue::from_str(origin).map_err(|_| invalid())?;
    let url = reqwest::Url::parse(origin).map_err(|_| invalid())?;
    // An origin is scheme://host[:port] with nothing after it
    if !matches!(url.scheme(), "http" | "https")
        || url.host_str().is_none()
        || origin.trim_end_matches('/') != origin
        || url.path() != "/"
    {
        return Err(invalid());
    }
    Ok(())
}

fn validate_backend_url(url: &str) -> Result<(), ConfigError> {
    match reqwest::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some() => {
            Ok(())
        }
        _ => Err(ConfigError::Validation(format!(
            "Invalid frontend.backend_url: {:?}",
            url
        ))),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
}

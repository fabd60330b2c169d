//! greeting-api entry point.
//!
//! Loads configuration from a TOML file, initializes tracing, builds the Axum
//! router for the configured role and starts the HTTP server.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use greeting_api::config::{AppConfig, LogFormat, DEFAULT_CONFIG_PATH, DEFAULT_LOG_FILTER};
use greeting_api::http::start_server;
use greeting_api::{create_router, AppState};

/// greeting-api: a greeting endpoint and single-page-app gateway
#[derive(Parser, Debug)]
#[command(name = "greeting-api", version, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Log level filter (e.g., "greeting_api=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,
}

fn init_tracing(filter: &str, format: LogFormat) {
    let registry = tracing_subscriber::registry().with(EnvFilter::new(filter));
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Config comes first since it picks the log format
    let config = AppConfig::load(&args.config)?;

    // Log filter priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
    init_tracing(&log_filter, config.logging.format);

    // Both aws-lc-rs (server TLS) and ring (reqwest) are linked; pick one explicitly
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| "Failed to install rustls crypto provider")?;

    tracing::info!(config = %args.config, role = %config.role(), "Loaded configuration");

    if config.cors.enabled {
        tracing::info!(origins = ?config.cors.allowed_origins, "CORS enabled");
    } else {
        tracing::info!("CORS disabled");
    }

    if let Some(frontend) = &config.frontend {
        tracing::info!(
            dist_dir = %frontend.dist_dir,
            backend_url = frontend.backend_url.as_deref().unwrap_or("(local)"),
            "Frontend configured"
        );
        if !frontend.index_path().is_file() {
            tracing::warn!(
                index = %frontend.index_path().display(),
                "SPA entry document not found; fallback requests will return 404"
            );
        }
    }

    let state = AppState::new(config.clone())?;
    let app = create_router(state);

    start_server(app, &config).await?;

    tracing::info!("Server stopped");
    Ok(())
}

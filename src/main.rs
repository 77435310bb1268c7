use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use axum::http::{HeaderValue, Method, header::CONTENT_TYPE};
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use callstream::providers::{DevGenerationProvider, DevRecognitionProvider};
use callstream::{AppState, ServerConfig, notify::TracingSink, routes};

/// callstream - real-time phone call session server
#[derive(Parser, Debug)]
#[command(name = "callstream")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = if let Some(config_path) = cli.config {
        info!("loading configuration from {}", config_path.display());
        ServerConfig::from_file(&config_path).map_err(|e| anyhow!(e.to_string()))?
    } else {
        ServerConfig::from_env().map_err(|e| anyhow!(e.to_string()))?
    };

    let address = config.address();
    let cors_origins = config.cors_allowed_origins.clone();

    // Offline stand-in providers; vendor bindings slot in through the same
    // traits once credentials are configured.
    let app_state = AppState::new(
        config,
        Arc::new(DevRecognitionProvider::default()),
        Arc::new(DevGenerationProvider),
        Arc::new(TracingSink),
    );

    // Background sweep for sessions whose transport died silently
    app_state.controller.clone().spawn_sweep();

    let cors_layer = if let Some(ref origins) = cors_origins {
        if origins == "*" {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::OPTIONS])
                .allow_headers([CONTENT_TYPE])
        } else {
            let origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::OPTIONS])
                .allow_headers([CONTENT_TYPE])
        }
    } else {
        // No allow_origin means same-origin only
        info!("CORS not configured, defaulting to same-origin only");
        CorsLayer::new()
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE])
    };

    let app = routes::create_router()
        .with_state(app_state)
        .layer(cors_layer);

    let socket_addr: SocketAddr = address
        .parse()
        .map_err(|e| anyhow!("invalid server address '{address}': {e}"))?;

    info!("listening on http://{socket_addr}");
    let listener = TcpListener::bind(&socket_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

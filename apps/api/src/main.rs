mod config;
mod document;
mod errors;
mod extraction;
mod layout;
mod models;
mod routes;
mod session;
mod state;
mod vision_client;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;
use crate::vision_client::VisionClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on unparsable values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting adgen v{}", env!("CARGO_PKG_VERSION"));

    // Initialize vision client
    let vision = VisionClient::new(config.vision_settings())?;
    info!(
        "Vision client initialized (model: {}, {})",
        vision.model(),
        if config.vision_api_token.is_some() {
            "direct"
        } else {
            "relay"
        }
    );

    // Build app state
    let state = AppState::new(config.clone(), vision);
    if state.fonts.is_empty() {
        warn!("AVAILABLE_FONTS is empty; text overrides will fail to load fonts");
    } else {
        info!("Font library: {} font(s)", state.fonts.len());
    }

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the UI host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#![deny(clippy::all)]

mod api;
mod assistant;
mod auth;
mod capture;
mod config;
mod error;
mod export;
mod feed;
mod gemini;
mod hotkeys;
mod meeting;
mod records;
mod session;
mod ui;

use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log to stderr so the terminal UI keeps stdout to itself
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    // Optional .env for local development
    dotenvy::dotenv().ok();

    // Load configuration and pin it for the lifetime of the process
    let loaded = config::load()?;
    config::initialize(loaded);
    let config = config::get()?;
    info!(
        api_base = %config.backend.api_base,
        ws_base = %config.backend.ws_base,
        "Configuration loaded"
    );

    // Warn-only probe so an unreachable backend shows up immediately
    let probe = api::ApiClient::new(&config.backend.api_base)?;
    match probe.health().await {
        Ok(()) => info!("Backend is healthy"),
        Err(e) => warn!("Backend health check failed: {}", e),
    }

    // Capture hotkey; the client stays usable without it
    let (hotkey_tx, hotkey_rx) = tokio::sync::mpsc::channel(8);
    let capture_enabled = match hotkeys::init_hotkeys() {
        Ok(manager) => {
            info!("Global hotkeys initialized successfully");
            hotkeys::start_hotkey_listener(hotkey_tx);

            // Keep hotkey manager alive
            std::mem::forget(manager);
            true
        }
        Err(e) => {
            warn!("Global hotkeys unavailable, capture disabled: {}", e);
            false
        }
    };

    ui::run(config, hotkey_rx, capture_enabled).await
}

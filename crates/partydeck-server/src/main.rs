// Party deck server entry point.
//
// Startup sequence:
// 1. Load config (config/server.toml, PORT override)
// 2. Initialize tracing
// 3. Load the card catalog
// 4. Build shared state (catalog + empty session store)
// 5. Bind the listener and serve until Ctrl+C

use std::path::Path;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use partydeck_core::Catalog;
use partydeck_server::config;
use partydeck_server::server::{self, AppState, ENDPOINTS};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = config::load_config().context("failed to load configuration")?;

    // 2. Initialize tracing
    init_tracing(&config.logging.filter)?;
    info!("Party deck server starting up");

    // 3. Load the card catalog
    let catalog = match &config.catalog.path {
        Some(path) => Catalog::load(Path::new(path))
            .with_context(|| format!("failed to load card catalog from {path}"))?,
        None => Catalog::embedded().context("failed to load the built-in card catalog")?,
    };
    info!(
        "Catalog loaded: {} cards ({})",
        catalog.len(),
        config.catalog.path.as_deref().unwrap_or("built-in deck")
    );

    // 4. Build shared state
    let state = AppState::new(catalog, config.game.recent_exclusion_window);

    // 5. Bind and serve
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    for endpoint in ENDPOINTS {
        info!("  {endpoint}");
    }

    server::serve(listener, state, shutdown_signal()).await?;

    info!("Party deck server shut down cleanly");
    Ok(())
}

/// Resolves on Ctrl+C. Sessions are in memory only, so nothing is flushed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

/// Initialize tracing to stdout. `RUST_LOG` overrides the configured filter.
fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

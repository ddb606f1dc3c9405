use anyhow::Context;
use tracing_subscriber::EnvFilter;

use handbok::{app, AppState};

const DEFAULT_LOG_FILTER: &str = "handbok=info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SUPABASE_*, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = handbok::config::config().clone();
    tracing::info!("Starting Handbok in {:?} mode", config.environment);

    let port = config.server.port;
    let state = AppState::new(config).context("failed to configure database pool")?;

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Handbok listening on http://{}", bind_addr);
    axum::serve(listener, app(state)).await.context("server error")?;
    Ok(())
}

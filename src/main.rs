use std::sync::Arc;

use anyhow::Context;
use tower_http::cors::CorsLayer;
use travel_assistant::{config::AppConfig, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().context("loading configuration")?;
    let state = Arc::new(AppState::new(&config.responder).context("building responder")?);

    if state.responder.is_live() {
        tracing::info!(endpoint = %config.responder.model_endpoint, "model API key configured");
    } else {
        tracing::info!("no model API key configured, serving canned replies");
    }

    let app = routes::create_router(&config.static_dir)
        .with_state(state)
        .layer(CorsLayer::very_permissive());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;

    tracing::info!("travel assistant running at http://{}", config.bind_addr);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

use anyhow::Context;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use chat_relay::{
    config::Config,
    routes,
    services::completion::OpenAiClient,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = Config::from_env().context("failed to load configuration")?;
    if config.openai_api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; every /chat request will fail");
    }

    let client = OpenAiClient::new(&config);
    info!(model = client.model(), api_base = %config.api_base, "completion client ready");

    let state = std::sync::Arc::new(AppState::new(client));

    let app = routes::create_router(&config.static_dir)
        .with_state(state)
        .layer(CorsLayer::very_permissive());

    let addr = config.listen_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("chat relay running at http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}

use anyhow::Context;
use dotenvy::dotenv;
use fren::logging::init_tracing;
use fren::router::init_router;
use fren::state::{AppConfig, init_app_state};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing().context("Failed to create log directory")?;

    let config = AppConfig::from_env();
    let port = config.server.port;

    let state = init_app_state(config).await?;
    state.bootstrap().await?;
    let app = init_router(state)?;

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;
    tracing::info!(port, "Server running on http://localhost:{port}");
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

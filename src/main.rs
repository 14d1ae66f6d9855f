use std::sync::Arc;

use anyhow::Context;
use civic_chat::{config::Config, logging, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    let cfg = Config::from_env().context("failed to load configuration")?;
    let addr = cfg.bind_addr();
    let mode = cfg.mode;
    let state = Arc::new(AppState::new(cfg));

    let app = routes::create_router(mode).with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(?mode, "chat proxy listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use log_explorer::core;
use log_explorer::server;
use log_explorer::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let state = AppState::initialize().await?;
    core::logging::init(&state.paths);

    let probe = state.clone();
    tokio::spawn(async move {
        let llm = probe.rag.llm();
        match llm.health_check().await {
            Ok(true) => tracing::info!("LLM provider '{}' is reachable", llm.name()),
            Ok(false) => tracing::warn!("LLM provider '{}' is not reachable", llm.name()),
            Err(err) => tracing::warn!("LLM provider '{}' health check failed: {}", llm.name(), err),
        }
    });

    let bind_addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    println!("LOG_EXPLORER_ADDR={}", addr);
    tracing::info!("Listening on {}", addr);

    let app: Router = server::router::router(state.clone());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use docchat_backend::core::config::AppPaths;
use docchat_backend::core::logging;
use docchat_backend::server;
use docchat_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let paths = std::sync::Arc::new(AppPaths::new());
    logging::init(&paths).context("Failed to initialize logging")?;

    let state = AppState::initialize_with_paths(paths)?;

    let bind_addr = format!(
        "{}:{}",
        state.settings.server.host, state.settings.server.port
    );
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    tracing::info!(
        "Listening on {} (chat model {}, index {})",
        addr,
        state.settings.llm.chat_model,
        state.settings.retrieval.index_host.as_deref().unwrap_or("-")
    );

    let app: Router = server::router::router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

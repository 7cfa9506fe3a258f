use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let llm_healthy = state.llm.health_check().await.unwrap_or(false);
    let settings = &state.settings;
    Json(json!({
        "llm": {
            "provider": state.llm.name(),
            "healthy": llm_healthy,
            "chat_model": settings.llm.chat_model,
            "embedding_model": settings.llm.embedding_model,
        },
        "retrieval": {
            "backend": state.retriever.name(),
            "index_host": settings.retrieval.index_host,
            "top_k": settings.retrieval.top_k,
        },
        "chat": {
            "history_window": settings.history_window,
            "empty_passages": settings.empty_passages,
        },
        "degraded": !llm_healthy,
    }))
}

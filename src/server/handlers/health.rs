use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let llm = state.rag.llm();
    let llm_reachable = match llm.health_check().await {
        Ok(reachable) => reachable,
        Err(err) => {
            tracing::debug!("LLM health check failed: {}", err);
            false
        }
    };

    Json(json!({
        "indexed_entries": state.rag.indexed_count().await,
        "stored_entries": state.logs.snapshot().await.len(),
        "llm_provider": llm.name(),
        "llm_reachable": llm_reachable,
        "top_k": state.rag.settings().top_k,
    }))
}

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
}

impl ChatRequest {
    fn query(&self) -> Result<&str, ApiError> {
        let query = self.query.trim();
        if query.is_empty() {
            return Err(ApiError::BadRequest("Query must not be empty".to_string()));
        }
        Ok(query)
    }
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.rag.answer(payload.query()?).await?;
    Ok(Json(json!({
        "answer": response.text,
        "context": response.evidence,
    })))
}

pub async fn chat_trace(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let trace = state.rag.answer_with_trace(payload.query()?).await?;
    Ok(Json(trace))
}

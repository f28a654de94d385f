use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// POST /chat
///
/// Forwards `message` verbatim and responds with the completion text as a JSON string.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<String>, AppError> {
    let text = state.completer.complete(&request.message).await?;
    Ok(Json(text))
}

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::chat::router::{ChatReply, IntentRouter};
use crate::errors::AppError;
use crate::models::chat::ChatHistoryEntry;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub user_id: Uuid,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Serialize)]
pub struct ChatHistoryMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Flattens stored exchanges into alternating user / assistant messages.
pub fn interleave_history(entries: Vec<ChatHistoryEntry>) -> Vec<ChatHistoryMessage> {
    entries
        .into_iter()
        .flat_map(|entry| {
            [
                ChatHistoryMessage {
                    role: ChatRole::User,
                    content: entry.message,
                    timestamp: entry.timestamp,
                },
                ChatHistoryMessage {
                    role: ChatRole::Assistant,
                    content: entry.response,
                    timestamp: entry.timestamp,
                },
            ]
        })
        .collect()
}

/// POST /chat
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>, AppError> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(AppError::Validation("message cannot be empty".to_string()));
    }

    let inventory = state.store.inventory(request.user_id).await?;

    let reply = IntentRouter::new(state.intents.as_ref(), state.store.as_ref())
        .route(request.user_id, message, &inventory)
        .await?;

    Ok(Json(reply))
}

/// GET /chat/history/:user_id
pub async fn handle_chat_history(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<ChatHistoryMessage>>, AppError> {
    let entries = state.store.chat_history(user_id).await?;
    Ok(Json(interleave_history(entries)))
}

#[derive(Debug, Serialize)]
pub struct HistoryCleared {
    pub deleted: u64,
}

/// DELETE /chat/history/:user_id
pub async fn handle_clear_chat_history(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<HistoryCleared>, AppError> {
    let deleted = state.store.clear_chat_history(user_id).await?;
    info!(%user_id, deleted, "Chat history cleared");
    Ok(Json(HistoryCleared { deleted }))
}

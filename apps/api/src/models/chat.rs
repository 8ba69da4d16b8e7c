use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One exchange: what the user said and what the assistant answered.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatHistoryEntry {
    pub id: i32,
    pub user_id: Uuid,
    pub message: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

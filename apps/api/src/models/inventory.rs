use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct InventoryItem {
    pub id: i32,
    pub user_id: Uuid,
    pub ingredient_name: String,
    pub amount: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

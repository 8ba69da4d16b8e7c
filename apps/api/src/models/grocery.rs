use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroceryListRow {
    pub id: i32,
    pub user_id: Uuid,
    pub name: String,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct GroceryItemRow {
    pub id: i32,
    pub list_id: i32,
    pub position: i32,
    pub name: String,
    pub amount: Option<String>,
    pub category: String,
    pub is_checked: bool,
}

/// A list with its items, in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroceryListDetail {
    #[serde(flatten)]
    pub list: GroceryListRow,
    pub items: Vec<GroceryItemRow>,
}

// Write shapes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGroceryItem {
    pub name: String,
    #[serde(default)]
    pub amount: Option<String>,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGroceryList {
    pub name: String,
    pub items: Vec<NewGroceryItem>,
}

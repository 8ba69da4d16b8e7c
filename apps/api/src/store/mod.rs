//! Persistence store.
//!
//! `AppState` holds an `Arc<dyn Store>`. `PgStore` is the production backend;
//! `MemoryStore` backs unit tests. Every method that writes more than one row runs
//! as a single transaction.
//!
//! Users are created lazily: every write scoped to a user first inserts the user
//! row (if absent) inside the same transaction, so a request that fails before
//! writing leaves no user behind.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::inventory::reconcile::InventoryOp;
use crate::models::chat::ChatHistoryEntry;
use crate::models::grocery::{GroceryListDetail, NewGroceryList};
use crate::models::inventory::InventoryItem;
use crate::models::recipe::{NewRecipe, RecipeDetail};

/// The chat row appended at the end of a routed turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatLine {
    pub message: String,
    pub response: String,
}

/// Everything one chat turn writes. Committed atomically by `Store::commit_turn`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnWrites {
    pub recipe: Option<NewRecipe>,
    pub inventory_ops: Vec<InventoryOp>,
    pub chat: Option<ChatLine>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnReceipt {
    pub recipe_id: Option<i32>,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Current inventory ordered by ingredient name.
    async fn inventory(&self, user_id: Uuid) -> Result<Vec<InventoryItem>, AppError>;

    /// Applies all operations as one unit and returns the resulting inventory.
    async fn apply_inventory_ops(
        &self,
        user_id: Uuid,
        ops: &[InventoryOp],
    ) -> Result<Vec<InventoryItem>, AppError>;

    async fn delete_inventory_item(&self, item_id: i32) -> Result<bool, AppError>;

    /// Inserts the recipe with its ingredients and steps; returns the new id.
    /// An owner is registered in the same transaction.
    async fn create_recipe(&self, owner: Option<Uuid>, recipe: &NewRecipe)
        -> Result<i32, AppError>;

    async fn get_recipe(&self, recipe_id: i32) -> Result<Option<RecipeDetail>, AppError>;

    async fn list_recipes(&self) -> Result<Vec<RecipeDetail>, AppError>;

    async fn delete_recipe(&self, recipe_id: i32) -> Result<bool, AppError>;

    /// Most recent chat row for the user, if any.
    async fn latest_chat(&self, user_id: Uuid) -> Result<Option<ChatHistoryEntry>, AppError>;

    /// All chat rows for the user, oldest first.
    async fn chat_history(&self, user_id: Uuid) -> Result<Vec<ChatHistoryEntry>, AppError>;

    /// Deletes every chat row of the user; returns how many were removed.
    async fn clear_chat_history(&self, user_id: Uuid) -> Result<u64, AppError>;

    /// Commits a routed chat turn. The user is registered even when `writes` is
    /// empty.
    async fn commit_turn(&self, user_id: Uuid, writes: TurnWrites)
        -> Result<TurnReceipt, AppError>;

    /// The user's grocery lists, newest first.
    async fn grocery_lists(&self, user_id: Uuid) -> Result<Vec<GroceryListDetail>, AppError>;

    async fn get_grocery_list(&self, list_id: i32) -> Result<Option<GroceryListDetail>, AppError>;

    /// Inserts the list with its items; returns the new id.
    async fn create_grocery_list(
        &self,
        user_id: Uuid,
        list: &NewGroceryList,
    ) -> Result<i32, AppError>;

    async fn delete_grocery_list(&self, list_id: i32) -> Result<bool, AppError>;
}

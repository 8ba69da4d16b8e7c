//! In-memory store for tests.
//!
//! Mirrors `PgStore` semantics: ids are assigned sequentially, inventory is
//! returned ordered by lower-cased name, users are registered by the first write
//! that needs them, and every batch is applied to a copy of the state that only
//! replaces the original once the whole batch succeeded.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::errors::AppError;
use crate::inventory::reconcile::InventoryOp;
use crate::models::chat::ChatHistoryEntry;
use crate::models::grocery::{GroceryItemRow, GroceryListDetail, GroceryListRow, NewGroceryList};
use crate::models::inventory::InventoryItem;
use crate::models::recipe::{IngredientRow, NewRecipe, RecipeDetail, RecipeRow, StepRow};
use crate::models::user::default_username;
use crate::store::{Store, TurnReceipt, TurnWrites};

#[derive(Debug, Clone, Default)]
struct State {
    /// id → username
    users: HashMap<Uuid, String>,
    recipes: Vec<RecipeDetail>,
    inventory: Vec<InventoryItem>,
    chat: Vec<ChatHistoryEntry>,
    grocery_lists: Vec<GroceryListDetail>,
    next_id: i32,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn register_user(&mut self, user_id: Uuid) {
        self.users
            .entry(user_id)
            .or_insert_with(|| default_username(user_id));
    }

    fn insert_recipe(&mut self, owner: Option<Uuid>, recipe: &NewRecipe) -> i32 {
        let recipe_id = self.next_id();
        let ingredients = recipe
            .ingredients
            .iter()
            .enumerate()
            .map(|(position, ingredient)| IngredientRow {
                id: self.next_id(),
                recipe_id,
                position: position as i32,
                name: ingredient.name.clone(),
                amount: ingredient.amount.clone(),
            })
            .collect();
        let steps = recipe
            .steps
            .iter()
            .map(|step| StepRow {
                id: self.next_id(),
                recipe_id,
                step_number: step.step_number,
                instruction: step.instruction.clone(),
            })
            .collect();
        self.recipes.push(RecipeDetail {
            recipe: RecipeRow {
                id: recipe_id,
                user_id: owner,
                title: recipe.title.clone(),
                description: recipe.description.clone(),
                servings: recipe.servings.clone(),
                tools: recipe.tool_names(),
                methods: recipe.method_names(),
                keywords: recipe.keywords.clone(),
                created_at: Utc::now(),
            },
            ingredients,
            steps,
        });
        recipe_id
    }

    fn apply_ops(&mut self, user_id: Uuid, ops: &[InventoryOp]) {
        for op in ops {
            match op {
                InventoryOp::Insert {
                    name,
                    amount,
                    expires_at,
                } => {
                    let id = self.next_id();
                    self.inventory.push(InventoryItem {
                        id,
                        user_id,
                        ingredient_name: name.clone(),
                        amount: amount.clone(),
                        expires_at: *expires_at,
                    });
                }
                InventoryOp::Update {
                    id,
                    name,
                    amount,
                    expires_at,
                } => {
                    if let Some(item) = self
                        .inventory
                        .iter_mut()
                        .find(|i| i.id == *id && i.user_id == user_id)
                    {
                        item.ingredient_name = name.clone();
                        item.amount = amount.clone();
                        if expires_at.is_some() {
                            item.expires_at = *expires_at;
                        }
                    }
                }
                InventoryOp::Delete { id } => {
                    self.inventory
                        .retain(|i| !(i.id == *id && i.user_id == user_id));
                }
            }
        }
    }

    /// Same order as `ORDER BY lower(ingredient_name), id`.
    fn inventory_for(&self, user_id: Uuid) -> Vec<InventoryItem> {
        let mut items: Vec<InventoryItem> = self
            .inventory
            .iter()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.ingredient_name
                .to_lowercase()
                .cmp(&b.ingredient_name.to_lowercase())
                .then(a.id.cmp(&b.id))
        });
        items
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose transactional writes run to completion and then fail, so
    /// tests can check nothing was kept.
    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn has_user(&self, user_id: Uuid) -> bool {
        self.state.lock().unwrap().users.contains_key(&user_id)
    }

    pub fn chat_rows(&self, user_id: Uuid) -> Vec<ChatHistoryEntry> {
        let state = self.state.lock().unwrap();
        state
            .chat
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn recipe_count(&self) -> usize {
        self.state.lock().unwrap().recipes.len()
    }

    pub fn seed_chat(&self, user_id: Uuid, message: &str, response: &str) {
        let mut state = self.state.lock().unwrap();
        state.register_user(user_id);
        let id = state.next_id();
        state.chat.push(ChatHistoryEntry {
            id,
            user_id,
            message: message.to_string(),
            response: response.to_string(),
            timestamp: Utc::now(),
        });
    }

    /// Runs `f` against a copy of the state and keeps the copy only on success.
    fn transact<T>(&self, f: impl FnOnce(&mut State) -> Result<T, AppError>) -> Result<T, AppError> {
        let mut guard = self.state.lock().unwrap();
        let mut draft = guard.clone();
        let out = f(&mut draft)?;
        if self.fail_writes {
            return Err(AppError::Internal(anyhow::anyhow!("write failed")));
        }
        *guard = draft;
        Ok(out)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn inventory(&self, user_id: Uuid) -> Result<Vec<InventoryItem>, AppError> {
        Ok(self.state.lock().unwrap().inventory_for(user_id))
    }

    async fn apply_inventory_ops(
        &self,
        user_id: Uuid,
        ops: &[InventoryOp],
    ) -> Result<Vec<InventoryItem>, AppError> {
        self.transact(|state| {
            state.register_user(user_id);
            state.apply_ops(user_id, ops);
            Ok(state.inventory_for(user_id))
        })
    }

    async fn delete_inventory_item(&self, item_id: i32) -> Result<bool, AppError> {
        self.transact(|state| {
            let before = state.inventory.len();
            state.inventory.retain(|i| i.id != item_id);
            Ok(state.inventory.len() != before)
        })
    }

    async fn create_recipe(
        &self,
        owner: Option<Uuid>,
        recipe: &NewRecipe,
    ) -> Result<i32, AppError> {
        self.transact(|state| {
            if let Some(owner) = owner {
                state.register_user(owner);
            }
            Ok(state.insert_recipe(owner, recipe))
        })
    }

    async fn get_recipe(&self, recipe_id: i32) -> Result<Option<RecipeDetail>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .recipes
            .iter()
            .find(|r| r.recipe.id == recipe_id)
            .cloned())
    }

    async fn list_recipes(&self) -> Result<Vec<RecipeDetail>, AppError> {
        Ok(self.state.lock().unwrap().recipes.clone())
    }

    async fn delete_recipe(&self, recipe_id: i32) -> Result<bool, AppError> {
        self.transact(|state| {
            let before = state.recipes.len();
            state.recipes.retain(|r| r.recipe.id != recipe_id);
            Ok(state.recipes.len() != before)
        })
    }

    async fn latest_chat(&self, user_id: Uuid) -> Result<Option<ChatHistoryEntry>, AppError> {
        Ok(self.chat_history(user_id).await?.pop())
    }

    async fn chat_history(&self, user_id: Uuid) -> Result<Vec<ChatHistoryEntry>, AppError> {
        let mut rows = self.chat_rows(user_id);
        rows.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn clear_chat_history(&self, user_id: Uuid) -> Result<u64, AppError> {
        self.transact(|state| {
            let before = state.chat.len();
            state.chat.retain(|c| c.user_id != user_id);
            Ok((before - state.chat.len()) as u64)
        })
    }

    async fn commit_turn(
        &self,
        user_id: Uuid,
        writes: TurnWrites,
    ) -> Result<TurnReceipt, AppError> {
        self.transact(|state| {
            state.register_user(user_id);
            let recipe_id = writes
                .recipe
                .as_ref()
                .map(|recipe| state.insert_recipe(Some(user_id), recipe));
            state.apply_ops(user_id, &writes.inventory_ops);
            if let Some(chat) = &writes.chat {
                let id = state.next_id();
                state.chat.push(ChatHistoryEntry {
                    id,
                    user_id,
                    message: chat.message.clone(),
                    response: chat.response.clone(),
                    timestamp: Utc::now(),
                });
            }
            Ok(TurnReceipt { recipe_id })
        })
    }

    async fn grocery_lists(&self, user_id: Uuid) -> Result<Vec<GroceryListDetail>, AppError> {
        let state = self.state.lock().unwrap();
        let mut lists: Vec<GroceryListDetail> = state
            .grocery_lists
            .iter()
            .filter(|l| l.list.user_id == user_id)
            .cloned()
            .collect();
        lists.sort_by(|a, b| b.list.id.cmp(&a.list.id));
        Ok(lists)
    }

    async fn get_grocery_list(&self, list_id: i32) -> Result<Option<GroceryListDetail>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .grocery_lists
            .iter()
            .find(|l| l.list.id == list_id)
            .cloned())
    }

    async fn create_grocery_list(
        &self,
        user_id: Uuid,
        list: &NewGroceryList,
    ) -> Result<i32, AppError> {
        self.transact(|state| {
            state.register_user(user_id);
            let list_id = state.next_id();
            let items = list
                .items
                .iter()
                .enumerate()
                .map(|(position, item)| GroceryItemRow {
                    id: state.next_id(),
                    list_id,
                    position: position as i32,
                    name: item.name.clone(),
                    amount: item.amount.clone(),
                    category: item.category.clone(),
                    is_checked: false,
                })
                .collect();
            state.grocery_lists.push(GroceryListDetail {
                list: GroceryListRow {
                    id: list_id,
                    user_id,
                    name: list.name.clone(),
                    is_completed: false,
                    created_at: Utc::now(),
                },
                items,
            });
            Ok(list_id)
        })
    }

    async fn delete_grocery_list(&self, list_id: i32) -> Result<bool, AppError> {
        self.transact(|state| {
            let before = state.grocery_lists.len();
            state.grocery_lists.retain(|l| l.list.id != list_id);
            Ok(state.grocery_lists.len() != before)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::recipe::NewIngredient;
    use crate::store::ChatLine;

    #[tokio::test]
    async fn test_failed_turn_leaves_no_partial_writes() {
        let store = MemoryStore::failing_writes();
        let user = Uuid::new_v4();

        let result = store
            .commit_turn(
                user,
                TurnWrites {
                    recipe: Some(NewRecipe {
                        title: "Soup".into(),
                        ingredients: vec![NewIngredient {
                            name: "leek".into(),
                            amount: None,
                        }],
                        ..NewRecipe::default()
                    }),
                    chat: Some(ChatLine {
                        message: "hi".into(),
                        response: "hello".into(),
                    }),
                    ..TurnWrites::default()
                },
            )
            .await;

        assert!(result.is_err());
        assert!(store.chat_rows(user).is_empty());
        assert_eq!(store.recipe_count(), 0);
        assert!(!store.has_user(user));
    }

    #[tokio::test]
    async fn test_first_write_registers_user() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        assert!(!store.has_user(user));

        store.apply_inventory_ops(user, &[]).await.unwrap();

        assert!(store.has_user(user));
    }

    #[tokio::test]
    async fn test_inventory_sorted_like_lower_name() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let ops: Vec<InventoryOp> = ["onion", "Apple", "banana", " zucchini"]
            .iter()
            .map(|name| InventoryOp::Insert {
                name: name.to_string(),
                amount: None,
                expires_at: None,
            })
            .collect();

        let items = store.apply_inventory_ops(user, &ops).await.unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.ingredient_name.as_str()).collect();
        // Leading whitespace is not trimmed for ordering.
        assert_eq!(names, vec![" zucchini", "Apple", "banana", "onion"]);
    }

    #[tokio::test]
    async fn test_clear_chat_history_only_touches_one_user() {
        let store = MemoryStore::new();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        store.seed_chat(alice, "a", "1");
        store.seed_chat(alice, "b", "2");
        store.seed_chat(bob, "c", "3");

        assert_eq!(store.clear_chat_history(alice).await.unwrap(), 2);
        assert!(store.chat_rows(alice).is_empty());
        assert_eq!(store.chat_rows(bob).len(), 1);
    }
}

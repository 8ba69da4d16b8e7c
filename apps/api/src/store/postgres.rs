use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::inventory::reconcile::InventoryOp;
use crate::models::chat::ChatHistoryEntry;
use crate::models::grocery::{GroceryItemRow, GroceryListDetail, GroceryListRow, NewGroceryList};
use crate::models::inventory::InventoryItem;
use crate::models::recipe::{IngredientRow, NewRecipe, RecipeDetail, RecipeRow, StepRow};
use crate::models::user::default_username;
use crate::store::{Store, TurnReceipt, TurnWrites};

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn register_user(conn: &mut PgConnection, user_id: Uuid) -> Result<(), sqlx::Error> {
    let inserted = sqlx::query(
        "INSERT INTO users (id, username) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING",
    )
    .bind(user_id)
    .bind(default_username(user_id))
    .execute(&mut *conn)
    .await?;

    if inserted.rows_affected() > 0 {
        info!("Created user {user_id}");
    }
    Ok(())
}

async fn insert_recipe(
    conn: &mut PgConnection,
    owner: Option<Uuid>,
    recipe: &NewRecipe,
) -> Result<i32, sqlx::Error> {
    let recipe_id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO recipes (user_id, title, description, servings, tools, methods, keywords)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(owner)
    .bind(&recipe.title)
    .bind(&recipe.description)
    .bind(&recipe.servings)
    .bind(recipe.tool_names())
    .bind(recipe.method_names())
    .bind(&recipe.keywords)
    .fetch_one(&mut *conn)
    .await?;

    for (position, ingredient) in recipe.ingredients.iter().enumerate() {
        sqlx::query(
            "INSERT INTO ingredients (recipe_id, position, name, amount) VALUES ($1, $2, $3, $4)",
        )
        .bind(recipe_id)
        .bind(position as i32)
        .bind(&ingredient.name)
        .bind(&ingredient.amount)
        .execute(&mut *conn)
        .await?;
    }

    for step in &recipe.steps {
        sqlx::query(
            "INSERT INTO steps (recipe_id, step_number, instruction) VALUES ($1, $2, $3)",
        )
        .bind(recipe_id)
        .bind(step.step_number)
        .bind(&step.instruction)
        .execute(&mut *conn)
        .await?;
    }

    info!(
        "Inserted recipe {recipe_id} '{}' with {} ingredients and {} steps",
        recipe.title,
        recipe.ingredients.len(),
        recipe.steps.len()
    );
    Ok(recipe_id)
}

async fn apply_ops(
    conn: &mut PgConnection,
    user_id: Uuid,
    ops: &[InventoryOp],
) -> Result<(), sqlx::Error> {
    for op in ops {
        match op {
            InventoryOp::Insert {
                name,
                amount,
                expires_at,
            } => {
                sqlx::query(
                    r#"
                    INSERT INTO inventory (user_id, ingredient_name, amount, expires_at)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(user_id)
                .bind(name)
                .bind(amount)
                .bind(expires_at)
                .execute(&mut *conn)
                .await?;
            }
            InventoryOp::Update {
                id,
                name,
                amount,
                expires_at,
            } => {
                sqlx::query(
                    r#"
                    UPDATE inventory
                    SET ingredient_name = $1,
                        amount = $2,
                        expires_at = COALESCE($3, expires_at)
                    WHERE id = $4 AND user_id = $5
                    "#,
                )
                .bind(name)
                .bind(amount)
                .bind(expires_at)
                .bind(id)
                .bind(user_id)
                .execute(&mut *conn)
                .await?;
            }
            InventoryOp::Delete { id } => {
                sqlx::query("DELETE FROM inventory WHERE id = $1 AND user_id = $2")
                    .bind(id)
                    .bind(user_id)
                    .execute(&mut *conn)
                    .await?;
            }
        }
    }
    Ok(())
}

async fn fetch_inventory(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Vec<InventoryItem>, sqlx::Error> {
    sqlx::query_as::<_, InventoryItem>(
        r#"
        SELECT id, user_id, ingredient_name, amount, expires_at
        FROM inventory
        WHERE user_id = $1
        ORDER BY lower(ingredient_name) COLLATE "C", id
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await
}

impl PgStore {
    async fn attach_children(&self, rows: Vec<RecipeRow>) -> Result<Vec<RecipeDetail>, AppError> {
        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();

        let ingredients = sqlx::query_as::<_, IngredientRow>(
            "SELECT * FROM ingredients WHERE recipe_id = ANY($1) ORDER BY recipe_id, position",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let steps = sqlx::query_as::<_, StepRow>(
            "SELECT * FROM steps WHERE recipe_id = ANY($1) ORDER BY recipe_id, step_number",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut ingredients_by_recipe: HashMap<i32, Vec<IngredientRow>> = HashMap::new();
        for ingredient in ingredients {
            ingredients_by_recipe
                .entry(ingredient.recipe_id)
                .or_default()
                .push(ingredient);
        }
        let mut steps_by_recipe: HashMap<i32, Vec<StepRow>> = HashMap::new();
        for step in steps {
            steps_by_recipe.entry(step.recipe_id).or_default().push(step);
        }

        Ok(rows
            .into_iter()
            .map(|recipe| RecipeDetail {
                ingredients: ingredients_by_recipe.remove(&recipe.id).unwrap_or_default(),
                steps: steps_by_recipe.remove(&recipe.id).unwrap_or_default(),
                recipe,
            })
            .collect())
    }
}

impl PgStore {
    async fn attach_items(
        &self,
        lists: Vec<GroceryListRow>,
    ) -> Result<Vec<GroceryListDetail>, AppError> {
        let ids: Vec<i32> = lists.iter().map(|l| l.id).collect();

        let items = sqlx::query_as::<_, GroceryItemRow>(
            "SELECT * FROM grocery_items WHERE list_id = ANY($1) ORDER BY list_id, position",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_list: HashMap<i32, Vec<GroceryItemRow>> = HashMap::new();
        for item in items {
            items_by_list.entry(item.list_id).or_default().push(item);
        }

        Ok(lists
            .into_iter()
            .map(|list| GroceryListDetail {
                items: items_by_list.remove(&list.id).unwrap_or_default(),
                list,
            })
            .collect())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn inventory(&self, user_id: Uuid) -> Result<Vec<InventoryItem>, AppError> {
        let mut conn = self.pool.acquire().await?;
        Ok(fetch_inventory(&mut conn, user_id).await?)
    }

    async fn apply_inventory_ops(
        &self,
        user_id: Uuid,
        ops: &[InventoryOp],
    ) -> Result<Vec<InventoryItem>, AppError> {
        let mut tx = self.pool.begin().await?;
        register_user(&mut tx, user_id).await?;
        apply_ops(&mut tx, user_id, ops).await?;
        let inventory = fetch_inventory(&mut tx, user_id).await?;
        tx.commit().await?;

        info!(
            "Applied {} inventory operations for user {user_id}",
            ops.len()
        );
        Ok(inventory)
    }

    async fn delete_inventory_item(&self, item_id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM inventory WHERE id = $1")
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_recipe(
        &self,
        owner: Option<Uuid>,
        recipe: &NewRecipe,
    ) -> Result<i32, AppError> {
        let mut tx = self.pool.begin().await?;
        if let Some(owner) = owner {
            register_user(&mut tx, owner).await?;
        }
        let recipe_id = insert_recipe(&mut tx, owner, recipe).await?;
        tx.commit().await?;
        Ok(recipe_id)
    }

    async fn get_recipe(&self, recipe_id: i32) -> Result<Option<RecipeDetail>, AppError> {
        let row = sqlx::query_as::<_, RecipeRow>("SELECT * FROM recipes WHERE id = $1")
            .bind(recipe_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.attach_children(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_recipes(&self) -> Result<Vec<RecipeDetail>, AppError> {
        let rows = sqlx::query_as::<_, RecipeRow>("SELECT * FROM recipes ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        self.attach_children(rows).await
    }

    async fn delete_recipe(&self, recipe_id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(recipe_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn latest_chat(&self, user_id: Uuid) -> Result<Option<ChatHistoryEntry>, AppError> {
        Ok(sqlx::query_as::<_, ChatHistoryEntry>(
            r#"
            SELECT * FROM chat_history
            WHERE user_id = $1
            ORDER BY timestamp DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn chat_history(&self, user_id: Uuid) -> Result<Vec<ChatHistoryEntry>, AppError> {
        Ok(sqlx::query_as::<_, ChatHistoryEntry>(
            "SELECT * FROM chat_history WHERE user_id = $1 ORDER BY timestamp ASC, id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn clear_chat_history(&self, user_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM chat_history WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        info!("Cleared {} chat rows for user {user_id}", result.rows_affected());
        Ok(result.rows_affected())
    }

    async fn commit_turn(
        &self,
        user_id: Uuid,
        writes: TurnWrites,
    ) -> Result<TurnReceipt, AppError> {
        let mut tx = self.pool.begin().await?;
        register_user(&mut tx, user_id).await?;

        let recipe_id = match &writes.recipe {
            Some(recipe) => Some(insert_recipe(&mut tx, Some(user_id), recipe).await?),
            None => None,
        };

        apply_ops(&mut tx, user_id, &writes.inventory_ops).await?;

        if let Some(chat) = &writes.chat {
            sqlx::query("INSERT INTO chat_history (user_id, message, response) VALUES ($1, $2, $3)")
                .bind(user_id)
                .bind(&chat.message)
                .bind(&chat.response)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(TurnReceipt { recipe_id })
    }

    async fn grocery_lists(&self, user_id: Uuid) -> Result<Vec<GroceryListDetail>, AppError> {
        let lists = sqlx::query_as::<_, GroceryListRow>(
            "SELECT * FROM grocery_lists WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        self.attach_items(lists).await
    }

    async fn get_grocery_list(&self, list_id: i32) -> Result<Option<GroceryListDetail>, AppError> {
        let row = sqlx::query_as::<_, GroceryListRow>("SELECT * FROM grocery_lists WHERE id = $1")
            .bind(list_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.attach_items(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn create_grocery_list(
        &self,
        user_id: Uuid,
        list: &NewGroceryList,
    ) -> Result<i32, AppError> {
        let mut tx = self.pool.begin().await?;
        register_user(&mut tx, user_id).await?;

        let list_id: i32 = sqlx::query_scalar(
            "INSERT INTO grocery_lists (user_id, name) VALUES ($1, $2) RETURNING id",
        )
        .bind(user_id)
        .bind(&list.name)
        .fetch_one(&mut *tx)
        .await?;

        for (position, item) in list.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO grocery_items (list_id, position, name, amount, category)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(list_id)
            .bind(position as i32)
            .bind(&item.name)
            .bind(&item.amount)
            .bind(&item.category)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(
            "Created grocery list {list_id} '{}' with {} items for user {user_id}",
            list.name,
            list.items.len()
        );
        Ok(list_id)
    }

    async fn delete_grocery_list(&self, list_id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM grocery_lists WHERE id = $1")
            .bind(list_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::grocery::build::{
    from_missing, grocery_item, merge_recipe_ingredients, DEFAULT_LIST_NAME,
};
use crate::models::grocery::{GroceryListDetail, NewGroceryItem, NewGroceryList};
use crate::recipes::pantry::check_availability;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListsQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct GroceryItemRequest {
    pub name: String,
    #[serde(default)]
    pub amount: Option<String>,
    /// Derived from the name when absent.
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub items: Vec<GroceryItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct FromRecipesRequest {
    pub user_id: Uuid,
    pub recipe_ids: Vec<i32>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FromMissingRequest {
    pub user_id: Uuid,
}

fn list_name(name: Option<String>) -> String {
    name.map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_LIST_NAME.to_string())
}

async fn save_list(
    state: &AppState,
    user_id: Uuid,
    list: NewGroceryList,
) -> Result<(StatusCode, Json<GroceryListDetail>), AppError> {
    let list_id = state.store.create_grocery_list(user_id, &list).await?;

    let detail = state
        .store
        .get_grocery_list(list_id)
        .await?
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("grocery list {list_id} missing after insert"))
        })?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /grocery-lists?user_id=
pub async fn handle_list_grocery_lists(
    State(state): State<AppState>,
    Query(params): Query<ListsQuery>,
) -> Result<Json<Vec<GroceryListDetail>>, AppError> {
    Ok(Json(state.store.grocery_lists(params.user_id).await?))
}

/// POST /grocery-lists
pub async fn handle_create_grocery_list(
    State(state): State<AppState>,
    Json(request): Json<CreateListRequest>,
) -> Result<(StatusCode, Json<GroceryListDetail>), AppError> {
    let mut items = Vec::with_capacity(request.items.len());
    for item in request.items {
        if item.name.trim().is_empty() {
            return Err(AppError::Validation("item name cannot be empty".to_string()));
        }
        items.push(match item.category {
            Some(category) => NewGroceryItem {
                name: item.name.trim().to_string(),
                amount: item.amount,
                category,
            },
            None => grocery_item(&item.name, item.amount),
        });
    }

    let list = NewGroceryList {
        name: list_name(request.name),
        items,
    };
    save_list(&state, request.user_id, list).await
}

/// GET /grocery-lists/:id
pub async fn handle_get_grocery_list(
    State(state): State<AppState>,
    Path(list_id): Path<i32>,
) -> Result<Json<GroceryListDetail>, AppError> {
    state
        .store
        .get_grocery_list(list_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Grocery list {list_id} not found")))
}

/// DELETE /grocery-lists/:id
pub async fn handle_delete_grocery_list(
    State(state): State<AppState>,
    Path(list_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    if state.store.delete_grocery_list(list_id).await? {
        info!(list_id, "Grocery list deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Grocery list {list_id} not found")))
    }
}

/// POST /grocery-lists/from-recipes
///
/// One list covering every ingredient of the given recipes, with repeated
/// ingredients merged into a single line.
pub async fn handle_list_from_recipes(
    State(state): State<AppState>,
    Json(request): Json<FromRecipesRequest>,
) -> Result<(StatusCode, Json<GroceryListDetail>), AppError> {
    if request.recipe_ids.is_empty() {
        return Err(AppError::Validation("recipe_ids cannot be empty".to_string()));
    }

    let mut recipes = Vec::with_capacity(request.recipe_ids.len());
    for recipe_id in &request.recipe_ids {
        let recipe = state
            .store
            .get_recipe(*recipe_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Recipe {recipe_id} not found")))?;
        recipes.push(recipe);
    }

    let list = NewGroceryList {
        name: list_name(request.name),
        items: merge_recipe_ingredients(&recipes),
    };
    save_list(&state, request.user_id, list).await
}

/// POST /recipes/:id/grocery-list
///
/// Lists what the user is missing for a recipe, checked against their inventory.
pub async fn handle_list_from_missing(
    State(state): State<AppState>,
    Path(recipe_id): Path<i32>,
    Json(request): Json<FromMissingRequest>,
) -> Result<(StatusCode, Json<GroceryListDetail>), AppError> {
    let recipe = state
        .store
        .get_recipe(recipe_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe {recipe_id} not found")))?;
    let inventory = state.store.inventory(request.user_id).await?;

    let availability = check_availability(&recipe.ingredients, &inventory);
    if availability.has_all_ingredients {
        return Err(AppError::Validation(
            "every ingredient is already in stock".to_string(),
        ));
    }

    let list = from_missing(&recipe.recipe.title, &availability.missing);
    save_list(&state, request.user_id, list).await
}

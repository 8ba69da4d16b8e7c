use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::chat::router::RECIPE_SAVED_MESSAGE;
use crate::errors::AppError;
use crate::intent::RawRecipe;
use crate::models::inventory::InventoryItem;
use crate::models::recipe::RecipeDetail;
use crate::recipes::normalize::normalize_recipe;
use crate::recipes::pantry::{check_availability, plan_cook, Availability};
use crate::recipes::search::search_recipes;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RecipeCreated {
    pub message: String,
    pub recipe_id: i32,
}

impl RecipeCreated {
    fn new(recipe_id: i32) -> Self {
        Self {
            message: RECIPE_SAVED_MESSAGE.to_string(),
            recipe_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct ProcessRecipeRequest {
    pub user_id: Option<Uuid>,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CookRequest {
    pub user_id: Uuid,
}

async fn load_recipe(state: &AppState, recipe_id: i32) -> Result<RecipeDetail, AppError> {
    state
        .store
        .get_recipe(recipe_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe {recipe_id} not found")))
}

/// POST /recipes/
pub async fn handle_create_recipe(
    State(state): State<AppState>,
    Json(raw): Json<RawRecipe>,
) -> Result<(StatusCode, Json<RecipeCreated>), AppError> {
    let recipe = normalize_recipe(raw)?;
    let recipe_id = state.store.create_recipe(None, &recipe).await?;
    info!(recipe_id, title = %recipe.title, "Recipe created");
    Ok((StatusCode::CREATED, Json(RecipeCreated::new(recipe_id))))
}

/// GET /recipes/
pub async fn handle_list_recipes(
    State(state): State<AppState>,
) -> Result<Json<Vec<RecipeDetail>>, AppError> {
    Ok(Json(state.store.list_recipes().await?))
}

/// GET /recipes/search?q=
pub async fn handle_search_recipes(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<RecipeDetail>>, AppError> {
    let recipes = state.store.list_recipes().await?;
    Ok(Json(search_recipes(recipes, &params.q)))
}

/// GET /recipes/:id
pub async fn handle_get_recipe(
    State(state): State<AppState>,
    Path(recipe_id): Path<i32>,
) -> Result<Json<RecipeDetail>, AppError> {
    Ok(Json(load_recipe(&state, recipe_id).await?))
}

/// DELETE /recipes/:id
pub async fn handle_delete_recipe(
    State(state): State<AppState>,
    Path(recipe_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    if state.store.delete_recipe(recipe_id).await? {
        info!(recipe_id, "Recipe deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Recipe {recipe_id} not found")))
    }
}

/// POST /process-recipe
///
/// Free-form recipe text is structured by the model, normalized like any other
/// recipe and saved under the user when one is given.
pub async fn handle_process_recipe(
    State(state): State<AppState>,
    Json(request): Json<ProcessRecipeRequest>,
) -> Result<(StatusCode, Json<RecipeCreated>), AppError> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }

    let raw = state.intents.extract_recipe(text).await?;
    let recipe = normalize_recipe(raw)?;

    let recipe_id = state.store.create_recipe(request.user_id, &recipe).await?;
    info!(recipe_id, title = %recipe.title, "Recipe extracted from text");

    Ok((StatusCode::CREATED, Json(RecipeCreated::new(recipe_id))))
}

/// GET /recipes/:id/availability?user_id=
pub async fn handle_availability(
    State(state): State<AppState>,
    Path(recipe_id): Path<i32>,
    Query(params): Query<UserQuery>,
) -> Result<Json<Availability>, AppError> {
    let recipe = load_recipe(&state, recipe_id).await?;
    let inventory = state.store.inventory(params.user_id).await?;
    Ok(Json(check_availability(&recipe.ingredients, &inventory)))
}

/// POST /recipes/:id/cook
pub async fn handle_cook(
    State(state): State<AppState>,
    Path(recipe_id): Path<i32>,
    Json(request): Json<CookRequest>,
) -> Result<Json<Vec<InventoryItem>>, AppError> {
    let recipe = load_recipe(&state, recipe_id).await?;
    let inventory = state.store.inventory(request.user_id).await?;

    let ops = plan_cook(&recipe.ingredients, &inventory);
    if ops.is_empty() {
        return Ok(Json(inventory));
    }

    let updated = state
        .store
        .apply_inventory_ops(request.user_id, &ops)
        .await?;
    info!(recipe_id, user_id = %request.user_id, changed = ops.len(), "Recipe cooked");
    Ok(Json(updated))
}

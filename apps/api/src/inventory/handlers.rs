use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::inventory::expiry::{expiry_report, ExpiryReport};
use crate::inventory::sync::{sync_from_notes, InventorySyncResult};
use crate::models::inventory::InventoryItem;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateInventoryRequest {
    pub user_id: Uuid,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ExpiringQuery {
    pub days: Option<i64>,
}

/// GET /inventory/:user_id
pub async fn handle_get_inventory(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<InventoryItem>>, AppError> {
    Ok(Json(state.store.inventory(user_id).await?))
}

/// GET /inventory/:user_id/expiring
pub async fn handle_expiring(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(params): Query<ExpiringQuery>,
) -> Result<Json<ExpiryReport>, AppError> {
    let days = params.days.unwrap_or(state.config.expiry_window_days);
    if days < 0 {
        return Err(AppError::Validation("days cannot be negative".to_string()));
    }
    let items = state.store.inventory(user_id).await?;
    Ok(Json(expiry_report(items, Utc::now(), days)?))
}

/// POST /update-inventory
pub async fn handle_update_inventory(
    State(state): State<AppState>,
    Json(request): Json<UpdateInventoryRequest>,
) -> Result<Json<InventorySyncResult>, AppError> {
    if request.message.trim().is_empty() {
        return Err(AppError::Validation("message cannot be empty".to_string()));
    }

    let result = sync_from_notes(
        state.intents.as_ref(),
        state.store.as_ref(),
        request.user_id,
        request.message.trim(),
    )
    .await?;
    Ok(Json(result))
}

/// DELETE /inventory/items/:id
pub async fn handle_delete_item(
    State(state): State<AppState>,
    Path(item_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    if state.store.delete_inventory_item(item_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Inventory item {item_id} not found")))
    }
}

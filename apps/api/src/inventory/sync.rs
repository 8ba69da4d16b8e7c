//! Sticky-note flow: ask the model to diff stored inventory against an external
//! source, then apply the result as one reconciliation batch.

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::intent::IntentService;
use crate::inventory::reconcile::{plan_comparison, DecodedLine, PlanSummary};
use crate::models::inventory::InventoryItem;
use crate::store::Store;

#[derive(Debug, Serialize)]
pub struct InventorySyncResult {
    pub inventory: Vec<InventoryItem>,
    #[serde(flatten)]
    pub summary: PlanSummary,
}

pub async fn sync_from_notes(
    intents: &dyn IntentService,
    store: &dyn Store,
    user_id: Uuid,
    notes: &str,
) -> Result<InventorySyncResult, AppError> {
    let snapshot = store.inventory(user_id).await?;

    let lines = intents.compare_inventory(&snapshot, notes).await?;
    let decoded: Vec<DecodedLine> = lines.iter().map(DecodedLine::from).collect();
    let plan = plan_comparison(&snapshot, &decoded);
    let summary = plan.summary();

    let inventory = store.apply_inventory_ops(user_id, &plan.ops).await?;
    info!("Inventory sync for user {user_id}: {summary:?}");

    Ok(InventorySyncResult { inventory, summary })
}

//! Inventory reconciler.
//!
//! Incoming lines are decoded once into `LineTarget` / `Quantity`; after that no
//! code compares against the `-1` sentinels. Planning is pure and produces the
//! `InventoryOp`s that `Store::apply_inventory_ops` applies in one transaction.
//!
//! Two entry points:
//! - `plan_upsert`: plain `save_inventory` turns, matched by case-insensitive name.
//! - `plan_comparison`: the sticky-note flow, where the model has already matched
//!   lines to row ids. Stale ids are skipped, never inserted.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::intent::RawIngredient;
use crate::models::inventory::InventoryItem;
use crate::recipes::normalize::value_to_text;

/// Wire marker for "this line is a new item" on `id`.
pub const NEW_ITEM_ID: i64 = -1;
/// Wire marker for "remove this item" on `amount`.
pub const TOMBSTONE_AMOUNT: &str = "-1";

// ────────────────────────────────────────────────────────────────────────────
// Wire shape
// ────────────────────────────────────────────────────────────────────────────

/// One line of a comparison reply, exactly as the model sends it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileLine {
    pub id: i64,
    #[serde(alias = "ingredient_name")]
    pub name: String,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl ReconcileLine {
    pub fn new(id: i64, name: &str, amount: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            amount: Some(Value::String(amount.to_string())),
            expires_at: None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Decoded instructions
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTarget {
    New,
    Existing(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Quantity {
    Remove,
    Amount(Option<String>),
}

impl Quantity {
    fn decode(amount: Option<&Value>) -> Self {
        match amount.and_then(value_to_text) {
            Some(text) if text == TOMBSTONE_AMOUNT => Quantity::Remove,
            other => Quantity::Amount(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedLine {
    pub target: LineTarget,
    pub name: String,
    pub quantity: Quantity,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&ReconcileLine> for DecodedLine {
    fn from(line: &ReconcileLine) -> Self {
        DecodedLine {
            target: if line.id == NEW_ITEM_ID {
                LineTarget::New
            } else {
                LineTarget::Existing(line.id)
            },
            name: line.name.trim().to_string(),
            quantity: Quantity::decode(line.amount.as_ref()),
            expires_at: line.expires_at,
        }
    }
}

impl DecodedLine {
    /// Ingredient extracted during a chat turn. Has no id, so it is always `New`.
    pub fn from_ingredient(ingredient: &RawIngredient) -> Option<Self> {
        let name = ingredient.name.as_deref()?.trim();
        if name.is_empty() {
            return None;
        }
        Some(DecodedLine {
            target: LineTarget::New,
            name: name.to_string(),
            quantity: Quantity::decode(ingredient.amount.as_ref()),
            expires_at: None,
        })
    }

    pub fn into_removal(mut self) -> Self {
        self.quantity = Quantity::Remove;
        self
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Operations
// ────────────────────────────────────────────────────────────────────────────

/// A single write against the user's inventory. `expires_at: None` on an update
/// keeps the stored expiry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum InventoryOp {
    Insert {
        name: String,
        amount: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    },
    Update {
        id: i32,
        name: String,
        amount: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    },
    Delete {
        id: i32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcilePlan {
    pub ops: Vec<InventoryOp>,
    /// Ids that referenced rows no longer in the inventory.
    pub skipped: Vec<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub skipped: usize,
}

impl ReconcilePlan {
    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary {
            skipped: self.skipped.len(),
            ..PlanSummary::default()
        };
        for op in &self.ops {
            match op {
                InventoryOp::Insert { .. } => summary.inserted += 1,
                InventoryOp::Update { .. } => summary.updated += 1,
                InventoryOp::Delete { .. } => summary.deleted += 1,
            }
        }
        summary
    }
}

pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

// ────────────────────────────────────────────────────────────────────────────
// Planning
// ────────────────────────────────────────────────────────────────────────────

/// Upsert-by-name: update the row with the same (case-insensitive) name, or insert.
pub fn plan_upsert(snapshot: &[InventoryItem], lines: &[DecodedLine]) -> ReconcilePlan {
    let mut planner = Planner::new(snapshot);
    for line in lines {
        planner.upsert_by_name(line);
    }
    planner.finish()
}

/// Reconciliation-by-comparison: lines carry row ids resolved by the model.
pub fn plan_comparison(snapshot: &[InventoryItem], lines: &[DecodedLine]) -> ReconcilePlan {
    let mut planner = Planner::new(snapshot);
    for line in lines {
        match line.target {
            LineTarget::Existing(raw_id) => {
                let live = i32::try_from(raw_id)
                    .ok()
                    .filter(|id| planner.by_id.contains_key(id));
                match live {
                    Some(id) => {
                        let name = if line.name.is_empty() {
                            planner.by_id[&id].clone()
                        } else {
                            line.name.clone()
                        };
                        planner.apply_to_existing(id, name, line);
                    }
                    None => {
                        warn!(
                            "Skipping reconciliation line for stale inventory id {raw_id} ({})",
                            line.name
                        );
                        planner.skipped.push(raw_id);
                    }
                }
            }
            LineTarget::New => planner.upsert_by_name(line),
        }
    }
    planner.finish()
}

struct Planner {
    /// Live row id → stored name.
    by_id: HashMap<i32, String>,
    /// Name key → live row id.
    by_name: HashMap<String, i32>,
    /// Name key → index of a pending insert in `ops`.
    pending: HashMap<String, usize>,
    ops: Vec<Option<InventoryOp>>,
    skipped: Vec<i64>,
}

impl Planner {
    fn new(snapshot: &[InventoryItem]) -> Self {
        let mut by_id = HashMap::new();
        let mut by_name = HashMap::new();
        for item in snapshot {
            by_id.insert(item.id, item.ingredient_name.clone());
            by_name.entry(name_key(&item.ingredient_name)).or_insert(item.id);
        }
        Self {
            by_id,
            by_name,
            pending: HashMap::new(),
            ops: Vec::new(),
            skipped: Vec::new(),
        }
    }

    fn upsert_by_name(&mut self, line: &DecodedLine) {
        let key = name_key(&line.name);
        if key.is_empty() {
            return;
        }
        if let Some(&id) = self.by_name.get(&key) {
            let stored = self.by_id.get(&id).cloned().unwrap_or_else(|| line.name.clone());
            self.apply_to_existing(id, stored, line);
        } else {
            self.insert_or_merge(key, line);
        }
    }

    fn apply_to_existing(&mut self, id: i32, name: String, line: &DecodedLine) {
        self.by_name.retain(|_, row| *row != id);
        match &line.quantity {
            Quantity::Remove => {
                self.by_id.remove(&id);
                self.ops.push(Some(InventoryOp::Delete { id }));
            }
            Quantity::Amount(amount) => {
                self.by_name.insert(name_key(&name), id);
                self.by_id.insert(id, name.clone());
                self.ops.push(Some(InventoryOp::Update {
                    id,
                    name,
                    amount: amount.clone(),
                    expires_at: line.expires_at,
                }));
            }
        }
    }

    fn insert_or_merge(&mut self, key: String, line: &DecodedLine) {
        if let Some(&index) = self.pending.get(&key) {
            match &line.quantity {
                Quantity::Remove => {
                    self.ops[index] = None;
                    self.pending.remove(&key);
                }
                Quantity::Amount(new_amount) => {
                    if let Some(InventoryOp::Insert {
                        amount, expires_at, ..
                    }) = self.ops[index].as_mut()
                    {
                        *amount = new_amount.clone();
                        if line.expires_at.is_some() {
                            *expires_at = line.expires_at;
                        }
                    }
                }
            }
            return;
        }

        match &line.quantity {
            Quantity::Remove => {
                debug!("Nothing to remove for '{}', not in inventory", line.name);
            }
            Quantity::Amount(amount) => {
                self.pending.insert(key, self.ops.len());
                self.ops.push(Some(InventoryOp::Insert {
                    name: line.name.clone(),
                    amount: amount.clone(),
                    expires_at: line.expires_at,
                }));
            }
        }
    }

    fn finish(self) -> ReconcilePlan {
        ReconcilePlan {
            ops: self.ops.into_iter().flatten().collect(),
            skipped: self.skipped,
        }
    }
}

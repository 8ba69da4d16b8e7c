//! Generative intent service — the seam between the core and the language model.
//!
//! The router, the inventory comparison flow and recipe extraction only ever see
//! the `IntentService` trait. `AppState` carries an `Arc<dyn IntentService>` built
//! once in `main`; tests swap in `ScriptedIntentService`.

pub mod llm;
pub mod prompts;
#[cfg(test)]
pub mod scripted;

use async_trait::async_trait;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::errors::AppError;
use crate::inventory::reconcile::ReconcileLine;
use crate::models::inventory::InventoryItem;

// ────────────────────────────────────────────────────────────────────────────
// Intent tag
// ────────────────────────────────────────────────────────────────────────────

/// Classification tag produced by the model. Tags are matched byte for byte; any
/// other spelling (including `"Unknown"`) lands in `Other` and is routed through
/// the pass-through branch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Intent {
    SaveRecipe,
    SearchRecipe,
    SearchWithInventory,
    SaveInventory,
    RemoveInventory,
    Question,
    OutOfTopic,
    Unknown,
    Other(String),
}

impl Intent {
    pub fn as_str(&self) -> &str {
        match self {
            Intent::SaveRecipe => "save_recipe",
            Intent::SearchRecipe => "search_recipe",
            Intent::SearchWithInventory => "search_with_inventory",
            Intent::SaveInventory => "save_inventory",
            Intent::RemoveInventory => "remove_inventory",
            Intent::Question => "question",
            Intent::OutOfTopic => "out_of_topic",
            Intent::Unknown => "unknown",
            Intent::Other(raw) => raw,
        }
    }
}

impl From<String> for Intent {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "save_recipe" => Intent::SaveRecipe,
            "search_recipe" => Intent::SearchRecipe,
            "search_with_inventory" => Intent::SearchWithInventory,
            "save_inventory" => Intent::SaveInventory,
            "remove_inventory" => Intent::RemoveInventory,
            "question" => Intent::Question,
            "out_of_topic" => Intent::OutOfTopic,
            "unknown" => Intent::Unknown,
            _ => Intent::Other(raw),
        }
    }
}

impl Serialize for Intent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Loosely-typed model output
// ────────────────────────────────────────────────────────────────────────────

/// Recipe as the model emits it: every field optional, amounts and servings may be
/// numbers, steps may be bare strings or objects. `recipes::normalize` turns this
/// into a `NewRecipe`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecipe {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub servings: Option<Value>,
    #[serde(default)]
    pub ingredients: Option<Vec<RawIngredient>>,
    #[serde(default)]
    pub steps: Option<Vec<Value>>,
    #[serde(default)]
    pub tools: Option<Vec<Value>>,
    #[serde(default)]
    pub methods: Option<Vec<Value>>,
    #[serde(default)]
    pub keywords: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawIngredient {
    #[serde(default, alias = "ingredient_name")]
    pub name: Option<String>,
    #[serde(default)]
    pub amount: Option<Value>,
}

/// One classification round-trip. `intent` and `ai_response` are mandatory;
/// a reply missing either fails to deserialize and surfaces as
/// `AppError::Classification`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub intent: Intent,
    pub ai_response: String,
    #[serde(default)]
    pub recipe: Option<RawRecipe>,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait IntentService: Send + Sync {
    /// Classifies free text and returns the intent plus optional recipe content.
    async fn classify(&self, prompt: &str) -> Result<Classification, AppError>;

    /// Diffs the stored inventory against an external source (e.g. scanned notes).
    /// Lines use `id = -1` for new items and `amount = "-1"` for removals.
    async fn compare_inventory(
        &self,
        inventory: &[InventoryItem],
        notes: &str,
    ) -> Result<Vec<ReconcileLine>, AppError>;

    /// Extracts a single recipe from free text.
    async fn extract_recipe(&self, text: &str) -> Result<RawRecipe, AppError>;
}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::intent::prompts::{
    CLASSIFY_PROMPT_TEMPLATE, CLASSIFY_SYSTEM, COMPARE_PROMPT_TEMPLATE, COMPARE_SYSTEM,
    EXTRACT_PROMPT_TEMPLATE, EXTRACT_SYSTEM,
};
use crate::intent::{Classification, IntentService, RawRecipe};
use crate::inventory::reconcile::ReconcileLine;
use crate::llm_client::prompts::RECIPE_OBJECT_SCHEMA;
use crate::llm_client::LlmClient;
use crate::models::inventory::InventoryItem;

/// Production intent service backed by Claude.
pub struct LlmIntentService {
    llm: LlmClient,
}

impl LlmIntentService {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

/// The comparison reply may come wrapped in `{"items": [...]}` or as a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ComparisonReply {
    Wrapped { items: Vec<ReconcileLine> },
    Bare(Vec<ReconcileLine>),
}

impl From<ComparisonReply> for Vec<ReconcileLine> {
    fn from(reply: ComparisonReply) -> Self {
        match reply {
            ComparisonReply::Wrapped { items } => items,
            ComparisonReply::Bare(items) => items,
        }
    }
}

#[derive(Serialize)]
struct PromptInventoryLine<'a> {
    id: i32,
    name: &'a str,
    amount: Option<&'a str>,
}

pub fn build_classify_prompt(message: &str) -> String {
    CLASSIFY_PROMPT_TEMPLATE
        .replace("{recipe_schema}", RECIPE_OBJECT_SCHEMA)
        .replace("{message}", message)
}

pub fn build_compare_prompt(inventory: &[InventoryItem], notes: &str) -> Result<String, AppError> {
    let lines: Vec<PromptInventoryLine<'_>> = inventory
        .iter()
        .map(|item| PromptInventoryLine {
            id: item.id,
            name: &item.ingredient_name,
            amount: item.amount.as_deref(),
        })
        .collect();
    let inventory_json =
        serde_json::to_string_pretty(&lines).map_err(|e| AppError::Internal(e.into()))?;
    Ok(COMPARE_PROMPT_TEMPLATE
        .replace("{inventory}", &inventory_json)
        .replace("{notes}", notes))
}

#[async_trait]
impl IntentService for LlmIntentService {
    async fn classify(&self, prompt: &str) -> Result<Classification, AppError> {
        self.llm
            .call_json::<Classification>(&build_classify_prompt(prompt), CLASSIFY_SYSTEM)
            .await
            .map_err(|e| AppError::Classification(format!("Intent classification failed: {e}")))
    }

    async fn compare_inventory(
        &self,
        inventory: &[InventoryItem],
        notes: &str,
    ) -> Result<Vec<ReconcileLine>, AppError> {
        let prompt = build_compare_prompt(inventory, notes)?;
        self.llm
            .call_json::<ComparisonReply>(&prompt, COMPARE_SYSTEM)
            .await
            .map(Into::into)
            .map_err(|e| AppError::Classification(format!("Inventory comparison failed: {e}")))
    }

    async fn extract_recipe(&self, text: &str) -> Result<RawRecipe, AppError> {
        let prompt = EXTRACT_PROMPT_TEMPLATE
            .replace("{recipe_schema}", RECIPE_OBJECT_SCHEMA)
            .replace("{text}", text);
        self.llm
            .call_json::<RawRecipe>(&prompt, EXTRACT_SYSTEM)
            .await
            .map_err(|e| AppError::Classification(format!("Recipe extraction failed: {e}")))
    }
}

//! Scripted intent service for tests.
//!
//! Replies are queued up front and handed out in order; every prompt received is
//! recorded so tests can assert on what the router sent.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::intent::{Classification, IntentService, RawRecipe};
use crate::inventory::reconcile::ReconcileLine;
use crate::llm_client::parse_json_reply;
use crate::models::inventory::InventoryItem;

#[derive(Default)]
pub struct ScriptedIntentService {
    classifications: Mutex<VecDeque<String>>,
    comparisons: Mutex<VecDeque<Vec<ReconcileLine>>>,
    extractions: Mutex<VecDeque<RawRecipe>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedIntentService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a raw model reply; it goes through the same JSON parsing as production.
    pub fn with_reply(self, raw: &str) -> Self {
        self.classifications
            .lock()
            .unwrap()
            .push_back(raw.to_string());
        self
    }

    pub fn with_comparison(self, lines: Vec<ReconcileLine>) -> Self {
        self.comparisons.lock().unwrap().push_back(lines);
        self
    }

    pub fn with_extraction(self, recipe: RawRecipe) -> Self {
        self.extractions.lock().unwrap().push_back(recipe);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl IntentService for ScriptedIntentService {
    async fn classify(&self, prompt: &str) -> Result<Classification, AppError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let raw = self
            .classifications
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::Classification("no scripted reply left".to_string()))?;
        parse_json_reply(&raw).map_err(|e| AppError::Classification(e.to_string()))
    }

    async fn compare_inventory(
        &self,
        _inventory: &[InventoryItem],
        notes: &str,
    ) -> Result<Vec<ReconcileLine>, AppError> {
        self.prompts.lock().unwrap().push(notes.to_string());
        self.comparisons
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::Classification("no scripted comparison left".to_string()))
    }

    async fn extract_recipe(&self, text: &str) -> Result<RawRecipe, AppError> {
        self.prompts.lock().unwrap().push(text.to_string());
        self.extractions
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::Classification("no scripted extraction left".to_string()))
    }
}

//! Intent router — turns one chat message into exactly one handling path.
//!
//! Flow:
//! 1. Classify the message (a `question` with a previous turn is re-classified
//!    once against that turn's response). A turn makes at most two model calls,
//!    so a follow-up classification never triggers another one.
//! 2. Build the turn's writes and reply without touching the store.
//! 3. Commit every write in a single `Store::commit_turn` call.
//!
//! A failed classification or a missing required field returns before step 3, so
//! a request either writes everything or nothing.

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::intent::{Classification, Intent, IntentService, RawRecipe};
use crate::inventory::reconcile::{plan_upsert, DecodedLine};
use crate::models::inventory::InventoryItem;
use crate::recipes::normalize::{non_empty, normalize_recipe};
use crate::store::{ChatLine, Store, TurnReceipt, TurnWrites};

pub const RECIPE_SAVED_MESSAGE: &str = "Recipe saved!";

/// Response payload of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChatReply {
    SavedRecipe {
        message: String,
        recipe_id: i32,
    },
    WithRecipe {
        intent: Intent,
        ai_response: String,
        recipe: Option<RawRecipe>,
    },
    Plain {
        intent: Intent,
        ai_response: String,
    },
}

/// Reply shape decided before commit; a saved recipe only gets its id afterwards.
enum PendingReply {
    SavedRecipe { message: String },
    Ready(ChatReply),
}

impl PendingReply {
    fn complete(self, receipt: TurnReceipt) -> Result<ChatReply, AppError> {
        match self {
            PendingReply::SavedRecipe { message } => {
                let recipe_id = receipt.recipe_id.ok_or_else(|| {
                    AppError::Internal(anyhow::anyhow!("recipe insert returned no id"))
                })?;
                Ok(ChatReply::SavedRecipe { message, recipe_id })
            }
            PendingReply::Ready(reply) => Ok(reply),
        }
    }
}

struct Turn {
    writes: TurnWrites,
    reply: PendingReply,
}

pub struct IntentRouter<'a> {
    intents: &'a dyn IntentService,
    store: &'a dyn Store,
}

impl<'a> IntentRouter<'a> {
    pub fn new(intents: &'a dyn IntentService, store: &'a dyn Store) -> Self {
        Self { intents, store }
    }

    pub async fn route(
        &self,
        user_id: Uuid,
        message: &str,
        inventory: &[InventoryItem],
    ) -> Result<ChatReply, AppError> {
        let (classification, follow_up) = self.classify_turn(user_id, message).await?;
        info!(
            "Routing chat turn for user {user_id} as '{}' (follow-up: {follow_up})",
            classification.intent
        );

        let turn = self
            .plan_turn(message, classification, follow_up, inventory)
            .await?;
        let receipt = self.store.commit_turn(user_id, turn.writes).await?;
        turn.reply.complete(receipt)
    }

    /// Returns the classification to act on and whether it came from the
    /// follow-up call.
    async fn classify_turn(
        &self,
        user_id: Uuid,
        message: &str,
    ) -> Result<(Classification, bool), AppError> {
        let first = self.intents.classify(message).await?;
        if first.intent != Intent::Question {
            return Ok((first, false));
        }

        match self.store.latest_chat(user_id).await? {
            Some(previous) => {
                debug!("Follow-up question; re-classifying against chat row {}", previous.id);
                let follow_up = format!("{}\n{}", previous.response, message);
                Ok((self.intents.classify(&follow_up).await?, true))
            }
            None => {
                debug!("Question without a previous turn; answering directly");
                Ok((first, false))
            }
        }
    }

    async fn plan_turn(
        &self,
        message: &str,
        classification: Classification,
        follow_up: bool,
        inventory: &[InventoryItem],
    ) -> Result<Turn, AppError> {
        let Classification {
            intent,
            ai_response,
            recipe,
        } = classification;

        match intent {
            Intent::SaveRecipe => {
                let raw = recipe.ok_or_else(|| missing_field(&Intent::SaveRecipe, "recipe"))?;
                let recipe = normalize_recipe(raw)?;
                let response = non_empty(Some(ai_response))
                    .unwrap_or_else(|| RECIPE_SAVED_MESSAGE.to_string());
                Ok(Turn {
                    writes: TurnWrites {
                        recipe: Some(recipe),
                        chat: Some(chat_line(message, &response)),
                        ..TurnWrites::default()
                    },
                    reply: PendingReply::SavedRecipe {
                        message: RECIPE_SAVED_MESSAGE.to_string(),
                    },
                })
            }

            Intent::SearchRecipe => {
                let raw = recipe.ok_or_else(|| missing_field(&Intent::SearchRecipe, "recipe"))?;
                Ok(Turn {
                    writes: chat_only(message, &ai_response),
                    reply: PendingReply::Ready(ChatReply::WithRecipe {
                        intent,
                        ai_response,
                        recipe: Some(raw),
                    }),
                })
            }

            // Already the second model call: answer with what it returned.
            Intent::SearchWithInventory if follow_up => Ok(Turn {
                writes: chat_only(message, &ai_response),
                reply: PendingReply::Ready(ChatReply::WithRecipe {
                    intent,
                    ai_response,
                    recipe,
                }),
            }),

            Intent::SearchWithInventory => {
                let prompt = augment_with_inventory(message, inventory)?;
                let second = self.intents.classify(&prompt).await?;
                Ok(Turn {
                    writes: chat_only(message, &second.ai_response),
                    reply: PendingReply::Ready(ChatReply::WithRecipe {
                        intent: second.intent,
                        ai_response: second.ai_response,
                        recipe: second.recipe,
                    }),
                })
            }

            Intent::SaveInventory | Intent::RemoveInventory => {
                let ingredients = recipe
                    .and_then(|r| r.ingredients)
                    .ok_or_else(|| missing_field(&intent, "recipe.ingredients"))?;
                let removing = intent == Intent::RemoveInventory;
                let lines: Vec<DecodedLine> = ingredients
                    .iter()
                    .filter_map(DecodedLine::from_ingredient)
                    .map(|line| if removing { line.into_removal() } else { line })
                    .collect();
                let plan = plan_upsert(inventory, &lines);
                debug!("Inventory turn planned: {:?}", plan.summary());

                let mut writes = chat_only(message, &ai_response);
                writes.inventory_ops = plan.ops;
                Ok(Turn {
                    writes,
                    reply: PendingReply::Ready(ChatReply::Plain {
                        intent,
                        ai_response,
                    }),
                })
            }

            // Question (unanswerable or nested), out_of_topic, unknown and any new tag.
            intent => {
                let writes = if intent == Intent::Unknown {
                    TurnWrites::default()
                } else {
                    chat_only(message, &ai_response)
                };
                Ok(Turn {
                    writes,
                    reply: PendingReply::Ready(ChatReply::Plain {
                        intent,
                        ai_response,
                    }),
                })
            }
        }
    }
}

fn missing_field(intent: &Intent, field: &str) -> AppError {
    AppError::Validation(format!(
        "model classified the message as '{intent}' but returned no {field}"
    ))
}

fn chat_line(message: &str, response: &str) -> ChatLine {
    ChatLine {
        message: message.to_string(),
        response: response.to_string(),
    }
}

fn chat_only(message: &str, response: &str) -> TurnWrites {
    TurnWrites {
        chat: Some(chat_line(message, response)),
        ..TurnWrites::default()
    }
}

#[derive(Serialize)]
struct InventoryContextLine<'a> {
    name: &'a str,
    amount: Option<&'a str>,
}

/// Appends the user's inventory as JSON so the model can build a recipe from it.
pub fn augment_with_inventory(
    message: &str,
    inventory: &[InventoryItem],
) -> Result<String, AppError> {
    let lines: Vec<InventoryContextLine<'_>> = inventory
        .iter()
        .map(|item| InventoryContextLine {
            name: &item.ingredient_name,
            amount: item.amount.as_deref(),
        })
        .collect();
    let serialized = serde_json::to_string(&lines).map_err(|e| AppError::Internal(e.into()))?;
    Ok(format!("{message}\n\nMy current inventory: {serialized}"))
}

//! Recipe shape normalizer.
//!
//! The only place where loosely-typed model output becomes a `NewRecipe`.
//! Present-but-empty strings are turned into `None` here and nowhere else.

use serde_json::Value;

use crate::errors::AppError;
use crate::intent::RawRecipe;
use crate::models::recipe::{MethodRecord, NewIngredient, NewRecipe, NewStep, ToolRecord};

pub fn normalize_recipe(raw: RawRecipe) -> Result<NewRecipe, AppError> {
    let title = non_empty(raw.title)
        .ok_or_else(|| AppError::Validation("recipe title is required".to_string()))?;

    let ingredients = raw
        .ingredients
        .unwrap_or_default()
        .into_iter()
        .filter_map(|ingredient| {
            let name = non_empty(ingredient.name)?;
            Some(NewIngredient {
                name,
                amount: ingredient.amount.as_ref().and_then(value_to_text),
            })
        })
        .collect();

    // Numbering comes from position only; blank entries are dropped first so the
    // sequence stays contiguous.
    let steps = raw
        .steps
        .unwrap_or_default()
        .iter()
        .filter_map(step_instruction)
        .enumerate()
        .map(|(i, instruction)| NewStep {
            step_number: i as i32 + 1,
            instruction,
        })
        .collect();

    let tools = raw
        .tools
        .unwrap_or_default()
        .iter()
        .filter_map(|v| record_name(v, "tool_name"))
        .map(|tool_name| ToolRecord { tool_name })
        .collect();

    let methods = raw
        .methods
        .unwrap_or_default()
        .iter()
        .filter_map(|v| record_name(v, "method_name"))
        .map(|method_name| MethodRecord { method_name })
        .collect();

    Ok(NewRecipe {
        title,
        description: non_empty(raw.description),
        servings: raw.servings.as_ref().and_then(value_to_text),
        ingredients,
        steps,
        tools,
        methods,
        keywords: raw.keywords.as_ref().and_then(keywords_text),
    })
}

/// Trims and drops empty strings.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Renders a scalar JSON value as text: `2` becomes `"2"`, `"4-6"` stays as is.
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => non_empty(Some(s.clone())),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn step_instruction(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => ["instruction", "text", "step"]
            .iter()
            .find_map(|key| map.get(*key).and_then(value_to_text)),
        other => value_to_text(other),
    }
}

fn record_name(value: &Value, key: &str) -> Option<String> {
    match value {
        Value::Object(map) => map
            .get(key)
            .or_else(|| map.get("name"))
            .and_then(value_to_text),
        other => value_to_text(other),
    }
}

fn keywords_text(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => {
            let joined = items
                .iter()
                .filter_map(value_to_text)
                .collect::<Vec<_>>()
                .join(", ");
            non_empty(Some(joined))
        }
        other => value_to_text(other),
    }
}

/// Splits a stored keyword string into lower-cased tokens.
pub fn split_keywords(keywords: &str) -> Vec<String> {
    keywords
        .split(',')
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

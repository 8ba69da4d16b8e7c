//! Recipe ↔ inventory helpers: what is missing for a recipe, and what cooking it
//! takes out of the pantry.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::inventory::reconcile::{name_key, InventoryOp};
use crate::models::inventory::InventoryItem;
use crate::models::recipe::IngredientRow;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientStatus {
    pub name: String,
    pub amount: Option<String>,
    /// Amount currently in the inventory, when the ingredient is there.
    pub in_stock: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Availability {
    pub has_all_ingredients: bool,
    pub available: Vec<IngredientStatus>,
    pub missing: Vec<IngredientStatus>,
}

/// Names like "Ingredient 2" are model placeholders, not real ingredients.
pub(crate) fn is_placeholder(name: &str) -> bool {
    let lower = name.trim().to_lowercase();
    match lower.strip_prefix("ingredient") {
        Some(rest) => {
            let rest = rest.trim();
            !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

pub fn check_availability(ingredients: &[IngredientRow], inventory: &[InventoryItem]) -> Availability {
    let stock: HashMap<String, &InventoryItem> = inventory
        .iter()
        .map(|item| (name_key(&item.ingredient_name), item))
        .collect();

    let mut available = Vec::new();
    let mut missing = Vec::new();

    for ingredient in ingredients.iter().filter(|i| !is_placeholder(&i.name)) {
        match stock.get(&name_key(&ingredient.name)) {
            Some(item) => available.push(IngredientStatus {
                name: ingredient.name.clone(),
                amount: ingredient.amount.clone(),
                in_stock: item.amount.clone(),
            }),
            None => missing.push(IngredientStatus {
                name: ingredient.name.clone(),
                amount: ingredient.amount.clone(),
                in_stock: None,
            }),
        }
    }

    Availability {
        has_all_ingredients: missing.is_empty(),
        available,
        missing,
    }
}

/// Parses the numeric prefix of an amount ("2 cups" → 2.0). `None` when the
/// amount does not start with a number.
pub(crate) fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim();
    let end = text
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    text[..end].parse().ok()
}

/// First number anywhere in the amount ("about 3 cloves" → 3.0).
pub(crate) fn first_number(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    leading_number(&text[start..])
}

pub(crate) fn format_amount(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}

/// Subtracts recipe quantities from matching inventory rows. Rows whose amount is
/// not numeric are left alone; rows that reach zero are deleted. Recipe amounts
/// without a number count as one unit.
pub fn plan_cook(ingredients: &[IngredientRow], inventory: &[InventoryItem]) -> Vec<InventoryOp> {
    let by_name: HashMap<String, &InventoryItem> = inventory
        .iter()
        .map(|item| (name_key(&item.ingredient_name), item))
        .collect();

    // id → (stored name, remaining quantity)
    let mut remaining: BTreeMap<i32, (String, f64)> = BTreeMap::new();

    for ingredient in ingredients {
        let Some(item) = by_name.get(&name_key(&ingredient.name)) else {
            continue;
        };
        let Some(in_stock) = item.amount.as_deref().and_then(leading_number) else {
            continue;
        };
        let used = ingredient
            .amount
            .as_deref()
            .and_then(first_number)
            .unwrap_or(1.0);

        let entry = remaining
            .entry(item.id)
            .or_insert_with(|| (item.ingredient_name.clone(), in_stock));
        entry.1 -= used;
    }

    remaining
        .into_iter()
        .map(|(id, (name, left))| {
            if left <= 0.0 {
                InventoryOp::Delete { id }
            } else {
                InventoryOp::Update {
                    id,
                    name,
                    amount: Some(format_amount(left)),
                    expires_at: None,
                }
            }
        })
        .collect()
}

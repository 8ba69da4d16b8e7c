//! Building grocery lists out of recipes.

use std::collections::HashMap;

use crate::inventory::reconcile::name_key;
use crate::models::grocery::{NewGroceryItem, NewGroceryList};
use crate::models::recipe::RecipeDetail;
use crate::recipes::pantry::{
    first_number, format_amount, is_placeholder, leading_number, IngredientStatus,
};

pub const DEFAULT_LIST_NAME: &str = "Shopping List";

/// Store aisles, checked in order; the first keyword contained in the name wins.
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Produce",
        &[
            "apple", "banana", "lettuce", "tomato", "onion", "garlic", "potato", "carrot",
            "pepper", "vegetable", "fruit", "herb", "lemon", "lime", "orange", "berry",
            "berries", "greens",
        ],
    ),
    (
        "Meat",
        &[
            "beef", "chicken", "pork", "lamb", "turkey", "sausage", "bacon", "ham", "steak",
            "ground", "meat",
        ],
    ),
    (
        "Seafood",
        &[
            "fish", "salmon", "tuna", "shrimp", "crab", "lobster", "clam", "mussel", "oyster",
            "seafood",
        ],
    ),
    (
        "Dairy",
        &["milk", "cheese", "yogurt", "butter", "cream", "dairy"],
    ),
    (
        "Bakery",
        &["bread", "roll", "bun", "bagel", "pastry", "cake", "cookie", "pie", "bakery"],
    ),
    (
        "Pantry",
        &[
            "flour", "sugar", "salt", "spice", "oil", "vinegar", "sauce", "can", "pasta",
            "rice", "bean", "lentil", "grain", "cereal", "condiment",
        ],
    ),
    ("Frozen", &["frozen", "pizza"]),
    (
        "Beverages",
        &[
            "water", "juice", "soda", "coffee", "tea", "drink", "beverage", "wine", "beer",
            "alcohol",
        ],
    ),
];

pub fn category_for(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    CATEGORIES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or("Other")
}

pub fn grocery_item(name: &str, amount: Option<String>) -> NewGroceryItem {
    NewGroceryItem {
        name: name.trim().to_string(),
        amount,
        category: category_for(name).to_string(),
    }
}

/// "Shopping for <recipe>" holding every ingredient the user does not have.
pub fn from_missing(recipe_title: &str, missing: &[IngredientStatus]) -> NewGroceryList {
    NewGroceryList {
        name: format!("Shopping for {recipe_title}"),
        items: missing
            .iter()
            .map(|status| grocery_item(&status.name, status.amount.clone()))
            .collect(),
    }
}

/// Adds `incoming` to an amount already on the list. Numeric amounts are summed,
/// a missing amount counts as one unit, anything else is joined with ", ".
fn merge_amount(current: Option<String>, incoming: Option<&str>) -> Option<String> {
    let have = match current.as_deref() {
        Some(text) => leading_number(text),
        None => Some(1.0),
    };
    let add = match incoming {
        Some(text) => first_number(text),
        None => Some(1.0),
    };

    match (have, add) {
        (Some(have), Some(add)) => Some(format_amount(have + add)),
        _ => Some(format!(
            "{}, {}",
            current.as_deref().unwrap_or("1"),
            incoming.unwrap_or("1")
        )),
    }
}

/// One item per distinct ingredient name (case-insensitive) across the recipes,
/// in first-seen order.
pub fn merge_recipe_ingredients(recipes: &[RecipeDetail]) -> Vec<NewGroceryItem> {
    let mut items: Vec<NewGroceryItem> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    let ingredients = recipes
        .iter()
        .flat_map(|r| r.ingredients.iter())
        .filter(|i| !is_placeholder(&i.name) && !i.name.trim().is_empty());

    for ingredient in ingredients {
        let key = name_key(&ingredient.name);
        match index.get(&key) {
            Some(&at) => {
                let item = &mut items[at];
                item.amount = merge_amount(item.amount.take(), ingredient.amount.as_deref());
            }
            None => {
                index.insert(key, items.len());
                items.push(grocery_item(&ingredient.name, ingredient.amount.clone()));
            }
        }
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::recipe::{IngredientRow, RecipeRow};
    use chrono::Utc;

    fn recipe(id: i32, ingredients: &[(&str, Option<&str>)]) -> RecipeDetail {
        RecipeDetail {
            recipe: RecipeRow {
                id,
                user_id: None,
                title: format!("recipe-{id}"),
                description: None,
                servings: None,
                tools: vec![],
                methods: vec![],
                keywords: None,
                created_at: Utc::now(),
            },
            ingredients: ingredients
                .iter()
                .enumerate()
                .map(|(position, (name, amount))| IngredientRow {
                    id: position as i32,
                    recipe_id: id,
                    position: position as i32,
                    name: name.to_string(),
                    amount: amount.map(String::from),
                })
                .collect(),
            steps: vec![],
        }
    }

    #[test]
    fn test_categories() {
        assert_eq!(category_for("Cherry Tomatoes"), "Produce");
        assert_eq!(category_for("chicken thighs"), "Meat");
        assert_eq!(category_for("Whole milk"), "Dairy");
        assert_eq!(category_for("flour"), "Pantry");
        assert_eq!(category_for("eggs"), "Other");
    }

    #[test]
    fn test_merge_sums_numbers_and_joins_the_rest() {
        let recipes = vec![
            recipe(1, &[("eggs", Some("2")), ("flour", Some("200 g")), ("salt", Some("a pinch"))]),
            recipe(
                2,
                &[
                    ("Eggs", Some("3")),
                    ("salt", Some("to taste")),
                    ("milk", None),
                    ("Ingredient 4", Some("1")),
                ],
            ),
        ];

        let items = merge_recipe_ingredients(&recipes);

        let summary: Vec<(&str, Option<&str>, &str)> = items
            .iter()
            .map(|i| (i.name.as_str(), i.amount.as_deref(), i.category.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("eggs", Some("5"), "Other"),
                ("flour", Some("200 g"), "Pantry"),
                ("salt", Some("a pinch, to taste"), "Pantry"),
                ("milk", None, "Dairy"),
            ]
        );
    }

    #[test]
    fn test_missing_amount_counts_as_one() {
        assert_eq!(merge_amount(None, Some("2")).as_deref(), Some("3"));
        assert_eq!(merge_amount(Some("1.5".into()), None).as_deref(), Some("2.5"));
    }

    #[test]
    fn test_from_missing_names_list_after_recipe() {
        let missing = vec![IngredientStatus {
            name: "chives".into(),
            amount: Some("1 bunch".into()),
            in_stock: None,
        }];

        let list = from_missing("Omelette", &missing);

        assert_eq!(list.name, "Shopping for Omelette");
        assert_eq!(list.items, vec![grocery_item("chives", Some("1 bunch".into()))]);
    }
}

// Prompt fragments shared by every service that talks to the model.

/// The recipe object shape every recipe-bearing reply must use.
pub const RECIPE_OBJECT_SCHEMA: &str = r#"{
    "title": "string",
    "description": "string",
    "servings": "string",
    "ingredients": [{"name": "string", "amount": "string"}],
    "steps": ["string"],
    "tools": ["string"],
    "methods": ["string"],
    "keywords": "comma, separated, string"
  }"#;

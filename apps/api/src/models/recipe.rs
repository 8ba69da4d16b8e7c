use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecipeRow {
    pub id: i32,
    pub user_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub servings: Option<String>,
    pub tools: Vec<String>,
    pub methods: Vec<String>,
    pub keywords: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IngredientRow {
    pub id: i32,
    pub recipe_id: i32,
    pub position: i32,
    pub name: String,
    pub amount: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StepRow {
    pub id: i32,
    pub recipe_id: i32,
    pub step_number: i32,
    pub instruction: String,
}

/// A stored recipe together with its ordered children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: RecipeRow,
    pub ingredients: Vec<IngredientRow>,
    pub steps: Vec<StepRow>,
}

// ────────────────────────────────────────────────────────────────────────────
// Strict write shapes (output of the normalizer)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIngredient {
    pub name: String,
    pub amount: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStep {
    pub step_number: i32,
    pub instruction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRecord {
    pub tool_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodRecord {
    pub method_name: String,
}

/// A recipe ready for persistence. Only `recipes::normalize` builds these.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewRecipe {
    pub title: String,
    pub description: Option<String>,
    pub servings: Option<String>,
    pub ingredients: Vec<NewIngredient>,
    pub steps: Vec<NewStep>,
    pub tools: Vec<ToolRecord>,
    pub methods: Vec<MethodRecord>,
    pub keywords: Option<String>,
}

impl NewRecipe {
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.tool_name.clone()).collect()
    }

    pub fn method_names(&self) -> Vec<String> {
        self.methods.iter().map(|m| m.method_name.clone()).collect()
    }
}

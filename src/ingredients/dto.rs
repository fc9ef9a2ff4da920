use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ingredients::repo::Ingredient;

#[derive(Debug, Serialize)]
pub struct IngredientResponse {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
    pub category: String,
}

impl From<Ingredient> for IngredientResponse {
    fn from(ing: Ingredient) -> Self {
        Self {
            id: ing.id,
            name: ing.name,
            unit: ing.unit,
            category: ing.category,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateIngredientRequest {
    pub name: String,
    pub unit: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateIngredientRequest {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub category: Option<String>,
}
fn default_limit() -> i64 {
    1000
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default = "default_search_limit")]
    pub limit: i64,
    pub category: Option<String>,
}
fn default_search_limit() -> i64 {
    50
}

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::recipes::repo::{Recipe, Step};

/// Scalar recipe fields shared by the create and replace payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeFields {
    pub title: String,
    pub description: String,
    #[serde(default = "default_is_public")]
    pub is_public: bool,
    pub preparation_time: i32,
    pub cooking_time: i32,
    pub servings: i32,
}
fn default_is_public() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct StepInput {
    pub order_number: i32,
    pub action_type: String,
    pub temperature: i32,
    pub speed: i32,
    pub duration: i32,
    pub description: String,
}

/// One ingredient use in a composite payload. An explicit `step_id`
/// wins over positional association.
#[derive(Debug, Clone, Deserialize)]
pub struct IngredientLinkInput {
    pub ingredient_id: Uuid,
    pub quantity: f64,
    #[serde(default)]
    pub step_id: Option<Uuid>,
}

/// Composite body of the create-complete and replace-complete endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct CompleteRecipeRequest {
    pub recipe: RecipeFields,
    #[serde(default)]
    pub steps: Vec<StepInput>,
    #[serde(default)]
    pub ingredients: Vec<IngredientLinkInput>,
}

#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub is_public: bool,
    pub preparation_time: i32,
    pub cooking_time: i32,
    pub servings: i32,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<Recipe> for RecipeResponse {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            description: recipe.description,
            is_public: recipe.is_public,
            preparation_time: recipe.preparation_time,
            cooking_time: recipe.cooking_time,
            servings: recipe.servings,
            user_id: recipe.user_id,
            created_at: recipe.created_at,
            updated_at: recipe.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StepResponse {
    pub id: Uuid,
    pub order_number: i32,
    pub action_type: String,
    pub temperature: i32,
    pub speed: i32,
    pub duration: i32,
    pub description: String,
}

impl From<Step> for StepResponse {
    fn from(step: Step) -> Self {
        Self {
            id: step.id,
            order_number: step.order_number,
            action_type: step.action_type,
            temperature: step.temperature,
            speed: step.speed,
            duration: step.duration,
            description: step.description,
        }
    }
}

/// Ingredient link joined with catalog data, as listed under a recipe
/// and in the export document. Carries no step ids: those belong to the
/// source recipe and would dangle on re-import, where step association
/// is re-resolved positionally.
#[derive(Debug, Serialize, FromRow)]
pub struct RecipeIngredientView {
    pub ingredient_id: Uuid,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Serialize)]
pub struct ExportInfo {
    #[serde(with = "time::serde::rfc3339")]
    pub exported_at: OffsetDateTime,
    pub format: String,
    pub source: String,
}

/// Download document: the full aggregate plus export metadata. The
/// `steps` and `ingredients` arrays are shaped so they can be fed back
/// into the create-complete endpoint.
#[derive(Debug, Serialize)]
pub struct RecipeExport {
    pub recipe: RecipeResponse,
    pub steps: Vec<StepResponse>,
    pub ingredients: Vec<RecipeIngredientView>,
    pub export_info: ExportInfo,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_request_defaults_missing_collections_to_empty() {
        let json = r#"{
            "recipe": {
                "title": "Toast",
                "description": "Bread, heat.",
                "preparation_time": 1,
                "cooking_time": 3,
                "servings": 1
            }
        }"#;
        let req: CompleteRecipeRequest = serde_json::from_str(json).unwrap();
        assert!(req.recipe.is_public);
        assert!(req.steps.is_empty());
        assert!(req.ingredients.is_empty());
    }

    #[test]
    fn ingredient_link_step_id_is_optional() {
        let json = r#"{"ingredient_id": "7f2a1c9e-30b4-4b44-9d3a-2f6f3a1f0d11", "quantity": 2.5}"#;
        let link: IngredientLinkInput = serde_json::from_str(json).unwrap();
        assert!(link.step_id.is_none());
        assert_eq!(link.quantity, 2.5);
    }

    #[test]
    fn export_document_contains_reimportable_arrays() {
        let now = OffsetDateTime::now_utc();
        let export = RecipeExport {
            recipe: RecipeResponse {
                id: Uuid::new_v4(),
                title: "Soup".into(),
                description: "Hot water plus".into(),
                is_public: true,
                preparation_time: 5,
                cooking_time: 30,
                servings: 2,
                user_id: Uuid::new_v4(),
                created_at: now,
                updated_at: now,
            },
            steps: vec![],
            ingredients: vec![RecipeIngredientView {
                ingredient_id: Uuid::new_v4(),
                name: "Salt".into(),
                quantity: 5.0,
                unit: "g".into(),
            }],
            export_info: ExportInfo {
                exported_at: now,
                format: "recipebox-export/1".into(),
                source: "recipebox 0.1.0".into(),
            },
        };
        let json = serde_json::to_value(&export).unwrap();
        assert!(json["ingredients"][0]["ingredient_id"].is_string());
        assert!(json["ingredients"][0]["quantity"].is_number());
        // No step ids in the document: they would be stale on re-import
        // and an explicit step_id overrides positional resolution.
        assert!(json["ingredients"][0].get("step_id").is_none());
        assert!(json["export_info"]["exported_at"].is_string());
    }
}

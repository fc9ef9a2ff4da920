//! Creates or replaces a recipe aggregate (the recipe row, its ordered
//! steps and its ingredient links) as one atomic unit.

use std::collections::HashSet;

use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::recipes::dto::{CompleteRecipeRequest, IngredientLinkInput};
use crate::recipes::repo::{self, Recipe};

/// Inserts a new recipe together with its steps and ingredient links.
/// Everything lands in one transaction; on any failure the whole
/// operation rolls back and the cause is reported to the caller.
pub async fn create_complete(
    db: &PgPool,
    owner_id: Uuid,
    payload: &CompleteRecipeRequest,
) -> Result<Recipe, AppError> {
    validate(payload)?;

    let mut tx = db.begin().await.map_err(anyhow::Error::from)?;
    match insert_aggregate(&mut tx, owner_id, payload).await {
        Ok(recipe) => {
            tx.commit().await.map_err(anyhow::Error::from)?;
            info!(
                recipe_id = %recipe.id,
                user_id = %owner_id,
                steps = payload.steps.len(),
                ingredients = payload.ingredients.len(),
                "recipe aggregate created"
            );
            Ok(recipe)
        }
        Err(e) => {
            warn!(user_id = %owner_id, error = %e, "create-complete rolled back");
            tx.rollback().await.ok();
            Err(AppError::TransactionFailure(e.to_string()))
        }
    }
}

/// Replaces an existing recipe's fields, steps and ingredient links as a
/// unit. Ownership must already be established by the guard.
pub async fn replace_complete(
    db: &PgPool,
    recipe_id: Uuid,
    payload: &CompleteRecipeRequest,
) -> Result<Recipe, AppError> {
    validate(payload)?;

    let mut tx = db.begin().await.map_err(anyhow::Error::from)?;
    match replace_aggregate(&mut tx, recipe_id, payload).await {
        Ok(recipe) => {
            tx.commit().await.map_err(anyhow::Error::from)?;
            info!(
                recipe_id = %recipe.id,
                steps = payload.steps.len(),
                ingredients = payload.ingredients.len(),
                "recipe aggregate replaced"
            );
            Ok(recipe)
        }
        Err(e) => {
            warn!(recipe_id = %recipe_id, error = %e, "replace-complete rolled back");
            tx.rollback().await.ok();
            Err(AppError::TransactionFailure(e.to_string()))
        }
    }
}

async fn insert_aggregate(
    tx: &mut Transaction<'_, Postgres>,
    owner_id: Uuid,
    payload: &CompleteRecipeRequest,
) -> anyhow::Result<Recipe> {
    let recipe = repo::insert_recipe(tx, owner_id, &payload.recipe).await?;
    let step_ids = insert_steps(tx, recipe.id, payload).await?;
    insert_links(tx, recipe.id, &payload.ingredients, &step_ids).await?;
    Ok(recipe)
}

async fn replace_aggregate(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    payload: &CompleteRecipeRequest,
) -> anyhow::Result<Recipe> {
    let recipe = repo::update_recipe_fields(tx, recipe_id, &payload.recipe).await?;
    // Links reference steps, so they must go first.
    repo::delete_links(tx, recipe_id).await?;
    repo::delete_steps(tx, recipe_id).await?;
    let step_ids = insert_steps(tx, recipe.id, payload).await?;
    insert_links(tx, recipe.id, &payload.ingredients, &step_ids).await?;
    Ok(recipe)
}

/// Inserts steps in the order the client sent them and returns the
/// generated ids in that same order. Positional correspondence with the
/// input array is what ingredient links resolve against, not the
/// `order_number` values.
async fn insert_steps(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    payload: &CompleteRecipeRequest,
) -> anyhow::Result<Vec<Uuid>> {
    let mut ids = Vec::with_capacity(payload.steps.len());
    for step in &payload.steps {
        let inserted = repo::insert_step(tx, recipe_id, step).await?;
        ids.push(inserted.id);
    }
    Ok(ids)
}

async fn insert_links(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    links: &[IngredientLinkInput],
    step_ids: &[Uuid],
) -> anyhow::Result<()> {
    for (index, link) in links.iter().enumerate() {
        let step_id = resolve_step_id(link, index, step_ids);
        repo::insert_link(tx, recipe_id, link.ingredient_id, link.quantity, step_id).await?;
    }
    Ok(())
}

/// An explicit step reference wins; otherwise the i-th link borrows the
/// i-th inserted step's id, when a step exists at that index.
fn resolve_step_id(link: &IngredientLinkInput, index: usize, step_ids: &[Uuid]) -> Option<Uuid> {
    link.step_id.or_else(|| step_ids.get(index).copied())
}

/// Boundary checks, run before the transaction is opened. Duplicate
/// `order_number` values are rejected rather than renumbered.
fn validate(payload: &CompleteRecipeRequest) -> Result<(), AppError> {
    if payload.recipe.title.trim().is_empty() {
        return Err(AppError::Validation("Title must not be empty".into()));
    }
    if payload.recipe.preparation_time < 0 || payload.recipe.cooking_time < 0 {
        return Err(AppError::Validation(
            "Preparation and cooking times must not be negative".into(),
        ));
    }
    if payload.recipe.servings <= 0 {
        return Err(AppError::Validation("Servings must be positive".into()));
    }

    let mut seen = HashSet::with_capacity(payload.steps.len());
    for step in &payload.steps {
        if !seen.insert(step.order_number) {
            return Err(AppError::Validation(format!(
                "Duplicate step order_number {}",
                step.order_number
            )));
        }
    }

    for (index, link) in payload.ingredients.iter().enumerate() {
        if link.quantity <= 0.0 {
            return Err(AppError::Validation(format!(
                "Ingredient quantity must be positive (entry {})",
                index
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipes::dto::{RecipeFields, StepInput};
    use axum::http::StatusCode;

    fn link(step_id: Option<Uuid>) -> IngredientLinkInput {
        IngredientLinkInput {
            ingredient_id: Uuid::new_v4(),
            quantity: 1.0,
            step_id,
        }
    }

    fn step(order_number: i32) -> StepInput {
        StepInput {
            order_number,
            action_type: "cook".into(),
            temperature: 100,
            speed: 0,
            duration: 10,
            description: "boil".into(),
        }
    }

    fn payload(steps: Vec<StepInput>, ingredients: Vec<IngredientLinkInput>) -> CompleteRecipeRequest {
        CompleteRecipeRequest {
            recipe: RecipeFields {
                title: "Pasta".into(),
                description: "Noodles".into(),
                is_public: true,
                preparation_time: 5,
                cooking_time: 15,
                servings: 2,
            },
            steps,
            ingredients,
        }
    }

    #[test]
    fn positional_resolution_pairs_links_with_steps_by_index() {
        let step_ids = vec![Uuid::new_v4(), Uuid::new_v4()];
        assert_eq!(
            resolve_step_id(&link(None), 0, &step_ids),
            Some(step_ids[0])
        );
        assert_eq!(
            resolve_step_id(&link(None), 1, &step_ids),
            Some(step_ids[1])
        );
    }

    #[test]
    fn positional_resolution_runs_out_with_the_steps() {
        let step_ids = vec![Uuid::new_v4()];
        assert_eq!(resolve_step_id(&link(None), 1, &step_ids), None);
        assert_eq!(resolve_step_id(&link(None), 5, &step_ids), None);
    }

    #[test]
    fn explicit_step_reference_wins_over_position() {
        let step_ids = vec![Uuid::new_v4(), Uuid::new_v4()];
        let explicit = Uuid::new_v4();
        assert_eq!(
            resolve_step_id(&link(Some(explicit)), 0, &step_ids),
            Some(explicit)
        );
    }

    #[test]
    fn valid_payload_passes() {
        assert!(validate(&payload(vec![step(1), step(2)], vec![link(None)])).is_ok());
    }

    #[test]
    fn duplicate_order_numbers_are_rejected() {
        let err = validate(&payload(vec![step(1), step(1)], vec![])).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("order_number"));
    }

    #[test]
    fn gapped_order_numbers_are_accepted() {
        assert!(validate(&payload(vec![step(1), step(5), step(9)], vec![])).is_ok());
    }

    #[test]
    fn nonpositive_quantity_is_rejected() {
        let mut bad = link(None);
        bad.quantity = 0.0;
        let err = validate(&payload(vec![step(1)], vec![bad])).unwrap_err();
        assert!(err.to_string().contains("quantity"));
    }

    #[test]
    fn empty_title_is_rejected() {
        let mut p = payload(vec![], vec![]);
        p.recipe.title = "   ".into();
        assert!(validate(&p).is_err());
    }

    #[test]
    fn negative_times_and_zero_servings_are_rejected() {
        let mut p = payload(vec![], vec![]);
        p.recipe.cooking_time = -1;
        assert!(validate(&p).is_err());

        let mut p = payload(vec![], vec![]);
        p.recipe.servings = 0;
        assert!(validate(&p).is_err());
    }
}

//! Duplicates a recipe aggregate under a new owner, remapping step
//! references through an old-id to new-id map.

use std::collections::HashMap;

use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::recipes::guard;
use crate::recipes::repo::{self, Recipe};

const COPY_SUFFIX: &str = " (Copy)";

/// Copies another user's recipe into the requester's collection. The
/// copy is always private, whatever the source's visibility was.
pub async fn copy_recipe(
    db: &PgPool,
    source_id: Uuid,
    requester: Uuid,
) -> Result<Recipe, AppError> {
    let source = guard::fetch_recipe(db, source_id).await?;

    if source.user_id == requester {
        return Err(AppError::Validation(
            "You cannot copy your own recipe".into(),
        ));
    }
    if !source.is_public {
        return Err(AppError::Forbidden("This recipe is private".into()));
    }

    let mut tx = db.begin().await.map_err(anyhow::Error::from)?;
    match copy_aggregate(&mut tx, &source, requester).await {
        Ok(recipe) => {
            tx.commit().await.map_err(anyhow::Error::from)?;
            info!(
                source_id = %source.id,
                recipe_id = %recipe.id,
                user_id = %requester,
                "recipe copied"
            );
            Ok(recipe)
        }
        Err(e) => {
            warn!(source_id = %source.id, user_id = %requester, error = %e, "copy rolled back");
            tx.rollback().await.ok();
            Err(AppError::Internal(e))
        }
    }
}

async fn copy_aggregate(
    tx: &mut Transaction<'_, Postgres>,
    source: &Recipe,
    new_owner: Uuid,
) -> anyhow::Result<Recipe> {
    let fields = crate::recipes::dto::RecipeFields {
        title: format!("{}{}", source.title, COPY_SUFFIX),
        description: source.description.clone(),
        is_public: false,
        preparation_time: source.preparation_time,
        cooking_time: source.cooking_time,
        servings: source.servings,
    };
    let copy = repo::insert_recipe(tx, new_owner, &fields).await?;

    // Steps are read ordered by order_number and inserted in that order;
    // the map pairs each source step with its copy.
    let source_steps = repo::steps_for_recipe_tx(tx, source.id).await?;
    let mut step_map = HashMap::with_capacity(source_steps.len());
    for step in &source_steps {
        let inserted = repo::copy_step(tx, copy.id, step).await?;
        step_map.insert(step.id, inserted.id);
    }

    let links = repo::links_for_recipe_tx(tx, source.id).await?;
    for link in &links {
        let step_id = remap_step_id(link.step_id, &step_map);
        repo::insert_link(tx, copy.id, link.ingredient_id, link.quantity, step_id).await?;
    }

    Ok(copy)
}

/// A link with no step stays that way; a known source step id maps to
/// its copy.
fn remap_step_id(old: Option<Uuid>, map: &HashMap<Uuid, Uuid>) -> Option<Uuid> {
    old.and_then(|id| map.get(&id).copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_step_reference_stays_null() {
        let map = HashMap::from([(Uuid::new_v4(), Uuid::new_v4())]);
        assert_eq!(remap_step_id(None, &map), None);
    }

    #[test]
    fn step_reference_maps_to_the_corresponding_copy() {
        let old_s1 = Uuid::new_v4();
        let old_s2 = Uuid::new_v4();
        let new_s1 = Uuid::new_v4();
        let new_s2 = Uuid::new_v4();
        let map = HashMap::from([(old_s1, new_s1), (old_s2, new_s2)]);

        // A link that pointed at the second source step must point at the
        // second copied step, not the first and not nothing.
        assert_eq!(remap_step_id(Some(old_s2), &map), Some(new_s2));
        assert_eq!(remap_step_id(Some(old_s1), &map), Some(new_s1));
    }

    #[test]
    fn unknown_step_reference_is_dropped() {
        let map = HashMap::from([(Uuid::new_v4(), Uuid::new_v4())]);
        assert_eq!(remap_step_id(Some(Uuid::new_v4()), &map), None);
    }

    #[test]
    fn copy_suffix_is_appended_to_the_title() {
        assert_eq!(format!("{}{}", "Borscht", COPY_SUFFIX), "Borscht (Copy)");
    }
}

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::recipes::repo::{self, Recipe};

/// Loads a recipe or fails with NotFound. Lookup comes before any
/// ownership decision, so a missing id is never reported as Forbidden.
pub async fn fetch_recipe(db: &PgPool, id: Uuid) -> Result<Recipe, AppError> {
    repo::find_recipe(db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".into()))
}

/// Read access: public recipes for everyone, private only for the owner.
pub fn authorize_read(recipe: &Recipe, requester: Option<Uuid>) -> Result<(), AppError> {
    if recipe.is_public || requester == Some(recipe.user_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You do not have access to this recipe".into(),
        ))
    }
}

/// Mutation is owner-only.
pub fn authorize_mutate(recipe: &Recipe, requester: Uuid) -> Result<(), AppError> {
    if recipe.user_id == requester {
        Ok(())
    } else {
        Err(AppError::Forbidden("You do not own this recipe".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use time::OffsetDateTime;

    fn recipe(owner: Uuid, is_public: bool) -> Recipe {
        let now = OffsetDateTime::now_utc();
        Recipe {
            id: Uuid::new_v4(),
            title: "Stock".into(),
            description: "Bones and time".into(),
            is_public,
            preparation_time: 10,
            cooking_time: 240,
            servings: 8,
            user_id: owner,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn public_recipe_is_readable_by_anyone() {
        let owner = Uuid::new_v4();
        let recipe = recipe(owner, true);
        assert!(authorize_read(&recipe, None).is_ok());
        assert!(authorize_read(&recipe, Some(Uuid::new_v4())).is_ok());
        assert!(authorize_read(&recipe, Some(owner)).is_ok());
    }

    #[test]
    fn private_recipe_is_readable_only_by_owner() {
        let owner = Uuid::new_v4();
        let recipe = recipe(owner, false);
        assert!(authorize_read(&recipe, Some(owner)).is_ok());

        let err = authorize_read(&recipe, None).unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        let err = authorize_read(&recipe, Some(Uuid::new_v4())).unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn mutation_is_owner_only_even_for_public_recipes() {
        let owner = Uuid::new_v4();
        let recipe = recipe(owner, true);
        assert!(authorize_mutate(&recipe, owner).is_ok());

        let err = authorize_mutate(&recipe, Uuid::new_v4()).unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }
}

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::{AuthUser, OptionalAuthUser},
    error::AppError,
    recipes::copy,
    recipes::dto::{
        CompleteRecipeRequest, ExportInfo, Pagination, RecipeExport, RecipeIngredientView,
        RecipeResponse, StepResponse,
    },
    recipes::guard,
    recipes::repo,
    recipes::sync,
    state::AppState,
    users::repo::User,
};

pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes))
        .route("/recipes/current", get(list_own_recipes))
        .route("/recipes/user/:user_id", get(list_user_recipes))
        .route("/recipes/complete", post(create_complete))
        .route("/recipes/:id", get(get_recipe).delete(delete_recipe))
        .route("/recipes/:id/complete", put(replace_complete))
        .route("/recipes/:id/steps", get(get_recipe_steps))
        .route("/recipes/:id/ingredients", get(get_recipe_ingredients))
        .route("/recipes/:id/copy", post(copy_recipe))
        .route("/recipes/:id/download", get(download_recipe))
}

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<RecipeResponse>>, AppError> {
    let recipes = repo::list_public(&state.db, p.limit, p.offset).await?;
    Ok(Json(recipes.into_iter().map(RecipeResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn list_own_recipes(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<RecipeResponse>>, AppError> {
    let recipes = repo::list_by_user(&state.db, user_id, true, p.limit, p.offset).await?;
    Ok(Json(recipes.into_iter().map(RecipeResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn list_user_recipes(
    State(state): State<AppState>,
    OptionalAuthUser(requester): OptionalAuthUser,
    Path(user_id): Path<Uuid>,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<RecipeResponse>>, AppError> {
    User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let include_private = requester == Some(user_id);
    let recipes =
        repo::list_by_user(&state.db, user_id, include_private, p.limit, p.offset).await?;
    Ok(Json(recipes.into_iter().map(RecipeResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    OptionalAuthUser(requester): OptionalAuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RecipeResponse>, AppError> {
    let recipe = guard::fetch_recipe(&state.db, id).await?;
    guard::authorize_read(&recipe, requester)?;
    Ok(Json(RecipeResponse::from(recipe)))
}

#[instrument(skip(state))]
pub async fn get_recipe_steps(
    State(state): State<AppState>,
    OptionalAuthUser(requester): OptionalAuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<StepResponse>>, AppError> {
    let recipe = guard::fetch_recipe(&state.db, id).await?;
    guard::authorize_read(&recipe, requester)?;
    let steps = repo::steps_for_recipe(&state.db, id).await?;
    Ok(Json(steps.into_iter().map(StepResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_recipe_ingredients(
    State(state): State<AppState>,
    OptionalAuthUser(requester): OptionalAuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<RecipeIngredientView>>, AppError> {
    let recipe = guard::fetch_recipe(&state.db, id).await?;
    guard::authorize_read(&recipe, requester)?;
    let views = repo::ingredient_views(&state.db, id).await?;
    Ok(Json(views))
}

#[instrument(skip(state, payload))]
pub async fn create_complete(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CompleteRecipeRequest>,
) -> Result<(StatusCode, Json<RecipeResponse>), AppError> {
    let recipe = sync::create_complete(&state.db, user_id, &payload).await?;
    Ok((StatusCode::CREATED, Json(RecipeResponse::from(recipe))))
}

#[instrument(skip(state, payload))]
pub async fn replace_complete(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CompleteRecipeRequest>,
) -> Result<Json<RecipeResponse>, AppError> {
    let recipe = guard::fetch_recipe(&state.db, id).await?;
    guard::authorize_mutate(&recipe, user_id)?;

    let updated = sync::replace_complete(&state.db, id, &payload).await?;
    Ok(Json(RecipeResponse::from(updated)))
}

#[instrument(skip(state))]
pub async fn copy_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<RecipeResponse>), AppError> {
    let recipe = copy::copy_recipe(&state.db, id, user_id).await?;
    Ok((StatusCode::CREATED, Json(RecipeResponse::from(recipe))))
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let recipe = guard::fetch_recipe(&state.db, id).await?;
    guard::authorize_mutate(&recipe, user_id)?;

    repo::delete_recipe(&state.db, id).await?;
    info!(recipe_id = %id, user_id = %user_id, "recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn download_recipe(
    State(state): State<AppState>,
    OptionalAuthUser(requester): OptionalAuthUser,
    Path(id): Path<Uuid>,
) -> Result<(HeaderMap, Json<RecipeExport>), AppError> {
    let recipe = guard::fetch_recipe(&state.db, id).await?;
    guard::authorize_read(&recipe, requester)?;

    let steps = repo::steps_for_recipe(&state.db, id).await?;
    let ingredients = repo::ingredient_views(&state.db, id).await?;

    let filename = attachment_filename(&recipe.title);
    let mut headers = HeaderMap::new();
    headers.insert(
        axum::http::header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{}\"", filename)
            .parse()
            .map_err(|e| anyhow::anyhow!("content-disposition header: {e}"))?,
    );

    let export = RecipeExport {
        recipe: RecipeResponse::from(recipe),
        steps: steps.into_iter().map(StepResponse::from).collect(),
        ingredients,
        export_info: ExportInfo {
            exported_at: OffsetDateTime::now_utc(),
            format: "recipebox-export/1".into(),
            source: format!("recipebox {}", env!("CARGO_PKG_VERSION")),
        },
    };

    Ok((headers, Json(export)))
}

/// ASCII-safe download filename derived from the recipe title.
fn attachment_filename(title: &str) -> String {
    let slug: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "recipe.json".to_string()
    } else {
        format!("{}.json", slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_is_slugged_and_json_suffixed() {
        assert_eq!(
            attachment_filename("Classic Spaghetti Carbonara"),
            "classic_spaghetti_carbonara.json"
        );
        assert_eq!(attachment_filename("Crème Brûlée!"), "cr_me_br_l_e.json");
    }

    #[test]
    fn filename_falls_back_when_nothing_survives() {
        assert_eq!(attachment_filename("!!!"), "recipe.json");
        assert_eq!(attachment_filename(""), "recipe.json");
    }
}

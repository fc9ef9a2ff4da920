use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    ingredients::category::Category,
    ingredients::dto::{
        CreateIngredientRequest, IngredientResponse, ListQuery, SearchQuery,
        UpdateIngredientRequest,
    },
    ingredients::repo,
    state::AppState,
};

pub fn ingredient_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/ingredients",
            get(list_ingredients).post(create_ingredient),
        )
        .route("/ingredients/categories", get(list_categories))
        .route("/ingredients/search/:term", get(search_ingredients))
        .route(
            "/ingredients/:id",
            get(get_ingredient)
                .put(update_ingredient)
                .delete(delete_ingredient),
        )
}

/// Validates an optional category filter, returning it as a bindable str.
fn category_filter(raw: Option<&String>) -> Result<Option<&str>, AppError> {
    match raw {
        Some(value) => Ok(Some(Category::parse(value)?.as_str())),
        None => Ok(None),
    }
}

#[instrument(skip(state))]
pub async fn list_ingredients(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<IngredientResponse>>, AppError> {
    let category = category_filter(q.category.as_ref())?;
    let rows = repo::list(&state.db, category, q.limit, q.offset).await?;
    Ok(Json(rows.into_iter().map(IngredientResponse::from).collect()))
}

pub async fn list_categories() -> Json<Vec<&'static str>> {
    Json(Category::names())
}

#[instrument(skip(state))]
pub async fn search_ingredients(
    State(state): State<AppState>,
    Path(term): Path<String>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<Vec<IngredientResponse>>, AppError> {
    let category = category_filter(q.category.as_ref())?;
    let rows = repo::search(&state.db, &term, category, q.limit).await?;
    Ok(Json(rows.into_iter().map(IngredientResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<IngredientResponse>, AppError> {
    let ingredient = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Ingredient not found".into()))?;
    Ok(Json(IngredientResponse::from(ingredient)))
}

#[instrument(skip(state, payload))]
pub async fn create_ingredient(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateIngredientRequest>,
) -> Result<(StatusCode, Json<IngredientResponse>), AppError> {
    let name = payload.name.trim().to_string();
    let unit = payload.unit.trim().to_string();
    if name.is_empty() || unit.is_empty() {
        return Err(AppError::Validation("Name and unit are required".into()));
    }

    let category = match payload.category.as_deref() {
        Some(value) => Category::parse(value)?,
        None => Category::default(),
    };

    if repo::find_by_name(&state.db, &name, None).await?.is_some() {
        warn!(name = %name, "ingredient already exists");
        return Err(AppError::Conflict(format!(
            "Ingredient '{}' already exists",
            name
        )));
    }

    let ingredient = repo::insert(&state.db, &name, &unit, category.as_str()).await?;
    info!(ingredient_id = %ingredient.id, user_id = %user_id, "ingredient created");
    Ok((StatusCode::CREATED, Json(IngredientResponse::from(ingredient))))
}

#[instrument(skip(state, payload))]
pub async fn update_ingredient(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateIngredientRequest>,
) -> Result<Json<IngredientResponse>, AppError> {
    repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Ingredient not found".into()))?;

    let category = match payload.category.as_deref() {
        Some(value) => Some(Category::parse(value)?),
        None => None,
    };

    let name = payload.name.as_deref().map(str::trim);
    if let Some(name) = name {
        if name.is_empty() {
            return Err(AppError::Validation("Name must not be empty".into()));
        }
        if repo::find_by_name(&state.db, name, Some(id)).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Ingredient '{}' already exists",
                name
            )));
        }
    }
    let unit = payload.unit.as_deref().map(str::trim);

    let ingredient = repo::update(
        &state.db,
        id,
        name,
        unit,
        category.map(|c| c.as_str()),
    )
    .await?;
    info!(ingredient_id = %ingredient.id, user_id = %user_id, "ingredient updated");
    Ok(Json(IngredientResponse::from(ingredient)))
}

#[instrument(skip(state))]
pub async fn delete_ingredient(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Ingredient not found".into()))?;

    if repo::reference_count(&state.db, id).await? > 0 {
        return Err(AppError::Conflict(
            "Cannot delete ingredient that is used in recipes".into(),
        ));
    }

    repo::delete(&state.db, id).await?;
    info!(ingredient_id = %id, user_id = %user_id, "ingredient deleted");
    Ok(StatusCode::NO_CONTENT)
}

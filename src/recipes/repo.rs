use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::recipes::dto::{RecipeFields, RecipeIngredientView, StepInput};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipe {
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

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Step {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub order_number: i32,
    pub action_type: String,
    pub temperature: i32,
    pub speed: i32,
    pub duration: i32,
    pub description: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecipeIngredient {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub ingredient_id: Uuid,
    pub quantity: f64,
    pub step_id: Option<Uuid>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

// --- pool-level reads ---

pub async fn find_recipe(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Recipe>> {
    let recipe = sqlx::query_as::<_, Recipe>(
        r#"
        SELECT id, title, description, is_public, preparation_time, cooking_time,
               servings, user_id, created_at, updated_at
        FROM recipes
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(recipe)
}

pub async fn list_public(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<Recipe>> {
    let rows = sqlx::query_as::<_, Recipe>(
        r#"
        SELECT id, title, description, is_public, preparation_time, cooking_time,
               servings, user_id, created_at, updated_at
        FROM recipes
        WHERE is_public = true
        ORDER BY created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// A user's recipes. Private rows are included only when the caller has
/// been established as that user.
pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    include_private: bool,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Recipe>> {
    let rows = sqlx::query_as::<_, Recipe>(
        r#"
        SELECT id, title, description, is_public, preparation_time, cooking_time,
               servings, user_id, created_at, updated_at
        FROM recipes
        WHERE user_id = $1 AND (is_public = true OR $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(user_id)
    .bind(include_private)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn steps_for_recipe(db: &PgPool, recipe_id: Uuid) -> anyhow::Result<Vec<Step>> {
    let rows = sqlx::query_as::<_, Step>(
        r#"
        SELECT id, recipe_id, order_number, action_type, temperature, speed,
               duration, description, created_at, updated_at
        FROM steps
        WHERE recipe_id = $1
        ORDER BY order_number ASC
        "#,
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Ingredient links joined with catalog name/unit, in insertion order.
pub async fn ingredient_views(
    db: &PgPool,
    recipe_id: Uuid,
) -> anyhow::Result<Vec<RecipeIngredientView>> {
    let rows = sqlx::query_as::<_, RecipeIngredientView>(
        r#"
        SELECT ri.ingredient_id, i.name, ri.quantity, i.unit
        FROM recipe_ingredients ri
        JOIN ingredients i ON ri.ingredient_id = i.id
        WHERE ri.recipe_id = $1
        ORDER BY ri.created_at ASC
        "#,
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Deletes a recipe; steps and ingredient links go with it through the
/// foreign-key cascade.
pub async fn delete_recipe(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

// --- transaction-scoped writes ---
//
// These take an explicit transaction handle: the synchronizer and the
// cloning engine decide the transaction boundary, not the repo.

pub async fn insert_recipe(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    fields: &RecipeFields,
) -> anyhow::Result<Recipe> {
    let recipe = sqlx::query_as::<_, Recipe>(
        r#"
        INSERT INTO recipes (title, description, is_public, preparation_time,
                             cooking_time, servings, user_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, title, description, is_public, preparation_time, cooking_time,
                  servings, user_id, created_at, updated_at
        "#,
    )
    .bind(&fields.title)
    .bind(&fields.description)
    .bind(fields.is_public)
    .bind(fields.preparation_time)
    .bind(fields.cooking_time)
    .bind(fields.servings)
    .bind(user_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(recipe)
}

pub async fn update_recipe_fields(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    fields: &RecipeFields,
) -> anyhow::Result<Recipe> {
    let recipe = sqlx::query_as::<_, Recipe>(
        r#"
        UPDATE recipes
        SET title = $2, description = $3, is_public = $4, preparation_time = $5,
            cooking_time = $6, servings = $7, updated_at = now()
        WHERE id = $1
        RETURNING id, title, description, is_public, preparation_time, cooking_time,
                  servings, user_id, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(&fields.title)
    .bind(&fields.description)
    .bind(fields.is_public)
    .bind(fields.preparation_time)
    .bind(fields.cooking_time)
    .bind(fields.servings)
    .fetch_one(&mut **tx)
    .await?;
    Ok(recipe)
}

pub async fn insert_step(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    step: &StepInput,
) -> anyhow::Result<Step> {
    let row = sqlx::query_as::<_, Step>(
        r#"
        INSERT INTO steps (recipe_id, order_number, action_type, temperature,
                           speed, duration, description)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, recipe_id, order_number, action_type, temperature, speed,
                  duration, description, created_at, updated_at
        "#,
    )
    .bind(recipe_id)
    .bind(step.order_number)
    .bind(&step.action_type)
    .bind(step.temperature)
    .bind(step.speed)
    .bind(step.duration)
    .bind(&step.description)
    .fetch_one(&mut **tx)
    .await?;
    Ok(row)
}

/// Inserts a verbatim copy of an existing step under another recipe.
pub async fn copy_step(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    source: &Step,
) -> anyhow::Result<Step> {
    let row = sqlx::query_as::<_, Step>(
        r#"
        INSERT INTO steps (recipe_id, order_number, action_type, temperature,
                           speed, duration, description)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, recipe_id, order_number, action_type, temperature, speed,
                  duration, description, created_at, updated_at
        "#,
    )
    .bind(recipe_id)
    .bind(source.order_number)
    .bind(&source.action_type)
    .bind(source.temperature)
    .bind(source.speed)
    .bind(source.duration)
    .bind(&source.description)
    .fetch_one(&mut **tx)
    .await?;
    Ok(row)
}

pub async fn insert_link(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    ingredient_id: Uuid,
    quantity: f64,
    step_id: Option<Uuid>,
) -> anyhow::Result<RecipeIngredient> {
    let row = sqlx::query_as::<_, RecipeIngredient>(
        r#"
        INSERT INTO recipe_ingredients (recipe_id, ingredient_id, quantity, step_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id, recipe_id, ingredient_id, quantity, step_id, created_at, updated_at
        "#,
    )
    .bind(recipe_id)
    .bind(ingredient_id)
    .bind(quantity)
    .bind(step_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(row)
}

pub async fn delete_links(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
) -> anyhow::Result<u64> {
    let result = sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_steps(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
) -> anyhow::Result<u64> {
    let result = sqlx::query("DELETE FROM steps WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

pub async fn steps_for_recipe_tx(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
) -> anyhow::Result<Vec<Step>> {
    let rows = sqlx::query_as::<_, Step>(
        r#"
        SELECT id, recipe_id, order_number, action_type, temperature, speed,
               duration, description, created_at, updated_at
        FROM steps
        WHERE recipe_id = $1
        ORDER BY order_number ASC
        "#,
    )
    .bind(recipe_id)
    .fetch_all(&mut **tx)
    .await?;
    Ok(rows)
}

pub async fn links_for_recipe_tx(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
) -> anyhow::Result<Vec<RecipeIngredient>> {
    let rows = sqlx::query_as::<_, RecipeIngredient>(
        r#"
        SELECT id, recipe_id, ingredient_id, quantity, step_id, created_at, updated_at
        FROM recipe_ingredients
        WHERE recipe_id = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(recipe_id)
    .fetch_all(&mut **tx)
    .await?;
    Ok(rows)
}

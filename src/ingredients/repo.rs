use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Reusable ingredient shared across recipes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
    pub category: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

pub async fn list(
    db: &PgPool,
    category: Option<&str>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Ingredient>> {
    let rows = sqlx::query_as::<_, Ingredient>(
        r#"
        SELECT id, name, unit, category, created_at, updated_at
        FROM ingredients
        WHERE ($1::text IS NULL OR category = $1)
        ORDER BY name ASC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(category)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn search(
    db: &PgPool,
    term: &str,
    category: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Ingredient>> {
    let pattern = format!("%{}%", term);
    let rows = sqlx::query_as::<_, Ingredient>(
        r#"
        SELECT id, name, unit, category, created_at, updated_at
        FROM ingredients
        WHERE name ILIKE $1 AND ($2::text IS NULL OR category = $2)
        ORDER BY name ASC
        LIMIT $3
        "#,
    )
    .bind(pattern)
    .bind(category)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Ingredient>> {
    let row = sqlx::query_as::<_, Ingredient>(
        r#"
        SELECT id, name, unit, category, created_at, updated_at
        FROM ingredients
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Case-insensitive name lookup, optionally excluding one row (so an
/// update does not collide with itself).
pub async fn find_by_name(
    db: &PgPool,
    name: &str,
    exclude: Option<Uuid>,
) -> anyhow::Result<Option<Ingredient>> {
    let row = sqlx::query_as::<_, Ingredient>(
        r#"
        SELECT id, name, unit, category, created_at, updated_at
        FROM ingredients
        WHERE lower(name) = lower($1) AND ($2::uuid IS NULL OR id <> $2)
        "#,
    )
    .bind(name)
    .bind(exclude)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn insert(
    db: &PgPool,
    name: &str,
    unit: &str,
    category: &str,
) -> anyhow::Result<Ingredient> {
    let row = sqlx::query_as::<_, Ingredient>(
        r#"
        INSERT INTO ingredients (name, unit, category)
        VALUES ($1, $2, $3)
        RETURNING id, name, unit, category, created_at, updated_at
        "#,
    )
    .bind(name)
    .bind(unit)
    .bind(category)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn update(
    db: &PgPool,
    id: Uuid,
    name: Option<&str>,
    unit: Option<&str>,
    category: Option<&str>,
) -> anyhow::Result<Ingredient> {
    let row = sqlx::query_as::<_, Ingredient>(
        r#"
        UPDATE ingredients
        SET name = COALESCE($2, name),
            unit = COALESCE($3, unit),
            category = COALESCE($4, category),
            updated_at = now()
        WHERE id = $1
        RETURNING id, name, unit, category, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(unit)
    .bind(category)
    .fetch_one(db)
    .await?;
    Ok(row)
}

/// How many recipe links still reference this ingredient.
pub async fn reference_count(db: &PgPool, id: Uuid) -> anyhow::Result<i64> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM recipe_ingredients WHERE ingredient_id = $1")
            .bind(id)
            .fetch_one(db)
            .await?;
    Ok(count)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM ingredients WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

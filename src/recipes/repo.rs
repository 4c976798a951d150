use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::RecipeRow;

const RECIPE_COLUMNS: &str = r#"
    id, name, type, description, ingredients, instructions, prep_time, cook_time,
    servings, calories, protein, carbs, fat, image_src, requires_blender, requires_cooking
"#;

/// Page through the catalog, optionally restricted to one recipe type.
pub async fn list(
    db: &PgPool,
    kind: Option<&str>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<RecipeRow>> {
    let sql = format!(
        r#"
        SELECT {RECIPE_COLUMNS}
          FROM recipes
         WHERE ($1::text IS NULL OR lower(type) = lower($1))
         ORDER BY name ASC
         LIMIT $2 OFFSET $3
        "#
    );
    let rows = sqlx::query_as::<_, RecipeRow>(&sql)
        .bind(kind)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
        .context("list recipes")?;
    Ok(rows)
}

/// The whole catalog, used by regeneration.
pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<RecipeRow>> {
    let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes ORDER BY name ASC");
    let rows = sqlx::query_as::<_, RecipeRow>(&sql)
        .fetch_all(db)
        .await
        .context("list all recipes")?;
    Ok(rows)
}

pub async fn get(db: &PgPool, id: Uuid) -> anyhow::Result<Option<RecipeRow>> {
    let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1");
    let row = sqlx::query_as::<_, RecipeRow>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await
        .context("get recipe")?;
    Ok(row)
}

pub async fn get_many(db: &PgPool, ids: &[Uuid]) -> anyhow::Result<Vec<RecipeRow>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ANY($1)");
    let rows = sqlx::query_as::<_, RecipeRow>(&sql)
        .bind(ids)
        .fetch_all(db)
        .await
        .context("get recipes by ids")?;
    Ok(rows)
}

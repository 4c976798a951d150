use anyhow::Context;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::model::NutritionGoals;

#[derive(Debug, FromRow)]
struct GoalsRow {
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
}

impl From<GoalsRow> for NutritionGoals {
    fn from(r: GoalsRow) -> Self {
        Self {
            calories: r.calories,
            protein: r.protein,
            carbs: r.carbs,
            fat: r.fat,
        }
    }
}

pub async fn get(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<NutritionGoals>> {
    let row = sqlx::query_as::<_, GoalsRow>(
        r#"
        SELECT calories, protein, carbs, fat
          FROM nutrition_goals
         WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("get nutrition goals")?;
    Ok(row.map(NutritionGoals::from))
}

/// Stored goals, or the defaults for users who never set any.
pub async fn get_or_default(db: &PgPool, user_id: Uuid) -> anyhow::Result<NutritionGoals> {
    Ok(get(db, user_id).await?.unwrap_or_default())
}

pub async fn upsert(
    db: &PgPool,
    user_id: Uuid,
    goals: &NutritionGoals,
) -> anyhow::Result<NutritionGoals> {
    let row = sqlx::query_as::<_, GoalsRow>(
        r#"
        INSERT INTO nutrition_goals (user_id, calories, protein, carbs, fat)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id) DO UPDATE
           SET calories = EXCLUDED.calories,
               protein = EXCLUDED.protein,
               carbs = EXCLUDED.carbs,
               fat = EXCLUDED.fat,
               updated_at = now()
        RETURNING calories, protein, carbs, fat
        "#,
    )
    .bind(user_id)
    .bind(goals.calories)
    .bind(goals.protein)
    .bind(goals.carbs)
    .bind(goals.fat)
    .fetch_one(db)
    .await
    .context("upsert nutrition goals")?;
    Ok(row.into())
}

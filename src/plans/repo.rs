use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};
use time::Date;
use uuid::Uuid;

use super::layout::PlanSlot;
use super::repo_types::{ActivationRow, PlanSlotRow, SavedPlanRow};

const PLAN_SELECT: &str = r#"
    SELECT p.id, p.name, p.description, p.tags, p.days, p.day_count, p.schema_version,
           p.created_at, p.updated_at,
           a.start_date, a.day_count AS active_days, a.activated_at
      FROM saved_meal_plans p
      LEFT JOIN plan_activations a
        ON a.plan_id = p.id AND a.user_id = p.user_id
"#;

pub async fn list(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<SavedPlanRow>> {
    let sql = format!("{PLAN_SELECT} WHERE p.user_id = $1 ORDER BY p.created_at DESC");
    let rows = sqlx::query_as::<_, SavedPlanRow>(&sql)
        .bind(user_id)
        .fetch_all(db)
        .await
        .context("list saved plans")?;
    Ok(rows)
}

pub async fn get(
    db: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
) -> anyhow::Result<Option<SavedPlanRow>> {
    let sql = format!("{PLAN_SELECT} WHERE p.user_id = $1 AND p.id = $2");
    let row = sqlx::query_as::<_, SavedPlanRow>(&sql)
        .bind(user_id)
        .bind(plan_id)
        .fetch_optional(db)
        .await
        .context("get saved plan")?;
    Ok(row)
}

pub async fn slots(db: &PgPool, plan_id: Uuid) -> anyhow::Result<Vec<PlanSlotRow>> {
    let rows = sqlx::query_as::<_, PlanSlotRow>(
        r#"
        SELECT day_index, meal_type, position, recipe_id
          FROM meal_plan_recipes
         WHERE plan_id = $1
         ORDER BY day_index, meal_type, position
        "#,
    )
    .bind(plan_id)
    .fetch_all(db)
    .await
    .context("list plan recipes")?;
    Ok(rows)
}

pub struct PlanFields<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub tags: &'a [String],
    pub day_count: i32,
}

/// Insert or overwrite the plan row. Overwriting only matches the user's own
/// plan; `false` means no row was written.
pub async fn upsert_plan_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    plan_id: Uuid,
    fields: &PlanFields<'_>,
    schema_version: i16,
) -> anyhow::Result<bool> {
    let written = sqlx::query(
        r#"
        INSERT INTO saved_meal_plans
               (id, user_id, name, description, tags, days, day_count, schema_version)
        VALUES ($1, $2, $3, $4, $5, NULL, $6, $7)
        ON CONFLICT (id) DO UPDATE
           SET name = EXCLUDED.name,
               description = EXCLUDED.description,
               tags = EXCLUDED.tags,
               days = NULL,
               day_count = EXCLUDED.day_count,
               schema_version = EXCLUDED.schema_version,
               updated_at = now()
         WHERE saved_meal_plans.user_id = EXCLUDED.user_id
        "#,
    )
    .bind(plan_id)
    .bind(user_id)
    .bind(fields.name)
    .bind(fields.description)
    .bind(fields.tags)
    .bind(fields.day_count)
    .bind(schema_version)
    .execute(&mut **tx)
    .await
    .context("upsert saved plan")?
    .rows_affected();
    Ok(written == 1)
}

pub async fn replace_slots_tx(
    tx: &mut Transaction<'_, Postgres>,
    plan_id: Uuid,
    slots: &[PlanSlot],
) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM meal_plan_recipes WHERE plan_id = $1")
        .bind(plan_id)
        .execute(&mut **tx)
        .await
        .context("clear plan recipes")?;

    for slot in slots {
        sqlx::query(
            r#"
            INSERT INTO meal_plan_recipes (plan_id, recipe_id, day_index, meal_type, position)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(plan_id)
        .bind(slot.recipe_id)
        .bind(slot.day_index)
        .bind(slot.meal_type.as_str())
        .bind(slot.position)
        .execute(&mut **tx)
        .await
        .context("insert plan recipe")?;
    }
    Ok(())
}

/// Delete the plan; its recipe rows and activation go with it.
pub async fn delete(db: &PgPool, user_id: Uuid, plan_id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM saved_meal_plans WHERE id = $1 AND user_id = $2")
        .bind(plan_id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete saved plan")?;
    Ok(res.rows_affected() == 1)
}

/// Active plans of the user, oldest activation first.
pub async fn activations(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<ActivationRow>> {
    let rows = sqlx::query_as::<_, ActivationRow>(
        r#"
        SELECT a.plan_id, p.name AS plan_name, a.start_date, a.day_count
          FROM plan_activations a
          JOIN saved_meal_plans p ON p.id = a.plan_id
         WHERE a.user_id = $1
         ORDER BY a.activated_at ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list plan activations")?;
    Ok(rows)
}

pub async fn delete_activations_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    plan_ids: &[Uuid],
) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM plan_activations WHERE user_id = $1 AND plan_id = ANY($2)")
        .bind(user_id)
        .bind(plan_ids)
        .execute(&mut **tx)
        .await
        .context("delete overlapped activations")?;
    Ok(())
}

pub async fn upsert_activation_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    plan_id: Uuid,
    start_date: Date,
    day_count: i32,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO plan_activations (user_id, plan_id, start_date, day_count)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, plan_id) DO UPDATE
           SET start_date = EXCLUDED.start_date,
               day_count = EXCLUDED.day_count,
               activated_at = now()
        "#,
    )
    .bind(user_id)
    .bind(plan_id)
    .bind(start_date)
    .bind(day_count)
    .execute(&mut **tx)
    .await
    .context("store plan activation")?;
    Ok(())
}

use std::collections::{BTreeMap, HashMap};

use anyhow::Context;
use sqlx::PgPool;
use time::Date;
use tracing::{info, warn};
use uuid::Uuid;

use super::activation::{self, ActivationConflict, ActiveWindow, PlanWindow};
use super::hub::{ActivationEvent, ActivationHub};
use super::layout::{self, PlanSlot};
use super::model::{
    ActiveDay, PlanError, PlanSummary, SavedPlan, SCHEMA_LEGACY, SCHEMA_NORMALIZED,
};
use super::repo::{self, PlanFields};
use super::repo_types::{PlanSlotRow, SavedPlanRow};
use crate::planner::model::MealPlanDay;
use crate::recipes::source::RecipeSource;

/// Plan metadata supplied when saving the draft.
#[derive(Debug, Clone, Default)]
pub struct PlanMeta {
    pub plan_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

/// Save the days as a plan, creating it or overwriting the user's plan with
/// the given id. The plan row and its recipe rows are written together.
pub async fn save(
    db: &PgPool,
    user_id: Uuid,
    meta: PlanMeta,
    days: &[MealPlanDay],
) -> Result<PlanSummary, PlanError> {
    let name = meta.name.trim();
    if name.is_empty() {
        return Err(PlanError::EmptyName);
    }
    if days.is_empty() {
        return Err(PlanError::NoDays);
    }
    let plan_id = meta.plan_id.unwrap_or_else(Uuid::new_v4);
    let fields = PlanFields {
        name,
        description: meta.description.as_deref().filter(|d| !d.trim().is_empty()),
        tags: &meta.tags,
        day_count: i32::try_from(days.len()).map_err(|_| PlanError::NoDays)?,
    };
    let slots = layout::flatten(days);

    let mut tx = db.begin().await.context("begin tx")?;
    if !repo::upsert_plan_tx(&mut tx, user_id, plan_id, &fields, SCHEMA_NORMALIZED).await? {
        return Err(PlanError::NotFound(plan_id));
    }
    repo::replace_slots_tx(&mut tx, plan_id, &slots).await?;
    tx.commit().await.context("commit tx")?;

    info!(%user_id, %plan_id, days = days.len(), slots = slots.len(), "plan saved");
    let row = repo::get(db, user_id, plan_id)
        .await?
        .ok_or(PlanError::NotFound(plan_id))?;
    Ok(row.summary())
}

pub async fn list(db: &PgPool, user_id: Uuid) -> Result<Vec<PlanSummary>, PlanError> {
    let rows = repo::list(db, user_id).await?;
    Ok(rows.iter().map(SavedPlanRow::summary).collect())
}

pub async fn get(
    db: &PgPool,
    recipes: &dyn RecipeSource,
    user_id: Uuid,
    plan_id: Uuid,
) -> Result<SavedPlan, PlanError> {
    let row = repo::get(db, user_id, plan_id)
        .await?
        .ok_or(PlanError::NotFound(plan_id))?;
    let days = load_days(db, recipes, &row).await?;
    Ok(SavedPlan {
        summary: row.summary(),
        days,
    })
}

async fn load_days(
    db: &PgPool,
    recipes: &dyn RecipeSource,
    row: &SavedPlanRow,
) -> Result<Vec<MealPlanDay>, PlanError> {
    let day_count = row.day_count.max(0) as usize;
    match row.schema_version {
        SCHEMA_LEGACY => {
            let days = match &row.days {
                Some(json) => decode_legacy(&json.0)
                    .with_context(|| format!("decode legacy plan {}", row.id))?,
                None => vec![MealPlanDay::empty(); day_count],
            };
            Ok(days)
        }
        SCHEMA_NORMALIZED => {
            let slots: Vec<PlanSlot> = repo::slots(db, row.id)
                .await?
                .into_iter()
                .filter_map(|r| slot_from_row(row.id, r))
                .collect();
            let mut ids: Vec<Uuid> = slots.iter().filter_map(|s| s.recipe_id).collect();
            ids.sort_unstable();
            ids.dedup();
            let found: HashMap<Uuid, _> = recipes
                .get_many(&ids)
                .await?
                .into_iter()
                .map(|r| (r.id, r))
                .collect();
            Ok(layout::rebuild(day_count, slots, &found))
        }
        version => Err(PlanError::UnknownSchema {
            plan_id: row.id,
            version,
        }),
    }
}

fn slot_from_row(plan_id: Uuid, row: PlanSlotRow) -> Option<PlanSlot> {
    match row.meal_type.parse() {
        Ok(meal_type) => Some(PlanSlot {
            day_index: row.day_index,
            meal_type,
            position: row.position,
            recipe_id: row.recipe_id,
        }),
        Err(e) => {
            warn!(%plan_id, error = %e, "skipping plan recipe row");
            None
        }
    }
}

/// Days of a plan stored as a JSON document. Meals may be single recipes or
/// `null` instead of lists.
pub fn decode_legacy(days: &serde_json::Value) -> serde_json::Result<Vec<MealPlanDay>> {
    serde_json::from_value(days.clone())
}

pub async fn delete(
    db: &PgPool,
    hub: &ActivationHub,
    user_id: Uuid,
    plan_id: Uuid,
) -> Result<(), PlanError> {
    let row = repo::get(db, user_id, plan_id)
        .await?
        .ok_or(PlanError::NotFound(plan_id))?;
    if !repo::delete(db, user_id, plan_id).await? {
        return Err(PlanError::NotFound(plan_id));
    }
    info!(%user_id, %plan_id, "plan deleted");
    if row.start_date.is_some() {
        hub.publish(ActivationEvent::Deactivated { user_id, plan_id });
    }
    Ok(())
}

#[derive(Debug, serde::Serialize)]
pub struct Activated {
    pub plan_id: Uuid,
    pub window: PlanWindow,
    pub replaced: Vec<ActivationConflict>,
}

/// Activate a plan starting on `start_date`. Overlapping active plans are
/// reported as [`PlanError::Overlap`] unless `confirm_overlap` is set, in which
/// case they are deactivated.
pub async fn activate(
    db: &PgPool,
    hub: &ActivationHub,
    user_id: Uuid,
    plan_id: Uuid,
    start_date: Date,
    confirm_overlap: bool,
) -> Result<Activated, PlanError> {
    let row = repo::get(db, user_id, plan_id)
        .await?
        .ok_or(PlanError::NotFound(plan_id))?;
    let day_count = row.day_count.max(0) as u32;
    if day_count == 0 {
        return Err(PlanError::NoDays);
    }
    let window = PlanWindow::new(start_date, day_count).ok_or(PlanError::DateOutOfRange)?;

    let active = active_windows(db, user_id).await?;
    let conflicts = activation::find_conflicts(plan_id, &window, &active);
    if !conflicts.is_empty() && !confirm_overlap {
        info!(%user_id, %plan_id, conflicts = conflicts.len(), "activation needs confirmation");
        return Err(PlanError::Overlap(conflicts));
    }

    let replaced_ids: Vec<Uuid> = conflicts.iter().map(|c| c.plan_id).collect();
    let mut tx = db.begin().await.context("begin tx")?;
    if !replaced_ids.is_empty() {
        repo::delete_activations_tx(&mut tx, user_id, &replaced_ids).await?;
    }
    repo::upsert_activation_tx(&mut tx, user_id, plan_id, start_date, row.day_count).await?;
    tx.commit().await.context("commit tx")?;

    hub.publish(ActivationEvent::Activated {
        user_id,
        plan_id,
        start_date,
        day_count,
        replaced: replaced_ids,
    });
    Ok(Activated {
        plan_id,
        window,
        replaced: conflicts,
    })
}

async fn active_windows(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<ActiveWindow>> {
    let rows = repo::activations(db, user_id).await?;
    Ok(rows.iter().filter_map(|r| r.window()).collect())
}

/// `{date: planName}` for every day covered by an active plan.
pub async fn calendar(db: &PgPool, user_id: Uuid) -> Result<BTreeMap<String, String>, PlanError> {
    let active = active_windows(db, user_id).await?;
    Ok(activation::calendar(&active))
}

/// The planned day for `date`, if an active plan covers it.
pub async fn active_on(
    db: &PgPool,
    recipes: &dyn RecipeSource,
    user_id: Uuid,
    date: Date,
) -> Result<Option<ActiveDay>, PlanError> {
    let active = active_windows(db, user_id).await?;
    let Some((plan, day_index)) = activation::active_for(date, &active) else {
        return Ok(None);
    };
    let saved = get(db, recipes, user_id, plan.plan_id).await?;
    Ok(saved.days.into_iter().nth(day_index).map(|mut day| {
        day.date = Some(date);
        ActiveDay {
            plan_id: plan.plan_id,
            plan_name: plan.plan_name.clone(),
            date,
            day_index,
            day,
        }
    }))
}

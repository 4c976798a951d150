use std::time::Duration;

use anyhow::Context;
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::generator::MealGenerator;
use super::model::{MealPlanDay, MealType, SlotIndex};
use super::regenerate::{self, AppliedSlot, RegenerateSnapshot, ReplacementSource};
use super::sessions::SharedStore;
use super::slots::SlotChange;
use crate::errors::AppError;
use crate::goals::model::NutritionGoals;
use crate::recipes::source::RecipeSource;

#[derive(Debug, Serialize)]
pub struct SlotUpdate {
    pub change: SlotChange,
    pub day: usize,
    pub meals: MealPlanDay,
}

/// Resolve the recipe and wire index of an edit request and apply it to the
/// day being edited.
pub async fn update_meal(
    store: &SharedStore,
    recipes: &dyn RecipeSource,
    meal_type: MealType,
    recipe_id: Option<Uuid>,
    raw_index: Option<i64>,
) -> Result<SlotUpdate, AppError> {
    let index = raw_index
        .map(|raw| {
            SlotIndex::from_wire(raw)
                .ok_or_else(|| AppError::Validation(format!("invalid slot index {raw}")))
        })
        .transpose()?;

    let recipe = match recipe_id {
        Some(id) => Some(
            recipes
                .get(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("recipe {id}")))?,
        ),
        None => None,
    };

    let mut store = store.lock().await;
    let change = store.update_meal(meal_type, recipe, index)?;
    Ok(SlotUpdate {
        change,
        day: store.current_day,
        meals: store.current().clone(),
    })
}

#[derive(Debug, Serialize)]
pub struct RegenerateResult {
    pub day: usize,
    pub source: ReplacementSource,
    pub reasoning: Option<String>,
    pub applied: Vec<AppliedSlot>,
    pub meals: MealPlanDay,
}

/// Replace the unlocked slots of the current day. The session lock is not held
/// while the generator runs, and the result lands on the day that was current
/// when the call started.
pub async fn regenerate(
    store: &SharedStore,
    recipes: &dyn RecipeSource,
    generator: &dyn MealGenerator,
    goals: NutritionGoals,
    fallback_delay: Duration,
) -> anyhow::Result<RegenerateResult> {
    let snapshot = RegenerateSnapshot::capture(&*store.lock().await);
    let catalog = recipes.catalog().await.context("load recipe catalog")?;

    let mut rng = StdRng::from_entropy();
    let (replacements, source, reasoning) = regenerate::plan_replacements(
        generator,
        &snapshot,
        goals,
        &catalog,
        fallback_delay,
        &mut rng,
    )
    .await;

    let mut store = store.lock().await;
    let applied = regenerate::apply(&mut store, snapshot.day, replacements);
    info!(day = snapshot.day, ?source, slots = applied.len(), "day regenerated");
    Ok(RegenerateResult {
        day: snapshot.day,
        source,
        reasoning,
        applied,
        meals: store.days[snapshot.day].clone(),
    })
}

//! Conversion between a plan's days and the rows of `meal_plan_recipes`.

use std::collections::HashMap;

use uuid::Uuid;

use crate::planner::model::{cleared_snacks, MealPlanDay, MealType};
use crate::recipes::model::Recipe;

/// One position of a normalized plan. Empty snack slots are stored with no
/// recipe so their position survives the round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSlot {
    pub day_index: i32,
    pub meal_type: MealType,
    pub position: i32,
    pub recipe_id: Option<Uuid>,
}

pub fn flatten(days: &[MealPlanDay]) -> Vec<PlanSlot> {
    let mut slots = Vec::new();
    for (d, day) in days.iter().enumerate() {
        for meal_type in MealType::MAINS {
            for (p, recipe) in day.mains(meal_type).iter().enumerate() {
                slots.push(PlanSlot {
                    day_index: d as i32,
                    meal_type,
                    position: p as i32,
                    recipe_id: Some(recipe.id),
                });
            }
        }
        for (p, snack) in day.meals.snacks.iter().enumerate() {
            slots.push(PlanSlot {
                day_index: d as i32,
                meal_type: MealType::Snack,
                position: p as i32,
                recipe_id: snack.as_ref().map(|r| r.id),
            });
        }
    }
    slots
}

/// Rebuild `day_count` days from stored slots. Slots whose recipe no longer
/// exists are dropped from breakfast, lunch and dinner and left empty among
/// the snacks.
pub fn rebuild(
    day_count: usize,
    mut slots: Vec<PlanSlot>,
    recipes: &HashMap<Uuid, Recipe>,
) -> Vec<MealPlanDay> {
    let mut days = vec![MealPlanDay::empty(); day_count];
    for day in &mut days {
        day.meals.snacks.clear();
    }
    slots.sort_by_key(|s| (s.day_index, s.meal_type, s.position));

    for slot in slots {
        let Some(day) = usize::try_from(slot.day_index)
            .ok()
            .and_then(|d| days.get_mut(d))
        else {
            continue;
        };
        let recipe = slot.recipe_id.and_then(|id| recipes.get(&id)).cloned();
        match day.mains_mut(slot.meal_type) {
            Some(list) => list.extend(recipe),
            None => {
                let Ok(pos) = usize::try_from(slot.position) else {
                    continue;
                };
                let snacks = &mut day.meals.snacks;
                if snacks.len() <= pos {
                    snacks.resize(pos + 1, None);
                }
                snacks[pos] = recipe;
            }
        }
    }

    for day in &mut days {
        if day.meals.snacks.is_empty() {
            day.meals.snacks = cleared_snacks();
        }
    }
    days
}

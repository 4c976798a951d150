use serde::Deserialize;
use tracing::debug;

use super::locks::lock_key;
use super::model::{MealPlanDay, MealType, MAX_MEALS_PER_TYPE, SNACK_SLOTS};
use super::slots::{MealSlotStore, SlotChange, SlotError};
use crate::recipes::model::Recipe;

/// A position inside one of the day's meal lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DragLocation {
    pub section: MealType,
    pub index: usize,
}

impl MealSlotStore {
    /// Move a recipe card between meal lists of the current day, or within one.
    /// A drop outside any list (`destination == None`) changes nothing.
    ///
    /// Locks belong to positions, not recipes: cards shifted by a move leave
    /// their locks behind.
    pub fn move_meal(
        &mut self,
        source: DragLocation,
        destination: Option<DragLocation>,
    ) -> Result<SlotChange, SlotError> {
        let Some(destination) = destination else {
            return Ok(SlotChange::Unchanged);
        };
        let day = self.current_day;

        if destination.section == MealType::Snack && destination.index >= SNACK_SLOTS {
            return Err(SlotError::SnackIndexOutOfRange {
                index: destination.index,
                max: SNACK_SLOTS,
            });
        }
        if self.days[day].slot(source.section, source.index).is_none() {
            return Err(SlotError::EmptySlot {
                meal_type: source.section,
                index: source.index,
            });
        }
        for loc in [source, destination] {
            if self.locks.is_slot_locked(day, loc.section, loc.index) {
                return Err(SlotError::SlotLocked {
                    key: lock_key(day, loc.section, Some(loc.index)),
                });
            }
        }
        if source == destination {
            return Ok(SlotChange::Unchanged);
        }

        let target = &mut self.days[day];
        let max = capacity(destination.section);
        if source.section != destination.section && occupied(target, destination.section) >= max {
            return Err(SlotError::CapReached {
                meal_type: destination.section,
                max,
            });
        }

        let Some(recipe) = take(target, source) else {
            return Err(SlotError::EmptySlot {
                meal_type: source.section,
                index: source.index,
            });
        };
        put(target, destination, recipe);
        debug!(day, ?source, ?destination, "meal moved");
        Ok(SlotChange::Moved)
    }
}

fn capacity(section: MealType) -> usize {
    match section {
        MealType::Snack => SNACK_SLOTS,
        _ => MAX_MEALS_PER_TYPE,
    }
}

fn occupied(day: &MealPlanDay, section: MealType) -> usize {
    match section {
        MealType::Snack => day.meals.snacks.iter().flatten().count(),
        main => day.mains(main).len(),
    }
}

/// Remove the recipe at a location. An emptied snack list keeps one
/// empty slot.
fn take(day: &mut MealPlanDay, at: DragLocation) -> Option<Recipe> {
    match day.mains_mut(at.section) {
        Some(list) => (at.index < list.len()).then(|| list.remove(at.index)),
        None => {
            let snacks = &mut day.meals.snacks;
            if at.index >= snacks.len() {
                return None;
            }
            let recipe = snacks.remove(at.index);
            if snacks.is_empty() {
                snacks.push(None);
            }
            recipe
        }
    }
}

/// Insert at the location, clamped to the list length. Dropping a snack onto an
/// empty snack slot fills it instead of shifting the others; a shift that
/// would grow the snacks past [`SNACK_SLOTS`] consumes an empty slot.
fn put(day: &mut MealPlanDay, at: DragLocation, recipe: Recipe) {
    match day.mains_mut(at.section) {
        Some(list) => {
            let i = at.index.min(list.len());
            list.insert(i, recipe);
        }
        None => {
            let snacks = &mut day.meals.snacks;
            if matches!(snacks.get(at.index), Some(None)) {
                snacks[at.index] = Some(recipe);
            } else {
                let i = at.index.min(snacks.len());
                snacks.insert(i, Some(recipe));
                while snacks.len() > SNACK_SLOTS {
                    let Some(empty) = snacks.iter().rposition(Option::is_none) else {
                        break;
                    };
                    snacks.remove(empty);
                }
            }
        }
    }
}

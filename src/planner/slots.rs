use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use super::locks::{lock_key, LockMap};
use super::model::{
    cleared_snacks, MealPlanDay, MealType, SlotIndex, MAX_MEALS_PER_TYPE, SNACK_SLOTS,
};
use crate::recipes::model::Recipe;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlotError {
    #[error("You can only add up to {max} {meal_type} items per day")]
    CapReached { meal_type: MealType, max: usize },

    #[error("slot {key} is locked")]
    SlotLocked { key: String },

    #[error("day {day} is outside the plan (0..{days})")]
    DayOutOfRange { day: usize, days: usize },

    #[error("snack slot {index} is outside 0..{max}")]
    SnackIndexOutOfRange { index: usize, max: usize },

    #[error("no {meal_type} at position {index}")]
    EmptySlot { meal_type: MealType, index: usize },
}

/// What an edit did to the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotChange {
    Unchanged,
    Cleared,
    Replaced,
    Inserted,
    Removed,
    Moved,
}

/// Draft plan being edited: the days, the day currently selected, and the
/// user's slot locks.
#[derive(Debug, Clone, Serialize)]
pub struct MealSlotStore {
    pub days: Vec<MealPlanDay>,
    pub current_day: usize,
    pub locks: LockMap,
}

impl MealSlotStore {
    pub fn new(day_count: usize) -> Self {
        Self::from_days(vec![MealPlanDay::empty(); day_count.max(1)])
    }

    pub fn from_days(days: Vec<MealPlanDay>) -> Self {
        let days = if days.is_empty() {
            vec![MealPlanDay::empty()]
        } else {
            days
        };
        Self {
            days,
            current_day: 0,
            locks: LockMap::default(),
        }
    }

    pub fn select_day(&mut self, day: usize) -> Result<(), SlotError> {
        self.check_day(day)?;
        self.current_day = day;
        Ok(())
    }

    pub fn current(&self) -> &MealPlanDay {
        &self.days[self.current_day]
    }

    pub(crate) fn check_day(&self, day: usize) -> Result<(), SlotError> {
        if day >= self.days.len() {
            return Err(SlotError::DayOutOfRange {
                day,
                days: self.days.len(),
            });
        }
        Ok(())
    }

    /// Assign, replace, remove or clear a recipe on the current day.
    ///
    /// * `index == Some(SlotIndex::Clear)` empties the meal type (`[]`, or
    ///   `[null]` for snacks).
    /// * `recipe == None` without an index does nothing.
    /// * Breakfast, lunch and dinner replace in place when the index is inside
    ///   the list and otherwise insert at the front, refusing to grow past
    ///   [`MAX_MEALS_PER_TYPE`].
    /// * Snacks without an index collapse to a single slot; with an index the
    ///   slot at that position is set.
    pub fn update_meal(
        &mut self,
        meal_type: MealType,
        recipe: Option<Recipe>,
        index: Option<SlotIndex>,
    ) -> Result<SlotChange, SlotError> {
        let day = self.current_day;
        let change = update_day(&mut self.days[day], meal_type, recipe, index)?;
        debug!(day, %meal_type, ?index, ?change, "meal slot updated");
        Ok(change)
    }

    /// Flip the lock of a slot, or of a whole meal type when `index` is `None`,
    /// on `day` (the current day when omitted). Returns the key and its new state.
    pub fn toggle_lock(
        &mut self,
        day: Option<usize>,
        meal_type: MealType,
        index: Option<usize>,
    ) -> Result<(String, bool), SlotError> {
        let day = day.unwrap_or(self.current_day);
        self.check_day(day)?;
        if let (MealType::Snack, Some(i)) = (meal_type, index) {
            if i >= SNACK_SLOTS {
                return Err(SlotError::SnackIndexOutOfRange {
                    index: i,
                    max: SNACK_SLOTS,
                });
            }
        }
        let locked = self.locks.toggle(day, meal_type, index);
        let key = lock_key(day, meal_type, index);
        info!(%key, locked, "{}", if locked { "meal locked" } else { "meal unlocked" });
        Ok((key, locked))
    }
}

pub(crate) fn update_day(
    day: &mut MealPlanDay,
    meal_type: MealType,
    recipe: Option<Recipe>,
    index: Option<SlotIndex>,
) -> Result<SlotChange, SlotError> {
    if index == Some(SlotIndex::Clear) {
        match day.mains_mut(meal_type) {
            Some(list) => list.clear(),
            None => day.meals.snacks = cleared_snacks(),
        }
        return Ok(SlotChange::Cleared);
    }

    let at = match index {
        Some(SlotIndex::At(i)) => Some(i),
        _ => None,
    };

    if recipe.is_none() && at.is_none() {
        return Ok(SlotChange::Unchanged);
    }

    let Some(list) = day.mains_mut(meal_type) else {
        return update_snack(&mut day.meals.snacks, recipe, at);
    };

    match (recipe, at) {
        (Some(recipe), Some(i)) if i < list.len() => {
            list[i] = recipe;
            Ok(SlotChange::Replaced)
        }
        (Some(recipe), _) => {
            if list.len() >= MAX_MEALS_PER_TYPE {
                return Err(SlotError::CapReached {
                    meal_type,
                    max: MAX_MEALS_PER_TYPE,
                });
            }
            list.insert(0, recipe);
            Ok(SlotChange::Inserted)
        }
        (None, Some(i)) if i < list.len() => {
            list.remove(i);
            Ok(SlotChange::Removed)
        }
        (None, _) => Ok(SlotChange::Unchanged),
    }
}

fn update_snack(
    snacks: &mut Vec<Option<Recipe>>,
    recipe: Option<Recipe>,
    at: Option<usize>,
) -> Result<SlotChange, SlotError> {
    let Some(i) = at else {
        let change = if recipe.is_some() {
            SlotChange::Replaced
        } else {
            SlotChange::Cleared
        };
        *snacks = vec![recipe];
        return Ok(change);
    };

    if i >= SNACK_SLOTS {
        return Err(SlotError::SnackIndexOutOfRange {
            index: i,
            max: SNACK_SLOTS,
        });
    }
    if snacks.len() <= i {
        if recipe.is_none() {
            return Ok(SlotChange::Unchanged);
        }
        snacks.resize(i + 1, None);
    }
    let change = match (&snacks[i], &recipe) {
        (_, Some(_)) => SlotChange::Replaced,
        (Some(_), None) => SlotChange::Removed,
        (None, None) => SlotChange::Unchanged,
    };
    snacks[i] = recipe;
    Ok(change)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipes::model::fixtures::recipe;

    fn names(list: &[Recipe]) -> Vec<&str> {
        list.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn inserted_meals_shift_past_slot_locks() {
        let mut store = MealSlotStore::new(7);
        store.update_meal(MealType::Lunch, Some(recipe("A", "lunch", 100.0)), None).unwrap();
        store.toggle_lock(None, MealType::Lunch, Some(0)).unwrap();

        store.update_meal(MealType::Lunch, Some(recipe("B", "lunch", 100.0)), None).unwrap();
        assert_eq!(names(&store.current().meals.lunch), vec!["B", "A"]);
        assert!(store.locks.is_slot_locked(0, MealType::Lunch, 0));
        assert!(!store.locks.is_slot_locked(0, MealType::Lunch, 1));
    }

    #[test]
    fn toggle_lock_defaults_to_current_day() {
        let mut store = MealSlotStore::new(7);
        store.select_day(3).unwrap();
        let (key, locked) = store.toggle_lock(None, MealType::Dinner, Some(0)).unwrap();
        assert_eq!(key, "3-dinner-0");
        assert!(locked);
        let (_, locked) = store.toggle_lock(Some(3), MealType::Dinner, Some(0)).unwrap();
        assert!(!locked);

        assert_eq!(
            store.toggle_lock(Some(9), MealType::Lunch, None),
            Err(SlotError::DayOutOfRange { day: 9, days: 7 })
        );
        assert!(matches!(
            store.toggle_lock(None, MealType::Snack, Some(2)),
            Err(SlotError::SnackIndexOutOfRange { index: 2, .. })
        ));
    }

    #[test]
    fn new_store_has_empty_days() {
        let store = MealSlotStore::new(7);
        assert_eq!(store.days.len(), 7);
        assert_eq!(store.current_day, 0);
        assert_eq!(store.current().meals.snacks, vec![None]);
    }

    #[test]
    fn new_items_are_inserted_at_the_front() {
        let mut store = MealSlotStore::new(7);
        store
            .update_meal(MealType::Lunch, Some(recipe("Soup", "lunch", 200.0)), None)
            .unwrap();
        let change = store
            .update_meal(MealType::Lunch, Some(recipe("Salad", "lunch", 150.0)), None)
            .unwrap();
        assert_eq!(change, SlotChange::Inserted);
        assert_eq!(names(&store.current().meals.lunch), vec!["Salad", "Soup"]);
    }

    #[test]
    fn index_inside_bounds_replaces_and_outside_inserts() {
        let mut store = MealSlotStore::new(7);
        store
            .update_meal(MealType::Dinner, Some(recipe("Chili", "dinner", 600.0)), None)
            .unwrap();
        let change = store
            .update_meal(
                MealType::Dinner,
                Some(recipe("Curry", "dinner", 650.0)),
                Some(SlotIndex::At(0)),
            )
            .unwrap();
        assert_eq!(change, SlotChange::Replaced);
        assert_eq!(names(&store.current().meals.dinner), vec!["Curry"]);

        let change = store
            .update_meal(
                MealType::Dinner,
                Some(recipe("Tacos", "dinner", 500.0)),
                Some(SlotIndex::At(5)),
            )
            .unwrap();
        assert_eq!(change, SlotChange::Inserted);
        assert_eq!(names(&store.current().meals.dinner), vec!["Tacos", "Curry"]);
    }

    #[test]
    fn clear_sentinel_between_assignments_leaves_cleared_state() {
        let mut store = MealSlotStore::new(7);
        let every = [MealType::Breakfast, MealType::Lunch, MealType::Dinner, MealType::Snack];
        for meal_type in every {
            store
                .update_meal(meal_type, Some(recipe("A", meal_type.as_str(), 100.0)), None)
                .unwrap();
            store
                .update_meal(meal_type, Some(recipe("B", meal_type.as_str(), 100.0)), None)
                .unwrap();
            let change = store
                .update_meal(meal_type, None, Some(SlotIndex::Clear))
                .unwrap();
            assert_eq!(change, SlotChange::Cleared);
        }
        let meals = &store.current().meals;
        assert!(meals.breakfast.is_empty());
        assert!(meals.lunch.is_empty());
        assert!(meals.dinner.is_empty());
        assert_eq!(meals.snacks, vec![None]);
    }

    #[test]
    fn clear_ignores_the_recipe_argument() {
        let mut store = MealSlotStore::new(1);
        store
            .update_meal(MealType::Breakfast, Some(recipe("Oats", "breakfast", 300.0)), None)
            .unwrap();
        store
            .update_meal(
                MealType::Breakfast,
                Some(recipe("Toast", "breakfast", 200.0)),
                Some(SlotIndex::Clear),
            )
            .unwrap();
        assert!(store.current().meals.breakfast.is_empty());
    }

    #[test]
    fn null_recipe_without_index_is_a_no_op() {
        let mut store = MealSlotStore::new(7);
        store
            .update_meal(MealType::Breakfast, Some(recipe("Oats", "breakfast", 300.0)), None)
            .unwrap();
        let change = store.update_meal(MealType::Breakfast, None, None).unwrap();
        assert_eq!(change, SlotChange::Unchanged);
        assert_eq!(store.current().meals.breakfast.len(), 1);
    }

    #[test]
    fn null_recipe_with_index_removes_that_item() {
        let mut store = MealSlotStore::new(7);
        for name in ["A", "B", "C"] {
            store
                .update_meal(MealType::Lunch, Some(recipe(name, "lunch", 100.0)), None)
                .unwrap();
        }
        let change = store
            .update_meal(MealType::Lunch, None, Some(SlotIndex::At(1)))
            .unwrap();
        assert_eq!(change, SlotChange::Removed);
        assert_eq!(names(&store.current().meals.lunch), vec!["C", "A"]);

        let change = store
            .update_meal(MealType::Lunch, None, Some(SlotIndex::At(9)))
            .unwrap();
        assert_eq!(change, SlotChange::Unchanged);
    }

    #[test]
    fn eleventh_item_hits_the_cap_and_leaves_the_list_alone() {
        let mut store = MealSlotStore::new(7);
        for i in 0..MAX_MEALS_PER_TYPE {
            store
                .update_meal(
                    MealType::Breakfast,
                    Some(recipe(&format!("R{i}"), "breakfast", 100.0)),
                    None,
                )
                .unwrap();
        }
        let before = store.current().meals.breakfast.clone();

        let err = store
            .update_meal(MealType::Breakfast, Some(recipe("R10", "breakfast", 100.0)), None)
            .unwrap_err();
        assert_eq!(
            err,
            SlotError::CapReached {
                meal_type: MealType::Breakfast,
                max: MAX_MEALS_PER_TYPE
            }
        );
        assert_eq!(err.to_string(), "You can only add up to 10 breakfast items per day");
        assert_eq!(store.current().meals.breakfast, before);

        // replacing inside a full list is still allowed
        store
            .update_meal(
                MealType::Breakfast,
                Some(recipe("Swap", "breakfast", 100.0)),
                Some(SlotIndex::At(3)),
            )
            .unwrap();
        assert_eq!(store.current().meals.breakfast.len(), MAX_MEALS_PER_TYPE);
    }

    #[test]
    fn snack_without_index_collapses_to_one_slot() {
        let mut store = MealSlotStore::new(7);
        store
            .update_meal(MealType::Snack, Some(recipe("Nuts", "snack", 180.0)), Some(SlotIndex::At(1)))
            .unwrap();
        assert_eq!(store.current().meals.snacks.len(), 2);

        store
            .update_meal(MealType::Snack, Some(recipe("Apple", "snack", 80.0)), None)
            .unwrap();
        let snacks = &store.current().meals.snacks;
        assert_eq!(snacks.len(), 1);
        assert_eq!(snacks[0].as_ref().unwrap().name, "Apple");
    }

    #[test]
    fn snack_index_sets_that_position() {
        let mut store = MealSlotStore::new(7);
        store
            .update_meal(MealType::Snack, Some(recipe("Bar", "snack", 200.0)), Some(SlotIndex::At(1)))
            .unwrap();
        let snacks = &store.current().meals.snacks;
        assert!(snacks[0].is_none());
        assert_eq!(snacks[1].as_ref().unwrap().name, "Bar");

        let change = store
            .update_meal(MealType::Snack, None, Some(SlotIndex::At(1)))
            .unwrap();
        assert_eq!(change, SlotChange::Removed);
        assert_eq!(store.current().meals.snacks, vec![None, None]);

        let err = store
            .update_meal(MealType::Snack, Some(recipe("X", "snack", 1.0)), Some(SlotIndex::At(2)))
            .unwrap_err();
        assert!(matches!(err, SlotError::SnackIndexOutOfRange { index: 2, .. }));
    }

    #[test]
    fn edits_apply_to_the_selected_day_only() {
        let mut store = MealSlotStore::new(7);
        store.select_day(3).unwrap();
        store
            .update_meal(MealType::Dinner, Some(recipe("Pasta", "dinner", 700.0)), None)
            .unwrap();
        assert!(store.days[0].meals.dinner.is_empty());
        assert_eq!(store.days[3].meals.dinner.len(), 1);

        assert_eq!(
            store.select_day(7).unwrap_err(),
            SlotError::DayOutOfRange { day: 7, days: 7 }
        );
        assert_eq!(store.current_day, 3);
    }
}

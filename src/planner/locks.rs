use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::model::MealType;

/// Key of a lock: `"{day}-{mealType}"` for a whole meal type or
/// `"{day}-{mealType}-{index}"` for a single slot.
pub fn lock_key(day: usize, meal_type: MealType, index: Option<usize>) -> String {
    match index {
        Some(i) => format!("{day}-{meal_type}-{i}"),
        None => format!("{day}-{meal_type}"),
    }
}

/// Slots the user pinned against regeneration and dragging. Session state only.
/// Keys name positions, so a recipe that shifts to another index leaves its
/// lock behind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockMap(BTreeMap<String, bool>);

impl LockMap {
    /// Flip the lock at the key and return the new state.
    pub fn toggle(&mut self, day: usize, meal_type: MealType, index: Option<usize>) -> bool {
        let entry = self.0.entry(lock_key(day, meal_type, index)).or_insert(false);
        *entry = !*entry;
        *entry
    }

    pub fn is_set(&self, key: &str) -> bool {
        self.0.get(key).copied().unwrap_or(false)
    }

    /// A slot is locked by its own key or by the key of its whole meal type.
    pub fn is_slot_locked(&self, day: usize, meal_type: MealType, index: usize) -> bool {
        self.is_set(&lock_key(day, meal_type, None))
            || self.is_set(&lock_key(day, meal_type, Some(index)))
    }

    /// Whether any lock, whole-type or per-slot, is set for the meal type.
    pub fn touches(&self, day: usize, meal_type: MealType) -> bool {
        let whole = lock_key(day, meal_type, None);
        let slot_prefix = format!("{whole}-");
        self.0
            .iter()
            .any(|(k, &on)| on && (*k == whole || k.starts_with(&slot_prefix)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_format_is_stable() {
        assert_eq!(lock_key(0, MealType::Breakfast, None), "0-breakfast");
        assert_eq!(lock_key(6, MealType::Snack, Some(1)), "6-snack-1");
    }

    #[test]
    fn toggling_twice_restores_the_original_state() {
        let mut locks = LockMap::default();
        let before = locks.is_slot_locked(2, MealType::Lunch, 0);
        assert!(locks.toggle(2, MealType::Lunch, Some(0)));
        assert!(locks.is_slot_locked(2, MealType::Lunch, 0));
        assert!(!locks.toggle(2, MealType::Lunch, Some(0)));
        assert_eq!(locks.is_slot_locked(2, MealType::Lunch, 0), before);
        assert!(!locks.touches(2, MealType::Lunch));
    }

    #[test]
    fn whole_type_lock_covers_every_slot() {
        let mut locks = LockMap::default();
        locks.toggle(1, MealType::Dinner, None);
        assert!(locks.is_slot_locked(1, MealType::Dinner, 0));
        assert!(locks.is_slot_locked(1, MealType::Dinner, 4));
        assert!(!locks.is_slot_locked(2, MealType::Dinner, 0));
        assert!(!locks.is_slot_locked(1, MealType::Lunch, 0));
    }

    #[test]
    fn touches_sees_slot_locks_but_not_other_days() {
        let mut locks = LockMap::default();
        locks.toggle(1, MealType::Snack, Some(1));
        assert!(locks.touches(1, MealType::Snack));
        assert!(!locks.touches(11, MealType::Snack));
        assert!(!locks.touches(1, MealType::Breakfast));
    }

    #[test]
    fn serializes_as_flat_map() {
        let mut locks = LockMap::default();
        locks.toggle(0, MealType::Breakfast, Some(0));
        let json = serde_json::to_value(&locks).unwrap();
        assert_eq!(json, serde_json::json!({ "0-breakfast-0": true }));
    }
}

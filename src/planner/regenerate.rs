use std::time::Duration;

use rand::{seq::SliceRandom, Rng};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::generator::{
    CatalogEntry, GenerationReply, GenerationRequest, LockedMeals, MealGenerator, RecipeRef,
};
use super::locks::LockMap;
use super::model::{MealPlanDay, MealType, SNACK_SLOTS};
use super::slots::MealSlotStore;
use crate::goals::model::NutritionGoals;
use crate::recipes::model::Recipe;

/// Which positions of a day regeneration has to leave alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayLocks {
    pub breakfast: bool,
    pub lunch: bool,
    pub dinner: bool,
    pub snacks: [bool; SNACK_SLOTS],
}

impl DayLocks {
    /// Breakfast, lunch and dinner count as locked when any of their slots is;
    /// snacks are checked slot by slot.
    pub fn for_day(locks: &LockMap, day: usize) -> Self {
        let mut snacks = [false; SNACK_SLOTS];
        for (i, locked) in snacks.iter_mut().enumerate() {
            *locked = locks.is_slot_locked(day, MealType::Snack, i);
        }
        Self {
            breakfast: locks.touches(day, MealType::Breakfast),
            lunch: locks.touches(day, MealType::Lunch),
            dinner: locks.touches(day, MealType::Dinner),
            snacks,
        }
    }

    pub fn main_locked(&self, meal_type: MealType) -> bool {
        match meal_type {
            MealType::Breakfast => self.breakfast,
            MealType::Lunch => self.lunch,
            MealType::Dinner => self.dinner,
            MealType::Snack => self.snacks.iter().all(|&l| l),
        }
    }
}

/// Recipes picked for the unlocked positions of one day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Replacements {
    pub breakfast: Option<Recipe>,
    pub lunch: Option<Recipe>,
    pub dinner: Option<Recipe>,
    pub snacks: [Option<Recipe>; SNACK_SLOTS],
}

impl Replacements {
    fn main_mut(&mut self, meal_type: MealType) -> Option<&mut Option<Recipe>> {
        match meal_type {
            MealType::Breakfast => Some(&mut self.breakfast),
            MealType::Lunch => Some(&mut self.lunch),
            MealType::Dinner => Some(&mut self.dinner),
            MealType::Snack => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementSource {
    Generator,
    Fallback,
}

/// Everything the remote call needs, captured while the session is locked.
#[derive(Debug, Clone)]
pub struct RegenerateSnapshot {
    pub day: usize,
    pub locks: DayLocks,
    pub current: MealPlanDay,
}

impl RegenerateSnapshot {
    pub fn capture(store: &MealSlotStore) -> Self {
        let day = store.current_day;
        Self {
            day,
            locks: DayLocks::for_day(&store.locks, day),
            current: store.days[day].clone(),
        }
    }

    pub fn request(&self, goals: NutritionGoals, catalog: &[Recipe]) -> GenerationRequest {
        let locked_main = |meal_type: MealType| {
            self.locks.main_locked(meal_type).then(|| {
                self.current
                    .mains(meal_type)
                    .iter()
                    .map(CatalogEntry::from)
                    .collect::<Vec<_>>()
            })
        };
        let snacks = (0..SNACK_SLOTS)
            .map(|i| {
                if self.locks.snacks[i] {
                    self.current.slot(MealType::Snack, i).map(CatalogEntry::from)
                } else {
                    None
                }
            })
            .collect();

        GenerationRequest {
            user_goals: goals,
            locked_meals: LockedMeals {
                breakfast: locked_main(MealType::Breakfast),
                lunch: locked_main(MealType::Lunch),
                dinner: locked_main(MealType::Dinner),
                snacks,
            },
            available_recipes: catalog.iter().map(CatalogEntry::from).collect(),
            current_day: self.day,
        }
    }
}

/// Resolve the generator's ids against the catalog. Any unlocked position
/// without a known recipe makes the whole reply unusable.
pub fn from_reply(
    reply: &GenerationReply,
    catalog: &[Recipe],
    locks: &DayLocks,
) -> Option<Replacements> {
    let find = |r: Option<RecipeRef>| -> Option<Recipe> {
        let id: Uuid = r?.id();
        catalog.iter().find(|c| c.id == id).cloned()
    };

    let mut out = Replacements::default();
    let picks = [
        (MealType::Breakfast, reply.meal_plan.breakfast),
        (MealType::Lunch, reply.meal_plan.lunch),
        (MealType::Dinner, reply.meal_plan.dinner),
    ];
    for (meal_type, pick) in picks {
        if locks.main_locked(meal_type) {
            continue;
        }
        let recipe = find(pick)?;
        if let Some(slot) = out.main_mut(meal_type) {
            *slot = Some(recipe);
        }
    }
    for i in 0..SNACK_SLOTS {
        if locks.snacks[i] {
            continue;
        }
        let pick = reply.meal_plan.snacks.get(i).copied().flatten();
        out.snacks[i] = Some(find(pick)?);
    }
    Some(out)
}

/// Uniform random pick per meal type among recipes of that type, or among the
/// whole catalog when none match. Nutrition goals are not considered.
pub fn fallback<R: Rng + ?Sized>(
    catalog: &[Recipe],
    locks: &DayLocks,
    rng: &mut R,
) -> Replacements {
    let mut out = Replacements::default();
    for meal_type in MealType::MAINS {
        if locks.main_locked(meal_type) {
            continue;
        }
        let pick = pick_for(catalog, meal_type, rng);
        if let Some(slot) = out.main_mut(meal_type) {
            *slot = pick;
        }
    }
    for i in 0..SNACK_SLOTS {
        if !locks.snacks[i] {
            out.snacks[i] = pick_for(catalog, MealType::Snack, rng);
        }
    }
    out
}

fn pick_for<R: Rng + ?Sized>(
    catalog: &[Recipe],
    meal_type: MealType,
    rng: &mut R,
) -> Option<Recipe> {
    let snack = meal_type == MealType::Snack;
    let matching: Vec<&Recipe> = catalog
        .iter()
        .filter(|r| r.is_kind(meal_type.as_str()) || (snack && r.is_kind("snacks")))
        .collect();
    if matching.is_empty() {
        catalog.choose(rng).cloned()
    } else {
        matching.choose(rng).map(|r| (*r).clone())
    }
}

/// Ask the generator for replacements and fall back to random picks on any
/// failure. The fallback answers after `fallback_delay`.
pub async fn plan_replacements<R: Rng + Send + ?Sized>(
    generator: &dyn MealGenerator,
    snapshot: &RegenerateSnapshot,
    goals: NutritionGoals,
    catalog: &[Recipe],
    fallback_delay: Duration,
    rng: &mut R,
) -> (Replacements, ReplacementSource, Option<String>) {
    let request = snapshot.request(goals, catalog);
    match generator.generate(&request).await {
        Ok(reply) => match from_reply(&reply, catalog, &snapshot.locks) {
            Some(replacements) => {
                info!(day = snapshot.day, "meals regenerated by generator");
                return (replacements, ReplacementSource::Generator, reply.reasoning);
            }
            None => warn!(day = snapshot.day, "generator reply names unknown recipes"),
        },
        Err(e) => warn!(day = snapshot.day, error = %e, "meal generator failed, using fallback"),
    }

    if !fallback_delay.is_zero() {
        tokio::time::sleep(fallback_delay).await;
    }
    (
        fallback(catalog, &snapshot.locks, rng),
        ReplacementSource::Fallback,
        None,
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedSlot {
    pub meal_type: MealType,
    pub index: usize,
    pub recipe_id: Uuid,
    pub recipe_name: String,
}

/// Write replacements into `day`, re-checking the locks as they are now so a
/// slot locked while the call was running is kept.
pub fn apply(
    store: &mut MealSlotStore,
    day: usize,
    replacements: Replacements,
) -> Vec<AppliedSlot> {
    let locks = DayLocks::for_day(&store.locks, day);
    let target = &mut store.days[day];
    let mut applied = Vec::new();

    let mains = [
        (MealType::Breakfast, replacements.breakfast),
        (MealType::Lunch, replacements.lunch),
        (MealType::Dinner, replacements.dinner),
    ];
    for (meal_type, pick) in mains {
        let (Some(recipe), false) = (pick, locks.main_locked(meal_type)) else {
            continue;
        };
        applied.push(AppliedSlot {
            meal_type,
            index: 0,
            recipe_id: recipe.id,
            recipe_name: recipe.name.clone(),
        });
        if let Some(list) = target.mains_mut(meal_type) {
            *list = vec![recipe];
        }
    }

    let snacks = &mut target.meals.snacks;
    if snacks.len() < SNACK_SLOTS {
        snacks.resize(SNACK_SLOTS, None);
    }
    for (i, pick) in replacements.snacks.into_iter().enumerate() {
        let (Some(recipe), false) = (pick, locks.snacks[i]) else {
            continue;
        };
        applied.push(AppliedSlot {
            meal_type: MealType::Snack,
            index: i,
            recipe_id: recipe.id,
            recipe_name: recipe.name.clone(),
        });
        snacks[i] = Some(recipe);
    }
    applied
}

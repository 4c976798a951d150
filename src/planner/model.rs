use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use time::Date;

use crate::recipes::model::Recipe;

/// Upper bound of items per meal type per day.
pub const MAX_MEALS_PER_TYPE: usize = 10;

/// Snack positions addressable by index and filled by regeneration.
pub const SNACK_SLOTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    #[serde(alias = "snacks")]
    Snack,
}

impl MealType {
    /// Meal types holding a plain list of recipes.
    pub const MAINS: [MealType; 3] = [MealType::Breakfast, MealType::Lunch, MealType::Dinner];

    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown meal type: {0}")]
pub struct UnknownMealType(pub String);

impl FromStr for MealType {
    type Err = UnknownMealType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            "snack" | "snacks" => Ok(MealType::Snack),
            _ => Err(UnknownMealType(s.to_string())),
        }
    }
}

/// Index argument of a slot edit. `-1` on the wire clears the whole meal type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotIndex {
    Clear,
    At(usize),
}

impl SlotIndex {
    pub fn from_wire(raw: i64) -> Option<Self> {
        match raw {
            -1 => Some(SlotIndex::Clear),
            i if i >= 0 => Some(SlotIndex::At(i as usize)),
            _ => None,
        }
    }
}

/// Meals of one day. Breakfast, lunch and dinner are always lists; snacks are
/// positional slots that may be empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayMeals {
    #[serde(default, deserialize_with = "one_or_many")]
    pub breakfast: Vec<Recipe>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub lunch: Vec<Recipe>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub dinner: Vec<Recipe>,
    #[serde(default = "cleared_snacks", deserialize_with = "snack_slots")]
    pub snacks: Vec<Option<Recipe>>,
}

impl Default for DayMeals {
    fn default() -> Self {
        Self {
            breakfast: Vec::new(),
            lunch: Vec::new(),
            dinner: Vec::new(),
            snacks: cleared_snacks(),
        }
    }
}

pub(crate) fn cleared_snacks() -> Vec<Option<Recipe>> {
    vec![None]
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<Option<Recipe>>),
    One(Box<Recipe>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<Recipe>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(r)) => vec![*r],
        Some(OneOrMany::Many(v)) => v.into_iter().flatten().collect(),
    })
}

fn snack_slots<'de, D>(deserializer: D) -> Result<Vec<Option<Recipe>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => cleared_snacks(),
        Some(OneOrMany::One(r)) => vec![Some(*r)],
        Some(OneOrMany::Many(v)) if v.is_empty() => cleared_snacks(),
        Some(OneOrMany::Many(v)) => v,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealPlanDay {
    #[serde(default, with = "iso_day")]
    pub date: Option<Date>,
    #[serde(default)]
    pub meals: DayMeals,
}

impl MealPlanDay {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Recipe at a slot, if any.
    pub fn slot(&self, meal_type: MealType, index: usize) -> Option<&Recipe> {
        match meal_type {
            MealType::Snack => self.meals.snacks.get(index).and_then(Option::as_ref),
            main => self.mains(main).get(index),
        }
    }

    /// Recipes of breakfast, lunch or dinner. Snacks live in positional slots
    /// and yield an empty slice here.
    pub fn mains(&self, meal_type: MealType) -> &[Recipe] {
        match meal_type {
            MealType::Breakfast => &self.meals.breakfast,
            MealType::Lunch => &self.meals.lunch,
            MealType::Dinner => &self.meals.dinner,
            MealType::Snack => &[],
        }
    }

    pub(crate) fn mains_mut(&mut self, meal_type: MealType) -> Option<&mut Vec<Recipe>> {
        match meal_type {
            MealType::Breakfast => Some(&mut self.meals.breakfast),
            MealType::Lunch => Some(&mut self.meals.lunch),
            MealType::Dinner => Some(&mut self.meals.dinner),
            MealType::Snack => None,
        }
    }

    /// Every recipe planned for the day, in meal order.
    pub fn recipes(&self) -> impl Iterator<Item = &Recipe> {
        self.meals
            .breakfast
            .iter()
            .chain(self.meals.lunch.iter())
            .chain(self.meals.dinner.iter())
            .chain(self.meals.snacks.iter().flatten())
    }
}

/// `YYYY-MM-DD` dates. Full ISO timestamps written by older clients are cut to
/// their date part.
mod iso_day {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use time::{format_description::FormatItem, macros::format_description, Date};

    const FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

    pub fn serialize<S: Serializer>(date: &Option<Date>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => {
                let text = d.format(FORMAT).map_err(serde::ser::Error::custom)?;
                s.serialize_some(&text)
            }
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Date>, D::Error> {
        let Some(raw) = Option::<String>::deserialize(d)? else {
            return Ok(None);
        };
        let day = raw.get(..10).unwrap_or(&raw);
        Date::parse(day, FORMAT).map(Some).map_err(D::Error::custom)
    }
}

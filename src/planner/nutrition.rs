use serde::Serialize;

use super::model::MealPlanDay;
use crate::goals::model::NutritionGoals;
use crate::recipes::model::Macros;

/// Sum of every planned recipe of the day.
pub fn day_macros(day: &MealPlanDay) -> Macros {
    day.recipes().fold(Macros::default(), |acc, r| acc + r.macros)
}

/// Average daily intake over the whole plan. Empty days count: a week with a
/// single filled day is divided by seven.
pub fn average_macros(days: &[MealPlanDay]) -> Macros {
    if days.is_empty() {
        return Macros::default();
    }
    let total = days.iter().map(day_macros).fold(Macros::default(), |a, b| a + b);
    total.scale(1.0 / days.len() as f64)
}

/// Share of each goal reached, in percent with one decimal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GoalProgress {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

pub fn goal_progress(actual: Macros, goals: &NutritionGoals) -> GoalProgress {
    GoalProgress {
        calories: percent(actual.calories, goals.calories),
        protein: percent(actual.protein, goals.protein),
        carbs: percent(actual.carbs, goals.carbs),
        fat: percent(actual.fat, goals.fat),
    }
}

fn percent(actual: f64, goal: f64) -> f64 {
    if goal <= 0.0 {
        return 0.0;
    }
    (actual / goal * 1000.0).round() / 10.0
}

#[derive(Debug, Clone, Serialize)]
pub struct MacroSummary {
    pub days: Vec<Macros>,
    pub average: Macros,
    pub goals: NutritionGoals,
    pub progress: GoalProgress,
}

pub fn summarize(days: &[MealPlanDay], goals: NutritionGoals) -> MacroSummary {
    let average = average_macros(days);
    MacroSummary {
        days: days.iter().map(day_macros).collect(),
        average,
        goals,
        progress: goal_progress(average, &goals),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipes::model::fixtures::recipe;

    #[test]
    fn average_divides_by_every_day_of_the_plan() {
        let mut days = vec![MealPlanDay::empty(); 7];
        let mut oats = recipe("Oats", "breakfast", 400.0);
        oats.macros = Macros { calories: 400.0, protein: 14.0, carbs: 70.0, fat: 7.0 };
        days[0].meals.breakfast.push(oats);

        let avg = average_macros(&days);
        assert!((avg.calories - 400.0 / 7.0).abs() < 1e-9);
        assert!((avg.protein - 2.0).abs() < 1e-9);
        assert!((avg.carbs - 10.0).abs() < 1e-9);
        assert!((avg.fat - 1.0).abs() < 1e-9);
    }

    #[test]
    fn day_totals_include_snacks_but_not_empty_slots() {
        let mut day = MealPlanDay::empty();
        day.meals.dinner.push(recipe("Stew", "dinner", 600.0));
        day.meals.snacks = vec![Some(recipe("Yogurt", "snack", 120.0)), None];
        assert_eq!(day_macros(&day).calories, 720.0);
    }

    #[test]
    fn empty_plan_averages_to_zero() {
        assert_eq!(average_macros(&[]), Macros::default());
    }

    #[test]
    fn progress_is_a_rounded_percentage() {
        let goals = NutritionGoals { calories: 2000.0, protein: 150.0, carbs: 0.0, fat: 65.0 };
        let actual = Macros { calories: 1000.0, protein: 50.0, carbs: 30.0, fat: 65.0 };
        let p = goal_progress(actual, &goals);
        assert_eq!(p.calories, 50.0);
        assert_eq!(p.protein, 33.3);
        assert_eq!(p.carbs, 0.0);
        assert_eq!(p.fat, 100.0);
    }

    #[test]
    fn summary_lists_every_day() {
        let days = vec![MealPlanDay::empty(); 3];
        let summary = summarize(&days, NutritionGoals::default());
        assert_eq!(summary.days.len(), 3);
        assert_eq!(summary.progress.calories, 0.0);
    }
}

use serde::{Deserialize, Serialize};

/// Daily calorie and macro targets of a user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutritionGoals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Default for NutritionGoals {
    fn default() -> Self {
        Self {
            calories: 2000.0,
            protein: 150.0,
            carbs: 200.0,
            fat: 65.0,
        }
    }
}

impl NutritionGoals {
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("calories", self.calories),
            ("protein", self.protein),
            ("carbs", self.carbs),
            ("fat", self.fat),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{name} must be a non-negative number"));
            }
        }
        if self.calories == 0.0 {
            return Err("calories must be greater than zero".into());
        }
        Ok(())
    }
}

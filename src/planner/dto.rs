use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::MealType;
use super::reorder::DragLocation;

#[derive(Debug, Deserialize)]
pub struct SelectDayRequest {
    pub day: usize,
}

/// `recipe_id: null` removes, `index: -1` clears the meal type.
#[derive(Debug, Deserialize)]
pub struct UpdateMealRequest {
    pub meal_type: MealType,
    pub recipe_id: Option<Uuid>,
    pub index: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleLockRequest {
    pub day: Option<usize>,
    pub meal_type: MealType,
    pub index: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ToggleLockResponse {
    pub key: String,
    pub locked: bool,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub source: DragLocation,
    pub destination: Option<DragLocation>,
}

#[derive(Debug, Deserialize)]
pub struct SavePlanRequest {
    /// Overwrite this plan instead of creating a new one.
    pub plan_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

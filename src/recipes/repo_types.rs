use sqlx::{types::Json, FromRow};
use uuid::Uuid;

use super::model::{Macros, Recipe};

#[derive(Debug, FromRow)]
pub struct RecipeRow {
    pub id: Uuid,
    pub name: String,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub description: String,
    pub ingredients: Json<Vec<String>>,
    pub instructions: Json<Vec<String>>,
    pub prep_time: i32,
    pub cook_time: i32,
    pub servings: i32,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub image_src: Option<String>,
    pub requires_blender: bool,
    pub requires_cooking: bool,
}

impl From<RecipeRow> for Recipe {
    fn from(r: RecipeRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            kind: r.kind,
            description: r.description,
            ingredients: r.ingredients.0,
            instructions: r.instructions.0,
            prep_time: r.prep_time,
            cook_time: r.cook_time,
            servings: r.servings,
            macros: Macros {
                calories: r.calories,
                protein: r.protein,
                carbs: r.carbs,
                fat: r.fat,
            },
            image_src: r.image_src,
            requires_blender: r.requires_blender,
            requires_cooking: r.requires_cooking,
        }
    }
}

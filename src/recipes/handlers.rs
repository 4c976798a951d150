use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use super::model::Recipe;
use crate::{auth::extractors::AuthUser, errors::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes))
        .route("/recipes/:id", get(get_recipe))
}

#[derive(Debug, Deserialize)]
pub struct RecipeQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 { 20 }

#[instrument(skip(state, _user))]
pub async fn list_recipes(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(q): Query<RecipeQuery>,
) -> Result<Json<Vec<Recipe>>, AppError> {
    if q.limit <= 0 || q.offset < 0 {
        return Err(AppError::Validation("limit must be positive and offset non-negative".into()));
    }
    let recipes = state
        .recipes
        .list(q.kind.as_deref(), q.limit.min(100), q.offset)
        .await?;
    Ok(Json(recipes))
}

#[instrument(skip(state, _user))]
pub async fn get_recipe(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Recipe>, AppError> {
    state
        .recipes
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("recipe {id}")))
}

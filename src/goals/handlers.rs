use axum::{extract::State, routing::get, Json, Router};
use tracing::{info, instrument, warn};

use super::{model::NutritionGoals, repo};
use crate::{auth::extractors::AuthUser, errors::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/goals", get(get_goals).put(put_goals))
}

#[instrument(skip(state))]
pub async fn get_goals(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<NutritionGoals>, AppError> {
    let goals = repo::get_or_default(&state.db, user_id).await?;
    Ok(Json(goals))
}

#[instrument(skip(state))]
pub async fn put_goals(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(goals): Json<NutritionGoals>,
) -> Result<Json<NutritionGoals>, AppError> {
    if let Err(msg) = goals.validate() {
        warn!(%user_id, %msg, "rejected nutrition goals");
        return Err(AppError::Validation(msg));
    }
    let saved = repo::upsert(&state.db, user_id, &goals).await?;
    info!(%user_id, calories = saved.calories, "nutrition goals updated");
    Ok(Json(saved))
}

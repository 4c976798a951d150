use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{today, ActivateRequest, ActiveQuery};
use super::model::{ActiveDay, PlanSummary, SavedPlan};
use super::services::{self, Activated};
use crate::{auth::extractors::AuthUser, errors::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/plans", get(list_plans))
        .route("/plans/active", get(active_day))
        .route("/plans/activations", get(activation_calendar))
        .route("/plans/:id", get(get_plan).delete(delete_plan))
        .route("/plans/:id/activate", post(activate_plan))
}

#[instrument(skip(state))]
pub async fn list_plans(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<PlanSummary>>, AppError> {
    Ok(Json(services::list(&state.db, user_id).await?))
}

#[instrument(skip(state))]
pub async fn get_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<SavedPlan>, AppError> {
    let plan = services::get(&state.db, &*state.recipes, user_id, id).await?;
    Ok(Json(plan))
}

#[instrument(skip(state))]
pub async fn delete_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    services::delete(&state.db, &state.activations, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn activate_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ActivateRequest>,
) -> Result<Json<Activated>, AppError> {
    let start = req.start_date.unwrap_or_else(today);
    let activated = services::activate(
        &state.db,
        &state.activations,
        user_id,
        id,
        start,
        req.confirm_overlap,
    )
    .await?;
    Ok(Json(activated))
}

#[instrument(skip(state))]
pub async fn active_day(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<ActiveQuery>,
) -> Result<Json<Option<ActiveDay>>, AppError> {
    let date = q.date()?;
    let day = services::active_on(&state.db, &*state.recipes, user_id, date).await?;
    Ok(Json(day))
}

#[instrument(skip(state))]
pub async fn activation_calendar(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<BTreeMap<String, String>>, AppError> {
    Ok(Json(services::calendar(&state.db, user_id).await?))
}

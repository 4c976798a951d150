use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use super::dto::{
    MoveRequest, SavePlanRequest, SelectDayRequest, ToggleLockRequest, ToggleLockResponse,
    UpdateMealRequest,
};
use super::nutrition::{self, MacroSummary};
use super::services::{self, RegenerateResult, SlotUpdate};
use super::slots::{MealSlotStore, SlotChange};
use crate::{
    auth::extractors::AuthUser,
    errors::AppError,
    goals,
    plans::{self, model::PlanSummary, services::PlanMeta},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/planner", get(get_draft).delete(discard_draft))
        .route("/planner/day", put(select_day))
        .route("/planner/meals", post(update_meal))
        .route("/planner/locks", post(toggle_lock))
        .route("/planner/regenerate", post(regenerate))
        .route("/planner/move", post(move_meal))
        .route("/planner/macros", get(macros))
        .route("/planner/save", post(save_plan))
        .route("/planner/load/:plan_id", post(load_plan))
}

#[instrument(skip(state))]
pub async fn get_draft(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Json<MealSlotStore> {
    let store = state.planner.get(user_id).await;
    let draft = store.lock().await.clone();
    Json(draft)
}

#[instrument(skip(state))]
pub async fn discard_draft(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Json<MealSlotStore> {
    state.planner.discard(user_id).await;
    Json(MealSlotStore::new(state.planner.plan_days()))
}

#[instrument(skip(state))]
pub async fn select_day(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<SelectDayRequest>,
) -> Result<Json<MealSlotStore>, AppError> {
    let store = state.planner.get(user_id).await;
    let mut store = store.lock().await;
    store.select_day(req.day)?;
    Ok(Json(store.clone()))
}

#[instrument(skip(state))]
pub async fn update_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<UpdateMealRequest>,
) -> Result<Json<SlotUpdate>, AppError> {
    let store = state.planner.get(user_id).await;
    let update =
        services::update_meal(&store, &*state.recipes, req.meal_type, req.recipe_id, req.index)
            .await?;
    Ok(Json(update))
}

#[instrument(skip(state))]
pub async fn toggle_lock(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<ToggleLockRequest>,
) -> Result<Json<ToggleLockResponse>, AppError> {
    let store = state.planner.get(user_id).await;
    let (key, locked) = store
        .lock()
        .await
        .toggle_lock(req.day, req.meal_type, req.index)?;
    Ok(Json(ToggleLockResponse { key, locked }))
}

#[instrument(skip(state))]
pub async fn regenerate(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<RegenerateResult>, AppError> {
    let goals = goals::repo::get_or_default(&state.db, user_id).await?;
    let store = state.planner.get(user_id).await;
    let result = services::regenerate(
        &store,
        &*state.recipes,
        &*state.generator,
        goals,
        state.config.generator.fallback_delay(),
    )
    .await?;
    Ok(Json(result))
}

#[derive(Debug, Serialize)]
pub struct MoveResponse {
    pub change: SlotChange,
    pub draft: MealSlotStore,
}

#[instrument(skip(state))]
pub async fn move_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<MoveRequest>,
) -> Result<Json<MoveResponse>, AppError> {
    let store = state.planner.get(user_id).await;
    let mut store = store.lock().await;
    let change = store.move_meal(req.source, req.destination)?;
    Ok(Json(MoveResponse {
        change,
        draft: store.clone(),
    }))
}

#[instrument(skip(state))]
pub async fn macros(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MacroSummary>, AppError> {
    let goals = goals::repo::get_or_default(&state.db, user_id).await?;
    let store = state.planner.get(user_id).await;
    let days = store.lock().await.days.clone();
    Ok(Json(nutrition::summarize(&days, goals)))
}

#[instrument(skip(state))]
pub async fn save_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<SavePlanRequest>,
) -> Result<Json<PlanSummary>, AppError> {
    let store = state.planner.get(user_id).await;
    let days = store.lock().await.days.clone();
    let meta = PlanMeta {
        plan_id: req.plan_id,
        name: req.name,
        description: req.description,
        tags: req.tags,
    };
    let saved = plans::services::save(&state.db, user_id, meta, &days).await?;
    Ok(Json(saved))
}

/// Copy a saved plan into the draft, replacing whatever was being edited.
#[instrument(skip(state))]
pub async fn load_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(plan_id): Path<Uuid>,
) -> Result<Json<MealSlotStore>, AppError> {
    let plan = plans::services::get(&state.db, &*state.recipes, user_id, plan_id).await?;
    let store = MealSlotStore::from_days(plan.days);
    let draft = store.clone();
    state.planner.replace(user_id, store).await;
    Ok(Json(draft))
}

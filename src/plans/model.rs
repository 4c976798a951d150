use serde::Serialize;
use thiserror::Error;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::activation::ActivationConflict;
use crate::planner::model::MealPlanDay;

/// Days stored as a JSON document on the plan row.
pub const SCHEMA_LEGACY: i16 = 1;
/// Days stored as rows of `meal_plan_recipes`.
pub const SCHEMA_NORMALIZED: i16 = 2;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("plan {0} not found")]
    NotFound(Uuid),

    #[error("plan name must not be empty")]
    EmptyName,

    #[error("plan has no days")]
    NoDays,

    #[error("plan dates fall outside the supported calendar")]
    DateOutOfRange,

    #[error("the plan overlaps {} active plan(s)", .0.len())]
    Overlap(Vec<ActivationConflict>),

    #[error("plan {plan_id} has unsupported schema version {version}")]
    UnknownSchema { plan_id: Uuid, version: i16 },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanActivation {
    pub start_date: Date,
    pub end_date: Date,
    pub day_count: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub activated_at: OffsetDateTime,
}

/// Plan metadata as listed to the user.
#[derive(Debug, Clone, Serialize)]
pub struct PlanSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub day_count: u32,
    pub schema_version: i16,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub activation: Option<PlanActivation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SavedPlan {
    #[serde(flatten)]
    pub summary: PlanSummary,
    pub days: Vec<MealPlanDay>,
}

/// The day of an active plan that covers a given date.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveDay {
    pub plan_id: Uuid,
    pub plan_name: String,
    pub date: Date,
    pub day_index: usize,
    pub day: MealPlanDay,
}

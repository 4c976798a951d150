use sqlx::{types::Json, FromRow};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::activation::{ActiveWindow, PlanWindow};
use super::model::{PlanActivation, PlanSummary};

#[derive(Debug, FromRow)]
pub struct SavedPlanRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub days: Option<Json<serde_json::Value>>,
    pub day_count: i32,
    pub schema_version: i16,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub start_date: Option<Date>,
    pub active_days: Option<i32>,
    pub activated_at: Option<OffsetDateTime>,
}

impl SavedPlanRow {
    pub fn summary(&self) -> PlanSummary {
        let activation = match (self.start_date, self.active_days, self.activated_at) {
            (Some(start), Some(days), Some(at)) => {
                let day_count = days.max(0) as u32;
                PlanWindow::new(start, day_count).map(|w| PlanActivation {
                    start_date: w.start,
                    end_date: w.end,
                    day_count,
                    activated_at: at,
                })
            }
            _ => None,
        };
        PlanSummary {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            tags: self.tags.clone(),
            day_count: self.day_count.max(0) as u32,
            schema_version: self.schema_version,
            created_at: self.created_at,
            updated_at: self.updated_at,
            activation,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct PlanSlotRow {
    pub day_index: i32,
    pub meal_type: String,
    pub position: i32,
    pub recipe_id: Option<Uuid>,
}

#[derive(Debug, FromRow)]
pub struct ActivationRow {
    pub plan_id: Uuid,
    pub plan_name: String,
    pub start_date: Date,
    pub day_count: i32,
}

impl ActivationRow {
    /// `None` when the stored range cannot be represented.
    pub fn window(&self) -> Option<ActiveWindow> {
        PlanWindow::new(self.start_date, self.day_count.max(0) as u32).map(|window| ActiveWindow {
            plan_id: self.plan_id,
            plan_name: self.plan_name.clone(),
            window,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn activation(start_date: Date, day_count: i32) -> ActivationRow {
        ActivationRow {
            plan_id: Uuid::nil(),
            plan_name: "Week 1".into(),
            start_date,
            day_count,
        }
    }

    #[test]
    fn activation_window_covers_the_stored_days() {
        let active = activation(date!(2024 - 02 - 26), 7).window().unwrap();
        assert_eq!(active.plan_name, "Week 1");
        assert_eq!(active.window.start, date!(2024 - 02 - 26));
        assert_eq!(active.window.end, date!(2024 - 03 - 03));
    }

    #[test]
    fn empty_or_negative_ranges_have_no_window() {
        assert!(activation(date!(2024 - 02 - 26), 0).window().is_none());
        assert!(activation(date!(2024 - 02 - 26), -3).window().is_none());
    }
}

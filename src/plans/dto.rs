use serde::Deserialize;
use time::{macros::format_description, Date, OffsetDateTime};

use crate::errors::AppError;

#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    /// First day of the plan; today when omitted.
    pub start_date: Option<Date>,
    #[serde(default)]
    pub confirm_overlap: bool,
}

#[derive(Debug, Deserialize)]
pub struct ActiveQuery {
    pub date: Option<String>,
}

impl ActiveQuery {
    pub fn date(&self) -> Result<Date, AppError> {
        match self.date.as_deref() {
            None => Ok(today()),
            Some(raw) => {
                let day = raw.get(..10).unwrap_or(raw);
                Date::parse(day, format_description!("[year]-[month]-[day]"))
                    .map_err(|_| AppError::Validation(format!("invalid date {raw:?}")))
            }
        }
    }
}

pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn active_query_parses_dates_and_timestamps() {
        let q = ActiveQuery { date: Some("2024-03-09".into()) };
        assert_eq!(q.date().unwrap(), date!(2024 - 03 - 09));
        let q = ActiveQuery { date: Some("2024-03-09T12:00:00Z".into()) };
        assert_eq!(q.date().unwrap(), date!(2024 - 03 - 09));
        let q = ActiveQuery { date: Some("yesterday".into()) };
        assert!(matches!(q.date(), Err(AppError::Validation(_))));
        assert_eq!(ActiveQuery { date: None }.date().unwrap(), today());
    }

    #[test]
    fn activate_request_defaults() {
        let req: ActivateRequest = serde_json::from_str(r#"{"start_date":"2024-05-01"}"#).unwrap();
        assert_eq!(req.start_date, Some(date!(2024 - 05 - 01)));
        assert!(!req.confirm_overlap);
    }
}

use std::collections::BTreeMap;

use serde::Serialize;
use time::{format_description::FormatItem, macros::format_description, Date, Duration};
use uuid::Uuid;

const DAY_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Signed number of whole days from `today` to `selected`.
pub fn day_offset(selected: Date, today: Date) -> i64 {
    (selected - today).whole_days()
}

/// Inclusive date range covered by an activated plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanWindow {
    pub start: Date,
    pub end: Date,
}

impl PlanWindow {
    /// `None` for an empty plan or a range past the calendar.
    pub fn new(start: Date, day_count: u32) -> Option<Self> {
        if day_count == 0 {
            return None;
        }
        let end = start.checked_add(Duration::days(i64::from(day_count) - 1))?;
        Some(Self { start, end })
    }

    /// Touching endpoints count as overlap.
    pub fn overlaps(&self, other: &PlanWindow) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn day_index(&self, date: Date) -> Option<usize> {
        if date < self.start || date > self.end {
            return None;
        }
        usize::try_from(day_offset(date, self.start)).ok()
    }

    pub fn days(&self) -> impl Iterator<Item = Date> {
        let end = self.end;
        std::iter::successors(Some(self.start), move |d| {
            d.next_day().filter(|next| *next <= end)
        })
    }
}

/// A plan currently activated by the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveWindow {
    pub plan_id: Uuid,
    pub plan_name: String,
    pub window: PlanWindow,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivationConflict {
    pub plan_id: Uuid,
    pub plan_name: String,
    pub start_date: Date,
    pub end_date: Date,
}

/// Active windows intersecting `candidate`. The plan being (re)activated is
/// never in conflict with itself.
pub fn find_conflicts(
    plan_id: Uuid,
    candidate: &PlanWindow,
    active: &[ActiveWindow],
) -> Vec<ActivationConflict> {
    active
        .iter()
        .filter(|a| a.plan_id != plan_id && a.window.overlaps(candidate))
        .map(|a| ActivationConflict {
            plan_id: a.plan_id,
            plan_name: a.plan_name.clone(),
            start_date: a.window.start,
            end_date: a.window.end,
        })
        .collect()
}

/// The plan covering `date` and the index of that date within it. When several
/// windows cover the date the first one wins; callers order by activation time.
pub fn active_for(date: Date, active: &[ActiveWindow]) -> Option<(&ActiveWindow, usize)> {
    active
        .iter()
        .find_map(|a| a.window.day_index(date).map(|i| (a, i)))
}

/// `{ "YYYY-MM-DD": planName }` for every day covered by an active plan.
pub fn calendar(active: &[ActiveWindow]) -> BTreeMap<String, String> {
    let mut days = BTreeMap::new();
    for a in active {
        for d in a.window.days() {
            if let Ok(key) = d.format(DAY_FORMAT) {
                days.entry(key).or_insert_with(|| a.plan_name.clone());
            }
        }
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn active(name: &str, start: Date, days: u32) -> ActiveWindow {
        ActiveWindow {
            plan_id: Uuid::new_v4(),
            plan_name: name.into(),
            window: PlanWindow::new(start, days).unwrap(),
        }
    }

    #[test]
    fn offset_is_signed() {
        assert_eq!(day_offset(date!(2024 - 03 - 05), date!(2024 - 03 - 01)), 4);
        assert_eq!(day_offset(date!(2024 - 02 - 28), date!(2024 - 03 - 01)), -2);
        assert_eq!(day_offset(date!(2024 - 03 - 01), date!(2024 - 03 - 01)), 0);
    }

    #[test]
    fn window_end_is_inclusive() {
        let w = PlanWindow::new(date!(2024 - 01 - 01), 7).unwrap();
        assert_eq!(w.end, date!(2024 - 01 - 07));
        assert_eq!(w.days().count(), 7);
        assert!(PlanWindow::new(date!(2024 - 01 - 01), 0).is_none());
    }

    #[test]
    fn touching_endpoints_overlap() {
        let a = PlanWindow::new(date!(2024 - 01 - 01), 7).unwrap();
        let touching = PlanWindow::new(date!(2024 - 01 - 07), 7).unwrap();
        let after = PlanWindow::new(date!(2024 - 01 - 08), 7).unwrap();
        assert!(a.overlaps(&touching));
        assert!(touching.overlaps(&a));
        assert!(!a.overlaps(&after));
        assert!(!after.overlaps(&a));
    }

    #[test]
    fn conflicts_skip_the_plan_itself() {
        let week = active("Week 1", date!(2024 - 01 - 01), 7);
        let candidate = PlanWindow::new(date!(2024 - 01 - 03), 7).unwrap();
        assert!(find_conflicts(week.plan_id, &candidate, &[week.clone()]).is_empty());

        let found = find_conflicts(Uuid::new_v4(), &candidate, &[week.clone()]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].plan_name, "Week 1");
        assert_eq!(found[0].end_date, date!(2024 - 01 - 07));
    }

    #[test]
    fn active_for_reports_day_index() {
        let plans = vec![
            active("Week 1", date!(2024 - 01 - 01), 7),
            active("Week 2", date!(2024 - 01 - 08), 7),
        ];
        let (plan, day) = active_for(date!(2024 - 01 - 10), &plans).unwrap();
        assert_eq!(plan.plan_name, "Week 2");
        assert_eq!(day, 2);
        assert!(active_for(date!(2023 - 12 - 31), &plans).is_none());
    }

    #[test]
    fn calendar_maps_each_covered_day() {
        let cal = calendar(&[active("Cut", date!(2024 - 02 - 28), 3)]);
        let keys: Vec<_> = cal.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["2024-02-28", "2024-02-29", "2024-03-01"]);
        assert_eq!(cal["2024-02-29"], "Cut");
    }
}

//! Daily dashboard context
//!
//! Everything the daily view shows about a selected date: the day's figures,
//! how they changed since the previous recorded day, progress towards the
//! configured goals, and the other days of the same calendar week.

use crate::aggregate::{week_bounds, WEEKDAY_LABELS};
use crate::config::{DashboardConfig, Goals};
use crate::error::ComputeError;
use crate::types::{CategoryHours, DayDerived};
use chrono::NaiveDate;
use serde::Serialize;

/// Outdoor minutes above which a day counts as highly active
pub const HIGH_OUTDOOR_MINUTES: u32 = 120;

/// Outdoor minutes above which a day counts as moderately active
pub const MODERATE_OUTDOOR_MINUTES: u32 = 60;

/// Outdoor minutes below which a day counts as inactive
pub const LOW_OUTDOOR_MINUTES: u32 = 30;

/// Calendar shading for a day's time outdoors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutdoorIntensity {
    High,
    Moderate,
    Normal,
    Low,
}

impl OutdoorIntensity {
    pub fn from_minutes(minutes: u32) -> Self {
        if minutes > HIGH_OUTDOOR_MINUTES {
            OutdoorIntensity::High
        } else if minutes > MODERATE_OUTDOOR_MINUTES {
            OutdoorIntensity::Moderate
        } else if minutes < LOW_OUTDOOR_MINUTES {
            OutdoorIntensity::Low
        } else {
            OutdoorIntensity::Normal
        }
    }
}

/// A metric compared with the previous recorded day
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricChange {
    pub current: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<f64>,
    /// Percentage change; absent when there is no non-zero previous value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_pct: Option<f64>,
}

impl MetricChange {
    pub fn new(current: f64, previous: Option<f64>) -> Self {
        Self {
            current,
            previous,
            change_pct: previous.and_then(|p| percent_change(current, p)),
        }
    }
}

/// Progress towards the daily goals, in percent (may exceed 100)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GoalProgress {
    pub sleep_pct: f64,
    pub outdoor_pct: f64,
}

impl GoalProgress {
    pub fn for_day(day: &DayDerived, goals: &Goals) -> Self {
        Self {
            sleep_pct: f64::from(day.sleep_hours) / goals.optimal_sleep_hours * 100.0,
            outdoor_pct: f64::from(day.outdoor_minutes) / goals.optimal_outdoor_minutes * 100.0,
        }
    }
}

/// One day of the selected week, for the stacked weekly chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekActivityRow {
    pub date: NaiveDate,
    pub label: &'static str,
    pub is_selected: bool,
    pub hours: CategoryHours,
}

/// The daily view of a selected date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyContext {
    pub day: DayDerived,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_date: Option<NaiveDate>,
    pub sleep_change: MetricChange,
    pub outdoor_change: MetricChange,
    /// Per-category change, in template order
    pub category_changes: Vec<MetricChange>,
    pub goal_progress: GoalProgress,
    pub outdoor_intensity: OutdoorIntensity,
    pub week: Vec<WeekActivityRow>,
}

impl DailyContext {
    /// Build the context for `date` from date-ordered days.
    ///
    /// Fails with `MissingData` when no day is recorded for `date`.
    pub fn build(
        days: &[DayDerived],
        date: NaiveDate,
        config: &DashboardConfig,
    ) -> Result<Self, ComputeError> {
        let index = days
            .iter()
            .position(|d| d.date == date)
            .ok_or_else(|| ComputeError::MissingData {
                date: date.to_string(),
            })?;

        let day = &days[index];
        let previous = index.checked_sub(1).map(|i| &days[i]);

        let category_changes = config
            .categories
            .ids()
            .map(|id| {
                MetricChange::new(
                    day.category_totals.get(id),
                    previous.map(|p| p.category_totals.get(id)),
                )
            })
            .collect();

        let (week_start, week_end) = week_bounds(date);
        let week = days
            .iter()
            .filter(|d| d.date >= week_start && d.date <= week_end)
            .map(|d| WeekActivityRow {
                date: d.date,
                label: WEEKDAY_LABELS[usize::from(d.day_of_week)],
                is_selected: d.date == date,
                hours: d.category_totals.clone(),
            })
            .collect();

        Ok(Self {
            day: day.clone(),
            previous_date: previous.map(|p| p.date),
            sleep_change: MetricChange::new(
                f64::from(day.sleep_hours),
                previous.map(|p| f64::from(p.sleep_hours)),
            ),
            outdoor_change: MetricChange::new(
                f64::from(day.outdoor_minutes),
                previous.map(|p| f64::from(p.outdoor_minutes)),
            ),
            category_changes,
            goal_progress: GoalProgress::for_day(day, &config.goals),
            outdoor_intensity: OutdoorIntensity::from_minutes(day.outdoor_minutes),
            week,
        })
    }
}

/// Percentage change from `previous` to `current`; `None` when previous is 0
pub fn percent_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    Some((current - previous) / previous * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::compute_day_derived;
    use crate::schema::{RawDay, RawInterval};

    fn make_day(date: &str, intervals: Vec<(&str, u32, u32)>) -> DayDerived {
        let raw = RawDay::new(
            date,
            intervals
                .into_iter()
                .map(|(c, s, e)| RawInterval::new(c, s, e))
                .collect(),
        );
        compute_day_derived(&raw, &DashboardConfig::default()).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn days() -> Vec<DayDerived> {
        vec![
            make_day("2025-04-25", vec![("sleep", 23, 7), ("work", 9, 18)]),
            make_day("2025-04-27", vec![("sleep", 0, 6), ("outdoor", 10, 13), ("leisure", 13, 0)]),
            make_day("2025-04-28", vec![("sleep", 23, 8), ("work", 9, 18), ("outdoor", 18, 19)]),
        ]
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(9.0, 6.0), Some(50.0));
        assert_eq!(percent_change(3.0, 6.0), Some(-50.0));
        assert_eq!(percent_change(3.0, 0.0), None);
    }

    #[test]
    fn test_outdoor_intensity_thresholds() {
        assert_eq!(OutdoorIntensity::from_minutes(180), OutdoorIntensity::High);
        assert_eq!(OutdoorIntensity::from_minutes(120), OutdoorIntensity::Moderate);
        assert_eq!(OutdoorIntensity::from_minutes(60), OutdoorIntensity::Normal);
        assert_eq!(OutdoorIntensity::from_minutes(30), OutdoorIntensity::Normal);
        assert_eq!(OutdoorIntensity::from_minutes(0), OutdoorIntensity::Low);
    }

    #[test]
    fn test_context_compares_with_previous_recorded_day() {
        let config = DashboardConfig::default();
        let context = DailyContext::build(&days(), date("2025-04-28"), &config).unwrap();

        assert_eq!(context.previous_date, Some(date("2025-04-27")));
        // 9h sleep after 6h
        assert_eq!(context.sleep_change.change_pct, Some(50.0));
        // 60 minutes outdoors after 180
        assert!((context.outdoor_change.change_pct.unwrap() + 66.666_666).abs() < 1e-3);
        assert_eq!(context.category_changes.len(), config.categories.len());
        assert_eq!(context.outdoor_intensity, OutdoorIntensity::Normal);
        assert_eq!(context.goal_progress.sleep_pct, 112.5);
        assert_eq!(context.goal_progress.outdoor_pct, 50.0);
    }

    #[test]
    fn test_context_week_rows() {
        let config = DashboardConfig::default();
        let context = DailyContext::build(&days(), date("2025-04-28"), &config).unwrap();

        // 2025-04-25 belongs to the previous calendar week
        assert_eq!(context.week.len(), 2);
        assert_eq!(context.week[0].label, "Sun");
        assert!(!context.week[0].is_selected);
        assert!(context.week[1].is_selected);
    }

    #[test]
    fn test_first_day_has_no_previous() {
        let config = DashboardConfig::default();
        let context = DailyContext::build(&days(), date("2025-04-25"), &config).unwrap();

        assert!(context.previous_date.is_none());
        assert!(context.sleep_change.change_pct.is_none());
        assert!(context.category_changes.iter().all(|c| c.previous.is_none()));
    }

    #[test]
    fn test_unknown_date_is_missing_data() {
        let config = DashboardConfig::default();
        let err = DailyContext::build(&days(), date("2025-04-26"), &config).unwrap_err();
        assert!(matches!(err, ComputeError::MissingData { .. }));
    }
}

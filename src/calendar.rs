//! Monthly calendar events
//!
//! Each recorded day becomes a short list of calendar markers: the
//! categories worked on that day (leading one first), a sleep-status marker
//! and an outdoor marker.

use crate::config::{CategoryId, DashboardConfig};
use crate::error::ComputeError;
use crate::types::DayDerived;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// Sleep hours from which a night counts as sufficient
pub const SUFFICIENT_SLEEP_HOURS: u32 = 7;

/// Sleep hours from which a night counts as adequate
pub const ADEQUATE_SLEEP_HOURS: u32 = 6;

/// How a night's sleep compares with the recommended amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepStatus {
    Sufficient,
    Adequate,
    Insufficient,
}

impl SleepStatus {
    pub fn from_hours(hours: u32) -> Self {
        if hours >= SUFFICIENT_SLEEP_HOURS {
            SleepStatus::Sufficient
        } else if hours >= ADEQUATE_SLEEP_HOURS {
            SleepStatus::Adequate
        } else {
            SleepStatus::Insufficient
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SleepStatus::Sufficient => "sufficient",
            SleepStatus::Adequate => "adequate",
            SleepStatus::Insufficient => "insufficient",
        }
    }

    /// Marker color: green, amber, red
    pub fn color(self) -> &'static str {
        match self {
            SleepStatus::Sufficient => "#4CAF50",
            SleepStatus::Adequate => "#FFC107",
            SleepStatus::Insufficient => "#F44336",
        }
    }
}

/// One marker on a calendar day
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CalendarEvent {
    /// Hours spent on a category; `highest` marks the day's leading one
    Activity {
        category: CategoryId,
        color: String,
        hours: f64,
        highest: bool,
    },
    /// Drawn as a colored dot, never as a label
    Sleep {
        status: SleepStatus,
        color: String,
        hours: u32,
    },
    Outdoor { color: String, minutes: u32 },
}

impl CalendarEvent {
    pub fn color(&self) -> &str {
        match self {
            CalendarEvent::Activity { color, .. }
            | CalendarEvent::Sleep { color, .. }
            | CalendarEvent::Outdoor { color, .. } => color,
        }
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self, CalendarEvent::Sleep { .. })
    }

    /// Sleep and outdoor markers pass every filter
    pub fn matches_filter(&self, filters: &[CategoryId]) -> bool {
        match self {
            CalendarEvent::Activity { category, .. } => {
                filters.is_empty() || filters.contains(category)
            }
            CalendarEvent::Sleep { .. } | CalendarEvent::Outdoor { .. } => true,
        }
    }
}

/// Markers of one recorded day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub events: Vec<CalendarEvent>,
}

impl CalendarDay {
    /// Build the markers of a day.
    ///
    /// Sleep, leisure and outdoor categories get their own markers and are
    /// left out of the activity list. Among the rest, every category with
    /// hours is listed in template order after the leading one; ties go to
    /// the category listed first.
    pub fn build(day: &DayDerived, config: &DashboardConfig) -> Result<Self, ComputeError> {
        let roles = config.resolve_roles()?;
        let template = &config.categories;

        let candidates: Vec<(CategoryId, f64)> = day
            .category_totals
            .iter()
            .filter(|(id, hours)| {
                *hours > 0.0 && ![roles.sleep, roles.leisure, roles.outdoor].contains(id)
            })
            .collect();

        let highest = candidates
            .iter()
            .fold(None, |best: Option<(CategoryId, f64)>, &(id, hours)| match best {
                Some((_, top)) if top >= hours => best,
                _ => Some((id, hours)),
            })
            .map(|(id, _)| id);

        let activity = |id: CategoryId, hours: f64| CalendarEvent::Activity {
            category: id,
            color: template.color(id).unwrap_or_default().to_string(),
            hours,
            highest: Some(id) == highest,
        };

        let mut events: Vec<CalendarEvent> = candidates
            .iter()
            .filter(|(id, _)| Some(*id) == highest)
            .chain(candidates.iter().filter(|(id, _)| Some(*id) != highest))
            .map(|&(id, hours)| activity(id, hours))
            .collect();

        let status = SleepStatus::from_hours(day.sleep_hours);
        events.push(CalendarEvent::Sleep {
            status,
            color: status.color().to_string(),
            hours: day.sleep_hours,
        });

        if day.outdoor_minutes > 0 {
            events.push(CalendarEvent::Outdoor {
                color: template.color(roles.outdoor).unwrap_or_default().to_string(),
                minutes: day.outdoor_minutes,
            });
        }

        Ok(Self {
            date: day.date,
            events,
        })
    }

    /// Events shown when the calendar is filtered to `filters`; empty shows all
    pub fn filtered(&self, filters: &[CategoryId]) -> Vec<&CalendarEvent> {
        self.events
            .iter()
            .filter(|e| e.matches_filter(filters))
            .collect()
    }
}

/// Calendar days of one month, in date order
pub fn month_calendar(
    days: &[DayDerived],
    year: i32,
    month: u32,
    config: &DashboardConfig,
) -> Result<Vec<CalendarDay>, ComputeError> {
    days.iter()
        .filter(|d| d.date.year() == year && d.date.month() == month)
        .map(|d| CalendarDay::build(d, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::compute_day_derived;
    use crate::schema::{RawDay, RawInterval};
    use pretty_assertions::assert_eq;

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

    fn id(config: &DashboardConfig, name: &str) -> CategoryId {
        config.categories.resolve(name).unwrap()
    }

    #[test]
    fn test_sleep_status_thresholds() {
        assert_eq!(SleepStatus::from_hours(9), SleepStatus::Sufficient);
        assert_eq!(SleepStatus::from_hours(7), SleepStatus::Sufficient);
        assert_eq!(SleepStatus::from_hours(6), SleepStatus::Adequate);
        assert_eq!(SleepStatus::from_hours(5), SleepStatus::Insufficient);
        assert_eq!(SleepStatus::from_hours(0).color(), "#F44336");
    }

    #[test]
    fn test_day_events_lead_with_highest_category() {
        let config = DashboardConfig::default();
        let day = make_day(
            "2025-04-28",
            vec![
                ("sleep", 0, 6),
                ("work", 9, 12),
                ("coding", 13, 18),
                ("outdoor", 18, 20),
                ("leisure", 20, 0),
            ],
        );
        let calendar = CalendarDay::build(&day, &config).unwrap();

        assert_eq!(
            calendar.events,
            vec![
                CalendarEvent::Activity {
                    category: id(&config, "coding"),
                    color: "#ffc658".to_string(),
                    hours: 5.0,
                    highest: true,
                },
                CalendarEvent::Activity {
                    category: id(&config, "work"),
                    color: "#4CAF50".to_string(),
                    hours: 3.0,
                    highest: false,
                },
                CalendarEvent::Sleep {
                    status: SleepStatus::Adequate,
                    color: "#FFC107".to_string(),
                    hours: 6,
                },
                CalendarEvent::Outdoor {
                    color: "#03A9F4".to_string(),
                    minutes: 120,
                },
            ]
        );
        assert!(calendar.events[2].is_hidden());
    }

    #[test]
    fn test_tied_categories_keep_template_order() {
        let config = DashboardConfig::default();
        let day = make_day(
            "2025-04-28",
            vec![("sleep", 0, 8), ("work", 9, 12), ("networking", 13, 16)],
        );
        let calendar = CalendarDay::build(&day, &config).unwrap();

        assert!(matches!(
            &calendar.events[0],
            CalendarEvent::Activity { category, highest: true, .. } if *category == id(&config, "work")
        ));
        assert!(!calendar.events.iter().any(|e| matches!(e, CalendarEvent::Outdoor { .. })));
    }

    #[test]
    fn test_rest_day_has_only_markers() {
        let config = DashboardConfig::default();
        let day = make_day("2025-04-27", vec![("sleep", 2, 12), ("leisure", 12, 2)]);
        let calendar = CalendarDay::build(&day, &config).unwrap();

        assert_eq!(calendar.events.len(), 1);
        assert_eq!(calendar.events[0].color(), SleepStatus::Sufficient.color());
    }

    #[test]
    fn test_filter_keeps_sleep_and_outdoor() {
        let config = DashboardConfig::default();
        let day = make_day(
            "2025-04-28",
            vec![("sleep", 0, 8), ("work", 9, 17), ("exercise", 17, 18), ("outdoor", 18, 19)],
        );
        let calendar = CalendarDay::build(&day, &config).unwrap();
        assert_eq!(calendar.filtered(&[]).len(), 4);

        let filtered = calendar.filtered(&[id(&config, "exercise")]);
        assert_eq!(filtered.len(), 3);
        assert!(matches!(
            filtered[0],
            CalendarEvent::Activity { category, highest: false, .. } if *category == id(&config, "exercise")
        ));
        assert!(matches!(filtered[1], CalendarEvent::Sleep { .. }));
        assert!(matches!(filtered[2], CalendarEvent::Outdoor { minutes: 60, .. }));
    }

    #[test]
    fn test_month_calendar_scopes_to_month() {
        let config = DashboardConfig::default();
        let days = vec![
            make_day("2025-04-29", vec![("sleep", 0, 8)]),
            make_day("2025-04-30", vec![("sleep", 0, 5)]),
            make_day("2025-05-01", vec![("sleep", 0, 7)]),
        ];

        let april = month_calendar(&days, 2025, 4, &config).unwrap();
        let dates: Vec<String> = april.iter().map(|d| d.date.to_string()).collect();
        assert_eq!(dates, vec!["2025-04-29", "2025-04-30"]);
        assert!(matches!(
            april[1].events[0],
            CalendarEvent::Sleep { status: SleepStatus::Insufficient, .. }
        ));
        assert!(month_calendar(&days, 2025, 6, &config).unwrap().is_empty());
    }
}

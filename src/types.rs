//! Core types for the Dayflux pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: normalized intervals, per-day derived statistics, and the
//! multi-day aggregates consumed by the dashboard.

use crate::config::{CategoryId, CategoryTemplate};
use chrono::NaiveDate;
use serde::Serialize;

/// Hours in a calendar day
pub const HOURS_PER_DAY: u8 = 24;

/// One contiguous block of an activity, in whole hours.
///
/// `start_hour` and `end_hour` are always in `0..24`. An interval with
/// `end_hour < start_hour` wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeInterval {
    pub category: CategoryId,
    pub start_hour: u8,
    pub end_hour: u8,
}

impl TimeInterval {
    pub fn new(category: CategoryId, start_hour: u8, end_hour: u8) -> Self {
        Self {
            category,
            start_hour,
            end_hour,
        }
    }

    pub fn wraps_midnight(&self) -> bool {
        self.end_hour < self.start_hour
    }

    /// Duration in hours, accounting for midnight wraparound
    pub fn duration_hours(&self) -> u32 {
        crate::features::interval_duration(self.start_hour, self.end_hour)
    }

    /// Whether the interval is active during hour `hour`
    pub fn covers_hour(&self, hour: u8) -> bool {
        crate::aggregate::interval_covers_hour(self.start_hour, self.end_hour, hour)
    }
}

/// A calendar day whose intervals passed normalization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedDay {
    pub date: NaiveDate,
    pub intervals: Vec<TimeInterval>,
    pub quality_flags: Vec<QualityFlag>,
}

/// Hours per category, stored in template order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CategoryHours {
    hours: Vec<f64>,
}

impl CategoryHours {
    /// All categories of the template at zero hours
    pub fn zeroed(template: &CategoryTemplate) -> Self {
        Self {
            hours: vec![0.0; template.len()],
        }
    }

    /// Build from values in template order
    pub fn from_values(hours: Vec<f64>) -> Self {
        Self { hours }
    }

    pub fn get(&self, id: CategoryId) -> f64 {
        self.hours.get(id.index()).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, id: CategoryId, hours: f64) {
        if let Some(slot) = self.hours.get_mut(id.index()) {
            *slot = hours;
        }
    }

    pub fn add(&mut self, id: CategoryId, hours: f64) {
        if let Some(slot) = self.hours.get_mut(id.index()) {
            *slot += hours;
        }
    }

    /// Multiply every category by `ratio`
    pub fn scale(&mut self, ratio: f64) {
        for value in &mut self.hours {
            *value *= ratio;
        }
    }

    /// Copy with every value rounded to the nearest whole hour
    pub fn rounded(&self) -> Self {
        Self {
            hours: self.hours.iter().map(|h| h.round()).collect(),
        }
    }

    pub fn total(&self) -> f64 {
        self.hours.iter().sum()
    }

    pub fn values(&self) -> &[f64] {
        &self.hours
    }

    pub fn len(&self) -> usize {
        self.hours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hours.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CategoryId, f64)> + '_ {
        self.hours
            .iter()
            .enumerate()
            .map(|(i, h)| (CategoryId::from_index(i), *h))
    }

    /// Pair every value with its category name and color
    pub fn named(&self, template: &CategoryTemplate) -> Vec<NamedHours> {
        template
            .iter()
            .map(|(id, category)| NamedHours {
                name: category.name.clone(),
                color: category.color.clone(),
                hours: self.get(id),
            })
            .collect()
    }
}

/// Category hours labelled for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedHours {
    pub name: String,
    pub color: String,
    pub hours: f64,
}

/// Correction applied to make a day sum to 24 hours
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reconciliation {
    /// Total was already within tolerance of 24h
    Balanced,
    /// Missing hours were added to the leisure category
    ShortfallToLeisure { hours: f64 },
    /// Every category was scaled down by `ratio`
    ProportionalShrink { ratio: f64 },
}

/// Data quality notes attached to a day
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "flag", rename_all = "snake_case")]
pub enum QualityFlag {
    /// Raw intervals did not sum to 24 hours
    InvariantViolation { total_hours: f64 },
    /// An interval with equal start and end was dropped
    DegenerateInterval { hour: u8 },
}

/// Statistics derived from a single day's intervals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayDerived {
    pub date: NaiveDate,
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: u8,
    pub is_weekend: bool,
    pub sleep_hours: u32,
    pub outdoor_minutes: u32,
    /// Reconciled totals rounded to whole hours
    pub category_totals: CategoryHours,
    /// Reconciled totals before rounding
    pub reconciled_totals: CategoryHours,
    pub reconciliation: Reconciliation,
    pub intervals: Vec<TimeInterval>,
    pub quality_flags: Vec<QualityFlag>,
}

/// Averages over a group of days
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodAverage {
    pub day_count: usize,
    pub average_hours: CategoryHours,
    pub average_sleep_hours: f64,
    pub average_outdoor_minutes: f64,
}

/// Days grouped into an inclusive date window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekAggregate {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub average_hours: CategoryHours,
    pub average_sleep_hours: f64,
    pub average_outdoor_minutes: f64,
    pub member_days: Vec<DayDerived>,
}

/// Share of days a category is active in a given hour
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HourlyRate {
    pub hour: u8,
    pub active_days: usize,
    /// Percentage of considered days, 0-100
    pub occurrence_rate: f64,
}

/// Occurrence rate of one category for each hour 0-23
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyDistribution {
    pub category: CategoryId,
    pub days_considered: usize,
    pub hours: Vec<HourlyRate>,
}

impl HourlyDistribution {
    pub fn rate(&self, hour: u8) -> f64 {
        self.hours
            .get(hour as usize)
            .map(|r| r.occurrence_rate)
            .unwrap_or(0.0)
    }

    /// Hour with the highest occurrence rate, earliest hour on ties
    pub fn peak_hour(&self) -> Option<HourlyRate> {
        self.hours
            .iter()
            .filter(|r| r.active_days > 0)
            .fold(None, |best: Option<HourlyRate>, r| match best {
                Some(b) if b.occurrence_rate >= r.occurrence_rate => Some(b),
                _ => Some(*r),
            })
    }
}

/// Hours of one category on one date
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DayHours {
    pub date: NaiveDate,
    pub hours: f64,
}

/// Headline figures of one category over a set of days
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityStats {
    pub category: CategoryId,
    pub day_count: usize,
    pub average_hours: f64,
    pub weekday_average_hours: f64,
    pub weekend_average_hours: f64,
    /// Day with the most hours, earliest on ties
    pub max_day: Option<DayHours>,
    /// Day with the fewest non-zero hours, earliest on ties
    pub min_day: Option<DayHours>,
    pub peak_hour: Option<HourlyRate>,
}

/// Weekday and weekend days compared for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayWeekendSplit {
    pub category: CategoryId,
    pub weekday_average: PeriodAverage,
    pub weekend_average: PeriodAverage,
    pub weekday_distribution: HourlyDistribution,
    pub weekend_distribution: HourlyDistribution,
}

impl WeekdayWeekendSplit {
    /// Weekend minus weekday average hours of the selected category
    pub fn weekend_excess_hours(&self) -> f64 {
        self.weekend_average.average_hours.get(self.category)
            - self.weekday_average.average_hours.get(self.category)
    }
}

/// Average category hours on one day of the week
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayOfWeekPattern {
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: u8,
    pub label: &'static str,
    pub day_count: usize,
    pub average_hours: CategoryHours,
}

/// Headline statistics for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    /// `YYYY-MM`
    pub month: String,
    pub total_days: usize,
    pub average_sleep_hours: f64,
    pub average_outdoor_minutes: f64,
}

/// One week's average for a single category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyTrendPoint {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// `MM/DD~MM/DD`
    pub label: String,
    pub day_count: usize,
    pub average_hours: f64,
}

/// Linear relationship between two categories' daily hours
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationEntry {
    pub category_a: CategoryId,
    pub category_b: CategoryId,
    pub pearson_coefficient: f64,
    /// Mean daily hours of `category_b`
    pub average_hours_b: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_hours_arithmetic() {
        let template = CategoryTemplate::default();
        let sleep = template.resolve("sleep").unwrap();
        let work = template.resolve("work").unwrap();

        let mut hours = CategoryHours::zeroed(&template);
        hours.add(sleep, 7.6);
        hours.add(work, 8.0);
        hours.add(sleep, 0.2);

        assert!((hours.get(sleep) - 7.8).abs() < 1e-9);
        assert!((hours.total() - 15.8).abs() < 1e-9);

        hours.scale(0.5);
        assert!((hours.get(work) - 4.0).abs() < 1e-9);
        assert_eq!(hours.rounded().get(sleep), 4.0);
    }

    #[test]
    fn test_named_hours_follow_template() {
        let template = CategoryTemplate::default();
        let hours = CategoryHours::from_values(vec![8.0, 8.0, 4.0, 2.0, 0.0, 1.0, 1.0]);
        let named = hours.named(&template);
        assert_eq!(named.len(), 7);
        assert_eq!(named[0].name, "sleep");
        assert_eq!(named[6].name, "outdoor");
        assert_eq!(named[6].color, "#03A9F4");
    }

    #[test]
    fn test_peak_hour_prefers_earliest() {
        let template = CategoryTemplate::default();
        let id = template.resolve("work").unwrap();
        let hours = (0..24u8)
            .map(|hour| {
                let active = usize::from(hour == 9 || hour == 14);
                HourlyRate {
                    hour,
                    active_days: active,
                    occurrence_rate: active as f64 * 50.0,
                }
            })
            .collect();
        let distribution = HourlyDistribution {
            category: id,
            days_considered: 2,
            hours,
        };
        assert_eq!(distribution.peak_hour().map(|r| r.hour), Some(9));
        assert_eq!(distribution.rate(14), 50.0);
    }
}

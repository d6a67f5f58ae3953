//! Multi-day aggregation
//!
//! This module combines per-day statistics into the dashboard's weekly,
//! monthly and time-range views:
//! - Period and weekly averages
//! - Hourly occurrence distributions
//! - Weekday vs. weekend comparison and day-of-week patterns
//! - Time-range filtering
//!
//! Every average over an empty group is defined as 0.

use crate::config::{CategoryId, CategoryTemplate};
use crate::types::{
    ActivityStats, CategoryHours, DayDerived, DayHours, DayOfWeekPattern, HourlyDistribution,
    HourlyRate, MonthlySummary, PeriodAverage, WeekAggregate, WeekdayWeekendSplit,
    WeeklyTrendPoint, HOURS_PER_DAY,
};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Short weekday labels, Sunday first
pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Days included in an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TimeRange {
    /// Every recorded day
    #[default]
    All,
    /// Days on or after `reference - n days`
    LastDays(u32),
    /// Days on or after a fixed date
    Since(NaiveDate),
}

impl TimeRange {
    /// Inclusive lower bound, if any, relative to `reference`
    pub fn lower_bound(&self, reference: NaiveDate) -> Option<NaiveDate> {
        match self {
            TimeRange::All => None,
            TimeRange::LastDays(n) => Some(reference - Duration::days(i64::from(*n))),
            TimeRange::Since(date) => Some(*date),
        }
    }

    pub fn contains(&self, date: NaiveDate, reference: NaiveDate) -> bool {
        self.lower_bound(reference).map_or(true, |bound| date >= bound)
    }
}

/// Copy of the days that fall inside `range`; the source is not modified
pub fn filter_range(days: &[DayDerived], range: TimeRange, reference: NaiveDate) -> Vec<DayDerived> {
    days.iter()
        .filter(|d| range.contains(d.date, reference))
        .cloned()
        .collect()
}

/// Whether `start..end` is active during hour `hour`
pub fn interval_covers_hour(start: u8, end: u8, hour: u8) -> bool {
    if end < start {
        hour >= start || hour < end
    } else {
        start <= hour && hour < end
    }
}

/// Average category hours and headline stats over a group of days
pub fn average_days<'a, I>(days: I, template: &CategoryTemplate) -> PeriodAverage
where
    I: IntoIterator<Item = &'a DayDerived>,
{
    let mut totals = CategoryHours::zeroed(template);
    let mut sleep = 0.0;
    let mut outdoor = 0.0;
    let mut count = 0usize;

    for day in days {
        for (id, hours) in day.category_totals.iter() {
            totals.add(id, hours);
        }
        sleep += f64::from(day.sleep_hours);
        outdoor += f64::from(day.outdoor_minutes);
        count += 1;
    }

    if count == 0 {
        return PeriodAverage {
            day_count: 0,
            average_hours: totals,
            average_sleep_hours: 0.0,
            average_outdoor_minutes: 0.0,
        };
    }

    let n = count as f64;
    totals.scale(1.0 / n);
    PeriodAverage {
        day_count: count,
        average_hours: totals,
        average_sleep_hours: sleep / n,
        average_outdoor_minutes: outdoor / n,
    }
}

/// Average over the days whose date lies in `[start_date, end_date]`
pub fn compute_weekly_aggregate(
    days: &[DayDerived],
    start_date: NaiveDate,
    end_date: NaiveDate,
    template: &CategoryTemplate,
) -> WeekAggregate {
    let member_days: Vec<DayDerived> = days
        .iter()
        .filter(|d| d.date >= start_date && d.date <= end_date)
        .cloned()
        .collect();

    let average = average_days(&member_days, template);

    WeekAggregate {
        start_date,
        end_date,
        average_hours: average.average_hours,
        average_sleep_hours: average.average_sleep_hours,
        average_outdoor_minutes: average.average_outdoor_minutes,
        member_days,
    }
}

/// Percentage of days on which `category` is active in each hour 0-23
pub fn compute_hourly_distribution(days: &[DayDerived], category: CategoryId) -> HourlyDistribution {
    distribution_over(days.iter(), category)
}

fn distribution_over<'a, I>(days: I, category: CategoryId) -> HourlyDistribution
where
    I: Iterator<Item = &'a DayDerived>,
{
    let mut active_days = [0usize; HOURS_PER_DAY as usize];
    let mut days_considered = 0usize;

    for day in days {
        days_considered += 1;
        for hour in 0..HOURS_PER_DAY {
            let active = day
                .intervals
                .iter()
                .any(|i| i.category == category && i.covers_hour(hour));
            if active {
                active_days[hour as usize] += 1;
            }
        }
    }

    let hours = (0..HOURS_PER_DAY)
        .map(|hour| {
            let count = active_days[hour as usize];
            let occurrence_rate = if days_considered == 0 {
                0.0
            } else {
                count as f64 / days_considered as f64 * 100.0
            };
            HourlyRate {
                hour,
                active_days: count,
                occurrence_rate,
            }
        })
        .collect();

    HourlyDistribution {
        category,
        days_considered,
        hours,
    }
}

/// Hourly distribution of every template category, in template order
pub fn compute_hourly_heatmap(
    days: &[DayDerived],
    template: &CategoryTemplate,
) -> Vec<HourlyDistribution> {
    template
        .ids()
        .map(|id| compute_hourly_distribution(days, id))
        .collect()
}

/// Compare weekday and weekend days, each averaged independently
pub fn compute_weekday_weekend_split(
    days: &[DayDerived],
    category: CategoryId,
    template: &CategoryTemplate,
) -> WeekdayWeekendSplit {
    let (weekend, weekday): (Vec<&DayDerived>, Vec<&DayDerived>) =
        days.iter().partition(|d| d.is_weekend);

    WeekdayWeekendSplit {
        category,
        weekday_average: average_days(weekday.iter().copied(), template),
        weekend_average: average_days(weekend.iter().copied(), template),
        weekday_distribution: distribution_over(weekday.iter().copied(), category),
        weekend_distribution: distribution_over(weekend.iter().copied(), category),
    }
}

/// Averages, busiest and lightest day, and peak hour of one category.
///
/// Hours are the rounded daily totals. A day without the category counts
/// toward the averages and the maximum but never becomes the minimum.
pub fn compute_activity_stats(days: &[DayDerived], category: CategoryId) -> ActivityStats {
    let mut total = 0.0;
    let (mut weekday_total, mut weekday_count) = (0.0, 0usize);
    let (mut weekend_total, mut weekend_count) = (0.0, 0usize);
    let mut max_day: Option<DayHours> = None;
    let mut min_day: Option<DayHours> = None;

    for day in days {
        let hours = day.category_totals.get(category);
        total += hours;
        if day.is_weekend {
            weekend_total += hours;
            weekend_count += 1;
        } else {
            weekday_total += hours;
            weekday_count += 1;
        }

        let current = DayHours {
            date: day.date,
            hours,
        };
        if max_day.map_or(true, |m| hours > m.hours) {
            max_day = Some(current);
        }
        if hours > 0.0 && min_day.map_or(true, |m| hours < m.hours) {
            min_day = Some(current);
        }
    }

    let mean = |sum: f64, count: usize| if count == 0 { 0.0 } else { sum / count as f64 };

    ActivityStats {
        category,
        day_count: days.len(),
        average_hours: mean(total, days.len()),
        weekday_average_hours: mean(weekday_total, weekday_count),
        weekend_average_hours: mean(weekend_total, weekend_count),
        max_day,
        min_day,
        peak_hour: compute_hourly_distribution(days, category).peak_hour(),
    }
}

/// Average category hours for each day of the week, Sunday first
pub fn compute_day_of_week_patterns(
    days: &[DayDerived],
    template: &CategoryTemplate,
) -> Vec<DayOfWeekPattern> {
    WEEKDAY_LABELS
        .into_iter()
        .enumerate()
        .map(|(dow, label)| {
            let average = average_days(
                days.iter().filter(|d| usize::from(d.day_of_week) == dow),
                template,
            );
            DayOfWeekPattern {
                day_of_week: dow as u8,
                label,
                day_count: average.day_count,
                average_hours: average.average_hours,
            }
        })
        .collect()
}

/// Sunday-to-Saturday week containing `date`
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let offset = i64::from(date.weekday().num_days_from_sunday());
    let start = date - Duration::days(offset);
    (start, start + Duration::days(6))
}

/// Group days into the calendar weeks they fall in, oldest first.
///
/// Only weeks with at least one recorded day are returned.
pub fn calendar_weeks(days: &[DayDerived], template: &CategoryTemplate) -> Vec<WeekAggregate> {
    let mut starts: Vec<(NaiveDate, NaiveDate)> = days.iter().map(|d| week_bounds(d.date)).collect();
    starts.sort();
    starts.dedup();

    starts
        .into_iter()
        .map(|(start, end)| compute_weekly_aggregate(days, start, end, template))
        .collect()
}

/// Weekly average hours of one category across calendar weeks
pub fn compute_weekly_trend(
    days: &[DayDerived],
    category: CategoryId,
    template: &CategoryTemplate,
) -> Vec<WeeklyTrendPoint> {
    calendar_weeks(days, template)
        .into_iter()
        .map(|week| WeeklyTrendPoint {
            label: format!(
                "{}~{}",
                week.start_date.format("%m/%d"),
                week.end_date.format("%m/%d")
            ),
            start_date: week.start_date,
            end_date: week.end_date,
            day_count: week.member_days.len(),
            average_hours: week.average_hours.get(category),
        })
        .collect()
}

/// Day count and headline averages per calendar month, oldest first
pub fn compute_monthly_summaries(days: &[DayDerived]) -> Vec<MonthlySummary> {
    let mut months: BTreeMap<(i32, u32), (usize, f64, f64)> = BTreeMap::new();
    for day in days {
        let entry = months
            .entry((day.date.year(), day.date.month()))
            .or_insert((0, 0.0, 0.0));
        entry.0 += 1;
        entry.1 += f64::from(day.sleep_hours);
        entry.2 += f64::from(day.outdoor_minutes);
    }

    months
        .into_iter()
        .map(|((year, month), (count, sleep, outdoor))| {
            let n = count.max(1) as f64;
            MonthlySummary {
                month: format!("{year:04}-{month:02}"),
                total_days: count,
                average_sleep_hours: sleep / n,
                average_outdoor_minutes: outdoor / n,
            }
        })
        .collect()
}

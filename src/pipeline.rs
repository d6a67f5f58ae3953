//! Pipeline orchestration
//!
//! This module provides the public API for Dayflux. It loads a raw dataset
//! through normalization and per-day derivation, then serves every dashboard
//! view from the loaded days.
//!
//! Pipeline stages:
//! 1. RawDayAdapter - Parse the dataset file into raw day records
//! 2. Normalizer - Canonical hours and resolved categories
//! 3. FeatureDeriver - Per-day statistics and 24-hour reconciliation
//! 4. Aggregation - Weekly, hourly, weekday/weekend and correlation views

use crate::aggregate::{
    average_days, calendar_weeks, compute_activity_stats, compute_day_of_week_patterns,
    compute_hourly_distribution,
    compute_hourly_heatmap, compute_monthly_summaries, compute_weekday_weekend_split,
    compute_weekly_trend, filter_range, TimeRange,
};
use crate::calendar::{month_calendar, CalendarDay};
use crate::config::{CategoryId, DashboardConfig};
use crate::context::DailyContext;
use crate::correlation::compute_correlations;
use crate::error::ComputeError;
use crate::features::compute_day_derived;
use crate::sample::sample_days;
use crate::schema::{DatasetFormat, RawDay, RawDayAdapter};
use crate::types::{
    ActivityStats, CorrelationEntry, DayDerived, DayOfWeekPattern, HourlyDistribution,
    MonthlySummary, PeriodAverage, WeekAggregate, WeekdayWeekendSplit, WeeklyTrendPoint,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// A day that could not be loaded
#[derive(Debug)]
pub struct DayFailure {
    /// Date as written in the dataset
    pub date: String,
    pub error: ComputeError,
}

/// Result of loading a dataset: the usable days and the ones that failed
#[derive(Debug)]
pub struct DatasetLoad {
    /// Derived days in date order
    pub days: Vec<DayDerived>,
    pub failures: Vec<DayFailure>,
}

/// Derive every day of a dataset.
///
/// Errors scoped to a single day are collected in `failures` and do not
/// stop the batch. An invalid config is fatal, and so is a batch that leaves
/// no usable day (`EmptyDataset`).
#[tracing::instrument(skip_all, fields(days = raw_days.len()))]
pub fn load_dataset(
    raw_days: &[RawDay],
    config: &DashboardConfig,
) -> Result<DatasetLoad, ComputeError> {
    config.validate()?;

    let mut days = Vec::with_capacity(raw_days.len());
    let mut failures = Vec::new();
    let mut seen = HashSet::new();

    for raw in raw_days {
        // Keyed on the parsed date: "2025-4-28" repeats "2025-04-28"
        if raw.parse_date().is_some_and(|date| !seen.insert(date)) {
            warn!(date = %raw.date, "skipping duplicate date");
            failures.push(DayFailure {
                date: raw.date.clone(),
                error: ComputeError::ParseError(format!("duplicate date {}", raw.date)),
            });
            continue;
        }

        match compute_day_derived(raw, config) {
            Ok(day) => days.push(day),
            Err(error) if error.is_day_scoped() => {
                warn!(date = %raw.date, %error, "skipping day");
                failures.push(DayFailure {
                    date: raw.date.clone(),
                    error,
                });
            }
            Err(error) => return Err(error),
        }
    }

    if days.is_empty() {
        return Err(ComputeError::EmptyDataset);
    }

    days.sort_by_key(|d| d.date);
    debug!(loaded = days.len(), failed = failures.len(), "dataset loaded");

    Ok(DatasetLoad { days, failures })
}

/// Headline figures for a time range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub range: TimeRange,
    pub reference_date: NaiveDate,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub period_average: PeriodAverage,
    pub day_of_week: Vec<DayOfWeekPattern>,
    pub months: Vec<MonthlySummary>,
    pub failed_dates: Vec<String>,
}

/// Stateful processor owning a loaded dataset.
///
/// Hourly distributions and correlations are memoized per category and
/// time range; every other view is recomputed on request.
pub struct DashboardProcessor {
    config: DashboardConfig,
    days: Vec<DayDerived>,
    failures: Vec<DayFailure>,
    reference_date: NaiveDate,
    distributions: HashMap<(CategoryId, TimeRange), HourlyDistribution>,
    correlations: HashMap<(CategoryId, TimeRange), Vec<CorrelationEntry>>,
}

impl DashboardProcessor {
    /// Load raw days; relative ranges are measured from the last recorded day
    pub fn new(raw_days: &[RawDay], config: DashboardConfig) -> Result<Self, ComputeError> {
        let DatasetLoad { days, failures } = load_dataset(raw_days, &config)?;
        let reference_date = days
            .last()
            .map(|d| d.date)
            .ok_or(ComputeError::EmptyDataset)?;

        Ok(Self {
            config,
            days,
            failures,
            reference_date,
            distributions: HashMap::new(),
            correlations: HashMap::new(),
        })
    }

    /// Parse a dataset file and load it
    pub fn from_json(
        input: &str,
        format: DatasetFormat,
        config: DashboardConfig,
    ) -> Result<Self, ComputeError> {
        let raw_days = RawDayAdapter::parse(input, format)?;
        Self::new(&raw_days, config)
    }

    /// Processor over the built-in sample week
    pub fn sample(config: DashboardConfig) -> Result<Self, ComputeError> {
        Self::new(&sample_days()?, config)
    }

    /// Measure relative ranges from `date` instead of the last recorded day
    pub fn set_reference_date(&mut self, date: NaiveDate) {
        if date != self.reference_date {
            self.reference_date = date;
            self.clear_cache();
        }
    }

    pub fn clear_cache(&mut self) {
        self.distributions.clear();
        self.correlations.clear();
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn days(&self) -> &[DayDerived] {
        &self.days
    }

    pub fn failures(&self) -> &[DayFailure] {
        &self.failures
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.days.first().map(|d| d.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.days.last().map(|d| d.date)
    }

    /// Dates with a usable record, oldest first
    pub fn available_dates(&self) -> Vec<NaiveDate> {
        self.days.iter().map(|d| d.date).collect()
    }

    pub fn has_data_for(&self, date: NaiveDate) -> bool {
        self.days.binary_search_by_key(&date, |d| d.date).is_ok()
    }

    /// Resolve a category name against the configured template
    pub fn category(&self, name: &str) -> Result<CategoryId, ComputeError> {
        self.config.categories.resolve(name)
    }

    /// Derived statistics of one day
    pub fn day(&self, date: NaiveDate) -> Result<&DayDerived, ComputeError> {
        self.days
            .binary_search_by_key(&date, |d| d.date)
            .map(|i| &self.days[i])
            .map_err(|_| ComputeError::MissingData {
                date: date.to_string(),
            })
    }

    /// Copy of the days inside `range`
    pub fn days_in(&self, range: TimeRange) -> Vec<DayDerived> {
        filter_range(&self.days, range, self.reference_date)
    }

    pub fn period_average(&self, range: TimeRange) -> PeriodAverage {
        average_days(&self.days_in(range), &self.config.categories)
    }

    /// Hourly distribution of one category, memoized
    pub fn distribution(&mut self, category: CategoryId, range: TimeRange) -> &HourlyDistribution {
        let days = &self.days;
        let reference = self.reference_date;
        self.distributions
            .entry((category, range))
            .or_insert_with(|| {
                debug!(%category, ?range, "computing hourly distribution");
                compute_hourly_distribution(&filter_range(days, range, reference), category)
            })
    }

    /// Hourly distribution of every category
    pub fn heatmap(&self, range: TimeRange) -> Vec<HourlyDistribution> {
        compute_hourly_heatmap(&self.days_in(range), &self.config.categories)
    }

    /// Correlations of one category against the others, memoized
    pub fn correlations(&mut self, category: CategoryId, range: TimeRange) -> &[CorrelationEntry] {
        let days = &self.days;
        let reference = self.reference_date;
        let template = &self.config.categories;
        self.correlations
            .entry((category, range))
            .or_insert_with(|| {
                debug!(%category, ?range, "computing correlations");
                compute_correlations(&filter_range(days, range, reference), category, template)
            })
    }

    /// Averages, busiest and lightest day of one category
    pub fn activity_stats(&self, category: CategoryId, range: TimeRange) -> ActivityStats {
        compute_activity_stats(&self.days_in(range), category)
    }

    /// Calendar markers of every recorded day in a month
    pub fn calendar_month(&self, year: i32, month: u32) -> Result<Vec<CalendarDay>, ComputeError> {
        month_calendar(&self.days, year, month, &self.config)
    }

    pub fn split(&self, category: CategoryId, range: TimeRange) -> WeekdayWeekendSplit {
        compute_weekday_weekend_split(&self.days_in(range), category, &self.config.categories)
    }

    /// Calendar weeks of the range, oldest first
    pub fn weeks(&self, range: TimeRange) -> Vec<WeekAggregate> {
        calendar_weeks(&self.days_in(range), &self.config.categories)
    }

    pub fn weekly_trend(&self, category: CategoryId, range: TimeRange) -> Vec<WeeklyTrendPoint> {
        compute_weekly_trend(&self.days_in(range), category, &self.config.categories)
    }

    pub fn day_of_week_patterns(&self, range: TimeRange) -> Vec<DayOfWeekPattern> {
        compute_day_of_week_patterns(&self.days_in(range), &self.config.categories)
    }

    pub fn monthly_summaries(&self, range: TimeRange) -> Vec<MonthlySummary> {
        compute_monthly_summaries(&self.days_in(range))
    }

    /// Daily view of a recorded date
    pub fn context(&self, date: NaiveDate) -> Result<DailyContext, ComputeError> {
        DailyContext::build(&self.days, date, &self.config)
    }

    /// Headline figures of a range; fails when the range holds no day
    pub fn summary(&self, range: TimeRange) -> Result<DashboardSummary, ComputeError> {
        let days = self.days_in(range);
        let (first, last) = match (days.first(), days.last()) {
            (Some(first), Some(last)) => (first.date, last.date),
            _ => return Err(ComputeError::EmptyDataset),
        };

        Ok(DashboardSummary {
            range,
            reference_date: self.reference_date,
            first_date: first,
            last_date: last,
            period_average: average_days(&days, &self.config.categories),
            day_of_week: compute_day_of_week_patterns(&days, &self.config.categories),
            months: compute_monthly_summaries(&days),
            failed_dates: self.failures.iter().map(|f| f.date.clone()).collect(),
        })
    }

    #[cfg(test)]
    fn cached_entries(&self) -> usize {
        self.distributions.len() + self.correlations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RawInterval;
    use pretty_assertions::assert_eq;

    fn make_raw(date: &str, intervals: Vec<(&str, u32, u32)>) -> RawDay {
        RawDay::new(
            date,
            intervals
                .into_iter()
                .map(|(c, s, e)| RawInterval::new(c, s, e))
                .collect(),
        )
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_load_dataset_scopes_failures_to_days() {
        let config = DashboardConfig::default();
        let raw = vec![
            make_raw("2025-04-28", vec![("sleep", 23, 7), ("work", 9, 18)]),
            RawDay::missing("2025-04-29"),
            make_raw("2025-04-30", vec![("gaming", 20, 23)]),
            make_raw("2025-05-01", vec![("sleep", 0, 8), ("work", 9, 30)]),
            make_raw("2025-05-02", vec![("sleep", 0, 8)]),
        ];

        let load = load_dataset(&raw, &config).unwrap();

        let loaded: Vec<String> = load.days.iter().map(|d| d.date.to_string()).collect();
        assert_eq!(loaded, vec!["2025-04-28", "2025-05-02"]);

        let failed: Vec<&str> = load.failures.iter().map(|f| f.date.as_str()).collect();
        assert_eq!(failed, vec!["2025-04-29", "2025-04-30", "2025-05-01"]);
        assert!(matches!(load.failures[0].error, ComputeError::MissingData { .. }));
        assert!(matches!(load.failures[1].error, ComputeError::UnknownCategory(_)));
        assert!(matches!(load.failures[2].error, ComputeError::InvalidHour { .. }));
    }

    #[test]
    fn test_load_dataset_rejects_duplicates() {
        let config = DashboardConfig::default();
        let raw = vec![
            make_raw("2025-04-28", vec![("sleep", 0, 8)]),
            make_raw("2025-04-28", vec![("sleep", 0, 6)]),
        ];

        let load = load_dataset(&raw, &config).unwrap();
        assert_eq!(load.days.len(), 1);
        assert_eq!(load.days[0].sleep_hours, 8);
        assert_eq!(load.failures.len(), 1);
    }

    #[test]
    fn test_load_dataset_rejects_unpadded_duplicate() {
        let config = DashboardConfig::default();
        let raw = vec![
            make_raw("2025-04-28", vec![("sleep", 0, 8)]),
            make_raw("2025-4-28", vec![("sleep", 0, 6)]),
        ];

        let processor = DashboardProcessor::new(&raw, config).unwrap();
        assert_eq!(processor.days().len(), 1);
        assert_eq!(processor.day(date("2025-04-28")).unwrap().sleep_hours, 8);
        assert_eq!(processor.failures()[0].date, "2025-4-28");
    }

    #[test]
    fn test_corrupt_day_does_not_abort_object_dataset() {
        for bad_hour in ["-1", "7.5"] {
            let json = format!(
                r#"{{
                    "2025-04-28": {{ "intervals": [{{ "category": "sleep", "start": 0, "end": 8 }}] }},
                    "2025-04-29": {{ "intervals": [{{ "category": "sleep", "start": {bad_hour}, "end": 7 }}] }}
                }}"#
            );
            let processor =
                DashboardProcessor::from_json(&json, DatasetFormat::Auto, DashboardConfig::default())
                    .unwrap();

            assert_eq!(processor.available_dates(), vec![date("2025-04-28")]);
            assert_eq!(processor.failures().len(), 1);
            assert!(matches!(
                processor.failures()[0].error,
                ComputeError::InvalidHour { .. }
            ));
        }
    }

    #[test]
    fn test_processor_activity_stats_and_calendar() {
        let processor = DashboardProcessor::sample(DashboardConfig::default()).unwrap();
        let sleep = processor.category("sleep").unwrap();

        let stats = processor.activity_stats(sleep, TimeRange::All);
        assert_eq!(stats.day_count, 7);
        assert_eq!(stats.max_day.map(|d| d.hours), Some(stats_max(&processor)));

        let april = processor.calendar_month(2025, 4).unwrap();
        assert_eq!(april.len(), 7);
        assert_eq!(april[6].date, date("2025-04-27"));
        assert!(processor.calendar_month(2025, 5).unwrap().is_empty());
    }

    fn stats_max(processor: &DashboardProcessor) -> f64 {
        let sleep = processor.category("sleep").unwrap();
        processor
            .days()
            .iter()
            .map(|d| d.category_totals.get(sleep))
            .fold(0.0, f64::max)
    }

    #[test]
    fn test_empty_dataset() {
        let config = DashboardConfig::default();
        assert!(matches!(
            load_dataset(&[], &config),
            Err(ComputeError::EmptyDataset)
        ));
        assert!(matches!(
            load_dataset(&[RawDay::missing("2025-04-28")], &config),
            Err(ComputeError::EmptyDataset)
        ));
    }

    #[test]
    fn test_processor_from_object_json() {
        let json = r#"{
            "2025-04-29": { "intervals": [ { "category": "sleep", "start": 23, "end": 7 } ] },
            "2025-04-28": { "hourlyActivity": [ { "name": "work", "start": 9, "end": 17 } ] }
        }"#;
        let processor =
            DashboardProcessor::from_json(json, DatasetFormat::Auto, DashboardConfig::default())
                .unwrap();

        assert_eq!(processor.first_date(), Some(date("2025-04-28")));
        assert_eq!(processor.last_date(), Some(date("2025-04-29")));
        assert_eq!(processor.reference_date(), date("2025-04-29"));
        assert!(processor.has_data_for(date("2025-04-28")));
        assert!(!processor.has_data_for(date("2025-04-30")));
        assert_eq!(processor.day(date("2025-04-29")).unwrap().sleep_hours, 8);
        assert!(matches!(
            processor.day(date("2025-04-30")),
            Err(ComputeError::MissingData { .. })
        ));
    }

    #[test]
    fn test_processor_memoizes_per_category_and_range() {
        let mut processor = DashboardProcessor::sample(DashboardConfig::default()).unwrap();
        let sleep = processor.category("sleep").unwrap();
        let coding = processor.category("coding").unwrap();

        let first = processor.distribution(sleep, TimeRange::All).clone();
        let again = processor.distribution(sleep, TimeRange::All).clone();
        assert_eq!(first, again);
        assert_eq!(processor.cached_entries(), 1);

        processor.distribution(sleep, TimeRange::LastDays(2));
        processor.distribution(coding, TimeRange::All);
        processor.correlations(sleep, TimeRange::All);
        processor.correlations(sleep, TimeRange::All);
        assert_eq!(processor.cached_entries(), 4);

        processor.set_reference_date(date("2025-04-25"));
        assert_eq!(processor.cached_entries(), 0);
    }

    #[test]
    fn test_processor_ranges() {
        let processor = DashboardProcessor::sample(DashboardConfig::default()).unwrap();

        assert_eq!(processor.days_in(TimeRange::All).len(), 7);
        // 2025-04-25 through 2025-04-27
        assert_eq!(processor.days_in(TimeRange::LastDays(2)).len(), 3);
        assert_eq!(processor.period_average(TimeRange::All).day_count, 7);
        assert_eq!(processor.heatmap(TimeRange::All).len(), 7);
        assert_eq!(processor.weeks(TimeRange::All).len(), 2);
    }

    #[test]
    fn test_summary() {
        let processor = DashboardProcessor::sample(DashboardConfig::default()).unwrap();
        let summary = processor.summary(TimeRange::All).unwrap();

        assert_eq!(summary.first_date, date("2025-04-21"));
        assert_eq!(summary.last_date, date("2025-04-27"));
        assert_eq!(summary.period_average.day_count, 7);
        assert_eq!(summary.months.len(), 1);
        assert!(summary.failed_dates.is_empty());

        let future = processor.summary(TimeRange::Since(date("2026-01-01")));
        assert!(matches!(future, Err(ComputeError::EmptyDataset)));
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let mut config = DashboardConfig::default();
        config.roles.leisure = "relaxing".to_string();
        let raw = vec![make_raw("2025-04-28", vec![("sleep", 0, 8)])];

        assert!(matches!(
            load_dataset(&raw, &config),
            Err(ComputeError::InvalidTemplate(_))
        ));
    }
}

//! Snapshot encoding
//!
//! This module encodes dashboard views into self-describing JSON documents.
//! Category ids are replaced with template names and colors so the output
//! can be rendered without the config that produced it.

use crate::aggregate::TimeRange;
use crate::config::{CategoryId, CategoryTemplate};
use crate::error::ComputeError;
use crate::pipeline::DashboardProcessor;
use crate::types::{
    ActivityStats, CorrelationEntry, DayHours, HourlyDistribution, HourlyRate, NamedHours,
    PeriodAverage, WeekdayWeekendSplit,
};
use crate::{DAYFLUX_VERSION, PRODUCER_NAME};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Current snapshot schema version
pub const SNAPSHOT_VERSION: &str = "dayflux.snapshot.v1";

/// Who computed a snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Period averages with named categories
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedPeriodAverage {
    pub day_count: usize,
    pub average_hours: Vec<NamedHours>,
    pub average_sleep_hours: f64,
    pub average_outdoor_minutes: f64,
}

impl NamedPeriodAverage {
    pub fn new(average: &PeriodAverage, template: &CategoryTemplate) -> Self {
        Self {
            day_count: average.day_count,
            average_hours: average.average_hours.named(template),
            average_sleep_hours: average.average_sleep_hours,
            average_outdoor_minutes: average.average_outdoor_minutes,
        }
    }
}

/// Hourly occurrence rates of a named category, indexed by hour
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedDistribution {
    pub category: String,
    pub color: String,
    pub days_considered: usize,
    pub rates: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_hour: Option<u8>,
}

impl NamedDistribution {
    pub fn new(distribution: &HourlyDistribution, template: &CategoryTemplate) -> Self {
        let (category, color) = category_label(template, distribution.category);
        Self {
            category,
            color,
            days_considered: distribution.days_considered,
            rates: distribution.hours.iter().map(|r| r.occurrence_rate).collect(),
            peak_hour: distribution.peak_hour().map(|r| r.hour),
        }
    }
}

/// Name and color of a category; an id from another template keeps its index
fn category_label(template: &CategoryTemplate, id: CategoryId) -> (String, String) {
    match template.get(id) {
        Some(c) => (c.name.clone(), c.color.clone()),
        None => (id.to_string(), String::new()),
    }
}

/// Weekday/weekend comparison with named categories
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedSplit {
    pub category: String,
    pub weekday: NamedPeriodAverage,
    pub weekend: NamedPeriodAverage,
    pub weekday_distribution: NamedDistribution,
    pub weekend_distribution: NamedDistribution,
    pub weekend_excess_hours: f64,
}

impl NamedSplit {
    pub fn new(split: &WeekdayWeekendSplit, template: &CategoryTemplate) -> Self {
        Self {
            category: category_label(template, split.category).0,
            weekday: NamedPeriodAverage::new(&split.weekday_average, template),
            weekend: NamedPeriodAverage::new(&split.weekend_average, template),
            weekday_distribution: NamedDistribution::new(&split.weekday_distribution, template),
            weekend_distribution: NamedDistribution::new(&split.weekend_distribution, template),
            weekend_excess_hours: split.weekend_excess_hours(),
        }
    }
}

/// Correlation against the selected category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedCorrelation {
    pub category: String,
    pub color: String,
    pub pearson_coefficient: f64,
    pub average_hours: f64,
}

impl NamedCorrelation {
    pub fn new(entry: &CorrelationEntry, template: &CategoryTemplate) -> Self {
        let (category, color) = category_label(template, entry.category_b);
        Self {
            category,
            color,
            pearson_coefficient: entry.pearson_coefficient,
            average_hours: entry.average_hours_b,
        }
    }
}

/// Activity stats card of a named category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedActivityStats {
    pub category: String,
    pub day_count: usize,
    pub average_hours: f64,
    pub weekday_average_hours: f64,
    pub weekend_average_hours: f64,
    pub max_day: Option<DayHours>,
    pub min_day: Option<DayHours>,
    pub peak_hour: Option<HourlyRate>,
}

impl NamedActivityStats {
    pub fn new(stats: &ActivityStats, template: &CategoryTemplate) -> Self {
        Self {
            category: category_label(template, stats.category).0,
            day_count: stats.day_count,
            average_hours: stats.average_hours,
            weekday_average_hours: stats.weekday_average_hours,
            weekend_average_hours: stats.weekend_average_hours,
            max_day: stats.max_day,
            min_day: stats.min_day,
            peak_hour: stats.peak_hour,
        }
    }
}

/// A date the dataset could not provide
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedDay {
    pub date: String,
    pub reason: String,
}

/// Full analytics view of a time range for one selected category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub snapshot_version: String,
    pub producer: SnapshotProducer,
    pub computed_at_utc: String,
    pub range: TimeRange,
    pub reference_date: NaiveDate,
    pub selected_category: String,
    pub period_average: NamedPeriodAverage,
    pub activity_stats: NamedActivityStats,
    pub heatmap: Vec<NamedDistribution>,
    pub split: NamedSplit,
    pub correlations: Vec<NamedCorrelation>,
    pub failed_days: Vec<FailedDay>,
}

/// Snapshot encoder for producing dashboard documents
pub struct SnapshotEncoder {
    instance_id: String,
}

impl Default for SnapshotEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Build the snapshot of `range` for `category`
    pub fn encode(
        &self,
        processor: &mut DashboardProcessor,
        category: CategoryId,
        range: TimeRange,
    ) -> Result<DashboardSnapshot, ComputeError> {
        if processor.days_in(range).is_empty() {
            return Err(ComputeError::EmptyDataset);
        }

        let template = processor.config().categories.clone();

        let correlations = processor
            .correlations(category, range)
            .iter()
            .map(|entry| NamedCorrelation::new(entry, &template))
            .collect();

        let heatmap = processor
            .heatmap(range)
            .iter()
            .map(|d| NamedDistribution::new(d, &template))
            .collect();

        let failed_days = processor
            .failures()
            .iter()
            .map(|f| FailedDay {
                date: f.date.clone(),
                reason: f.error.to_string(),
            })
            .collect();

        Ok(DashboardSnapshot {
            snapshot_version: SNAPSHOT_VERSION.to_string(),
            producer: SnapshotProducer {
                name: PRODUCER_NAME.to_string(),
                version: DAYFLUX_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            range,
            reference_date: processor.reference_date(),
            selected_category: category_label(&template, category).0,
            period_average: NamedPeriodAverage::new(&processor.period_average(range), &template),
            activity_stats: NamedActivityStats::new(
                &processor.activity_stats(category, range),
                &template,
            ),
            heatmap,
            split: NamedSplit::new(&processor.split(category, range), &template),
            correlations,
            failed_days,
        })
    }

    /// Encode to JSON string
    pub fn encode_to_json(
        &self,
        processor: &mut DashboardProcessor,
        category: CategoryId,
        range: TimeRange,
    ) -> Result<String, ComputeError> {
        let snapshot = self.encode(processor, category, range)?;
        serde_json::to_string_pretty(&snapshot).map_err(ComputeError::JsonError)
    }
}

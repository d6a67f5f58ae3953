//! Raw day records as they arrive from the dataset collaborator

use crate::config::CategoryTemplate;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current schema version
pub const SCHEMA_VERSION: &str = "dayflux.raw_day.v1";

/// Date format used for record keys
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Highest hour accepted on input; 24 is an alias for midnight
pub const MAX_RAW_HOUR: u32 = 24;

/// One activity block as written in the dataset.
///
/// Hours are kept as raw JSON values so a negative, fractional or missing
/// hour only invalidates its own day instead of the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInterval {
    /// Category name, must exist in the template
    #[serde(alias = "name")]
    pub category: String,
    /// Start hour, 0-24
    #[serde(default)]
    pub start: Value,
    /// End hour, 0-24
    #[serde(default)]
    pub end: Value,
}

impl RawInterval {
    pub fn new(category: impl Into<String>, start: u32, end: u32) -> Self {
        Self {
            category: category.into(),
            start: Value::from(start),
            end: Value::from(end),
        }
    }

    /// Start hour, if it is a whole number within 0-24
    pub fn start_hour(&self) -> Option<u32> {
        whole_hour(&self.start)
    }

    /// End hour, if it is a whole number within 0-24
    pub fn end_hour(&self) -> Option<u32> {
        whole_hour(&self.end)
    }
}

/// Read a raw hour; anything but an integer in 0-24 is rejected
pub fn whole_hour(value: &Value) -> Option<u32> {
    value
        .as_u64()
        .and_then(|h| u32::try_from(h).ok())
        .filter(|h| *h <= MAX_RAW_HOUR)
}

/// The interval list of a day, as found under a date key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDayBody {
    #[serde(default, alias = "hourlyActivity", skip_serializing_if = "Option::is_none")]
    pub intervals: Option<Vec<RawInterval>>,
}

/// A calendar day and its raw intervals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDay {
    /// ISO date, `YYYY-MM-DD`
    pub date: String,
    /// `None` when the record carries no interval list at all
    #[serde(default, alias = "hourlyActivity", skip_serializing_if = "Option::is_none")]
    pub intervals: Option<Vec<RawInterval>>,
}

impl RawDay {
    pub fn new(date: impl Into<String>, intervals: Vec<RawInterval>) -> Self {
        Self {
            date: date.into(),
            intervals: Some(intervals),
        }
    }

    /// A record with no interval list
    pub fn missing(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            intervals: None,
        }
    }

    pub fn parse_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, DATE_FORMAT).ok()
    }

    /// Validate the record against a template
    pub fn validate(&self, template: &CategoryTemplate) -> Result<(), ValidationError> {
        match self.issues(template).into_iter().find(|i| !i.is_warning()) {
            Some(issue) => Err(issue),
            None => Ok(()),
        }
    }

    /// Every problem found in the record, warnings included
    pub fn issues(&self, template: &CategoryTemplate) -> Vec<ValidationError> {
        let mut issues = Vec::new();

        if self.parse_date().is_none() {
            issues.push(ValidationError::InvalidDate(self.date.clone()));
        }

        let Some(intervals) = &self.intervals else {
            issues.push(ValidationError::MissingIntervals(self.date.clone()));
            return issues;
        };

        for interval in intervals {
            for hour in [&interval.start, &interval.end] {
                if whole_hour(hour).is_none() {
                    issues.push(ValidationError::HourOutOfRange {
                        date: self.date.clone(),
                        hour: hour.to_string(),
                    });
                }
            }

            if template.find(&interval.category).is_none() {
                issues.push(ValidationError::UnknownCategory {
                    date: self.date.clone(),
                    category: interval.category.clone(),
                });
            }

            if let (Some(start), Some(end)) = (interval.start_hour(), interval.end_hour()) {
                if start % MAX_RAW_HOUR == end % MAX_RAW_HOUR {
                    issues.push(ValidationError::DegenerateInterval {
                        date: self.date.clone(),
                        category: interval.category.clone(),
                        hour: start,
                    });
                }
            }
        }

        issues
    }
}

/// Validation errors for raw day records
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Day {0} has no interval list")]
    MissingIntervals(String),

    #[error("Day {date}: hour {hour} is not a whole number within 0-24")]
    HourOutOfRange { date: String, hour: String },

    #[error("Day {date}: unknown category '{category}'")]
    UnknownCategory { date: String, category: String },

    #[error("Day {date}: '{category}' interval starting at {hour} has zero length")]
    DegenerateInterval {
        date: String,
        category: String,
        hour: u32,
    },

    #[error("Date {0} appears more than once")]
    DuplicateDate(String),
}

impl ValidationError {
    /// Warnings are reported but do not stop a day from loading
    pub fn is_warning(&self) -> bool {
        matches!(self, ValidationError::DegenerateInterval { .. })
    }
}

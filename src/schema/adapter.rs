//! Parsers turning dataset files into ordered raw day records
//!
//! Three layouts are accepted: an object keyed by date, an array of day
//! records, and newline-delimited day records.

use crate::config::CategoryTemplate;
use crate::error::ComputeError;
use crate::schema::raw_day::*;
use serde::de::{Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Layout of a dataset file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetFormat {
    /// Detect the layout from the content
    #[default]
    Auto,
    /// `{ "2025-04-27": { "intervals": [...] }, ... }`
    Object,
    /// `[ { "date": ..., "intervals": [...] }, ... ]`
    Array,
    /// One `{ "date": ..., "intervals": [...] }` per line
    Ndjson,
}

/// Adapter for reading raw day records
pub struct RawDayAdapter;

impl RawDayAdapter {
    /// Parse a dataset in the given layout, returning days sorted by date
    pub fn parse(input: &str, format: DatasetFormat) -> Result<Vec<RawDay>, ComputeError> {
        let mut days = match format {
            DatasetFormat::Object => Self::parse_object(input)?,
            DatasetFormat::Array => Self::parse_array(input)?,
            DatasetFormat::Ndjson => Self::parse_ndjson(input)?,
            DatasetFormat::Auto => Self::parse_auto(input)?,
        };
        Self::sort_by_date(&mut days);
        Ok(days)
    }

    /// Parse a JSON object mapping dates to interval lists.
    ///
    /// Days come back in file order. A repeated date key is kept as a
    /// separate record so validation can report it.
    pub fn parse_object(json: &str) -> Result<Vec<RawDay>, ComputeError> {
        let DatedDays(days) = serde_json::from_str(json)?;
        Ok(days)
    }

    /// Parse a JSON array of day records
    pub fn parse_array(json: &str) -> Result<Vec<RawDay>, ComputeError> {
        let days: Vec<RawDay> = serde_json::from_str(json)?;
        Ok(days)
    }

    /// Parse NDJSON (newline-delimited JSON) day records
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RawDay>, ComputeError> {
        let mut days = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawDay>(trimmed) {
                Ok(day) => days.push(day),
                Err(e) => {
                    return Err(ComputeError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(days)
    }

    fn parse_auto(input: &str) -> Result<Vec<RawDay>, ComputeError> {
        let trimmed = input.trim_start();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }
        if trimmed.starts_with('[') {
            return Self::parse_array(trimmed);
        }

        // A single-line NDJSON record is also a JSON object, so fall back
        // when the keys are not dates. If the input is one JSON document the
        // object error is the one worth reporting.
        match Self::parse_object(trimmed) {
            Ok(days) => Ok(days),
            Err(object_error) => Self::parse_ndjson(trimmed).map_err(|ndjson_error| {
                if serde_json::from_str::<IgnoredAny>(trimmed).is_ok() {
                    object_error
                } else {
                    ndjson_error
                }
            }),
        }
    }

    /// Stable sort on the parsed date; unparseable dates come first
    pub fn sort_by_date(days: &mut [RawDay]) {
        days.sort_by_key(|d| d.parse_date());
    }

    /// Validate every day and report the ones with problems
    pub fn validate_days(days: &[RawDay], template: &CategoryTemplate) -> Vec<DayValidation> {
        let mut seen = HashSet::new();
        let mut results = Vec::new();

        for (index, day) in days.iter().enumerate() {
            let mut issues = day.issues(template);
            // "2025-4-28" and "2025-04-28" are the same day
            if let Some(date) = day.parse_date() {
                if !seen.insert(date) {
                    issues.push(ValidationError::DuplicateDate(day.date.clone()));
                }
            }
            if !issues.is_empty() {
                results.push(DayValidation {
                    index,
                    date: day.date.clone(),
                    issues,
                });
            }
        }

        results
    }
}

/// Date-keyed object read entry by entry, duplicates included
struct DatedDays(Vec<RawDay>);

impl<'de> Deserialize<'de> for DatedDays {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DatedDaysVisitor;

        impl<'de> Visitor<'de> for DatedDaysVisitor {
            type Value = DatedDays;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping dates to interval lists")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut days = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((date, body)) = map.next_entry::<String, RawDayBody>()? {
                    days.push(RawDay {
                        date,
                        intervals: body.intervals,
                    });
                }
                Ok(DatedDays(days))
            }
        }

        deserializer.deserialize_map(DatedDaysVisitor)
    }
}

/// Problems found in a single day of a dataset
#[derive(Debug, Clone, PartialEq)]
pub struct DayValidation {
    pub index: usize,
    pub date: String,
    pub issues: Vec<ValidationError>,
}

impl DayValidation {
    /// Whether any issue prevents the day from loading
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| !i.is_warning())
    }
}

/// Serializable outcome of validating a whole dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub schema_version: String,
    pub total_days: usize,
    pub valid_days: usize,
    pub invalid_days: usize,
    pub warning_count: usize,
    pub days: Vec<DayReport>,
}

/// Issues of one day, split into errors and warnings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayReport {
    pub index: usize,
    pub date: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn build(days: &[RawDay], template: &CategoryTemplate) -> Self {
        let results = RawDayAdapter::validate_days(days, template);
        let invalid_days = results.iter().filter(|r| r.has_errors()).count();

        let days_report: Vec<DayReport> = results
            .into_iter()
            .map(|r| {
                let (warnings, errors): (Vec<_>, Vec<_>) =
                    r.issues.iter().partition(|i| i.is_warning());
                DayReport {
                    index: r.index,
                    date: r.date,
                    errors: errors.iter().map(|e| e.to_string()).collect(),
                    warnings: warnings.iter().map(|w| w.to_string()).collect(),
                }
            })
            .collect();

        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            total_days: days.len(),
            valid_days: days.len() - invalid_days,
            invalid_days,
            warning_count: days_report.iter().map(|d| d.warnings.len()).sum(),
            days: days_report,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.invalid_days == 0
    }
}

//! Interval normalization
//!
//! This module converts raw interval lists into a canonical form that is safe
//! for duration arithmetic:
//! - Hour 24 is rewritten to 0 (midnight)
//! - Category names are resolved against the template
//! - Zero-length intervals are dropped and flagged
//!
//! Normalization never mutates its input; it returns new records.

use crate::config::CategoryTemplate;
use crate::error::ComputeError;
use crate::schema::{whole_hour, RawDay, RawInterval, DATE_FORMAT, MAX_RAW_HOUR};
use crate::types::{NormalizedDay, QualityFlag, TimeInterval};
use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

/// Normalizer for converting raw day records to normalized days
pub struct Normalizer;

impl Normalizer {
    /// Rewrite hour 24 as 0 on every interval of every day.
    ///
    /// Total over its input: nothing else is checked or changed.
    pub fn normalize_hours(days: &[RawDay]) -> Vec<RawDay> {
        days.iter()
            .map(|day| RawDay {
                date: day.date.clone(),
                intervals: day.intervals.as_ref().map(|intervals| {
                    intervals
                        .iter()
                        .map(|i| RawInterval {
                            category: i.category.clone(),
                            start: normalize_raw_hour(&i.start),
                            end: normalize_raw_hour(&i.end),
                        })
                        .collect()
                }),
            })
            .collect()
    }

    /// Normalize one day and resolve its categories
    pub fn normalize_day(
        raw: &RawDay,
        template: &CategoryTemplate,
    ) -> Result<NormalizedDay, ComputeError> {
        let date = parse_date(&raw.date)?;

        let raw_intervals = raw.intervals.as_ref().ok_or_else(|| ComputeError::MissingData {
            date: raw.date.clone(),
        })?;

        let mut intervals = Vec::with_capacity(raw_intervals.len());
        let mut quality_flags = Vec::new();

        for interval in raw_intervals {
            let start_hour = checked_hour(&raw.date, &interval.start)?;
            let end_hour = checked_hour(&raw.date, &interval.end)?;
            let category = template.resolve(&interval.category)?;

            if start_hour == end_hour {
                debug!(
                    date = %raw.date,
                    category = %interval.category,
                    hour = start_hour,
                    "dropping zero-length interval"
                );
                quality_flags.push(QualityFlag::DegenerateInterval { hour: start_hour });
                continue;
            }

            intervals.push(TimeInterval::new(category, start_hour, end_hour));
        }

        Ok(NormalizedDay {
            date,
            intervals,
            quality_flags,
        })
    }
}

/// Midnight may be written as 24
pub fn normalize_hour(hour: u32) -> u32 {
    if hour == MAX_RAW_HOUR {
        0
    } else {
        hour
    }
}

/// Non-integer hours are left as written; validation reports them
fn normalize_raw_hour(value: &Value) -> Value {
    match whole_hour(value) {
        Some(hour) => Value::from(normalize_hour(hour)),
        None => value.clone(),
    }
}

fn checked_hour(date: &str, value: &Value) -> Result<u8, ComputeError> {
    let hour = whole_hour(value).ok_or_else(|| ComputeError::InvalidHour {
        date: date.to_string(),
        hour: value.to_string(),
    })?;
    // 0..=23 after normalization, always fits
    Ok(normalize_hour(hour) as u8)
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(date: &str) -> Result<NaiveDate, ComputeError> {
    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map_err(|e| ComputeError::DateParseError(format!("{date}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn make_raw(intervals: Vec<(&str, u32, u32)>) -> RawDay {
        RawDay::new(
            "2025-04-27",
            intervals
                .into_iter()
                .map(|(c, s, e)| RawInterval::new(c, s, e))
                .collect(),
        )
    }

    #[test]
    fn test_normalize_hours_rewrites_24() {
        let raw = vec![make_raw(vec![("sleep", 24, 8), ("leisure", 20, 24), ("work", 9, 17)])];
        let normalized = Normalizer::normalize_hours(&raw);

        let intervals = normalized[0].intervals.as_ref().unwrap();
        assert_eq!(intervals[0], RawInterval::new("sleep", 0, 8));
        assert_eq!(intervals[1], RawInterval::new("leisure", 20, 0));
        assert_eq!(intervals[2], RawInterval::new("work", 9, 17));

        // Source records are left untouched
        assert_eq!(raw[0].intervals.as_ref().unwrap()[0].start, 24);
    }

    #[test]
    fn test_normalize_hours_keeps_missing_lists() {
        let raw = vec![RawDay::missing("2025-04-28")];
        let normalized = Normalizer::normalize_hours(&raw);
        assert_eq!(normalized, raw);
    }

    #[test]
    fn test_normalize_day_resolves_categories() {
        let template = CategoryTemplate::default();
        let day = Normalizer::normalize_day(&make_raw(vec![("coding", 23, 4)]), &template).unwrap();

        assert_eq!(day.date, NaiveDate::from_ymd_opt(2025, 4, 27).unwrap());
        assert_eq!(day.intervals.len(), 1);
        assert_eq!(day.intervals[0].category, template.resolve("coding").unwrap());
        assert!(day.intervals[0].wraps_midnight());
    }

    #[test]
    fn test_degenerate_intervals_dropped() {
        let template = CategoryTemplate::default();
        let raw = make_raw(vec![("sleep", 0, 24), ("work", 9, 17)]);
        let day = Normalizer::normalize_day(&raw, &template).unwrap();

        assert_eq!(day.intervals.len(), 1);
        assert_eq!(day.quality_flags, vec![QualityFlag::DegenerateInterval { hour: 0 }]);
    }

    #[test]
    fn test_missing_intervals_is_missing_data() {
        let template = CategoryTemplate::default();
        let err = Normalizer::normalize_day(&RawDay::missing("2025-04-28"), &template).unwrap_err();
        assert!(matches!(err, ComputeError::MissingData { date } if date == "2025-04-28"));
    }

    #[test]
    fn test_unknown_category_rejected() {
        let template = CategoryTemplate::default();
        let err = Normalizer::normalize_day(&make_raw(vec![("gaming", 1, 2)]), &template)
            .unwrap_err();
        assert!(matches!(err, ComputeError::UnknownCategory(_)));
    }

    #[test]
    fn test_out_of_range_hour_rejected() {
        let template = CategoryTemplate::default();
        let err = Normalizer::normalize_day(&make_raw(vec![("work", 9, 30)]), &template)
            .unwrap_err();
        assert!(matches!(err, ComputeError::InvalidHour { hour, .. } if hour == "30"));
    }

    #[test]
    fn test_negative_and_fractional_hours_rejected() {
        let template = CategoryTemplate::default();
        for hour in ["-1", "7.5"] {
            let json = format!(
                r#"{{"date": "2025-04-29", "intervals": [{{"category": "sleep", "start": {hour}, "end": 7}}]}}"#
            );
            let raw: RawDay = serde_json::from_str(&json).unwrap();
            let err = Normalizer::normalize_day(&raw, &template).unwrap_err();
            assert!(err.is_day_scoped());
            assert!(matches!(err, ComputeError::InvalidHour { hour: h, .. } if h == hour));
        }
    }

    #[test]
    fn test_bad_date_rejected() {
        let template = CategoryTemplate::default();
        let raw = RawDay::new("27/04/2025", vec![]);
        assert!(matches!(
            Normalizer::normalize_day(&raw, &template),
            Err(ComputeError::DateParseError(_))
        ));
    }
}

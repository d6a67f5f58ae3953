//! Built-in sample dataset
//!
//! One week of recorded days ending on Sunday 2025-04-27, in the object
//! format with `hourlyActivity`/`name` keys. Used when no input is given.

use crate::error::ComputeError;
use crate::schema::{DatasetFormat, RawDay, RawDayAdapter};

/// Date the sample is anchored on
pub const SAMPLE_REFERENCE_DATE: &str = "2025-04-27";

/// Sample week as raw JSON
pub const SAMPLE_DATASET_JSON: &str = r#"{
  "2025-04-21": {
    "hourlyActivity": [
      { "name": "sleep", "start": 0, "end": 7 },
      { "name": "work", "start": 9, "end": 18 },
      { "name": "exercise", "start": 19, "end": 20 },
      { "name": "leisure", "start": 20, "end": 24 }
    ]
  },
  "2025-04-22": {
    "hourlyActivity": [
      { "name": "sleep", "start": 0, "end": 7 },
      { "name": "work", "start": 9, "end": 18 },
      { "name": "coding", "start": 19, "end": 23 }
    ]
  },
  "2025-04-23": {
    "hourlyActivity": [
      { "name": "sleep", "start": 23, "end": 7 },
      { "name": "work", "start": 9, "end": 17 },
      { "name": "outdoor", "start": 17, "end": 19 },
      { "name": "networking", "start": 19, "end": 22 }
    ]
  },
  "2025-04-24": {
    "hourlyActivity": [
      { "name": "sleep", "start": 1, "end": 8 },
      { "name": "work", "start": 9, "end": 18 },
      { "name": "coding", "start": 20, "end": 1 }
    ]
  },
  "2025-04-25": {
    "hourlyActivity": [
      { "name": "sleep", "start": 0, "end": 7 },
      { "name": "work", "start": 9, "end": 16 },
      { "name": "exercise", "start": 17, "end": 18 },
      { "name": "networking", "start": 19, "end": 24 }
    ]
  },
  "2025-04-26": {
    "hourlyActivity": [
      { "name": "sleep", "start": 2, "end": 11 },
      { "name": "outdoor", "start": 12, "end": 15 },
      { "name": "leisure", "start": 15, "end": 20 },
      { "name": "coding", "start": 20, "end": 2 }
    ]
  },
  "2025-04-27": {
    "hourlyActivity": [
      { "name": "sleep", "start": 2, "end": 12 },
      { "name": "leisure", "start": 12, "end": 16 },
      { "name": "outdoor", "start": 16, "end": 20 },
      { "name": "leisure", "start": 20, "end": 23 },
      { "name": "coding", "start": 23, "end": 4 }
    ]
  }
}"#;

/// The sample week, sorted by date
pub fn sample_days() -> Result<Vec<RawDay>, ComputeError> {
    RawDayAdapter::parse(SAMPLE_DATASET_JSON, DatasetFormat::Object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::features::compute_day_derived;
    use crate::types::Reconciliation;

    #[test]
    fn test_sample_parses_and_validates() {
        let config = DashboardConfig::default();
        let days = sample_days().unwrap();

        assert_eq!(days.len(), 7);
        assert_eq!(days[6].date, SAMPLE_REFERENCE_DATE);
        for day in &days {
            assert!(day.validate(&config.categories).is_ok(), "{}", day.date);
        }
    }

    #[test]
    fn test_sample_anchor_day() {
        let config = DashboardConfig::default();
        let days = sample_days().unwrap();
        let derived = compute_day_derived(&days[6], &config).unwrap();

        assert_eq!(derived.sleep_hours, 10);
        assert_eq!(derived.outdoor_minutes, 240);
        assert!(derived.is_weekend);
        // 10 + 4 + 4 + 3 + 5 = 26 recorded hours
        assert!(matches!(
            derived.reconciliation,
            Reconciliation::ProportionalShrink { .. }
        ));
        assert!((derived.reconciled_totals.total() - 24.0).abs() < 0.1);
    }
}

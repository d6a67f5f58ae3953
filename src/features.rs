//! Per-day statistics
//!
//! This module derives the day-level figures shown on the dashboard from a
//! normalized day:
//! - Sleep hours and outdoor minutes
//! - Per-category hour totals in template order
//! - 24-hour reconciliation of those totals

use crate::config::{CategoryTemplate, DashboardConfig, ResolvedRoles};
use crate::error::ComputeError;
use crate::normalizer::Normalizer;
use crate::schema::RawDay;
use crate::types::{
    CategoryHours, DayDerived, NormalizedDay, QualityFlag, Reconciliation, TimeInterval,
    HOURS_PER_DAY,
};
use chrono::{Datelike, NaiveDate, Weekday};
use tracing::warn;

/// Normalize a raw day and derive its statistics.
///
/// Fails with `MissingData` when the record has no interval list.
pub fn compute_day_derived(
    raw: &RawDay,
    config: &DashboardConfig,
) -> Result<DayDerived, ComputeError> {
    let roles = config.resolve_roles()?;
    let normalized = Normalizer::normalize_day(raw, &config.categories)?;
    Ok(FeatureDeriver::derive(
        normalized,
        &config.categories,
        roles,
        config.reconciliation_tolerance_hours,
    ))
}

/// Feature deriver for computing per-day statistics
pub struct FeatureDeriver;

impl FeatureDeriver {
    /// Derive statistics from a normalized day
    pub fn derive(
        day: NormalizedDay,
        template: &CategoryTemplate,
        roles: ResolvedRoles,
        tolerance_hours: f64,
    ) -> DayDerived {
        let NormalizedDay {
            date,
            intervals,
            mut quality_flags,
        } = day;

        let sleep_hours = compute_sleep_hours(&intervals, roles);
        let outdoor_minutes = compute_outdoor_minutes(&intervals, roles);

        let raw_totals = compute_category_totals(&intervals, template);
        let raw_total = raw_totals.total();
        let (reconciled_totals, reconciliation) =
            reconcile_to_day(raw_totals, roles, tolerance_hours);

        if reconciliation != Reconciliation::Balanced {
            warn!(
                %date,
                total_hours = raw_total,
                ?reconciliation,
                "recorded activity does not sum to 24 hours"
            );
            quality_flags.push(QualityFlag::InvariantViolation {
                total_hours: raw_total,
            });
        }

        DayDerived {
            date,
            day_of_week: day_of_week(date),
            is_weekend: is_weekend(date),
            sleep_hours,
            outdoor_minutes,
            category_totals: reconciled_totals.rounded(),
            reconciled_totals,
            reconciliation,
            intervals,
            quality_flags,
        }
    }
}

/// Duration of `start..end` in hours; `end < start` wraps past midnight
pub fn interval_duration(start: u8, end: u8) -> u32 {
    let (start, end) = (u32::from(start), u32::from(end));
    if end >= start {
        end - start
    } else {
        u32::from(HOURS_PER_DAY) - start + end
    }
}

/// Total sleep, rounded to whole hours
pub fn compute_sleep_hours(intervals: &[TimeInterval], roles: ResolvedRoles) -> u32 {
    let hours: u32 = intervals
        .iter()
        .filter(|i| i.category == roles.sleep)
        .map(TimeInterval::duration_hours)
        .sum();
    (hours as f64).round() as u32
}

/// Total time outdoors, in minutes
pub fn compute_outdoor_minutes(intervals: &[TimeInterval], roles: ResolvedRoles) -> u32 {
    let hours: u32 = intervals
        .iter()
        .filter(|i| i.category == roles.outdoor)
        .map(TimeInterval::duration_hours)
        .sum();
    (hours as f64 * 60.0).round() as u32
}

/// Hours per template category; categories without intervals stay at 0
pub fn compute_category_totals(
    intervals: &[TimeInterval],
    template: &CategoryTemplate,
) -> CategoryHours {
    let mut totals = CategoryHours::zeroed(template);
    for interval in intervals {
        totals.add(interval.category, f64::from(interval.duration_hours()));
    }
    totals
}

/// Force a day's totals to sum to 24 hours.
///
/// Within `tolerance_hours` of 24 the totals are kept. A shortfall goes to the
/// leisure category in full; an excess shrinks every category by `24 / total`.
pub fn reconcile_to_day(
    mut totals: CategoryHours,
    roles: ResolvedRoles,
    tolerance_hours: f64,
) -> (CategoryHours, Reconciliation) {
    let day = f64::from(HOURS_PER_DAY);
    let total = totals.total();

    if (total - day).abs() <= tolerance_hours {
        return (totals, Reconciliation::Balanced);
    }

    if total < day {
        let shortfall = day - total;
        totals.add(roles.leisure, shortfall);
        (totals, Reconciliation::ShortfallToLeisure { hours: shortfall })
    } else {
        let ratio = day / total;
        totals.scale(ratio);
        (totals, Reconciliation::ProportionalShrink { ratio })
    }
}

/// Build category totals from caller-supplied values in template order.
///
/// Values that stray from 24 hours by more than `tolerance_hours` are
/// rescaled by `24 / sum` and rounded.
pub fn category_hours_from_values(
    values: &[f64],
    template: &CategoryTemplate,
    tolerance_hours: f64,
) -> Result<CategoryHours, ComputeError> {
    if values.len() != template.len() {
        return Err(ComputeError::InvalidTemplate(format!(
            "expected {} category values, got {}",
            template.len(),
            values.len()
        )));
    }

    let day = f64::from(HOURS_PER_DAY);
    let sum: f64 = values.iter().sum();
    if (sum - day).abs() <= tolerance_hours {
        return Ok(CategoryHours::from_values(values.to_vec()));
    }

    warn!(sum, "category values should sum to 24 hours, rescaling");
    if sum <= 0.0 {
        return Ok(CategoryHours::from_values(values.to_vec()));
    }

    let ratio = day / sum;
    Ok(CategoryHours::from_values(
        values.iter().map(|v| (v * ratio).round()).collect(),
    ))
}

/// 0 = Sunday .. 6 = Saturday
pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
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

    fn derive(raw: &RawDay) -> DayDerived {
        compute_day_derived(raw, &DashboardConfig::default()).unwrap()
    }

    fn hours(day: &DayDerived, name: &str) -> f64 {
        let id = CategoryTemplate::default().resolve(name).unwrap();
        day.reconciled_totals.get(id)
    }

    #[test]
    fn test_interval_duration() {
        assert_eq!(interval_duration(9, 17), 8);
        assert_eq!(interval_duration(23, 4), 5);
        assert_eq!(interval_duration(8, 8), 0);
        assert_eq!(interval_duration(0, 0), 0);
        assert_eq!(interval_duration(22, 0), 2);
    }

    #[test]
    fn test_duration_matches_modular_end() {
        for start in 0..24u8 {
            for end in 0..24u8 {
                let duration = interval_duration(start, end);
                let shifted = interval_duration(start, ((u32::from(end) + 24) % 24) as u8);
                assert_eq!(duration, shifted);
                assert!(duration < 24);
            }
        }
    }

    #[test]
    fn test_wraparound_sleep() {
        let day = derive(&make_raw(
            "2025-04-28",
            vec![("sleep", 23, 7), ("work", 7, 23)],
        ));
        assert_eq!(day.sleep_hours, 8);
        assert_eq!(day.reconciliation, Reconciliation::Balanced);
    }

    #[test]
    fn test_outdoor_minutes() {
        let day = derive(&make_raw(
            "2025-04-27",
            vec![
                ("sleep", 2, 12),
                ("leisure", 12, 16),
                ("outdoor", 16, 20),
                ("leisure", 20, 23),
                ("coding", 23, 2),
            ],
        ));
        assert_eq!(day.outdoor_minutes, 240);
        assert_eq!(day.sleep_hours, 10);
        assert_eq!(hours(&day, "leisure"), 7.0);
        assert_eq!(hours(&day, "coding"), 3.0);
    }

    #[test]
    fn test_reconciliation_shortfall_goes_to_leisure() {
        // 20 recorded hours, 4 missing
        let day = derive(&make_raw(
            "2025-04-28",
            vec![("sleep", 0, 8), ("work", 8, 16), ("leisure", 16, 20)],
        ));
        assert_eq!(day.reconciliation, Reconciliation::ShortfallToLeisure { hours: 4.0 });
        assert_eq!(hours(&day, "leisure"), 8.0);
        assert_eq!(hours(&day, "sleep"), 8.0);
        assert!(day
            .quality_flags
            .contains(&QualityFlag::InvariantViolation { total_hours: 20.0 }));
    }

    #[test]
    fn test_reconciliation_overflow_shrinks() {
        // 30 recorded hours
        let day = derive(&make_raw(
            "2025-04-28",
            vec![("sleep", 0, 10), ("work", 8, 18), ("coding", 14, 0)],
        ));
        assert_eq!(day.reconciliation, Reconciliation::ProportionalShrink { ratio: 0.8 });
        assert!((hours(&day, "sleep") - 8.0).abs() < 1e-9);
        assert!((hours(&day, "work") - 8.0).abs() < 1e-9);
        assert!((hours(&day, "coding") - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_twenty_four_hour_closure() {
        let cases = vec![
            vec![("sleep", 23, 7)],
            vec![("sleep", 0, 10), ("work", 8, 18), ("coding", 14, 0)],
            vec![("outdoor", 6, 7), ("exercise", 7, 8), ("networking", 18, 21)],
            vec![("sleep", 0, 12), ("work", 12, 0)],
        ];
        for intervals in cases {
            let day = derive(&make_raw("2025-04-28", intervals));
            let total = day.reconciled_totals.total();
            assert!((23.9..=24.1).contains(&total), "total was {total}");
        }
    }

    #[test]
    fn test_rounding_is_idempotent() {
        let raw = make_raw(
            "2025-04-28",
            vec![("sleep", 23, 7), ("work", 9, 17), ("leisure", 7, 9), ("coding", 17, 23)],
        );
        let first = derive(&raw);
        let second = derive(&raw);
        assert_eq!(first.category_totals, second.category_totals);

        // Feeding the rounded totals back through reconciliation changes nothing
        let roles = DashboardConfig::default().resolve_roles().unwrap();
        let (again, reconciliation) =
            reconcile_to_day(first.category_totals.clone(), roles, 0.1);
        assert_eq!(reconciliation, Reconciliation::Balanced);
        assert_eq!(again.rounded(), first.category_totals);
    }

    #[test]
    fn test_missing_data_error() {
        let err = compute_day_derived(&RawDay::missing("2025-04-28"), &DashboardConfig::default())
            .unwrap_err();
        assert!(matches!(err, ComputeError::MissingData { .. }));
    }

    #[test]
    fn test_weekday_fields() {
        // 2025-04-27 was a Sunday
        let sunday = derive(&make_raw("2025-04-27", vec![("sleep", 0, 0)]));
        assert_eq!(sunday.day_of_week, 0);
        assert!(sunday.is_weekend);

        let monday = derive(&make_raw("2025-04-28", vec![("sleep", 0, 0)]));
        assert_eq!(monday.day_of_week, 1);
        assert!(!monday.is_weekend);
    }

    #[test]
    fn test_category_hours_from_values() {
        let template = CategoryTemplate::default();
        let balanced = category_hours_from_values(
            &[8.0, 8.0, 4.0, 2.0, 0.0, 1.0, 1.0],
            &template,
            0.1,
        )
        .unwrap();
        assert_eq!(balanced.total(), 24.0);

        let rescaled = category_hours_from_values(
            &[16.0, 16.0, 8.0, 4.0, 0.0, 2.0, 2.0],
            &template,
            0.1,
        )
        .unwrap();
        assert_eq!(rescaled.values(), &[8.0, 8.0, 4.0, 2.0, 0.0, 1.0, 1.0]);

        assert!(category_hours_from_values(&[24.0], &template, 0.1).is_err());
    }
}

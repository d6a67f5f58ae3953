//! Correlation analysis
//!
//! Pearson correlation between the daily hours of a selected category and
//! every other category of the template.

use crate::config::{CategoryId, CategoryTemplate};
use crate::types::{CorrelationEntry, DayDerived};

/// Correlate `selected` against every other category, in template order
pub fn compute_correlations(
    days: &[DayDerived],
    selected: CategoryId,
    template: &CategoryTemplate,
) -> Vec<CorrelationEntry> {
    let selected_hours: Vec<f64> = days.iter().map(|d| d.category_totals.get(selected)).collect();

    template
        .ids()
        .filter(|id| *id != selected)
        .map(|other| {
            let other_hours: Vec<f64> =
                days.iter().map(|d| d.category_totals.get(other)).collect();

            CorrelationEntry {
                category_a: selected,
                category_b: other,
                pearson_coefficient: pearson(&selected_hours, &other_hours),
                average_hours_b: mean(&other_hours),
            }
        })
        .collect()
}

/// Pearson's coefficient of two paired sequences.
///
/// Returns 0 when either sequence is constant or the sequences are empty.
/// Sequences of different lengths are compared over their common prefix.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n == 0 {
        return 0.0;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let mean_x = mean(xs);
    let mean_y = mean(ys);

    let mut numerator = 0.0;
    let mut sum_sq_x = 0.0;
    let mut sum_sq_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        numerator += dx * dy;
        sum_sq_x += dx * dx;
        sum_sq_y += dy * dy;
    }

    if sum_sq_x == 0.0 || sum_sq_y == 0.0 {
        return 0.0;
    }

    (numerator / (sum_sq_x * sum_sq_y).sqrt()).clamp(-1.0, 1.0)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

//! Momentum pipeline: daily prices → month-ends → trailing returns → score.
//!
//! Each stage is a pure function of its input. Insufficient history and
//! degenerate ratios travel as explicit `Metric` variants, never as zero.

pub mod metric;
pub mod resample;
pub mod score;
pub mod trailing;

pub use metric::{format_pct, Metric};
pub use resample::month_end_series;
pub use score::{ReturnMetrics, ScoreModel};
pub use trailing::{total_return, Window};

/// Default tolerance for float comparisons in tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-12;

/// Assert two floats are within `eps` of each other.
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, eps: f64) {
    assert!(
        (actual - expected).abs() <= eps,
        "expected {expected}, got {actual} (eps {eps})"
    );
}

/// Build a month-end series from consecutive monthly prices starting January 2020.
#[cfg(test)]
pub fn make_month_ends(prices: &[f64]) -> crate::domain::MonthEndSeries {
    use crate::domain::{MonthEndSeries, PriceObservation};
    use chrono::{Months, NaiveDate};

    let first = NaiveDate::from_ymd_opt(2020, 1, 31).unwrap();
    let points = prices
        .iter()
        .enumerate()
        .map(|(i, &price)| PriceObservation {
            date: first
                .checked_add_months(Months::new(i as u32))
                .unwrap(),
            price,
        })
        .collect();
    MonthEndSeries::from_points(points).unwrap()
}

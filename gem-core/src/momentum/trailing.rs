//! Trailing total return over a month-end series.
//!
//! total_return[t] = price[last - skip] / price[last - skip - months] - 1
//! Simple, non-annualized. Lookback: months + 1 + skip month-ends.

use super::metric::Metric;
use crate::domain::MonthEndSeries;
use serde::{Deserialize, Serialize};

/// A lookback window in months, optionally skipping the most recent months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub months: usize,
    pub skip_last: usize,
}

impl Window {
    pub const fn new(months: usize, skip_last: usize) -> Self {
        Self { months, skip_last }
    }

    /// Month-end points needed before the return is defined.
    pub const fn required_points(&self) -> usize {
        self.months.saturating_add(1).saturating_add(self.skip_last)
    }

    pub fn total_return(&self, series: &MonthEndSeries) -> Metric {
        total_return(series, self.months, self.skip_last)
    }

    /// Short label used in reports, e.g. `12-1` or `6M`.
    pub fn label(&self) -> String {
        if self.skip_last == 0 {
            format!("{}M", self.months)
        } else {
            format!("{}-{}", self.months, self.skip_last)
        }
    }
}

/// Total return over `months`, ending `skip_last` points before the latest.
pub fn total_return(series: &MonthEndSeries, months: usize, skip_last: usize) -> Metric {
    // Unrepresentable lookbacks can never be satisfied.
    let needed = months
        .checked_add(1)
        .and_then(|n| n.checked_add(skip_last))
        .unwrap_or(usize::MAX);
    let available = series.len();
    if available < needed {
        return Metric::InsufficientHistory { needed, available };
    }

    let points = series.points();
    let end_idx = available - 1 - skip_last;
    let start_idx = end_idx - months;
    let start = points[start_idx].price;
    let end = points[end_idx].price;

    if start <= 0.0 {
        return Metric::Degenerate;
    }
    Metric::from_ratio(end / start - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::momentum::{assert_approx, make_month_ends, DEFAULT_EPSILON};

    #[test]
    fn one_month_return() {
        // 121 / 110 - 1 = 10%
        let series = make_month_ends(&[100.0, 110.0, 121.0]);
        let r = total_return(&series, 1, 0).value().unwrap();
        assert_approx(r, 0.10, DEFAULT_EPSILON);
    }

    #[test]
    fn two_month_return() {
        // 121 / 100 - 1 = 21%
        let series = make_month_ends(&[100.0, 110.0, 121.0]);
        let r = total_return(&series, 2, 0).value().unwrap();
        assert_approx(r, 0.21, DEFAULT_EPSILON);
    }

    #[test]
    fn skip_last_excludes_recent_points() {
        // months=1, skip=1: 110 / 100 - 1
        let series = make_month_ends(&[100.0, 110.0, 50.0]);
        let r = total_return(&series, 1, 1).value().unwrap();
        assert_approx(r, 0.10, DEFAULT_EPSILON);
    }

    #[test]
    fn twelve_minus_one_uses_index_offsets() {
        // 14 points: end = idx 12, start = idx 0.
        let mut prices = vec![100.0; 14];
        prices[12] = 130.0;
        prices[13] = 10.0;
        let series = make_month_ends(&prices);
        let r = total_return(&series, 12, 1).value().unwrap();
        assert_approx(r, 0.30, DEFAULT_EPSILON);
    }

    #[test]
    fn undefined_below_minimum_length() {
        let series = make_month_ends(&[100.0; 13]);
        assert_eq!(
            total_return(&series, 12, 1),
            Metric::InsufficientHistory {
                needed: 14,
                available: 13
            }
        );
    }

    #[test]
    fn defined_at_exact_minimum_length() {
        let series = make_month_ends(&[100.0; 14]);
        assert_eq!(total_return(&series, 12, 1), Metric::Defined(0.0));
    }

    #[test]
    fn empty_series_is_undefined() {
        let series = MonthEndSeries::default();
        assert!(!total_return(&series, 6, 0).is_defined());
    }

    #[test]
    fn zero_start_price_is_degenerate() {
        let series = make_month_ends(&[0.0, 110.0]);
        assert_eq!(total_return(&series, 1, 0), Metric::Degenerate);
    }

    #[test]
    fn negative_start_price_is_degenerate() {
        let series = make_month_ends(&[-5.0, 110.0]);
        assert_eq!(total_return(&series, 1, 0), Metric::Degenerate);
    }

    #[test]
    fn huge_lookback_is_insufficient_not_overflow() {
        let series = make_month_ends(&[100.0; 3]);
        assert_eq!(
            total_return(&series, usize::MAX, 1),
            Metric::InsufficientHistory {
                needed: usize::MAX,
                available: 3
            }
        );
        assert_eq!(
            total_return(&series, 1, usize::MAX),
            Metric::InsufficientHistory {
                needed: usize::MAX,
                available: 3
            }
        );
        assert_eq!(Window::new(usize::MAX, 0).required_points(), usize::MAX);
    }

    #[test]
    fn window_labels() {
        assert_eq!(Window::new(12, 1).label(), "12-1");
        assert_eq!(Window::new(6, 0).label(), "6M");
        assert_eq!(Window::new(12, 1).required_points(), 14);
    }
}

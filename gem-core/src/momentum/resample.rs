//! Month-end resampling.
//!
//! Keeps the last observed trading day of each calendar month. Missing and
//! non-finite prices are dropped first. Empty output is not an error here;
//! the loader decides whether an empty history is fatal.

use crate::domain::{month_key, DailyObservation, MonthEndSeries, PriceObservation};

/// Reduce daily observations to one observation per calendar month.
///
/// Input may be unsorted and may repeat a date; when a date repeats, the
/// later row in input order wins.
pub fn month_end_series(observations: &[DailyObservation]) -> MonthEndSeries {
    let mut usable: Vec<PriceObservation> = observations
        .iter()
        .filter_map(|o| {
            o.usable_price().map(|price| PriceObservation {
                date: o.date,
                price,
            })
        })
        .collect();

    // Stable: equal dates keep input order.
    usable.sort_by_key(|o| o.date);

    let mut points: Vec<PriceObservation> = Vec::new();
    for obs in usable {
        match points.last_mut() {
            Some(last) if month_key(last.date) == month_key(obs.date) => *last = obs,
            _ => points.push(obs),
        }
    }

    MonthEndSeries::from_sorted_unchecked(points)
}

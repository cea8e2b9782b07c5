//! Domain types: asset keys, raw daily observations, and month-end series.
//!
//! Everything here is computed fresh on each run and handed forward by value.
//! No stage mutates another stage's output.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use thiserror::Error;

/// Display name of an asset, e.g. `"USA (VUAA)"`.
///
/// This is distinct from the ticker symbol, which is only used to fetch data.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetKey(String);

impl AssetKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AssetKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for AssetKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// One provider row. `price` is `None` when the provider had no usable value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyObservation {
    pub date: NaiveDate,
    pub price: Option<f64>,
}

impl DailyObservation {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self {
            date,
            price: Some(price),
        }
    }

    pub fn missing(date: NaiveDate) -> Self {
        Self { date, price: None }
    }

    /// The price, if present and finite. NaN from a provider counts as missing.
    pub fn usable_price(&self) -> Option<f64> {
        self.price.filter(|p| p.is_finite())
    }
}

/// A clean (date, price) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub date: NaiveDate,
    pub price: f64,
}

/// Calendar month of a date as `(year, month)`.
pub fn month_key(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("month-end series must be strictly ascending by month: {previous} is followed by {next}")]
    NotAscendingMonths { previous: NaiveDate, next: NaiveDate },

    #[error("month-end series contains a non-finite price on {date}")]
    NonFinitePrice { date: NaiveDate },
}

/// At most one observation per calendar month, strictly ascending by month.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthEndSeries {
    points: Vec<PriceObservation>,
}

impl MonthEndSeries {
    /// Build from points that already satisfy the invariant. Resampler-only.
    pub(crate) fn from_sorted_unchecked(points: Vec<PriceObservation>) -> Self {
        debug_assert!(points
            .windows(2)
            .all(|w| month_key(w[0].date) < month_key(w[1].date)));
        Self { points }
    }

    /// Build from explicit month-end points, checking the ordering invariant.
    pub fn from_points(points: Vec<PriceObservation>) -> Result<Self, SeriesError> {
        if let Some(bad) = points.iter().find(|p| !p.price.is_finite()) {
            return Err(SeriesError::NonFinitePrice { date: bad.date });
        }
        for w in points.windows(2) {
            if month_key(w[0].date) >= month_key(w[1].date) {
                return Err(SeriesError::NotAscendingMonths {
                    previous: w[0].date,
                    next: w[1].date,
                });
            }
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[PriceObservation] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Date of the most recent month-end used.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Re-express the series as daily observations (one per month).
    pub fn to_daily(&self) -> Vec<DailyObservation> {
        self.points
            .iter()
            .map(|p| DailyObservation::new(p.date, p.price))
            .collect()
    }
}

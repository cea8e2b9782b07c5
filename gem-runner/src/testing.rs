//! Test helpers: an in-memory provider and synthetic month-end price rows.

use chrono::{Datelike, Days, Months, NaiveDate};
use gem_core::data::{DataError, DataProvider, DataSource, FetchResult};
use gem_core::DailyObservation;
use std::collections::HashMap;

/// Provider serving fixed rows per symbol. Unknown symbols are not found.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    rows: HashMap<String, Vec<DailyObservation>>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, symbol: &str, rows: Vec<DailyObservation>) -> Self {
        self.rows.insert(symbol.to_string(), rows);
        self
    }
}

impl DataProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let rows = self
            .rows
            .get(symbol)
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })?;
        Ok(FetchResult {
            symbol: symbol.to_string(),
            observations: rows
                .iter()
                .filter(|o| o.date >= start && o.date <= end)
                .copied()
                .collect(),
            source: DataSource::Fixture,
        })
    }
}

/// Last calendar day of the month `offset` months after `first_month`.
pub fn month_end(first_month: NaiveDate, offset: u32) -> NaiveDate {
    first_month
        .checked_add_months(Months::new(offset + 1))
        .and_then(|d| d.checked_sub_days(Days::new(1)))
        .unwrap_or(first_month)
}

/// First month of every synthetic series: September 2023.
pub fn first_month() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 9, 1).unwrap_or_default()
}

/// Daily rows for consecutive months from September 2023.
///
/// Each month gets a mid-month row with a decoy price and a missing-price
/// row, so only resampling recovers the month-end values.
pub fn month_end_rows(prices: &[f64]) -> Vec<DailyObservation> {
    let first = first_month();
    let mut rows = Vec::with_capacity(prices.len() * 3);
    for (i, &price) in prices.iter().enumerate() {
        let start = first
            .checked_add_months(Months::new(i as u32))
            .unwrap_or(first);
        let end = month_end(first, i as u32);
        let mid = start.with_day(15).unwrap_or(start);
        rows.push(DailyObservation::new(mid, price * 0.5));
        rows.push(DailyObservation::new(end, price));
        rows.push(DailyObservation::missing(end));
    }
    rows
}

/// Fourteen month-ends whose classic metrics equal the given returns.
///
/// Prices are flat at 100 except month 12 (ends the 12-1 window) and
/// month 13 (ends the 6M window).
pub fn rows_with_returns(momentum_12_1: f64, momentum_6: f64) -> Vec<DailyObservation> {
    let mut prices = vec![100.0; 14];
    prices[12] = 100.0 * (1.0 + momentum_12_1);
    prices[13] = 100.0 * (1.0 + momentum_6);
    month_end_rows(&prices)
}

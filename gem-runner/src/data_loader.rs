//! Price loading for every configured asset.
//!
//! Fetches each ticker, resamples it to month-ends, and stops at the first
//! asset that cannot be loaded. A GEM ranking over a partial universe is
//! meaningless, so there is no degraded mode.

use chrono::NaiveDate;
use gem_core::data::{DataError, DataProvider, DataSource};
use gem_core::{month_end_series, AssetKey, MonthEndSeries};
use rayon::prelude::*;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("fetch failed for '{asset}' ({symbol}) via {provider}: {source}")]
    FetchFailed {
        asset: AssetKey,
        symbol: String,
        provider: String,
        source: DataError,
    },

    #[error("no price data for '{asset}' ({symbol})")]
    NoData { asset: AssetKey, symbol: String },

    #[error("no month-end data for '{asset}' ({symbol}): every price was missing")]
    NoMonthEnds { asset: AssetKey, symbol: String },

    #[error("failed to start fetch workers: {0}")]
    WorkerPool(String),
}

/// Options controlling how prices are loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// First date requested.
    pub start: NaiveDate,
    /// Last date requested (inclusive).
    pub end: NaiveDate,
    /// Concurrent fetches. 1 or less fetches sequentially.
    pub workers: usize,
}

/// Month-end history of one asset. `month_ends` is never empty.
#[derive(Debug, Clone)]
pub struct AssetHistory {
    pub asset: AssetKey,
    pub symbol: String,
    pub source: DataSource,
    pub month_ends: MonthEndSeries,
    pub last_month_end: NaiveDate,
}

/// Histories for the whole universe, keyed by asset.
#[derive(Debug, Clone, Default)]
pub struct LoadedUniverse {
    pub histories: BTreeMap<AssetKey, AssetHistory>,
}

impl LoadedUniverse {
    pub fn get(&self, asset: &AssetKey) -> Option<&AssetHistory> {
        self.histories.get(asset)
    }

    pub fn len(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }
}

/// Load every ticker. Fails on the first asset without usable data.
///
/// With `workers > 1` the fetches run on a bounded pool; the result is only
/// returned once all of them have finished.
pub fn load_universe(
    tickers: &BTreeMap<AssetKey, String>,
    provider: &dyn DataProvider,
    opts: &LoadOptions,
) -> Result<LoadedUniverse, LoadError> {
    let jobs: Vec<(&AssetKey, &String)> = tickers.iter().collect();
    info!(
        assets = jobs.len(),
        provider = provider.name(),
        start = %opts.start,
        end = %opts.end,
        "loading prices"
    );

    let histories: Vec<AssetHistory> = if opts.workers > 1 && jobs.len() > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(opts.workers.min(jobs.len()))
            .build()
            .map_err(|e| LoadError::WorkerPool(e.to_string()))?;
        pool.install(|| {
            jobs.par_iter()
                .map(|(asset, symbol)| load_asset(asset, symbol, provider, opts))
                .collect::<Result<Vec<_>, _>>()
        })?
    } else {
        jobs.iter()
            .map(|(asset, symbol)| load_asset(asset, symbol, provider, opts))
            .collect::<Result<Vec<_>, _>>()?
    };

    Ok(LoadedUniverse {
        histories: histories
            .into_iter()
            .map(|h| (h.asset.clone(), h))
            .collect(),
    })
}

/// Fetch → resample for a single asset.
fn load_asset(
    asset: &AssetKey,
    symbol: &str,
    provider: &dyn DataProvider,
    opts: &LoadOptions,
) -> Result<AssetHistory, LoadError> {
    debug!(%asset, symbol, "fetching");
    let fetched = provider
        .fetch(symbol, opts.start, opts.end)
        .map_err(|source| LoadError::FetchFailed {
            asset: asset.clone(),
            symbol: symbol.to_string(),
            provider: provider.name().to_string(),
            source,
        })?;

    if fetched.observations.is_empty() {
        return Err(LoadError::NoData {
            asset: asset.clone(),
            symbol: symbol.to_string(),
        });
    }

    let month_ends = month_end_series(&fetched.observations);
    let last_month_end = month_ends.last_date().ok_or_else(|| LoadError::NoMonthEnds {
        asset: asset.clone(),
        symbol: symbol.to_string(),
    })?;

    info!(
        %asset,
        symbol,
        rows = fetched.observations.len(),
        month_ends = month_ends.len(),
        %last_month_end,
        "loaded"
    );

    Ok(AssetHistory {
        asset: asset.clone(),
        symbol: symbol.to_string(),
        source: fetched.source,
        month_ends,
        last_month_end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{month_end_rows, StaticProvider};
    use gem_core::DailyObservation;

    fn opts(workers: usize) -> LoadOptions {
        LoadOptions {
            start: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            workers,
        }
    }

    fn tickers(pairs: &[(&str, &str)]) -> BTreeMap<AssetKey, String> {
        pairs
            .iter()
            .map(|(a, s)| (AssetKey::new(*a), s.to_string()))
            .collect()
    }

    #[test]
    fn loads_all_assets_sequentially() {
        let provider = StaticProvider::new()
            .with("AAA", month_end_rows(&[1.0, 2.0, 3.0]))
            .with("SSS", month_end_rows(&[5.0, 5.0]));
        let loaded =
            load_universe(&tickers(&[("A", "AAA"), ("SAFE", "SSS")]), &provider, &opts(1)).unwrap();

        assert_eq!(loaded.len(), 2);
        let a = loaded.get(&AssetKey::new("A")).unwrap();
        assert_eq!(a.month_ends.len(), 3);
        assert_eq!(a.symbol, "AAA");
        assert_eq!(a.last_month_end, a.month_ends.last_date().unwrap());
    }

    #[test]
    fn parallel_load_matches_sequential() {
        let provider = StaticProvider::new()
            .with("AAA", month_end_rows(&[1.0, 2.0, 3.0]))
            .with("BBB", month_end_rows(&[4.0, 2.0]))
            .with("SSS", month_end_rows(&[5.0]));
        let t = tickers(&[("A", "AAA"), ("B", "BBB"), ("SAFE", "SSS")]);

        let seq = load_universe(&t, &provider, &opts(1)).unwrap();
        let par = load_universe(&t, &provider, &opts(3)).unwrap();
        for (asset, h) in &seq.histories {
            assert_eq!(par.get(asset).unwrap().month_ends, h.month_ends);
        }
    }

    #[test]
    fn failed_fetch_aborts_and_names_asset() {
        let provider = StaticProvider::new().with("AAA", month_end_rows(&[1.0]));
        let err = load_universe(&tickers(&[("A", "AAA"), ("SAFE", "MISSING")]), &provider, &opts(1))
            .unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, LoadError::FetchFailed { .. }));
        assert!(msg.contains("SAFE"), "{msg}");
        assert!(msg.contains("MISSING"), "{msg}");
    }

    #[test]
    fn empty_fetch_aborts() {
        let provider = StaticProvider::new()
            .with("AAA", month_end_rows(&[1.0]))
            .with("SSS", Vec::new());
        let err = load_universe(&tickers(&[("A", "AAA"), ("SAFE", "SSS")]), &provider, &opts(2))
            .unwrap_err();
        assert!(matches!(err, LoadError::NoData { .. }));
    }

    #[test]
    fn all_missing_prices_abort_after_resampling() {
        let rows = vec![DailyObservation::missing(
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )];
        let provider = StaticProvider::new().with("AAA", rows);
        let err = load_universe(&tickers(&[("A", "AAA")]), &provider, &opts(1)).unwrap_err();
        assert!(matches!(err, LoadError::NoMonthEnds { .. }));
    }
}

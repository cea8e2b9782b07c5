//! GEM Core — the Global Equity Momentum signal without any I/O policy.
//!
//! This crate contains the heart of the signal:
//! - Domain types (asset keys, daily observations, month-end series)
//! - Month-end resampling of daily prices
//! - Trailing total returns with a lookback/skip window
//! - The classic 12-1 + 6M composite momentum score
//! - Ranking of risk assets and the risk-off decision rule
//! - The price-provider boundary (Yahoo Finance, CSV import)

pub mod allocation;
pub mod data;
pub mod domain;
pub mod momentum;

pub use allocation::{
    decide, decide_with_policy, rank, Allocation, Decision, DecisionError, RankedEntry,
    UndefinedTopPolicy,
};
pub use domain::{AssetKey, DailyObservation, MonthEndSeries, PriceObservation, SeriesError};
pub use momentum::{month_end_series, total_return, Metric, ReturnMetrics, ScoreModel, Window};

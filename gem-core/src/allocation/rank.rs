//! Ranking by composite score.
//!
//! Order: defined scores descending, then undefined scores. Equal scores
//! (and all undefined ones) are ordered alphabetically by asset key, so the
//! ranking never depends on configuration order.

use crate::domain::AssetKey;
use crate::momentum::Metric;
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub asset: AssetKey,
    pub score: Metric,
}

/// Rank `(asset, score)` pairs, best first.
pub fn rank<I>(candidates: I) -> Vec<RankedEntry>
where
    I: IntoIterator<Item = (AssetKey, Metric)>,
{
    let mut ranked: Vec<RankedEntry> = candidates
        .into_iter()
        .map(|(asset, score)| RankedEntry { asset, score })
        .collect();
    ranked.sort_by(compare_entries);
    ranked
}

fn compare_entries(a: &RankedEntry, b: &RankedEntry) -> Ordering {
    let by_score = match (a.score.value(), b.score.value()) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_score.then_with(|| a.asset.cmp(&b.asset))
}

//! Run orchestration: config, data loading, scoring, and the report.
//!
//! Two entry points:
//! - `run_gem()`: validates config, loads prices, evaluates, formats. Used by the CLI.
//! - `evaluate()`: takes pre-loaded histories. No I/O.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use gem_core::data::DataProvider;
use gem_core::{
    decide_with_policy, rank, AssetKey, Decision, DecisionError, RankedEntry, ReturnMetrics,
    ScoreModel,
};

use crate::config::{ConfigError, GemConfig};
use crate::data_loader::{load_universe, LoadError, LoadOptions, LoadedUniverse};
use crate::report::Report;

/// Errors from the runner. Every variant is fatal for the run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("decision error: {0}")]
    Decision(#[from] DecisionError),
    #[error("asset '{0}' not found in loaded data")]
    AssetNotLoaded(AssetKey),
    #[error("as-of date {as_of} is before history start {history_start}")]
    EmptyWindow {
        as_of: NaiveDate,
        history_start: NaiveDate,
    },
}

/// Metrics and provenance for one asset.
#[derive(Debug, Clone, Serialize)]
pub struct AssetSnapshot {
    pub asset: AssetKey,
    pub symbol: String,
    pub metrics: ReturnMetrics,
    pub last_month_end: NaiveDate,
    pub month_end_count: usize,
    /// Month-ends needed before every metric is defined.
    pub months_needed: usize,
}

/// Pure output of a run: per-asset metrics, ranking, decision.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub snapshots: BTreeMap<AssetKey, AssetSnapshot>,
    pub ranking: Vec<RankedEntry>,
    pub decision: Decision,
}

/// Options for a full run.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Last date requested from the provider.
    pub as_of: NaiveDate,
    /// Timestamp printed in the report header.
    pub generated_at: NaiveDateTime,
}

/// Complete result of a run.
#[derive(Debug, Clone, Serialize)]
pub struct GemRun {
    pub generated_at: NaiveDateTime,
    pub as_of: NaiveDate,
    pub safe_haven: AssetKey,
    pub evaluation: Evaluation,
    /// Formatted report text.
    #[serde(skip)]
    pub report: String,
}

impl GemRun {
    pub fn decision(&self) -> &Decision {
        &self.evaluation.decision
    }

    /// Machine-readable summary of the run.
    pub fn summary_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Score every loaded asset, rank the risk assets, and decide. No I/O.
pub fn evaluate(config: &GemConfig, loaded: &LoadedUniverse) -> Result<Evaluation, RunError> {
    let model = ScoreModel::classic();

    let snapshots: BTreeMap<AssetKey, AssetSnapshot> = loaded
        .histories
        .values()
        .map(|h| {
            let months_needed = model.required_months();
            if h.month_ends.len() < months_needed {
                warn!(
                    asset = %h.asset,
                    month_ends = h.month_ends.len(),
                    months_needed,
                    "not enough history for a full score"
                );
            }
            let snapshot = AssetSnapshot {
                asset: h.asset.clone(),
                symbol: h.symbol.clone(),
                metrics: model.score(&h.month_ends),
                last_month_end: h.last_month_end,
                month_end_count: h.month_ends.len(),
                months_needed,
            };
            (h.asset.clone(), snapshot)
        })
        .collect();

    let universe = &config.universe;
    if !snapshots.contains_key(&universe.safe_haven) {
        return Err(RunError::AssetNotLoaded(universe.safe_haven.clone()));
    }

    let candidates = universe
        .risk_assets
        .iter()
        .map(|asset| {
            snapshots
                .get(asset)
                .map(|s| (asset.clone(), s.metrics.score))
                .ok_or_else(|| RunError::AssetNotLoaded(asset.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let ranking = rank(candidates);
    let decision = decide_with_policy(
        &ranking,
        &universe.safe_haven,
        universe.risk_off_threshold,
        config.on_undefined_top,
    )?;

    Ok(Evaluation {
        snapshots,
        ranking,
        decision,
    })
}

/// Run the whole pipeline: validate, load, evaluate, format.
pub fn run_gem(
    config: &GemConfig,
    provider: &dyn DataProvider,
    opts: &RunOptions,
) -> Result<GemRun, RunError> {
    config.validate()?;

    let history_start = config.data.history_start;
    if opts.as_of < history_start {
        return Err(RunError::EmptyWindow {
            as_of: opts.as_of,
            history_start,
        });
    }

    let load_opts = LoadOptions {
        start: history_start,
        end: opts.as_of,
        workers: config.data.fetch_workers,
    };
    let loaded = load_universe(&config.universe.tickers, provider, &load_opts)?;
    let evaluation = evaluate(config, &loaded)?;

    let decision = &evaluation.decision;
    info!(
        selected = %decision.selected(),
        risk_off = decision.is_risk_off(),
        trigger = %decision.trigger,
        score = %decision.trigger_score,
        "decision"
    );

    let report = Report {
        generated_at: opts.generated_at,
        ranking: &evaluation.ranking,
        snapshots: &evaluation.snapshots,
        safe_haven: &config.universe.safe_haven,
        decision,
        capital_label: &config.report.capital_label,
    }
    .render();

    Ok(GemRun {
        generated_at: opts.generated_at,
        as_of: opts.as_of,
        safe_haven: config.universe.safe_haven.clone(),
        evaluation,
        report,
    })
}

//! The GEM decision rule.
//!
//! Risk-on when the top-ranked risk asset has a defined score strictly above
//! the threshold; otherwise risk-off into the safe haven. The comparison is
//! `score > threshold`, so a score equal to the threshold is risk-off.

use super::rank::RankedEntry;
use crate::domain::AssetKey;
use crate::momentum::{format_pct, Metric};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What to hold.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "regime", rename_all = "snake_case")]
pub enum Allocation {
    RiskOn { asset: AssetKey },
    RiskOff { safe_haven: AssetKey },
}

/// The selected allocation plus the score that triggered it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub allocation: Allocation,
    /// Top-ranked risk asset, whose score drove the rule.
    pub trigger: AssetKey,
    pub trigger_score: Metric,
    pub threshold: f64,
    pub rationale: String,
}

impl Decision {
    /// The asset to hold.
    pub fn selected(&self) -> &AssetKey {
        match &self.allocation {
            Allocation::RiskOn { asset } => asset,
            Allocation::RiskOff { safe_haven } => safe_haven,
        }
    }

    pub fn is_risk_off(&self) -> bool {
        matches!(self.allocation, Allocation::RiskOff { .. })
    }
}

/// What to do when the top-ranked risk asset has no usable score.
///
/// Undefined scores rank last, so this only happens when no risk asset
/// has a defined score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedTopPolicy {
    /// Fail the run with `InsufficientHistory`.
    #[default]
    Abort,
    /// Fall back to the safe haven.
    RiskOff,
}

#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("no risk assets to rank")]
    NoRiskAssets,

    #[error("top-ranked risk asset '{asset}' has no usable score: {reason}")]
    InsufficientHistory { asset: AssetKey, reason: String },
}

/// Apply the decision rule to a ranking. Undefined top scores select the safe haven.
pub fn decide(
    ranked: &[RankedEntry],
    safe_haven: &AssetKey,
    threshold: f64,
) -> Result<Decision, DecisionError> {
    decide_with_policy(ranked, safe_haven, threshold, UndefinedTopPolicy::RiskOff)
}

/// Apply the decision rule, with an explicit policy for an undefined top score.
pub fn decide_with_policy(
    ranked: &[RankedEntry],
    safe_haven: &AssetKey,
    threshold: f64,
    policy: UndefinedTopPolicy,
) -> Result<Decision, DecisionError> {
    let top = ranked.first().ok_or(DecisionError::NoRiskAssets)?;
    let threshold_pct = format_pct(threshold);

    let (allocation, rationale) = match top.score.value() {
        Some(score) if score > threshold => (
            Allocation::RiskOn {
                asset: top.asset.clone(),
            },
            format!(
                "RISK-ON: {} leads with score {} > threshold {threshold_pct}",
                top.asset,
                format_pct(score)
            ),
        ),
        Some(score) => (
            Allocation::RiskOff {
                safe_haven: safe_haven.clone(),
            },
            format!(
                "RISK-OFF: best risk asset {} scored {} <= threshold {threshold_pct}",
                top.asset,
                format_pct(score)
            ),
        ),
        None => {
            let reason = top
                .score
                .gap_reason()
                .unwrap_or_else(|| "score unavailable".into());
            if policy == UndefinedTopPolicy::Abort {
                return Err(DecisionError::InsufficientHistory {
                    asset: top.asset.clone(),
                    reason,
                });
            }
            (
                Allocation::RiskOff {
                    safe_haven: safe_haven.clone(),
                },
                format!(
                    "RISK-OFF: best risk asset {} has no usable score ({reason}), threshold {threshold_pct}",
                    top.asset
                ),
            )
        }
    };

    Ok(Decision {
        allocation,
        trigger: top.asset.clone(),
        trigger_score: top.score,
        threshold,
        rationale,
    })
}

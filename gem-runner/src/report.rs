//! Plain-text GEM report.
//!
//! One block of lines: header with timestamp, the risk-asset ranking, the
//! safe haven's own metrics, the decision, its rationale, and the capital
//! footer. Percentages are signed with two decimals; anything undefined
//! renders as `n/a`.

use crate::runner::AssetSnapshot;
use chrono::NaiveDateTime;
use gem_core::momentum::metric::NOT_AVAILABLE;
use gem_core::{AssetKey, Decision, RankedEntry, ScoreModel};
use std::collections::BTreeMap;

pub const TITLE: &str = "📈 GEM signal (classic 12-1 + 6M)";

/// Everything the report shows. Borrowed from a finished evaluation.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    pub generated_at: NaiveDateTime,
    pub ranking: &'a [RankedEntry],
    pub snapshots: &'a BTreeMap<AssetKey, AssetSnapshot>,
    pub safe_haven: &'a AssetKey,
    pub decision: &'a Decision,
    pub capital_label: &'a str,
}

impl Report<'_> {
    pub fn render(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        lines.push(TITLE.to_string());
        lines.push(format!("🕒 {}", self.generated_at.format("%Y-%m-%d %H:%M")));
        lines.push(String::new());

        lines.push("Ranking (risk assets):".to_string());
        for entry in self.ranking {
            lines.push(format!("• {}", self.asset_line(&entry.asset)));
        }
        lines.push(String::new());

        lines.push(format!("🛡️ {}", self.asset_line(self.safe_haven)));
        lines.push(String::new());

        lines.push(format!("✅ DECISION: {}", self.decision.selected()));
        lines.push(format!("ℹ️ {}", self.decision.rationale));
        if !self.capital_label.trim().is_empty() {
            lines.push(format!("💰 {}", self.capital_label));
        }

        lines.join("\n")
    }

    fn asset_line(&self, asset: &AssetKey) -> String {
        let model = ScoreModel::classic();
        let (long, short) = (model.long.label(), model.short.label());
        match self.snapshots.get(asset) {
            Some(s) => format!(
                "{asset}: score {} | {long} {} | {short} {} | ME: {}",
                s.metrics.score, s.metrics.momentum_12_1, s.metrics.momentum_6, s.last_month_end
            ),
            None => format!(
                "{asset}: score {na} | {long} {na} | {short} {na} | ME: {na}",
                na = NOT_AVAILABLE
            ),
        }
    }
}

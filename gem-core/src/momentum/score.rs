//! Composite momentum score: the classic GEM blend of 12-1 and 6M returns.
//!
//! score = w * momentum_12_1 + (1 - w) * momentum_6, with w = 0.5.
//! An undefined component makes the score undefined.

use super::metric::Metric;
use super::trailing::Window;
use crate::domain::MonthEndSeries;
use serde::{Deserialize, Serialize};

/// Per-asset trailing returns and their blended score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnMetrics {
    pub momentum_12_1: Metric,
    pub momentum_6: Metric,
    pub score: Metric,
}

impl ReturnMetrics {
    /// Blend two component returns with equal weights.
    pub fn from_components(momentum_12_1: Metric, momentum_6: Metric) -> Self {
        ScoreModel::classic().combine(momentum_12_1, momentum_6)
    }
}

/// Windows and weight of the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreModel {
    pub long: Window,
    pub short: Window,
    pub long_weight: f64,
}

impl Default for ScoreModel {
    fn default() -> Self {
        Self::classic()
    }
}

impl ScoreModel {
    /// 12-1 and 6M, equally weighted.
    pub const fn classic() -> Self {
        Self {
            long: Window::new(12, 1),
            short: Window::new(6, 0),
            long_weight: 0.5,
        }
    }

    /// Month-end points needed for every component to be defined.
    pub fn required_months(&self) -> usize {
        self.long.required_points().max(self.short.required_points())
    }

    pub fn score(&self, series: &MonthEndSeries) -> ReturnMetrics {
        self.combine(self.long.total_return(series), self.short.total_return(series))
    }

    fn combine(&self, long: Metric, short: Metric) -> ReturnMetrics {
        let score = match (long, short) {
            (Metric::Defined(l), Metric::Defined(s)) => {
                Metric::from_ratio(self.long_weight * l + (1.0 - self.long_weight) * s)
            }
            (Metric::Defined(_), gap) => gap,
            (gap, _) => gap,
        };
        ReturnMetrics {
            momentum_12_1: long,
            momentum_6: short,
            score,
        }
    }
}

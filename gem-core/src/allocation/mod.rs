//! Ranking of risk assets and the risk-on / risk-off decision rule.

pub mod decision;
pub mod rank;

pub use decision::{decide, decide_with_policy, Allocation, Decision, DecisionError, UndefinedTopPolicy};
pub use rank::{rank, RankedEntry};

//! A trailing return or score that may be unavailable.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker rendered in place of any value that is not a finite number.
pub const NOT_AVAILABLE: &str = "n/a";

/// A return-like value. `Defined` always holds a finite number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Defined(f64),
    /// The series is shorter than the window needs.
    InsufficientHistory { needed: usize, available: usize },
    /// Non-positive start price or a non-finite ratio.
    Degenerate,
}

impl Metric {
    /// Wrap a computed value, folding NaN and infinities into `Degenerate`.
    pub fn from_ratio(value: f64) -> Self {
        if value.is_finite() {
            Metric::Defined(value)
        } else {
            Metric::Degenerate
        }
    }

    pub fn value(&self) -> Option<f64> {
        match *self {
            Metric::Defined(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Metric::Defined(_))
    }

    /// Why the value is unavailable, for diagnostics. `None` when defined.
    pub fn gap_reason(&self) -> Option<String> {
        match *self {
            Metric::Defined(_) => None,
            Metric::InsufficientHistory { needed, available } => Some(format!(
                "needs {needed} month-end prices, has {available}"
            )),
            Metric::Degenerate => Some("degenerate price ratio (non-positive start price)".into()),
        }
    }
}

/// Signed percentage with two decimals, e.g. `+8.00%`.
pub fn format_pct(value: f64) -> String {
    if value.is_finite() {
        format!("{:+.2}%", value * 100.0)
    } else {
        NOT_AVAILABLE.to_string()
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(v) => f.write_str(&format_pct(v)),
            None => f.write_str(NOT_AVAILABLE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_ratios_become_degenerate() {
        assert_eq!(Metric::from_ratio(f64::NAN), Metric::Degenerate);
        assert_eq!(Metric::from_ratio(f64::INFINITY), Metric::Degenerate);
        assert_eq!(Metric::from_ratio(f64::NEG_INFINITY), Metric::Degenerate);
        assert_eq!(Metric::from_ratio(0.25), Metric::Defined(0.25));
    }

    #[test]
    fn renders_signed_percent() {
        assert_eq!(Metric::Defined(0.08).to_string(), "+8.00%");
        assert_eq!(Metric::Defined(-0.0123).to_string(), "-1.23%");
        assert_eq!(Metric::Defined(0.0).to_string(), "+0.00%");
    }

    #[test]
    fn undefined_renders_marker_never_nan() {
        let gap = Metric::InsufficientHistory {
            needed: 14,
            available: 3,
        };
        assert_eq!(gap.to_string(), "n/a");
        assert_eq!(Metric::Degenerate.to_string(), "n/a");
        assert_eq!(format_pct(f64::NAN), "n/a");
        assert_eq!(format_pct(f64::INFINITY), "n/a");
    }

    #[test]
    fn gap_reason_names_missing_history() {
        let gap = Metric::InsufficientHistory {
            needed: 14,
            available: 9,
        };
        assert_eq!(
            gap.gap_reason().as_deref(),
            Some("needs 14 month-end prices, has 9")
        );
        assert_eq!(Metric::Defined(0.1).gap_reason(), None);
    }
}

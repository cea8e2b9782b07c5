//! Serializable GEM configuration.
//!
//! Loaded either from a TOML file or from `GEM_*` environment variables,
//! then validated before any price is fetched.

use chrono::NaiveDate;
use gem_core::{AssetKey, UndefinedTopPolicy};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

pub const ENV_TICKERS: &str = "GEM_TICKERS_JSON";
pub const ENV_RISK_ASSETS: &str = "GEM_RISK_ASSETS_JSON";
pub const ENV_SAFE_HAVEN: &str = "GEM_BONDS_NAME";
pub const ENV_THRESHOLD: &str = "GEM_RISK_OFF_THRESHOLD";
pub const ENV_CAPITAL_LABEL: &str = "GEM_CAPITAL_LABEL";
pub const ENV_HISTORY_START: &str = "GEM_HISTORY_START";
pub const ENV_FETCH_WORKERS: &str = "GEM_FETCH_WORKERS";
pub const ENV_OUTPUT_PATH: &str = "GEM_OUTPUT_PATH";
pub const ENV_ON_UNDEFINED_TOP: &str = "GEM_ON_UNDEFINED_TOP";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("{var} is not valid JSON: {source}")]
    EnvJson {
        var: &'static str,
        source: serde_json::Error,
    },

    #[error("{var} has invalid value '{value}': {reason}")]
    EnvValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("no tickers configured")]
    NoTickers,

    #[error("no risk assets configured")]
    NoRiskAssets,

    #[error("risk asset '{0}' is listed more than once")]
    DuplicateRiskAsset(AssetKey),

    #[error("risk asset '{0}' has no ticker in [universe.tickers]")]
    UnknownRiskAsset(AssetKey),

    #[error("safe haven '{0}' has no ticker in [universe.tickers]")]
    UnknownSafeHaven(AssetKey),

    #[error("ticker symbol for '{0}' is blank")]
    BlankSymbol(AssetKey),

    #[error("risk-off threshold must be finite, got {0}")]
    NonFiniteThreshold(f64),

    #[error("fetch_workers must be at least 1")]
    NoFetchWorkers,
}

/// Top-level configuration.
///
/// ```toml
/// on_undefined_top = "abort"
///
/// [universe]
/// safe_haven = "BONDS (VAGF)"
/// risk_assets = ["USA (VUAA)", "DM ex-US (EXUS)"]
/// risk_off_threshold = 0.0
///
/// [universe.tickers]
/// "USA (VUAA)" = "VUAA.L"
/// "DM ex-US (EXUS)" = "EXUS.L"
/// "BONDS (VAGF)" = "VAGF.DE"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GemConfig {
    /// What to do when no risk asset has a usable score.
    #[serde(default)]
    pub on_undefined_top: UndefinedTopPolicy,
    pub universe: UniverseConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// The asset universe and the risk-off rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UniverseConfig {
    pub safe_haven: AssetKey,
    /// Risk assets in configuration order. Ranking does not depend on this order.
    pub risk_assets: Vec<AssetKey>,
    #[serde(default)]
    pub risk_off_threshold: f64,
    /// Display name → provider symbol.
    pub tickers: BTreeMap<AssetKey, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataConfig {
    /// First date requested from the provider (`"YYYY-MM-DD"`).
    #[serde(default = "default_history_start")]
    pub history_start: NaiveDate,
    /// Concurrent price fetches. 1 fetches sequentially.
    #[serde(default = "default_fetch_workers")]
    pub fetch_workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportConfig {
    /// Footer line of the report.
    #[serde(default = "default_capital_label")]
    pub capital_label: String,
    /// Where the report file is written.
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
}

fn default_history_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default()
}

fn default_fetch_workers() -> usize {
    1
}

fn default_capital_label() -> String {
    "GEM capital (rotational, one ETF at a time)".into()
}

fn default_output_path() -> PathBuf {
    PathBuf::from("gem_message.txt")
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            history_start: default_history_start(),
            fetch_workers: default_fetch_workers(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            capital_label: default_capital_label(),
            output_path: default_output_path(),
        }
    }
}

impl GemConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize the configuration to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|var| std::env::var(var).ok())
    }

    /// Load from an arbitrary variable lookup. Unset variables take defaults.
    pub fn from_env_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let tickers: BTreeMap<AssetKey, String> = match lookup(ENV_TICKERS) {
            Some(raw) => serde_json::from_str(&raw).map_err(|source| ConfigError::EnvJson {
                var: ENV_TICKERS,
                source,
            })?,
            None => BTreeMap::new(),
        };

        let risk_assets: Vec<AssetKey> = match lookup(ENV_RISK_ASSETS) {
            Some(raw) => serde_json::from_str(&raw).map_err(|source| ConfigError::EnvJson {
                var: ENV_RISK_ASSETS,
                source,
            })?,
            None => Vec::new(),
        };

        let safe_haven = AssetKey::new(lookup(ENV_SAFE_HAVEN).unwrap_or_else(|| "BONDS".into()));

        let risk_off_threshold = match lookup(ENV_THRESHOLD) {
            Some(raw) => parse_env(ENV_THRESHOLD, &raw)?,
            None => 0.0,
        };

        let mut data = DataConfig::default();
        if let Some(raw) = lookup(ENV_HISTORY_START) {
            data.history_start = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
                ConfigError::EnvValue {
                    var: ENV_HISTORY_START,
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        if let Some(raw) = lookup(ENV_FETCH_WORKERS) {
            data.fetch_workers = parse_env(ENV_FETCH_WORKERS, &raw)?;
        }

        let mut report = ReportConfig::default();
        if let Some(label) = lookup(ENV_CAPITAL_LABEL) {
            report.capital_label = label;
        }
        if let Some(path) = lookup(ENV_OUTPUT_PATH) {
            report.output_path = PathBuf::from(path);
        }

        let on_undefined_top = match lookup(ENV_ON_UNDEFINED_TOP).as_deref().map(str::trim) {
            None | Some("abort") => UndefinedTopPolicy::Abort,
            Some("risk_off") => UndefinedTopPolicy::RiskOff,
            Some(other) => {
                return Err(ConfigError::EnvValue {
                    var: ENV_ON_UNDEFINED_TOP,
                    value: other.to_string(),
                    reason: "expected 'abort' or 'risk_off'".into(),
                })
            }
        };

        Ok(Self {
            on_undefined_top,
            universe: UniverseConfig {
                safe_haven,
                risk_assets,
                risk_off_threshold,
                tickers,
            },
            data,
            report,
        })
    }

    /// Check every invariant the run depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let u = &self.universe;

        if u.tickers.is_empty() {
            return Err(ConfigError::NoTickers);
        }
        if u.risk_assets.is_empty() {
            return Err(ConfigError::NoRiskAssets);
        }
        if let Some((asset, _)) = u.tickers.iter().find(|(_, sym)| sym.trim().is_empty()) {
            return Err(ConfigError::BlankSymbol(asset.clone()));
        }

        let mut seen = HashSet::new();
        for asset in &u.risk_assets {
            if !seen.insert(asset) {
                return Err(ConfigError::DuplicateRiskAsset(asset.clone()));
            }
            if !u.tickers.contains_key(asset) {
                return Err(ConfigError::UnknownRiskAsset(asset.clone()));
            }
        }

        if !u.tickers.contains_key(&u.safe_haven) {
            return Err(ConfigError::UnknownSafeHaven(u.safe_haven.clone()));
        }
        if !u.risk_off_threshold.is_finite() {
            return Err(ConfigError::NonFiniteThreshold(u.risk_off_threshold));
        }
        if self.data.fetch_workers == 0 {
            return Err(ConfigError::NoFetchWorkers);
        }

        if seen.contains(&u.safe_haven) {
            warn!(safe_haven = %u.safe_haven, "safe haven is also a risk asset");
        }
        for asset in u.tickers.keys() {
            if !seen.contains(asset) && *asset != u.safe_haven {
                warn!(%asset, "ticker is neither a risk asset nor the safe haven; it is still fetched");
            }
        }

        Ok(())
    }

    /// Provider symbol for an asset.
    pub fn symbol_for(&self, asset: &AssetKey) -> Option<&str> {
        self.universe.tickers.get(asset).map(|s| s.as_str())
    }

    /// The classic European GEM universe: three equity ETFs and a bond ETF.
    pub fn example() -> Self {
        let tickers: BTreeMap<AssetKey, String> = [
            ("USA (VUAA)", "VUAA.L"),
            ("DM ex-US (EXUS)", "EXUS.L"),
            ("EM (Vanguard FTSE EM Acc)", "VFEG.L"),
            ("BONDS (VAGF)", "VAGF.DE"),
        ]
        .into_iter()
        .map(|(name, sym)| (AssetKey::new(name), sym.to_string()))
        .collect();

        Self {
            on_undefined_top: UndefinedTopPolicy::Abort,
            universe: UniverseConfig {
                safe_haven: AssetKey::new("BONDS (VAGF)"),
                risk_assets: vec![
                    AssetKey::new("USA (VUAA)"),
                    AssetKey::new("DM ex-US (EXUS)"),
                    AssetKey::new("EM (Vanguard FTSE EM Acc)"),
                ],
                risk_off_threshold: 0.0,
                tickers,
            },
            data: DataConfig::default(),
            report: ReportConfig {
                capital_label: "GEM capital: 560€ (rotational, one ETF at a time)".into(),
                output_path: default_output_path(),
            },
        }
    }
}

fn parse_env<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::EnvValue {
        var,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

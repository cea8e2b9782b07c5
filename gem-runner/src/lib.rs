//! GEM Runner — configuration, price loading, evaluation, and delivery.
//!
//! This crate builds on `gem-core` to provide:
//! - TOML and environment-variable configuration with validation
//! - Fail-fast loading of every configured ticker, optionally in parallel
//! - The end-to-end run: score, rank, decide, format
//! - The plain-text report and its sinks (file, stdout, Telegram)

pub mod config;
pub mod data_loader;
pub mod report;
pub mod runner;
pub mod sink;
pub mod testing;

pub use config::{ConfigError, DataConfig, GemConfig, ReportConfig, UniverseConfig};
pub use data_loader::{load_universe, AssetHistory, LoadError, LoadOptions, LoadedUniverse};
pub use report::Report;
pub use runner::{evaluate, run_gem, AssetSnapshot, Evaluation, GemRun, RunError, RunOptions};
pub use sink::{FileSink, MessageSink, SinkError, StdoutSink, TelegramConfig, TelegramSink};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_is_send_sync() {
        assert_send::<GemConfig>();
        assert_sync::<GemConfig>();
    }

    #[test]
    fn loaded_universe_is_send_sync() {
        assert_send::<LoadedUniverse>();
        assert_sync::<LoadedUniverse>();
        assert_send::<AssetHistory>();
    }

    #[test]
    fn run_result_is_send_sync() {
        assert_send::<GemRun>();
        assert_sync::<GemRun>();
        assert_send::<RunError>();
    }

    #[test]
    fn sinks_are_send_sync() {
        assert_send::<FileSink>();
        assert_sync::<FileSink>();
        assert_send::<TelegramSink>();
        assert_sync::<TelegramSink>();
    }
}

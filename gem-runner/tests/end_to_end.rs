//! End-to-end runs over in-memory and CSV price data.
//!
//! Each scenario builds a three-asset universe whose classic metrics are
//! known in advance, runs the full pipeline, and checks the decision and
//! the rendered report.

use chrono::NaiveDate;
use gem_core::data::CsvProvider;
use gem_core::{Allocation, DecisionError};
use gem_runner::testing::{rows_with_returns, StaticProvider};
use gem_runner::{run_gem, FileSink, GemConfig, MessageSink, RunError, RunOptions};
use std::collections::HashMap;
use std::fmt::Write as _;

fn config() -> GemConfig {
    GemConfig::from_toml(
        r#"
[universe]
safe_haven = "BONDS"
risk_assets = ["A", "B"]
risk_off_threshold = 0.0

[universe.tickers]
A = "AAA.L"
B = "BBB.L"
BONDS = "BND.DE"

[report]
capital_label = "GEM capital: 560€"
"#,
    )
    .unwrap()
}

fn opts() -> RunOptions {
    let as_of = NaiveDate::from_ymd_opt(2024, 11, 4).unwrap();
    RunOptions {
        as_of,
        generated_at: as_of.and_hms_opt(9, 30, 0).unwrap(),
    }
}

#[test]
fn leading_positive_asset_is_selected() {
    // A: 0.5 * 0.10 + 0.5 * 0.06 = 0.08; B: 0.5 * -0.04 + 0.5 * 0.0 = -0.02
    let provider = StaticProvider::new()
        .with("AAA.L", rows_with_returns(0.10, 0.06))
        .with("BBB.L", rows_with_returns(-0.04, 0.0))
        .with("BND.DE", rows_with_returns(0.02, 0.01));

    let run = run_gem(&config(), &provider, &opts()).unwrap();

    assert_eq!(
        run.decision().allocation,
        Allocation::RiskOn { asset: "A".into() }
    );
    let score = run.evaluation.ranking[0].score.value().unwrap();
    assert!((score - 0.08).abs() < 1e-12, "score {score}");

    assert!(run.report.contains("🕒 2024-11-04 09:30"));
    assert!(run
        .report
        .contains("• A: score +8.00% | 12-1 +10.00% | 6M +6.00% | ME: 2024-10-31"));
    assert!(run.report.contains("• B: score -2.00%"));
    assert!(run.report.contains("🛡️ BONDS: score +1.50%"));
    assert!(run.report.contains("✅ DECISION: A"));
    assert!(run.report.ends_with("💰 GEM capital: 560€"));

    let a = run.report.find("• A:").unwrap();
    let b = run.report.find("• B:").unwrap();
    assert!(a < b, "ranking order in report");
}

#[test]
fn all_negative_scores_go_risk_off() {
    let provider = StaticProvider::new()
        .with("AAA.L", rows_with_returns(-0.01, -0.01))
        .with("BBB.L", rows_with_returns(-0.05, -0.05))
        .with("BND.DE", rows_with_returns(0.02, 0.01));

    let run = run_gem(&config(), &provider, &opts()).unwrap();

    assert!(run.decision().is_risk_off());
    assert_eq!(run.decision().selected().as_str(), "BONDS");
    assert_eq!(run.decision().trigger.as_str(), "A");
    assert!(run.report.contains("✅ DECISION: BONDS"));
    assert!(run
        .report
        .contains("RISK-OFF: best risk asset A scored -1.00%"));
}

#[test]
fn score_at_threshold_is_risk_off() {
    let provider = StaticProvider::new()
        .with("AAA.L", rows_with_returns(0.0, 0.0))
        .with("BBB.L", rows_with_returns(-0.05, -0.05))
        .with("BND.DE", rows_with_returns(0.02, 0.01));

    let run = run_gem(&config(), &provider, &opts()).unwrap();
    assert!(run.decision().is_risk_off());
}

#[test]
fn missing_ticker_fails_the_whole_run() {
    let provider = StaticProvider::new()
        .with("AAA.L", rows_with_returns(0.10, 0.06))
        .with("BND.DE", rows_with_returns(0.02, 0.01));

    let err = run_gem(&config(), &provider, &opts()).unwrap_err();
    assert!(matches!(err, RunError::Data(_)));
    assert!(err.to_string().contains("BBB.L"), "{err}");
}

#[test]
fn no_defined_score_aborts_by_default() {
    let provider = StaticProvider::new()
        .with("AAA.L", gem_runner::testing::month_end_rows(&[100.0; 5]))
        .with("BBB.L", gem_runner::testing::month_end_rows(&[100.0; 13]))
        .with("BND.DE", rows_with_returns(0.02, 0.01));

    let err = run_gem(&config(), &provider, &opts()).unwrap_err();
    match err {
        RunError::Decision(DecisionError::InsufficientHistory { reason, .. }) => {
            assert!(reason.contains("needs 14"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn env_configured_run_matches_toml_run() {
    let vars: HashMap<&str, &str> = [
        (
            "GEM_TICKERS_JSON",
            r#"{"A": "AAA.L", "B": "BBB.L", "BONDS": "BND.DE"}"#,
        ),
        ("GEM_RISK_ASSETS_JSON", r#"["A", "B"]"#),
        ("GEM_CAPITAL_LABEL", "GEM capital: 560€"),
    ]
    .into();
    let env_config =
        GemConfig::from_env_with(|k: &str| vars.get(k).map(|v| v.to_string())).unwrap();

    let provider = StaticProvider::new()
        .with("AAA.L", rows_with_returns(0.10, 0.06))
        .with("BBB.L", rows_with_returns(-0.04, 0.0))
        .with("BND.DE", rows_with_returns(0.02, 0.01));

    let from_env = run_gem(&env_config, &provider, &opts()).unwrap();
    let from_toml = run_gem(&config(), &provider, &opts()).unwrap();
    assert_eq!(from_env.report, from_toml.report);
}

fn write_csv(dir: &std::path::Path, symbol: &str, month_end_prices: &[(NaiveDate, f64)]) {
    let mut body = String::from("date,close,adj_close\n");
    for (date, price) in month_end_prices {
        // Raw close differs from the adjusted one; only the adjusted column counts.
        writeln!(body, "{date},{},{price}", price * 2.0).unwrap();
    }
    std::fs::write(dir.join(format!("{symbol}.csv")), body).unwrap();
}

#[test]
fn csv_provider_run_writes_report_file() {
    let dir = tempfile::tempdir().unwrap();
    let month_ends: Vec<NaiveDate> = (0..14)
        .map(|i| gem_runner::testing::month_end(gem_runner::testing::first_month(), i))
        .collect();
    let series = |last2: f64, last: f64| -> Vec<(NaiveDate, f64)> {
        month_ends
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let price = match i {
                    12 => last2,
                    13 => last,
                    _ => 100.0,
                };
                (*d, price)
            })
            .collect()
    };
    write_csv(dir.path(), "AAA.L", &series(90.0, 95.0));
    write_csv(dir.path(), "BBB.L", &series(80.0, 85.0));
    write_csv(dir.path(), "BND.DE", &series(101.0, 102.0));

    let provider = CsvProvider::new(dir.path());
    let run = run_gem(&config(), &provider, &opts()).unwrap();
    assert_eq!(run.decision().selected().as_str(), "BONDS");

    let out = dir.path().join("reports").join("gem_message.txt");
    FileSink::new(&out).deliver(&run.report).unwrap();
    let written = std::fs::read_to_string(&out).unwrap();
    assert_eq!(written, run.report);
    assert!(written.contains("✅ DECISION: BONDS"));
}

//! GEM CLI — compute the monthly signal, check and scaffold configuration.
//!
//! Commands:
//! - `run` — fetch prices, decide, and deliver the report
//! - `check-config` — load and validate a configuration without fetching
//! - `init` — write an example TOML configuration

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use gem_core::data::{CsvProvider, DataProvider, YahooProvider};
use gem_runner::sink::{FileSink, MessageSink, StdoutSink, TelegramConfig, TelegramSink};
use gem_runner::{run_gem, GemConfig, RunOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Exit status for any failed command.
const EXIT_FAILURE: u8 = 2;

#[derive(Parser)]
#[command(
    name = "gem",
    about = "GEM — Global Equity Momentum signal (classic 12-1 + 6M)"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConfigSource {
    /// Path to a TOML config file.
    #[arg(long, conflicts_with = "from_env")]
    config: Option<PathBuf>,

    /// Read configuration from GEM_* environment variables.
    #[arg(long, default_value_t = false)]
    from_env: bool,
}

impl ConfigSource {
    fn load(&self) -> Result<GemConfig> {
        match (&self.config, self.from_env) {
            (Some(path), _) => GemConfig::from_file(path)
                .with_context(|| format!("loading config from {}", path.display())),
            (None, true) => GemConfig::from_env().context("loading config from environment"),
            (None, false) => bail!("one of --config or --from-env is required"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the signal and deliver the report.
    Run {
        #[command(flatten)]
        source: ConfigSource,

        /// Read prices from <DIR>/<SYMBOL>.csv instead of Yahoo Finance.
        #[arg(long)]
        csv_dir: Option<PathBuf>,

        /// Last date of price history (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        as_of: Option<String>,

        /// Report file. Overrides the configured output path.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Also write a JSON summary of the run.
        #[arg(long)]
        json: Option<PathBuf>,

        /// Send the report to Telegram (TELEGRAM_BOT_TOKEN, TELEGRAM_CHAT_ID).
        #[arg(long, default_value_t = false)]
        telegram: bool,

        /// Do not print the report to stdout.
        #[arg(long, default_value_t = false)]
        quiet: bool,
    },
    /// Load and validate a configuration without fetching prices.
    CheckConfig {
        #[command(flatten)]
        source: ConfigSource,
    },
    /// Write an example configuration file.
    Init {
        /// Destination path.
        #[arg(long, default_value = "gem.toml")]
        path: PathBuf,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run {
            source,
            csv_dir,
            as_of,
            output,
            json,
            telegram,
            quiet,
        } => run_cmd(&source, csv_dir, as_of, output, json, telegram, quiet),
        Commands::CheckConfig { source } => check_config_cmd(&source),
        Commands::Init { path, force } => init_cmd(&path, force),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn run_cmd(
    source: &ConfigSource,
    csv_dir: Option<PathBuf>,
    as_of: Option<String>,
    output: Option<PathBuf>,
    json: Option<PathBuf>,
    telegram: bool,
    quiet: bool,
) -> Result<()> {
    let config = source.load()?;

    let now = chrono::Local::now().naive_local();
    let as_of = as_of
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("parsing --as-of")?
        .unwrap_or_else(|| now.date());
    let opts = RunOptions {
        as_of,
        generated_at: now,
    };

    let provider: Box<dyn DataProvider> = match csv_dir {
        Some(dir) => Box::new(CsvProvider::new(dir)),
        None => Box::new(YahooProvider::new()?),
    };

    // Resolve every sink before fetching so a missing credential fails early.
    let output_path = output.unwrap_or_else(|| config.report.output_path.clone());
    let mut sinks: Vec<Box<dyn MessageSink>> = vec![Box::new(FileSink::new(output_path))];
    if !quiet {
        sinks.push(Box::new(StdoutSink));
    }
    if telegram {
        sinks.push(Box::new(TelegramSink::new(TelegramConfig::from_env()?)?));
    }

    let run = run_gem(&config, provider.as_ref(), &opts)?;

    for sink in &sinks {
        sink.deliver(&run.report)
            .with_context(|| format!("delivering report via {}", sink.name()))?;
    }

    if let Some(path) = json {
        std::fs::write(&path, run.summary_json()?)
            .with_context(|| format!("writing JSON summary to {}", path.display()))?;
        info!(path = %path.display(), "summary written");
    }

    Ok(())
}

fn check_config_cmd(source: &ConfigSource) -> Result<()> {
    let config = source.load()?;
    config.validate()?;

    let u = &config.universe;
    println!("Config OK");
    println!("Risk assets:");
    for asset in &u.risk_assets {
        println!("  {asset} ({})", config.symbol_for(asset).unwrap_or("?"));
    }
    println!(
        "Safe haven: {} ({})",
        u.safe_haven,
        config.symbol_for(&u.safe_haven).unwrap_or("?")
    );
    println!("Risk-off threshold: {}", u.risk_off_threshold);
    println!("History start: {}", config.data.history_start);
    println!("Report: {}", config.report.output_path.display());
    Ok(())
}

fn init_cmd(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let toml = GemConfig::example().to_toml()?;
    std::fs::write(path, toml).with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote example config to {}", path.display());
    Ok(())
}

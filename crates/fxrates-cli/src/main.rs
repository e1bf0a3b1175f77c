//! `fxrates`: local exchange-rate store, sync and query tool.
//!
//! # Usage
//!
//! ```
//! fxrates sync
//! fxrates rate EUR JPY
//! fxrates chart EUR PLN --period year
//! fxrates serve --port 8080
//! ```

mod commands;
mod settings;

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use fxrates_core::{CurrencyCode, chart::ChartPeriod};
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "fxrates", version, about = "Local exchange-rate store")]
struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE", default_value = "fxrates.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Fetch every missing day up to today (or `--until`).
  Sync {
    #[arg(long, value_name = "YYYY-MM-DD")]
    until: Option<NaiveDate>,
  },
  /// Most recent stored date.
  LatestDate,
  /// First and last dates with a valid observation for a currency.
  Range { code: CurrencyCode },
  /// Latest cross rate: units of `to` per one `from`.
  Rate { from: CurrencyCode, to: CurrencyCode },
  /// The raw stored USD-based value for one day.
  RateOn { code: CurrencyCode, date: NaiveDate },
  /// Downsampled USD-based series as JSON.
  Series {
    code:       CurrencyCode,
    start:      NaiveDate,
    end:        NaiveDate,
    #[arg(long)]
    max_points: Option<usize>,
  },
  /// Cross-rate chart series as JSON.
  Chart {
    from:       CurrencyCode,
    to:         CurrencyCode,
    #[arg(long, default_value = "all")]
    period:     ChartPeriod,
    #[arg(long)]
    max_points: Option<usize>,
  },
  /// Known currency codes.
  Codes,
  /// Currency catalog.
  Names,
  /// Serve the JSON API under `/api`.
  Serve {
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();
  let settings = Settings::load(&args.config)?;
  commands::run(args.command, settings).await
}

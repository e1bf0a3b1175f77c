//! Subcommand implementations.

use std::{io::Write as _, sync::Arc};

use anyhow::{Context as _, Result};
use axum::Router;
use fxrates_api::{ApiState, api_router};
use fxrates_core::{RateStore, chart::chart_series, is_valid_observation};
use fxrates_oxr::OxrClient;
use fxrates_store_sqlite::SqliteStore;
use fxrates_sync::{SyncEngine, SyncReport};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{Command, settings::Settings};

pub async fn run(command: Command, settings: Settings) -> Result<()> {
  let store = open_store(&settings).await?;

  match command {
    Command::Sync { until } => sync(store, &settings, until).await,
    Command::LatestDate => {
      println!("{}", store.latest_date().await?);
      Ok(())
    }
    Command::Range { code } => {
      let first = store.first_valid_date(&code).await?;
      let last = store.last_valid_date(&code).await?;
      match (first, last) {
        (Some(first), Some(last)) => println!("{code}\t{first}\t{last}"),
        _ => println!("{code}\tno valid observations"),
      }
      Ok(())
    }
    Command::Rate { from, to } => {
      let rate = store.latest_rate(&from, &to).await?;
      println!("1 {from} = {rate} {to}");
      Ok(())
    }
    Command::RateOn { code, date } => {
      match store.rate_on(&code, date).await? {
        Some(v) if is_valid_observation(Some(v)) => println!("{v}"),
        Some(v) => println!("no observation (stored {v})"),
        None => println!("no observation"),
      }
      Ok(())
    }
    Command::Series { code, start, end, max_points } => {
      anyhow::ensure!(start <= end, "start {start} is after end {end}");
      let max_points = max_points.unwrap_or(settings.chart_max_points);
      let series = store.downsample(&code, start, end, max_points).await?;
      print_json(&series)
    }
    Command::Chart { from, to, period, max_points } => {
      let max_points = max_points.unwrap_or(settings.chart_max_points);
      match chart_series(&store, &from, &to, period, max_points).await? {
        Some(chart) => print_json(&chart),
        None => anyhow::bail!("{from} and {to} have no overlapping observations"),
      }
    }
    Command::Codes => {
      for code in store.list_known_codes().await? {
        println!("{code}");
      }
      Ok(())
    }
    Command::Names => {
      for name in store.list_currency_names().await? {
        println!("{}\t{}", name.code, name.full_name);
      }
      Ok(())
    }
    Command::Serve { host, port } => serve(store, &settings, host, port).await,
  }
}

async fn open_store(settings: &Settings) -> Result<SqliteStore> {
  let path = &settings.store_path;
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  SqliteStore::open(path)
    .await
    .with_context(|| format!("failed to open store at {}", path.display()))
}

fn provider(settings: &Settings) -> Result<OxrClient> {
  if settings.app_id.is_empty() {
    tracing::warn!("no app_id configured; set FXRATES_APP_ID or app_id in the config file");
  }
  OxrClient::new(settings.oxr()).context("failed to build HTTP client")
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
  let out = serde_json::to_string_pretty(value)?;
  println!("{out}");
  Ok(())
}

// ─── Sync ─────────────────────────────────────────────────────────────────────

async fn sync(
  store: SqliteStore,
  settings: &Settings,
  until: Option<chrono::NaiveDate>,
) -> Result<()> {
  let engine = SyncEngine::new(Arc::new(store), Arc::new(provider(settings)?));

  let progress = |processed: u32, total: u32| {
    let mut err = std::io::stderr().lock();
    let _ = write!(err, "\r{processed}/{total} days");
    let _ = err.flush();
  };
  let status = |line: &str| tracing::debug!("{line}");

  let report = match until {
    Some(today) => engine.sync_until(today, Some(&progress), Some(&status)).await,
    None => engine.sync_to_today(Some(&progress), Some(&status)).await,
  }
  .context("sync aborted")?;
  eprintln!();

  print_report(&report);
  Ok(())
}

fn print_report(report: &SyncReport) {
  println!(
    "{} → {}: {}/{} days, {} rates written",
    report.first_missing,
    report.today,
    report.processed_days,
    report.total_days,
    report.rates_written,
  );
  if !report.currencies_added.is_empty() {
    let added: Vec<&str> = report.currencies_added.iter().map(|c| c.as_str()).collect();
    println!("new currencies: {}", added.join(", "));
  }
  for failure in &report.failures {
    eprintln!(
      "{} {:?} {}: {}",
      failure.date,
      failure.stage,
      failure.code.as_deref().unwrap_or("-"),
      failure.message
    );
  }
}

// ─── Serve ────────────────────────────────────────────────────────────────────

async fn serve(
  store: SqliteStore,
  settings: &Settings,
  host: Option<String>,
  port: Option<u16>,
) -> Result<()> {
  let state = ApiState::new(Arc::new(store), Arc::new(provider(settings)?))
    .with_max_points(settings.chart_max_points);

  let app = Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http());

  let host = host.unwrap_or_else(|| settings.host.clone());
  let address = format!("{host}:{}", port.unwrap_or(settings.port));

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

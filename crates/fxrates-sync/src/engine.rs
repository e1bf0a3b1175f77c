//! [`SyncEngine`]: day-by-day reconciliation of a store against a provider.

use std::{
  collections::{HashMap, HashSet},
  sync::Arc,
};

use chrono::{Local, NaiveDate};
use fxrates_core::{CurrencyCode, RateProvider, RateStore};

use crate::{
  error::SyncError,
  report::{FailureStage, SyncReport},
};

/// Receives `(processed_days, total_days)` after each day.
pub type ProgressSink<'a> = &'a (dyn Fn(u32, u32) + Send + Sync);

/// Receives a human-readable status line before each day.
pub type StatusSink<'a> = &'a (dyn Fn(&str) + Send + Sync);

/// Pulls missing days from `P` into `S`.
///
/// Holds no state between runs; everything durable lives in the store.
pub struct SyncEngine<S, P> {
  store:    Arc<S>,
  provider: Arc<P>,
}

impl<S, P> Clone for SyncEngine<S, P> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), provider: self.provider.clone() }
  }
}

/// Working copies of the store's code set and name catalog, loaded once per
/// run and extended as new currencies are discovered.
struct Known {
  codes: HashSet<CurrencyCode>,
  names: HashMap<CurrencyCode, String>,
}

impl<S: RateStore, P: RateProvider> SyncEngine<S, P> {
  pub fn new(store: Arc<S>, provider: Arc<P>) -> Self { Self { store, provider } }

  pub fn store(&self) -> &Arc<S> { &self.store }

  /// Sync up to and including the local calendar date.
  pub async fn sync_to_today(
    &self,
    progress: Option<ProgressSink<'_>>,
    status: Option<StatusSink<'_>>,
  ) -> Result<SyncReport, SyncError> {
    self.sync_until(Local::now().date_naive(), progress, status).await
  }

  /// Sync every day after the store's latest date up to and including `today`.
  pub async fn sync_until(
    &self,
    today: NaiveDate,
    progress: Option<ProgressSink<'_>>,
    status: Option<StatusSink<'_>>,
  ) -> Result<SyncReport, SyncError> {
    let latest = match self.store.latest_date().await {
      Ok(date) => date,
      Err(e) => {
        tracing::error!(error = %e, "cannot read latest stored date; aborting sync");
        return Err(SyncError::LatestDate(Box::new(e)));
      }
    };

    let first_missing = latest.succ_opt().unwrap_or(latest);
    let span = today.succ_opt().unwrap_or(today) - first_missing;
    let total_days = u32::try_from(span.num_days()).unwrap_or(0).max(1);
    let mut report = SyncReport::new(first_missing, today, total_days);

    if first_missing > today {
      tracing::info!(%latest, "rate store already up to date");
      return Ok(report);
    }
    tracing::info!(%first_missing, %today, total_days, "starting rate sync");

    let mut known = self.load_known().await;

    for date in first_missing.iter_days().take_while(|d| *d <= today) {
      if let Some(status) = status {
        status(&format!("Updating: {date}"));
      }

      self.sync_day(date, &mut known, &mut report).await;

      report.processed_days += 1;
      if let Some(progress) = progress {
        progress(report.processed_days, total_days);
      }
    }

    tracing::info!(
      processed = report.processed_days,
      written = report.rates_written,
      failures = report.failures.len(),
      "rate sync finished"
    );
    Ok(report)
  }

  async fn load_known(&self) -> Known {
    let codes = match self.store.list_known_codes().await {
      Ok(codes) => codes.into_iter().collect(),
      Err(e) => {
        tracing::error!(error = %e, "failed to load currency codes");
        HashSet::new()
      }
    };
    let names = match self.store.list_currency_names().await {
      Ok(names) => names.into_iter().map(|n| (n.code, n.full_name)).collect(),
      Err(e) => {
        tracing::error!(error = %e, "failed to load currency names");
        HashMap::new()
      }
    };
    Known { codes, names }
  }

  /// Ingest one day. Never fails; problems land in `report.failures`.
  async fn sync_day(&self, date: NaiveDate, known: &mut Known, report: &mut SyncReport) {
    let rates = match self.provider.rates_for_date(date).await {
      Ok(rates) => rates,
      Err(e) => {
        tracing::error!(%date, error = %e, "failed to fetch rates");
        report.fail(date, None, FailureStage::Fetch, &e);
        return;
      }
    };
    if rates.is_empty() {
      tracing::warn!(%date, "provider returned no rates");
    }

    for (raw_code, rate) in rates {
      let code = match CurrencyCode::parse(&raw_code) {
        Ok(code) => code,
        Err(e) => {
          tracing::warn!(%date, code = %raw_code, error = %e, "skipping invalid currency code");
          report.fail(date, Some(raw_code.as_str()), FailureStage::InvalidCode, &e);
          continue;
        }
      };

      if !known.codes.contains(&code) {
        match self.store.add_currency_column(&code).await {
          Ok(true) => report.currencies_added.push(code.clone()),
          Ok(false) => {}
          Err(e) => {
            tracing::error!(%date, %code, error = %e, "failed to add currency column");
            report.fail(date, Some(code.as_str()), FailureStage::AddColumn, &e);
            continue;
          }
        }
        known.codes.insert(code.clone());
      }

      if !known.names.contains_key(&code) {
        let name = self.display_name(&code).await;
        match self.store.add_currency_name(&code, &name).await {
          Ok(()) => {
            known.names.insert(code.clone(), name);
            report.names_added += 1;
          }
          Err(e) => {
            tracing::error!(%code, error = %e, "failed to add currency name");
            report.fail(date, Some(code.as_str()), FailureStage::AddName, &e);
          }
        }
      }

      match self.store.upsert_rate(&code, date, rate).await {
        Ok(()) => report.rates_written += 1,
        Err(e) => {
          tracing::error!(%date, %code, error = %e, "failed to upsert rate");
          report.fail(date, Some(code.as_str()), FailureStage::Upsert, &e);
        }
      }
    }
  }

  /// The provider's display name for `code`, or the code itself.
  async fn display_name(&self, code: &CurrencyCode) -> String {
    match self.provider.display_name_for_code(code).await {
      Ok(Some(name)) if !name.trim().is_empty() => name,
      Ok(_) => code.to_string(),
      Err(e) => {
        tracing::warn!(%code, error = %e, "currency name lookup failed");
        code.to_string()
      }
    }
  }
}

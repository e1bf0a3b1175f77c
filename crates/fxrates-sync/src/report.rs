//! Outcome of a sync run.

use chrono::NaiveDate;
use fxrates_core::CurrencyCode;
use serde::Serialize;

/// Which step of the per-day ingestion a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
  /// The day's rate table could not be fetched; the whole day was skipped.
  Fetch,
  /// The provider returned a code that is not a valid currency code.
  InvalidCode,
  AddColumn,
  AddName,
  Upsert,
}

/// One skipped unit of work.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncFailure {
  pub date:    NaiveDate,
  /// Absent for [`FailureStage::Fetch`]; the raw provider code for
  /// [`FailureStage::InvalidCode`].
  pub code:    Option<String>,
  pub stage:   FailureStage,
  pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
  pub first_missing:    NaiveDate,
  pub today:            NaiveDate,
  pub total_days:       u32,
  pub processed_days:   u32,
  pub rates_written:    usize,
  /// Codes whose column was created by this run.
  pub currencies_added: Vec<CurrencyCode>,
  pub names_added:      usize,
  pub failures:         Vec<SyncFailure>,
}

impl SyncReport {
  pub(crate) fn new(first_missing: NaiveDate, today: NaiveDate, total_days: u32) -> Self {
    Self {
      first_missing,
      today,
      total_days,
      processed_days: 0,
      rates_written: 0,
      currencies_added: Vec::new(),
      names_added: 0,
      failures: Vec::new(),
    }
  }

  pub(crate) fn fail(
    &mut self,
    date: NaiveDate,
    code: Option<&str>,
    stage: FailureStage,
    error: &dyn std::error::Error,
  ) {
    self.failures.push(SyncFailure {
      date,
      code: code.map(str::to_owned),
      stage,
      message: error.to_string(),
    });
  }

  /// Whether every fetched observation made it into the store.
  pub fn is_clean(&self) -> bool { self.failures.is_empty() }

  /// Days whose fetch failed; these stay as gaps in the store.
  pub fn skipped_days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
    self
      .failures
      .iter()
      .filter(|f| f.stage == FailureStage::Fetch)
      .map(|f| f.date)
  }
}

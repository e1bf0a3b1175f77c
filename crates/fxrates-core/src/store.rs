//! The `RateStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `fxrates-store-sqlite`).
//! The sync engine and the query surfaces depend on this abstraction, not on
//! any concrete backend.

use std::{collections::BTreeMap, future::Future};

use chrono::NaiveDate;

use crate::currency::{CurrencyCode, CurrencyName};

/// A date-ordered series of USD-based rates for one currency.
pub type RateSeries = BTreeMap<NaiveDate, f64>;

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Backend-independent classification of store failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
  /// No rows at all.
  EmptyStore,
  /// The code has no column.
  UnknownCurrency,
  /// The requested observation is missing or a sentinel.
  NoData,
  /// A cross rate was asked for with a zero denominator.
  DivisionByZero,
  SchemaMutationFailed,
  CatalogWriteFailed,
  UpsertFailed,
  /// Any other backend failure.
  Storage,
}

/// Implemented by every [`RateStore::Error`] so callers can react to the
/// failure class without knowing the backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> StoreErrorKind;
}

/// Abstraction over a local exchange-rate store.
///
/// Logically the store is one wide table keyed by date with one nullable
/// column per known currency, plus a `(code, full_name)` catalog. Every stored
/// value is "units of currency per 1 USD". Cells holding `NULL`, `-1` or `0`
/// are not observations and are skipped by every read path.
///
/// Operations taking a [`CurrencyCode`] fail with an "unknown currency" error
/// when the code has no column, except [`RateStore::add_currency_column`] and
/// [`RateStore::add_currency_name`].
pub trait RateStore: Send + Sync {
  type Error: StoreError;

  // ── Dates ─────────────────────────────────────────────────────────────

  /// The most recent date with a row. Fails if the store has no rows.
  fn latest_date(&self) -> impl Future<Output = Result<NaiveDate, Self::Error>> + Send + '_;

  /// Earliest date holding a valid observation for `code`.
  fn first_valid_date<'a>(
    &'a self,
    code: &'a CurrencyCode,
  ) -> impl Future<Output = Result<Option<NaiveDate>, Self::Error>> + Send + 'a;

  /// Latest date holding a valid observation for `code`.
  fn last_valid_date<'a>(
    &'a self,
    code: &'a CurrencyCode,
  ) -> impl Future<Output = Result<Option<NaiveDate>, Self::Error>> + Send + 'a;

  // ── Rates ─────────────────────────────────────────────────────────────

  /// Cross rate `to / from` taken from the most recent row.
  ///
  /// Returns `1.0` without touching storage when `from == to`.
  fn latest_rate<'a>(
    &'a self,
    from: &'a CurrencyCode,
    to: &'a CurrencyCode,
  ) -> impl Future<Output = Result<f64, Self::Error>> + Send + 'a;

  /// The raw stored cell for `(code, date)`, sentinels included.
  fn rate_on<'a>(
    &'a self,
    code: &'a CurrencyCode,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<f64>, Self::Error>> + Send + 'a;

  /// Fixed-stride downsampling of `code` over `[start, end]`.
  ///
  /// With `n` rows in range the stride is `ceil(n / max_points)` (at least
  /// one); the first row and every stride-th row after it are kept, then
  /// rows without a valid observation are dropped. An empty range yields an
  /// empty series. `max_points` of zero is treated as one.
  fn downsample<'a>(
    &'a self,
    code: &'a CurrencyCode,
    start: NaiveDate,
    end: NaiveDate,
    max_points: usize,
  ) -> impl Future<Output = Result<RateSeries, Self::Error>> + Send + 'a;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Add a column for `code`. A no-op when the column already exists.
  ///
  /// Resolves to `true` only when this call created the column.
  fn add_currency_column<'a>(
    &'a self,
    code: &'a CurrencyCode,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Insert a catalog entry. First write wins; later calls are no-ops.
  fn add_currency_name<'a>(
    &'a self,
    code: &'a CurrencyCode,
    full_name: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Ensure a row for `date` exists and set its `code` cell to `value`.
  fn upsert_rate<'a>(
    &'a self,
    code: &'a CurrencyCode,
    date: NaiveDate,
    value: f64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Catalog ───────────────────────────────────────────────────────────

  /// All currency columns, sorted. Refreshes the known-codes cache.
  fn list_known_codes(
    &self,
  ) -> impl Future<Output = Result<Vec<CurrencyCode>, Self::Error>> + Send + '_;

  /// The full catalog in stored order.
  fn list_currency_names(
    &self,
  ) -> impl Future<Output = Result<Vec<CurrencyName>, Self::Error>> + Send + '_;
}

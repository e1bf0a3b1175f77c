//! Error type for `fxrates-store-sqlite`.

use chrono::NaiveDate;
use fxrates_core::{CurrencyCode, StoreError, StoreErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] fxrates_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date parse error: {0}")]
  DateParse(String),

  /// The rate table has no rows at all.
  #[error("the rate store is empty")]
  EmptyStore,

  #[error("unknown currency: {0}")]
  UnknownCurrency(CurrencyCode),

  #[error("no rate data: {0}")]
  NoData(String),

  #[error("rate for {0} is zero")]
  DivisionByZero(CurrencyCode),

  #[error("failed to add column for {code}: {source}")]
  SchemaMutationFailed {
    code:   CurrencyCode,
    #[source]
    source: tokio_rusqlite::Error,
  },

  #[error("failed to write catalog entry for {code}: {source}")]
  CatalogWriteFailed {
    code:   CurrencyCode,
    #[source]
    source: tokio_rusqlite::Error,
  },

  #[error("failed to upsert {code} on {date}: {source}")]
  UpsertFailed {
    code:   CurrencyCode,
    date:   NaiveDate,
    #[source]
    source: tokio_rusqlite::Error,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl StoreError for Error {
  fn kind(&self) -> StoreErrorKind {
    match self {
      Error::EmptyStore => StoreErrorKind::EmptyStore,
      Error::UnknownCurrency(_) => StoreErrorKind::UnknownCurrency,
      Error::NoData(_) => StoreErrorKind::NoData,
      Error::DivisionByZero(_) => StoreErrorKind::DivisionByZero,
      Error::SchemaMutationFailed { .. } => StoreErrorKind::SchemaMutationFailed,
      Error::CatalogWriteFailed { .. } => StoreErrorKind::CatalogWriteFailed,
      Error::UpsertFailed { .. } => StoreErrorKind::UpsertFailed,
      Error::Core(_) | Error::Database(_) | Error::DateParse(_) => StoreErrorKind::Storage,
    }
  }
}

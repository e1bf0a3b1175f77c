//! Error types for `fxrates-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid currency code: {0:?}")]
  InvalidCurrencyCode(String),

  #[error("unknown chart period: {0:?}")]
  UnknownChartPeriod(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

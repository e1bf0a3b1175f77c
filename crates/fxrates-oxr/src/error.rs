//! Error type for `fxrates-oxr`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Connection, timeout, or body-read failure.
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

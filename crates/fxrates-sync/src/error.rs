//! Error type for `fxrates-sync`.

use thiserror::Error;

/// The only way a sync run fails as a whole.
#[derive(Debug, Error)]
pub enum SyncError {
  /// The store's latest date could not be read (including an empty store);
  /// nothing was fetched or written.
  #[error("cannot read latest stored date: {0}")]
  LatestDate(#[source] Box<dyn std::error::Error + Send + Sync>),
}

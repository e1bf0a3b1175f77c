//! The known-codes cache.
//!
//! Mirrors the set of currency columns in the rate table so validation does
//! not hit `PRAGMA table_info` on every call. Owned by one [`SqliteStore`]
//! (and shared by its clones); invalidated on every schema change and rebuilt
//! lazily by the next validation.
//!
//! [`SqliteStore`]: crate::SqliteStore

use std::{
  collections::BTreeSet,
  sync::{Arc, PoisonError, RwLock},
};

use fxrates_core::CurrencyCode;

pub type CodeSet = Arc<BTreeSet<CurrencyCode>>;

#[derive(Debug, Default)]
pub struct KnownCodes {
  codes: RwLock<Option<CodeSet>>,
}

impl KnownCodes {
  /// The cached set, or `None` if it has been invalidated or never built.
  pub fn get(&self) -> Option<CodeSet> {
    self.codes.read().unwrap_or_else(PoisonError::into_inner).clone()
  }

  /// Replace the cached set with a freshly loaded one.
  pub fn store(&self, codes: BTreeSet<CurrencyCode>) -> CodeSet {
    let codes = Arc::new(codes);
    *self.codes.write().unwrap_or_else(PoisonError::into_inner) = Some(codes.clone());
    codes
  }

  pub fn invalidate(&self) {
    *self.codes.write().unwrap_or_else(PoisonError::into_inner) = None;
  }
}

//! The `RateProvider` trait: the remote side of a sync.

use std::{collections::BTreeMap, future::Future};

use chrono::NaiveDate;

use crate::currency::CurrencyCode;

/// A remote source of daily USD-based rates and currency display names.
pub trait RateProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every rate published for `date`, keyed by the provider's raw code.
  ///
  /// Transport and decoding failures are errors. A well-formed response that
  /// simply carries no rates resolves to an empty map.
  fn rates_for_date(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<BTreeMap<String, f64>, Self::Error>> + Send + '_;

  /// Human-readable name for `code`, if the provider knows one.
  fn display_name_for_code<'a>(
    &'a self,
    code: &'a CurrencyCode,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;
}

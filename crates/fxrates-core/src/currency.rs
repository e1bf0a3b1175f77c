//! Currency codes, catalog entries, and the observation sentinel convention.
//!
//! Codes double as column identifiers in the wide rate table, so every code
//! entering the system goes through [`CurrencyCode::parse`] first.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Longest code accepted. Real ISO 4217 codes are three letters; providers
/// also publish a handful of longer synthetic ones.
const MAX_CODE_LEN: usize = 10;

/// An upper-case ASCII alphanumeric currency code such as `EUR` or `XAU`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
  /// Trim, upper-case and validate `raw`.
  pub fn parse(raw: &str) -> Result<Self> {
    let code = raw.trim().to_ascii_uppercase();
    let valid = !code.is_empty()
      && code.len() <= MAX_CODE_LEN
      && code.bytes().all(|b| b.is_ascii_alphanumeric());
    if valid {
      Ok(Self(code))
    } else {
      Err(Error::InvalidCurrencyCode(raw.to_owned()))
    }
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for CurrencyCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl FromStr for CurrencyCode {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl TryFrom<String> for CurrencyCode {
  type Error = Error;

  fn try_from(value: String) -> Result<Self> { Self::parse(&value) }
}

impl From<CurrencyCode> for String {
  fn from(code: CurrencyCode) -> Self { code.0 }
}

impl AsRef<str> for CurrencyCode {
  fn as_ref(&self) -> &str { &self.0 }
}

/// One row of the currency catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyName {
  pub code:      CurrencyCode,
  pub full_name: String,
}

/// Whether a stored cell counts as a real observation.
///
/// `NULL`, `-1` and `0` all mean "no rate for this day".
pub fn is_valid_observation(value: Option<f64>) -> bool {
  match value {
    Some(v) => v != -1.0 && v != 0.0 && v.is_finite(),
    None => false,
  }
}

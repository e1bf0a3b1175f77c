//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite.
//!
//! Dates are stored as ISO 8601 `YYYY-MM-DD` strings, which sort the same way
//! lexically and chronologically. Currency codes become quoted column names.

use chrono::NaiveDate;
use fxrates_core::CurrencyCode;

use crate::{Error, Result};

const ISO_FORMAT: &str = "%Y-%m-%d";
const DISPLAY_FORMAT: &str = "%b-%d-%Y";

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_date(date: NaiveDate) -> String { date.format(ISO_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, ISO_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

/// The derived `display_date` value, e.g. `Jan-03-1994`.
pub fn display_date(date: NaiveDate) -> String { date.format(DISPLAY_FORMAT).to_string() }

// ─── Currency columns ────────────────────────────────────────────────────────

/// Quoted identifier for the column holding `code`.
///
/// Safe to splice into SQL: [`CurrencyCode`] only admits ASCII alphanumerics.
pub fn column(code: &CurrencyCode) -> String { format!("\"{}\"", code.as_str()) }

/// SQL predicate matching [`fxrates_core::is_valid_observation`] for the cell
/// in `col`: not `NULL`, not a `-1`/`0` sentinel, and finite.
pub fn valid_cell(col: &str) -> String {
  format!("{col} IS NOT NULL AND {col} NOT IN (-1, 0) AND abs({col}) <= {:e}", f64::MAX)
}

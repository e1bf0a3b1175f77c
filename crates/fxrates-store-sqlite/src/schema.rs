//! SQL schema for the fxrates SQLite store.
//!
//! Currency columns are not part of the DDL: they are added one at a time with
//! `ALTER TABLE` the first time a code is seen.

pub const RATES_TABLE: &str = "exchange_rates";
pub const NAMES_TABLE: &str = "currency_names";

/// Key column of [`RATES_TABLE`], `YYYY-MM-DD`.
pub const ISO_DATE_COLUMN: &str = "iso_date";
/// Human-readable copy of the key, `Mon-DD-YYYY`.
pub const DISPLAY_DATE_COLUMN: &str = "display_date";

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per calendar date, one nullable REAL column per currency code.
-- Every value is units of that currency per 1 USD; NULL, -1 and 0 mean
-- no observation.
CREATE TABLE IF NOT EXISTS exchange_rates (
    iso_date     TEXT PRIMARY KEY,
    display_date TEXT NOT NULL
);

-- First write wins: entries are inserted with INSERT OR IGNORE.
CREATE TABLE IF NOT EXISTS currency_names (
    code      TEXT PRIMARY KEY,
    full_name TEXT NOT NULL
);

PRAGMA user_version = 1;
";

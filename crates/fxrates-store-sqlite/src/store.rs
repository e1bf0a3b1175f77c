//! [`SqliteStore`]: the SQLite implementation of [`RateStore`].

use std::{collections::BTreeSet, path::Path, sync::Arc};

use chrono::NaiveDate;
use fxrates_core::{CurrencyCode, CurrencyName, RateSeries, RateStore, is_valid_observation};
use rusqlite::OptionalExtension as _;

use crate::{
  Error, Result,
  cache::{CodeSet, KnownCodes},
  encode::{column, decode_date, display_date, encode_date, valid_cell},
  schema::{DISPLAY_DATE_COLUMN, ISO_DATE_COLUMN, NAMES_TABLE, RATES_TABLE, SCHEMA},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An exchange-rate store backed by a single SQLite file.
///
/// Cloning is cheap. The inner connection is reference-counted and clones
/// share one known-codes cache.
#[derive(Clone)]
pub struct SqliteStore {
  conn:  tokio_rusqlite::Connection,
  known: Arc<KnownCodes>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn, known: Arc::default() })
  }

  // ── Known codes ───────────────────────────────────────────────────────────

  /// Read the currency columns straight from the schema.
  async fn load_known_codes(&self) -> Result<BTreeSet<CurrencyCode>, tokio_rusqlite::Error> {
    let names: Vec<String> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT name FROM pragma_table_info('{RATES_TABLE}')"
        ))?;
        let names = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
      })
      .await?;

    Ok(
      names
        .into_iter()
        .filter(|name| {
          !name.eq_ignore_ascii_case(ISO_DATE_COLUMN)
            && !name.eq_ignore_ascii_case(DISPLAY_DATE_COLUMN)
        })
        .filter_map(|name| match CurrencyCode::parse(&name) {
          Ok(code) => Some(code),
          Err(_) => {
            tracing::warn!(column = %name, "ignoring non-currency column in rate table");
            None
          }
        })
        .collect(),
    )
  }

  async fn refresh_known_codes(&self) -> Result<CodeSet> {
    let codes = self.load_known_codes().await?;
    Ok(self.known.store(codes))
  }

  /// Fail with [`Error::UnknownCurrency`] unless `code` has a column.
  ///
  /// The cache is rebuilt when it is cold or does not contain `code`, so a
  /// column added through another handle is picked up before rejecting.
  async fn validate(&self, code: &CurrencyCode) -> Result<()> {
    if self.known.get().is_some_and(|codes| codes.contains(code)) {
      return Ok(());
    }
    if self.refresh_known_codes().await?.contains(code) {
      Ok(())
    } else {
      Err(Error::UnknownCurrency(code.clone()))
    }
  }

  /// Earliest (`ascending`) or latest valid observation date for `code`.
  async fn valid_date_bound(&self, code: &CurrencyCode, ascending: bool) -> Result<Option<NaiveDate>> {
    self.validate(code).await?;

    let valid = valid_cell(&column(code));
    let order = if ascending { "ASC" } else { "DESC" };
    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {ISO_DATE_COLUMN} FROM {RATES_TABLE}
                 WHERE {valid}
                 ORDER BY {ISO_DATE_COLUMN} {order} LIMIT 1"
              ),
              [],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    raw.as_deref().map(decode_date).transpose()
  }
}

// ─── RateStore impl ──────────────────────────────────────────────────────────

impl RateStore for SqliteStore {
  type Error = Error;

  // ── Dates ─────────────────────────────────────────────────────────────────

  async fn latest_date(&self) -> Result<NaiveDate> {
    let raw: Option<String> = self
      .conn
      .call(|conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {ISO_DATE_COLUMN} FROM {RATES_TABLE}
                 ORDER BY {ISO_DATE_COLUMN} DESC LIMIT 1"
              ),
              [],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    match raw {
      Some(s) => decode_date(&s),
      None => Err(Error::EmptyStore),
    }
  }

  async fn first_valid_date(&self, code: &CurrencyCode) -> Result<Option<NaiveDate>> {
    self.valid_date_bound(code, true).await
  }

  async fn last_valid_date(&self, code: &CurrencyCode) -> Result<Option<NaiveDate>> {
    self.valid_date_bound(code, false).await
  }

  // ── Rates ─────────────────────────────────────────────────────────────────

  async fn latest_rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Result<f64> {
    self.validate(from).await?;
    self.validate(to).await?;

    if from == to {
      return Ok(1.0);
    }

    let (from_col, to_col) = (column(from), column(to));
    let row: Option<(Option<f64>, Option<f64>)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {from_col}, {to_col} FROM {RATES_TABLE}
                 ORDER BY {ISO_DATE_COLUMN} DESC LIMIT 1"
              ),
              [],
              |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?,
        )
      })
      .await?;

    let Some((from_rate, to_rate)) = row else {
      return Err(Error::NoData("the rate table has no rows".into()));
    };

    match from_rate {
      Some(v) if v == 0.0 => return Err(Error::DivisionByZero(from.clone())),
      v if !is_valid_observation(v) => {
        return Err(Error::NoData(format!("no latest observation for {from}")));
      }
      _ => {}
    }
    if !is_valid_observation(to_rate) {
      return Err(Error::NoData(format!("no latest observation for {to}")));
    }

    Ok(to_rate.unwrap_or_default() / from_rate.unwrap_or(1.0))
  }

  async fn rate_on(&self, code: &CurrencyCode, date: NaiveDate) -> Result<Option<f64>> {
    self.validate(code).await?;

    let col = column(code);
    let date_str = encode_date(date);
    let value: Option<Option<f64>> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {col} FROM {RATES_TABLE} WHERE {ISO_DATE_COLUMN} = ?1"),
              rusqlite::params![date_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(value.flatten())
  }

  async fn downsample(
    &self,
    code:       &CurrencyCode,
    start:      NaiveDate,
    end:        NaiveDate,
    max_points: usize,
  ) -> Result<RateSeries> {
    self.validate(code).await?;

    let col = column(code);
    let start_str = encode_date(start);
    let end_str = encode_date(end);
    let max_points = max_points.max(1);

    let rows: Vec<(String, Option<f64>)> = self
      .conn
      .call(move |conn| {
        let count: i64 = conn.query_row(
          &format!(
            "SELECT COUNT(*) FROM {RATES_TABLE}
             WHERE {ISO_DATE_COLUMN} >= ?1 AND {ISO_DATE_COLUMN} <= ?2"
          ),
          rusqlite::params![start_str, end_str],
          |row| row.get(0),
        )?;
        let rows_in_range = usize::try_from(count).unwrap_or_default();
        if rows_in_range == 0 {
          return Ok(Vec::new());
        }

        // At least 1 and at most `count`, so it always fits back into an i64.
        let stride = i64::try_from(rows_in_range.div_ceil(max_points)).unwrap_or(i64::MAX);

        // Keep the first row in range and every stride-th one after it.
        let mut stmt = conn.prepare(&format!(
          "SELECT {ISO_DATE_COLUMN}, {col} FROM (
             SELECT {ISO_DATE_COLUMN}, {col},
                    ROW_NUMBER() OVER (ORDER BY {ISO_DATE_COLUMN}) AS rn
             FROM {RATES_TABLE}
             WHERE {ISO_DATE_COLUMN} >= ?1 AND {ISO_DATE_COLUMN} <= ?2
           )
           WHERE (rn - 1) % ?3 = 0
           ORDER BY {ISO_DATE_COLUMN} ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![start_str, end_str, stride], |row| {
            Ok((row.get(0)?, row.get(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .filter(|(_, value)| is_valid_observation(*value))
      .map(|(date, value)| -> Result<(NaiveDate, f64)> {
        Ok((decode_date(&date)?, value.unwrap_or_default()))
      })
      .collect()
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn add_currency_column(&self, code: &CurrencyCode) -> Result<bool> {
    let schema_error = |source| Error::SchemaMutationFailed { code: code.clone(), source };

    let known = self.load_known_codes().await.map_err(schema_error)?;
    if known.contains(code) {
      self.known.store(known);
      tracing::debug!(%code, "currency column already present");
      return Ok(false);
    }

    let col = column(code);
    let added = self
      .conn
      .call(move |conn| {
        match conn.execute(&format!("ALTER TABLE {RATES_TABLE} ADD COLUMN {col} REAL"), []) {
          Ok(_) => Ok(true),
          Err(rusqlite::Error::SqliteFailure(_, Some(msg)))
            if msg.to_ascii_lowercase().contains("duplicate column name") =>
          {
            Ok(false)
          }
          Err(e) => Err(e.into()),
        }
      })
      .await
      .map_err(schema_error)?;

    self.known.invalidate();
    if added {
      tracing::info!(%code, "added currency column");
    } else {
      tracing::debug!(%code, "currency column added concurrently");
    }
    Ok(added)
  }

  async fn add_currency_name(&self, code: &CurrencyCode, full_name: &str) -> Result<()> {
    let code_str = code.as_str().to_owned();
    let name = full_name.to_owned();

    let inserted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          &format!("INSERT OR IGNORE INTO {NAMES_TABLE} (code, full_name) VALUES (?1, ?2)"),
          rusqlite::params![code_str, name],
        )?;
        Ok(n > 0)
      })
      .await
      .map_err(|source| Error::CatalogWriteFailed { code: code.clone(), source })?;

    if inserted {
      tracing::info!(%code, full_name, "added currency name");
    }
    Ok(())
  }

  async fn upsert_rate(&self, code: &CurrencyCode, date: NaiveDate, value: f64) -> Result<()> {
    self.validate(code).await?;

    let col = column(code);
    let iso = encode_date(date);
    let display = display_date(date);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          &format!(
            "INSERT OR IGNORE INTO {RATES_TABLE} ({ISO_DATE_COLUMN}, {DISPLAY_DATE_COLUMN})
             VALUES (?1, ?2)"
          ),
          rusqlite::params![iso, display],
        )?;
        tx.execute(
          &format!("UPDATE {RATES_TABLE} SET {col} = ?1 WHERE {ISO_DATE_COLUMN} = ?2"),
          rusqlite::params![value, iso],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await
      .map_err(|source| Error::UpsertFailed { code: code.clone(), date, source })?;

    tracing::debug!(%code, %date, value, "upserted rate");
    Ok(())
  }

  // ── Catalog ───────────────────────────────────────────────────────────────

  async fn list_known_codes(&self) -> Result<Vec<CurrencyCode>> {
    let codes = self.refresh_known_codes().await?;
    Ok(codes.iter().cloned().collect())
  }

  async fn list_currency_names(&self) -> Result<Vec<CurrencyName>> {
    let raws: Vec<(String, String)> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT code, full_name FROM {NAMES_TABLE} ORDER BY rowid"))?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(code, full_name)| -> Result<CurrencyName> {
        Ok(CurrencyName { code: CurrencyCode::parse(&code)?, full_name })
      })
      .collect()
  }
}

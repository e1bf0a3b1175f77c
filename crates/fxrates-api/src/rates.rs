//! Handlers for rate lookups.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/dates/latest` | Most recent stored date |
//! | `GET`  | `/rate` | `?from&to`; cross rate from the most recent row |
//! | `GET`  | `/rates/{code}` | `?date`; the raw stored cell, sentinels included |
//! | `GET`  | `/rates/{code}/series` | `?start&end[&max_points]`; downsampled USD-based series |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::NaiveDate;
use fxrates_core::{CurrencyCode, RateProvider, RateSeries, RateStore, is_valid_observation};
use serde::{Deserialize, Serialize};

use crate::{
  ApiState,
  error::{ApiError, parse_code},
};

// ─── Latest date ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct LatestDate {
  pub date: NaiveDate,
}

/// `GET /dates/latest`
pub async fn latest_date<S, P>(
  State(state): State<ApiState<S, P>>,
) -> Result<Json<LatestDate>, ApiError>
where
  S: RateStore,
  P: RateProvider,
{
  let date = state.store.latest_date().await.map_err(ApiError::store)?;
  Ok(Json(LatestDate { date }))
}

// ─── Latest cross rate ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PairParams {
  pub from: String,
  pub to:   String,
}

#[derive(Debug, Serialize)]
pub struct CrossRate {
  pub from: CurrencyCode,
  pub to:   CurrencyCode,
  /// Units of `to` per one unit of `from`.
  pub rate: f64,
}

/// `GET /rate?from=EUR&to=JPY`
pub async fn latest<S, P>(
  State(state): State<ApiState<S, P>>,
  Query(params): Query<PairParams>,
) -> Result<Json<CrossRate>, ApiError>
where
  S: RateStore,
  P: RateProvider,
{
  let from = parse_code(&params.from)?;
  let to = parse_code(&params.to)?;
  let rate = state
    .store
    .latest_rate(&from, &to)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(CrossRate { from, to, rate }))
}

// ─── Single cell ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DateParams {
  pub date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct StoredRate {
  pub code:  CurrencyCode,
  pub date:  NaiveDate,
  /// The stored cell as-is; `null`, `-1` and `0` are all "no observation".
  pub value: Option<f64>,
  pub valid: bool,
}

/// `GET /rates/{code}?date=YYYY-MM-DD`
pub async fn on_date<S, P>(
  State(state): State<ApiState<S, P>>,
  Path(code): Path<String>,
  Query(params): Query<DateParams>,
) -> Result<Json<StoredRate>, ApiError>
where
  S: RateStore,
  P: RateProvider,
{
  let code = parse_code(&code)?;
  let value = state
    .store
    .rate_on(&code, params.date)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(StoredRate {
    code,
    date: params.date,
    value,
    valid: is_valid_observation(value),
  }))
}

// ─── Series ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SeriesParams {
  pub start:      NaiveDate,
  pub end:        NaiveDate,
  /// Defaults to the server's configured budget.
  pub max_points: Option<usize>,
}

/// `GET /rates/{code}/series?start=...&end=...[&max_points=...]`
pub async fn series<S, P>(
  State(state): State<ApiState<S, P>>,
  Path(code): Path<String>,
  Query(params): Query<SeriesParams>,
) -> Result<Json<RateSeries>, ApiError>
where
  S: RateStore,
  P: RateProvider,
{
  let code = parse_code(&code)?;
  if params.start > params.end {
    return Err(ApiError::BadRequest(format!(
      "start {} is after end {}",
      params.start, params.end
    )));
  }
  let series = state
    .store
    .downsample(
      &code,
      params.start,
      params.end,
      params.max_points.unwrap_or(state.max_points),
    )
    .await
    .map_err(ApiError::store)?;
  Ok(Json(series))
}

//! Handlers for `/currencies` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/currencies` | Sorted list of known codes |
//! | `GET`  | `/currencies/names` | Catalog in stored order |
//! | `GET`  | `/currencies/{code}/range` | First and last valid observation dates |

use axum::{
  Json,
  extract::{Path, State},
};
use chrono::NaiveDate;
use fxrates_core::{CurrencyCode, CurrencyName, RateProvider, RateStore};
use serde::Serialize;

use crate::{
  ApiState,
  error::{ApiError, parse_code},
};

/// `GET /currencies`
pub async fn list<S, P>(
  State(state): State<ApiState<S, P>>,
) -> Result<Json<Vec<CurrencyCode>>, ApiError>
where
  S: RateStore,
  P: RateProvider,
{
  let codes = state.store.list_known_codes().await.map_err(ApiError::store)?;
  Ok(Json(codes))
}

/// `GET /currencies/names`
pub async fn names<S, P>(
  State(state): State<ApiState<S, P>>,
) -> Result<Json<Vec<CurrencyName>>, ApiError>
where
  S: RateStore,
  P: RateProvider,
{
  let names = state
    .store
    .list_currency_names()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(names))
}

#[derive(Debug, Serialize)]
pub struct ValidRange {
  pub code:  CurrencyCode,
  pub first: Option<NaiveDate>,
  pub last:  Option<NaiveDate>,
}

/// `GET /currencies/{code}/range`
pub async fn range<S, P>(
  State(state): State<ApiState<S, P>>,
  Path(code): Path<String>,
) -> Result<Json<ValidRange>, ApiError>
where
  S: RateStore,
  P: RateProvider,
{
  let code = parse_code(&code)?;
  let first = state
    .store
    .first_valid_date(&code)
    .await
    .map_err(ApiError::store)?;
  let last = state
    .store
    .last_valid_date(&code)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(ValidRange { code, first, last }))
}

//! Handler for `GET /chart`.

use axum::{
  Json,
  extract::{Query, State},
};
use fxrates_core::{
  RateProvider, RateStore,
  chart::{ChartPeriod, ChartSeries, chart_series},
};
use serde::Deserialize;

use crate::{
  ApiState,
  error::{ApiError, parse_code},
};

#[derive(Debug, Deserialize)]
pub struct ChartParams {
  pub from:       String,
  pub to:         String,
  /// `day`, `week`, `month`, `year`, `5y` or `all` (the default).
  pub period:     Option<String>,
  pub max_points: Option<usize>,
}

/// `GET /chart?from=EUR&to=JPY[&period=year][&max_points=...]`
///
/// 404 when the two currencies have no overlapping valid observations.
pub async fn handler<S, P>(
  State(state): State<ApiState<S, P>>,
  Query(params): Query<ChartParams>,
) -> Result<Json<ChartSeries>, ApiError>
where
  S: RateStore,
  P: RateProvider,
{
  let from = parse_code(&params.from)?;
  let to = parse_code(&params.to)?;
  let period = match params.period.as_deref() {
    Some(raw) => raw
      .parse::<ChartPeriod>()
      .map_err(|e| ApiError::BadRequest(e.to_string()))?,
    None => ChartPeriod::default(),
  };
  let max_points = params.max_points.unwrap_or(state.max_points);

  chart_series(state.store.as_ref(), &from, &to, period, max_points)
    .await
    .map_err(ApiError::store)?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("no overlapping data for {from}/{to}")))
}

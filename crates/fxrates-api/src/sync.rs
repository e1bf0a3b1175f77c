//! Handler for `POST /sync`.

use axum::{Json, extract::State};
use fxrates_core::{RateProvider, RateStore};
use fxrates_sync::SyncReport;

use crate::{ApiState, error::ApiError};

/// `POST /sync` runs the sync engine up to today and return its report.
///
/// Answers 409 while another run holds the lock.
pub async fn run<S, P>(State(state): State<ApiState<S, P>>) -> Result<Json<SyncReport>, ApiError>
where
  S: RateStore,
  P: RateProvider,
{
  let Ok(_guard) = state.sync_lock.try_lock() else {
    return Err(ApiError::Conflict("a sync is already running".into()));
  };
  let report = state.engine.sync_to_today(None, None).await?;
  Ok(Json(report))
}

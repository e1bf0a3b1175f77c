//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use fxrates_core::{StoreError, StoreErrorKind};
use fxrates_sync::SyncError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {source}")]
  Store {
    kind:   StoreErrorKind,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error(transparent)]
  Sync(#[from] SyncError),
}

impl ApiError {
  /// Wrap a store failure, keeping its classification for the status code.
  pub fn store<E: StoreError>(e: E) -> Self {
    ApiError::Store { kind: e.kind(), source: Box::new(e) }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Store { kind, .. } => match kind {
        StoreErrorKind::UnknownCurrency => StatusCode::BAD_REQUEST,
        StoreErrorKind::EmptyStore | StoreErrorKind::NoData => StatusCode::NOT_FOUND,
        StoreErrorKind::DivisionByZero => StatusCode::UNPROCESSABLE_ENTITY,
        StoreErrorKind::SchemaMutationFailed
        | StoreErrorKind::CatalogWriteFailed
        | StoreErrorKind::UpsertFailed
        | StoreErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
      },
      ApiError::Sync(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self {
      ApiError::NotFound(m) | ApiError::BadRequest(m) | ApiError::Conflict(m) => m.clone(),
      ApiError::Store { source, .. } => source.to_string(),
      ApiError::Sync(e) => e.to_string(),
    };
    if status.is_server_error() {
      tracing::error!(%status, error = %message, "request failed");
    }
    (status, Json(json!({ "error": message }))).into_response()
  }
}

/// Parse a path or query currency code, answering 400 on malformed input.
pub(crate) fn parse_code(raw: &str) -> Result<fxrates_core::CurrencyCode, ApiError> {
  fxrates_core::CurrencyCode::parse(raw).map_err(|e| ApiError::BadRequest(e.to_string()))
}

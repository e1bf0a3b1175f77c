//! JSON REST API for fxrates.
//!
//! Exposes an axum [`Router`] backed by any [`RateStore`] plus the
//! [`RateProvider`] used by `POST /sync`. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", fxrates_api::api_router(ApiState::new(store, provider)))
//! ```

pub mod chart;
pub mod currencies;
pub mod error;
pub mod rates;
pub mod sync;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use fxrates_core::{RateProvider, RateStore, chart::DEFAULT_MAX_POINTS};
use fxrates_sync::SyncEngine;
use tokio::sync::Mutex;

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S, P> {
  pub store:      Arc<S>,
  pub engine:     SyncEngine<S, P>,
  /// Point budget for charts and series when the request names none.
  pub max_points: usize,
  /// Held for the duration of a sync; at most one run at a time.
  sync_lock:      Arc<Mutex<()>>,
}

impl<S, P> Clone for ApiState<S, P> {
  fn clone(&self) -> Self {
    Self {
      store:      self.store.clone(),
      engine:     self.engine.clone(),
      max_points: self.max_points,
      sync_lock:  self.sync_lock.clone(),
    }
  }
}

impl<S: RateStore, P: RateProvider> ApiState<S, P> {
  pub fn new(store: Arc<S>, provider: Arc<P>) -> Self {
    Self {
      engine: SyncEngine::new(store.clone(), provider),
      store,
      max_points: DEFAULT_MAX_POINTS,
      sync_lock: Arc::default(),
    }
  }

  pub fn with_max_points(mut self, max_points: usize) -> Self {
    self.max_points = max_points;
    self
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, P>(state: ApiState<S, P>) -> Router<()>
where
  S: RateStore + 'static,
  P: RateProvider + 'static,
{
  Router::new()
    // Dates
    .route("/dates/latest", get(rates::latest_date::<S, P>))
    // Currencies
    .route("/currencies", get(currencies::list::<S, P>))
    .route("/currencies/names", get(currencies::names::<S, P>))
    .route("/currencies/{code}/range", get(currencies::range::<S, P>))
    // Rates
    .route("/rate", get(rates::latest::<S, P>))
    .route("/rates/{code}", get(rates::on_date::<S, P>))
    .route("/rates/{code}/series", get(rates::series::<S, P>))
    // Chart
    .route("/chart", get(chart::handler::<S, P>))
    // Sync
    .route("/sync", post(sync::run::<S, P>))
    .with_state(state)
}

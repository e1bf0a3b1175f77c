//! Core types and trait definitions for the fxrates exchange-rate store.
//!
//! No HTTP or database dependencies live here. Storage backends implement
//! [`RateStore`] and remote sources implement [`RateProvider`]; the sync
//! engine, API and CLI only ever see these traits.

// Native `async fn` in traits; futures are declared `Send` where it matters.
#![allow(async_fn_in_trait)]

pub mod chart;
pub mod currency;
pub mod error;
pub mod provider;
pub mod store;

pub use currency::{CurrencyCode, CurrencyName, is_valid_observation};
pub use error::{Error, Result};
pub use provider::RateProvider;
pub use store::{RateSeries, RateStore, StoreError, StoreErrorKind};

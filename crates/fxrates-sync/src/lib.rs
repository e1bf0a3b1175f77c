//! Incremental synchronisation of a [`RateStore`] with a [`RateProvider`].
//!
//! A run walks forward one calendar day at a time from the day after the
//! store's latest date up to "today", pulling each day's USD-based table and
//! writing it through the store. Only an unreadable latest date aborts a run;
//! every other failure is confined to one day or one (day, currency) pair and
//! recorded in the returned [`SyncReport`].
//!
//! The engine does not guard against concurrent runs. Callers serialise
//! invocations themselves (see the `/sync` handler in `fxrates-api`).
//!
//! [`RateStore`]: fxrates_core::RateStore
//! [`RateProvider`]: fxrates_core::RateProvider

mod engine;
mod report;

pub mod error;

pub use engine::{ProgressSink, StatusSink, SyncEngine};
pub use error::SyncError;
pub use report::{FailureStage, SyncFailure, SyncReport};

#[cfg(test)]
mod tests;

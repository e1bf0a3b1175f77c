//! [Open Exchange Rates](https://openexchangerates.org) client implementing
//! [`fxrates_core::RateProvider`].

mod client;
mod parse;

pub mod error;

pub use client::{DEFAULT_BASE_URL, OxrClient, OxrConfig};
pub use error::{Error, Result};

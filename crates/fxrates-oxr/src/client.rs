//! Async HTTP client for the Open Exchange Rates API.

use std::{
  collections::{BTreeMap, HashMap},
  fmt,
  sync::Arc,
  time::Duration,
};

use chrono::NaiveDate;
use fxrates_core::{CurrencyCode, RateProvider};
use reqwest::Client;
use tokio::sync::OnceCell;

use crate::{
  Error, Result,
  parse::{parse_names, parse_rates},
};

pub const DEFAULT_BASE_URL: &str = "https://openexchangerates.org/api";

/// Connection settings for the Open Exchange Rates API.
#[derive(Clone)]
pub struct OxrConfig {
  pub base_url: String,
  /// The `app_id` query parameter.
  pub app_id:   String,
  pub timeout:  Duration,
}

impl Default for OxrConfig {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_BASE_URL.to_string(),
      app_id:   String::new(),
      timeout:  Duration::from_secs(30),
    }
  }
}

impl fmt::Debug for OxrConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("OxrConfig")
      .field("base_url", &self.base_url)
      .field("app_id", &"<redacted>")
      .field("timeout", &self.timeout)
      .finish()
  }
}

/// Async HTTP client for historical USD-based rates and currency names.
///
/// Cheap to clone. The inner [`reqwest::Client`] is `Arc`-based and clones
/// share one currency-name cache.
#[derive(Clone)]
pub struct OxrClient {
  client: Client,
  config: OxrConfig,
  names:  Arc<OnceCell<HashMap<String, String>>>,
}

impl OxrClient {
  pub fn new(config: OxrConfig) -> Result<Self> {
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { client, config, names: Arc::default() })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  /// `GET /historical/YYYY-MM-DD.json?app_id=...`
  pub async fn historical(&self, date: NaiveDate) -> Result<BTreeMap<String, f64>> {
    let resp = self
      .client
      .get(self.url(&format!("/historical/{date}.json")))
      .query(&[("app_id", self.config.app_id.as_str())])
      .send()
      .await?;

    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
      tracing::warn!(%date, %status, "historical rates request was not successful");
    }
    Ok(parse_rates(&body))
  }

  /// `GET /currencies.json`, fetched once and cached for the client's lifetime.
  ///
  /// A failed fetch is not cached; the next call retries.
  pub async fn currency_names(&self) -> Result<&HashMap<String, String>> {
    self
      .names
      .get_or_try_init(|| async {
        let body = self
          .client
          .get(self.url("/currencies.json"))
          .send()
          .await?
          .error_for_status()?
          .text()
          .await?;
        let names = parse_names(&body)?;
        tracing::info!(count = names.len(), "loaded currency names");
        Ok::<_, Error>(names)
      })
      .await
  }
}

impl RateProvider for OxrClient {
  type Error = Error;

  async fn rates_for_date(&self, date: NaiveDate) -> Result<BTreeMap<String, f64>> {
    self.historical(date).await
  }

  async fn display_name_for_code(&self, code: &CurrencyCode) -> Result<Option<String>> {
    Ok(self.currency_names().await?.get(code.as_str()).cloned())
  }
}

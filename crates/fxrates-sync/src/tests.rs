//! Sync engine tests against an in-memory SQLite store and a scripted provider.

use std::{
  collections::{BTreeMap, HashMap, HashSet},
  sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
  },
};

use chrono::NaiveDate;
use fxrates_core::{
  CurrencyCode, CurrencyName, RateProvider, RateSeries, RateStore, StoreError, StoreErrorKind,
};
use fxrates_store_sqlite::SqliteStore;

use crate::{FailureStage, SyncEngine, SyncError};

fn d(s: &str) -> NaiveDate { s.parse().unwrap() }

fn code(s: &str) -> CurrencyCode { CurrencyCode::parse(s).unwrap() }

fn rates(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
  pairs.iter().map(|(c, v)| ((*c).to_owned(), *v)).collect()
}

// ─── Scripted provider ───────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("provider unavailable: {0}")]
struct ProviderDown(String);

/// Serves canned tables per date and counts every call.
#[derive(Default)]
struct ScriptedProvider {
  days:         HashMap<NaiveDate, BTreeMap<String, f64>>,
  failing_days: HashSet<NaiveDate>,
  names:        HashMap<String, String>,
  names_down:   bool,
  rate_calls:   AtomicUsize,
  name_calls:   AtomicUsize,
}

impl ScriptedProvider {
  fn day(mut self, date: &str, pairs: &[(&str, f64)]) -> Self {
    self.days.insert(d(date), rates(pairs));
    self
  }

  fn failing(mut self, date: &str) -> Self {
    self.failing_days.insert(d(date));
    self
  }

  fn name(mut self, code: &str, name: &str) -> Self {
    self.names.insert(code.to_owned(), name.to_owned());
    self
  }
}

impl RateProvider for ScriptedProvider {
  type Error = ProviderDown;

  async fn rates_for_date(&self, date: NaiveDate) -> Result<BTreeMap<String, f64>, ProviderDown> {
    self.rate_calls.fetch_add(1, Ordering::SeqCst);
    if self.failing_days.contains(&date) {
      return Err(ProviderDown(date.to_string()));
    }
    Ok(self.days.get(&date).cloned().unwrap_or_default())
  }

  async fn display_name_for_code(&self, code: &CurrencyCode) -> Result<Option<String>, ProviderDown> {
    self.name_calls.fetch_add(1, Ordering::SeqCst);
    if self.names_down {
      return Err(ProviderDown("currencies.json".into()));
    }
    Ok(self.names.get(code.as_str()).cloned())
  }
}

// ─── Flaky store ─────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
enum FlakyError {
  #[error(transparent)]
  Inner(#[from] fxrates_store_sqlite::Error),
  #[error("injected {0} failure")]
  Injected(&'static str),
}

impl StoreError for FlakyError {
  fn kind(&self) -> StoreErrorKind {
    match self {
      FlakyError::Inner(e) => e.kind(),
      FlakyError::Injected(_) => StoreErrorKind::Storage,
    }
  }
}

/// Delegates to a real store but fails chosen writes for chosen codes.
struct FlakyStore {
  inner:         SqliteStore,
  fail_columns:  HashSet<CurrencyCode>,
  fail_names:    HashSet<CurrencyCode>,
  fail_upserts:  HashSet<CurrencyCode>,
  fail_listing:  bool,
}

impl FlakyStore {
  fn new(inner: SqliteStore) -> Self {
    Self {
      inner,
      fail_columns: HashSet::new(),
      fail_names: HashSet::new(),
      fail_upserts: HashSet::new(),
      fail_listing: false,
    }
  }
}

impl RateStore for FlakyStore {
  type Error = FlakyError;

  async fn latest_date(&self) -> Result<NaiveDate, FlakyError> {
    Ok(self.inner.latest_date().await?)
  }

  async fn first_valid_date(&self, code: &CurrencyCode) -> Result<Option<NaiveDate>, FlakyError> {
    Ok(self.inner.first_valid_date(code).await?)
  }

  async fn last_valid_date(&self, code: &CurrencyCode) -> Result<Option<NaiveDate>, FlakyError> {
    Ok(self.inner.last_valid_date(code).await?)
  }

  async fn latest_rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Result<f64, FlakyError> {
    Ok(self.inner.latest_rate(from, to).await?)
  }

  async fn rate_on(&self, code: &CurrencyCode, date: NaiveDate) -> Result<Option<f64>, FlakyError> {
    Ok(self.inner.rate_on(code, date).await?)
  }

  async fn downsample(
    &self,
    code: &CurrencyCode,
    start: NaiveDate,
    end: NaiveDate,
    max_points: usize,
  ) -> Result<RateSeries, FlakyError> {
    Ok(self.inner.downsample(code, start, end, max_points).await?)
  }

  async fn add_currency_column(&self, code: &CurrencyCode) -> Result<bool, FlakyError> {
    if self.fail_columns.contains(code) {
      return Err(FlakyError::Injected("column"));
    }
    Ok(self.inner.add_currency_column(code).await?)
  }

  async fn add_currency_name(&self, code: &CurrencyCode, full_name: &str) -> Result<(), FlakyError> {
    if self.fail_names.contains(code) {
      return Err(FlakyError::Injected("name"));
    }
    Ok(self.inner.add_currency_name(code, full_name).await?)
  }

  async fn upsert_rate(&self, code: &CurrencyCode, date: NaiveDate, value: f64) -> Result<(), FlakyError> {
    if self.fail_upserts.contains(code) {
      return Err(FlakyError::Injected("upsert"));
    }
    Ok(self.inner.upsert_rate(code, date, value).await?)
  }

  async fn list_known_codes(&self) -> Result<Vec<CurrencyCode>, FlakyError> {
    if self.fail_listing {
      return Err(FlakyError::Injected("listing"));
    }
    Ok(self.inner.list_known_codes().await?)
  }

  async fn list_currency_names(&self) -> Result<Vec<CurrencyName>, FlakyError> {
    Ok(self.inner.list_currency_names().await?)
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

/// A store whose latest row is 2025-01-01 with a USD column and catalog entry.
async fn seeded_store() -> SqliteStore {
  let store = SqliteStore::open_in_memory().await.unwrap();
  store.add_currency_column(&code("USD")).await.unwrap();
  store.add_currency_name(&code("USD"), "United States Dollar").await.unwrap();
  store.upsert_rate(&code("USD"), d("2025-01-01"), 1.0).await.unwrap();
  store
}

#[derive(Default)]
struct Recorder {
  progress: Mutex<Vec<(u32, u32)>>,
  status:   Mutex<Vec<String>>,
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_store_aborts_before_any_fetch() {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let provider = Arc::new(ScriptedProvider::default().day("2025-01-02", &[("USD", 1.0)]));
  let engine = SyncEngine::new(store, provider.clone());

  let rec = Recorder::default();
  let progress = |p: u32, t: u32| rec.progress.lock().unwrap().push((p, t));
  let status = |m: &str| rec.status.lock().unwrap().push(m.to_owned());

  let result = engine.sync_until(d("2025-01-04"), Some(&progress), Some(&status)).await;

  assert!(matches!(result, Err(SyncError::LatestDate(_))));
  assert_eq!(provider.rate_calls.load(Ordering::SeqCst), 0);
  assert_eq!(provider.name_calls.load(Ordering::SeqCst), 0);
  assert!(rec.progress.lock().unwrap().is_empty());
  assert!(rec.status.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_fetch_still_counts_toward_progress() {
  let store = Arc::new(seeded_store().await);
  let provider = Arc::new(
    ScriptedProvider::default()
      .day("2025-01-02", &[("USD", 1.0), ("EUR", 0.96)])
      .failing("2025-01-03")
      .day("2025-01-04", &[("USD", 1.0), ("EUR", 0.97)]),
  );
  let engine = SyncEngine::new(store.clone(), provider.clone());

  let rec = Recorder::default();
  let progress = |p: u32, t: u32| rec.progress.lock().unwrap().push((p, t));
  let status = |m: &str| rec.status.lock().unwrap().push(m.to_owned());

  let report = engine
    .sync_until(d("2025-01-04"), Some(&progress), Some(&status))
    .await
    .unwrap();

  assert_eq!(*rec.progress.lock().unwrap(), [(1, 3), (2, 3), (3, 3)]);
  assert_eq!(
    *rec.status.lock().unwrap(),
    ["Updating: 2025-01-02", "Updating: 2025-01-03", "Updating: 2025-01-04"]
  );
  assert_eq!(provider.rate_calls.load(Ordering::SeqCst), 3);

  assert_eq!(store.rate_on(&code("EUR"), d("2025-01-02")).await.unwrap(), Some(0.96));
  assert_eq!(store.rate_on(&code("USD"), d("2025-01-03")).await.unwrap(), None);
  assert_eq!(store.rate_on(&code("EUR"), d("2025-01-04")).await.unwrap(), Some(0.97));
  assert_eq!(store.latest_date().await.unwrap(), d("2025-01-04"));

  assert_eq!(report.total_days, 3);
  assert_eq!(report.processed_days, 3);
  assert_eq!(report.rates_written, 4);
  assert_eq!(report.failures.len(), 1);
  assert_eq!(report.failures[0].stage, FailureStage::Fetch);
  assert_eq!(report.skipped_days().collect::<Vec<_>>(), [d("2025-01-03")]);
}

#[tokio::test]
async fn sinks_are_optional() {
  let store = Arc::new(seeded_store().await);
  let provider = Arc::new(ScriptedProvider::default().day("2025-01-02", &[("USD", 1.0)]));
  let engine = SyncEngine::new(store.clone(), provider);

  let report = engine.sync_until(d("2025-01-02"), None, None).await.unwrap();
  assert!(report.is_clean());
  assert_eq!(report.processed_days, 1);
  assert_eq!(store.latest_date().await.unwrap(), d("2025-01-02"));
}

#[tokio::test]
async fn up_to_date_store_makes_no_calls() {
  let store = Arc::new(seeded_store().await);
  let provider = Arc::new(ScriptedProvider::default());
  let engine = SyncEngine::new(store, provider.clone());

  let rec = Recorder::default();
  let progress = |p: u32, t: u32| rec.progress.lock().unwrap().push((p, t));

  let report = engine.sync_until(d("2025-01-01"), Some(&progress), None).await.unwrap();
  assert_eq!(report.total_days, 1);
  assert_eq!(report.processed_days, 0);
  assert_eq!(provider.rate_calls.load(Ordering::SeqCst), 0);
  assert!(rec.progress.lock().unwrap().is_empty());
}

#[tokio::test]
async fn new_currency_gets_column_and_name_once() {
  let store = Arc::new(seeded_store().await);
  let provider = Arc::new(
    ScriptedProvider::default()
      .day("2025-01-02", &[("USD", 1.0), ("CHF", 0.90)])
      .day("2025-01-03", &[("USD", 1.0), ("CHF", 0.91)])
      .name("CHF", "Swiss Franc"),
  );
  let engine = SyncEngine::new(store.clone(), provider.clone());

  let report = engine.sync_until(d("2025-01-03"), None, None).await.unwrap();

  assert!(report.is_clean());
  assert_eq!(report.currencies_added, vec![code("CHF")]);
  assert_eq!(report.names_added, 1);
  assert_eq!(provider.name_calls.load(Ordering::SeqCst), 1);

  let codes = store.list_known_codes().await.unwrap();
  assert_eq!(codes, vec![code("CHF"), code("USD")]);
  let names = store.list_currency_names().await.unwrap();
  assert_eq!(names.last().unwrap().full_name, "Swiss Franc");
  assert_eq!(store.rate_on(&code("CHF"), d("2025-01-03")).await.unwrap(), Some(0.91));
}

#[tokio::test]
async fn missing_or_failed_name_falls_back_to_code() {
  let store = Arc::new(seeded_store().await);
  let provider = Arc::new(ScriptedProvider {
    names_down: true,
    ..ScriptedProvider::default().day("2025-01-02", &[("SEK", 10.9)])
  });
  let engine = SyncEngine::new(store.clone(), provider);
  engine.sync_until(d("2025-01-02"), None, None).await.unwrap();

  let blank = Arc::new(
    ScriptedProvider::default()
      .day("2025-01-03", &[("NOK", 11.2)])
      .name("NOK", "   "),
  );
  SyncEngine::new(store.clone(), blank)
    .sync_until(d("2025-01-03"), None, None)
    .await
    .unwrap();

  let names: HashMap<_, _> = store
    .list_currency_names()
    .await
    .unwrap()
    .into_iter()
    .map(|n| (n.code, n.full_name))
    .collect();
  assert_eq!(names[&code("SEK")], "SEK");
  assert_eq!(names[&code("NOK")], "NOK");
}

#[tokio::test]
async fn invalid_provider_code_is_skipped_and_recorded() {
  let store = Arc::new(seeded_store().await);
  let provider = Arc::new(
    ScriptedProvider::default().day("2025-01-02", &[("USD", 1.0), ("BAD-CODE", 3.0)]),
  );
  let engine = SyncEngine::new(store.clone(), provider);

  let report = engine.sync_until(d("2025-01-02"), None, None).await.unwrap();
  assert_eq!(report.rates_written, 1);
  assert_eq!(report.failures.len(), 1);
  assert_eq!(report.failures[0].stage, FailureStage::InvalidCode);
  assert_eq!(report.failures[0].code.as_deref(), Some("BAD-CODE"));
}

#[tokio::test]
async fn per_currency_failures_do_not_stop_the_day() {
  let inner = seeded_store().await;
  let mut flaky = FlakyStore::new(inner);
  flaky.fail_columns.insert(code("AAA"));
  flaky.fail_names.insert(code("BBB"));
  flaky.fail_upserts.insert(code("CCC"));
  let store = Arc::new(flaky);

  let provider = Arc::new(ScriptedProvider::default().day(
    "2025-01-02",
    &[("AAA", 1.0), ("BBB", 2.0), ("CCC", 3.0), ("DDD", 4.0)],
  ));
  let engine = SyncEngine::new(store.clone(), provider);

  let report = engine.sync_until(d("2025-01-02"), None, None).await.unwrap();

  let stages: Vec<(Option<&str>, FailureStage)> = report
    .failures
    .iter()
    .map(|f| (f.code.as_deref(), f.stage))
    .collect();
  assert_eq!(stages, [
    (Some("AAA"), FailureStage::AddColumn),
    (Some("BBB"), FailureStage::AddName),
    (Some("CCC"), FailureStage::Upsert),
  ]);

  // BBB's catalog write failed but its rate still landed.
  assert_eq!(store.rate_on(&code("BBB"), d("2025-01-02")).await.unwrap(), Some(2.0));
  assert_eq!(store.rate_on(&code("CCC"), d("2025-01-02")).await.unwrap(), None);
  assert_eq!(store.rate_on(&code("DDD"), d("2025-01-02")).await.unwrap(), Some(4.0));
  assert!(store.rate_on(&code("AAA"), d("2025-01-02")).await.is_err());
  assert_eq!(report.rates_written, 2);
}

#[tokio::test]
async fn next_run_resumes_after_latest_date() {
  let store = Arc::new(seeded_store().await);
  let provider = Arc::new(
    ScriptedProvider::default()
      .day("2025-01-02", &[("USD", 1.0)])
      .day("2025-01-03", &[("USD", 1.0)]),
  );
  let engine = SyncEngine::new(store.clone(), provider.clone());

  engine.sync_until(d("2025-01-02"), None, None).await.unwrap();
  let report = engine.sync_until(d("2025-01-03"), None, None).await.unwrap();

  assert_eq!(report.first_missing, d("2025-01-03"));
  assert_eq!(report.total_days, 1);
  assert_eq!(provider.rate_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn existing_columns_are_not_reported_as_added() {
  let mut flaky = FlakyStore::new(seeded_store().await);
  flaky.fail_listing = true;
  let store = Arc::new(flaky);

  let provider = Arc::new(
    ScriptedProvider::default().day("2025-01-02", &[("USD", 1.0), ("CHF", 0.9)]),
  );
  let engine = SyncEngine::new(store.clone(), provider);

  // The code set cannot be loaded, so USD goes through the column add again.
  let report = engine.sync_until(d("2025-01-02"), None, None).await.unwrap();

  assert!(report.is_clean());
  assert_eq!(report.currencies_added, vec![code("CHF")]);
  assert_eq!(report.rates_written, 2);
  assert_eq!(store.rate_on(&code("USD"), d("2025-01-02")).await.unwrap(), Some(1.0));
}

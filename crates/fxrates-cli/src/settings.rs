//! Layered runtime settings: defaults, then `fxrates.toml`, then `FXRATES_*`
//! environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use fxrates_core::chart::DEFAULT_MAX_POINTS;
use fxrates_oxr::OxrConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  /// SQLite file holding the rate table and currency catalog. `~` is expanded.
  #[serde(default = "default_store_path")]
  pub store_path:       PathBuf,
  /// Open Exchange Rates `app_id`.
  #[serde(default)]
  pub app_id:           String,
  #[serde(default = "default_base_url")]
  pub base_url:         String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs:     u64,
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  #[serde(default = "default_chart_max_points")]
  pub chart_max_points: usize,
}

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/fxrates/rates.db") }

fn default_base_url() -> String { fxrates_oxr::DEFAULT_BASE_URL.to_string() }

fn default_timeout_secs() -> u64 { 30 }

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_chart_max_points() -> usize { DEFAULT_MAX_POINTS }

impl Settings {
  /// Read `path` if it exists, then overlay `FXRATES_*` variables.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings: Settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("FXRATES"))
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise settings")?;
    Ok(Settings { store_path: expand_tilde(&settings.store_path), ..settings })
  }

  pub fn oxr(&self) -> OxrConfig {
    OxrConfig {
      base_url: self.base_url.clone(),
      app_id:   self.app_id.clone(),
      timeout:  Duration::from_secs(self.timeout_secs),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

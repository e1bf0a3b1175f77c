//! Response body decoding, kept free of I/O so it can be tested directly.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::Result;

/// Extract the `rates` object of a historical-rates response.
///
/// Anything that is not a JSON object with a `rates` object (error payloads,
/// HTML from a proxy, an empty body) yields an empty map. Non-numeric rate
/// entries are dropped.
pub fn parse_rates(body: &str) -> BTreeMap<String, f64> {
  let trimmed = body.trim_start();
  if !trimmed.starts_with('{') {
    tracing::error!(body = %truncate(trimmed), "rates response is not a JSON object");
    return BTreeMap::new();
  }

  let json: Value = match serde_json::from_str(trimmed) {
    Ok(v) => v,
    Err(e) => {
      tracing::error!(error = %e, "rates response is not valid JSON");
      return BTreeMap::new();
    }
  };

  let Some(rates) = json.get("rates").and_then(Value::as_object) else {
    let message = json
      .get("description")
      .or_else(|| json.get("message"))
      .and_then(Value::as_str)
      .unwrap_or("unknown error");
    tracing::error!(reason = message, "rates response has no rates");
    return BTreeMap::new();
  };

  rates
    .iter()
    .filter_map(|(code, value)| match value.as_f64() {
      Some(rate) => Some((code.clone(), rate)),
      None => {
        tracing::warn!(%code, %value, "ignoring non-numeric rate");
        None
      }
    })
    .collect()
}

/// Decode the flat `{"USD": "United States Dollar", ...}` currencies map.
pub fn parse_names(body: &str) -> Result<HashMap<String, String>> {
  Ok(serde_json::from_str(body)?)
}

fn truncate(s: &str) -> &str {
  match s.char_indices().nth(80) {
    Some((i, _)) => &s[..i],
    None => s,
  }
}

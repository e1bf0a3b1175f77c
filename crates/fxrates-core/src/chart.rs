//! Cross-rate chart series built on top of [`RateStore`] queries.
//!
//! Both currencies are downsampled over the window where each has valid
//! observations, then combined date-by-date into `to / from`.

use std::{fmt, str::FromStr};

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{
  Error,
  currency::{CurrencyCode, is_valid_observation},
  store::{RateSeries, RateStore},
};

/// Point budget used when a caller does not ask for one.
pub const DEFAULT_MAX_POINTS: usize = 300;

// ─── Period ──────────────────────────────────────────────────────────────────

/// How far back from the end of the overlap window a chart reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartPeriod {
  Day,
  Week,
  Month,
  Year,
  #[serde(rename = "5y")]
  FiveYears,
  #[default]
  All,
}

impl ChartPeriod {
  /// First chart date for an overlap window `[overlap_start, overlap_end]`.
  ///
  /// Never earlier than `overlap_start`.
  pub fn start_for(self, overlap_start: NaiveDate, overlap_end: NaiveDate) -> NaiveDate {
    let start = match self {
      ChartPeriod::All => return overlap_start,
      ChartPeriod::Day => overlap_end.checked_sub_days(Days::new(1)),
      ChartPeriod::Week => overlap_end.checked_sub_days(Days::new(7)),
      ChartPeriod::Month => overlap_end.checked_sub_months(Months::new(1)),
      ChartPeriod::Year => overlap_end.checked_sub_months(Months::new(12)),
      ChartPeriod::FiveYears => overlap_end.checked_sub_months(Months::new(60)),
    };
    start.map_or(overlap_start, |s| s.max(overlap_start))
  }
}

impl FromStr for ChartPeriod {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Error> {
    match s.trim().to_ascii_lowercase().as_str() {
      "day" => Ok(ChartPeriod::Day),
      "week" => Ok(ChartPeriod::Week),
      "month" => Ok(ChartPeriod::Month),
      "year" => Ok(ChartPeriod::Year),
      "5y" | "five_years" => Ok(ChartPeriod::FiveYears),
      "all" => Ok(ChartPeriod::All),
      _ => Err(Error::UnknownChartPeriod(s.to_owned())),
    }
  }
}

impl fmt::Display for ChartPeriod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      ChartPeriod::Day => "day",
      ChartPeriod::Week => "week",
      ChartPeriod::Month => "month",
      ChartPeriod::Year => "year",
      ChartPeriod::FiveYears => "5y",
      ChartPeriod::All => "all",
    })
  }
}

// ─── Trend ───────────────────────────────────────────────────────────────────

/// Direction of a series from its first to its last point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
  Up,
  Down,
  Flat,
}

impl Trend {
  pub fn of(series: &RateSeries) -> Self {
    let (Some((_, first)), Some((_, last))) =
      (series.first_key_value(), series.last_key_value())
    else {
      return Trend::Flat;
    };
    if last > first {
      Trend::Up
    } else if last < first {
      Trend::Down
    } else {
      Trend::Flat
    }
  }
}

// ─── Series ──────────────────────────────────────────────────────────────────

/// A ready-to-plot cross-rate series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
  pub from:   CurrencyCode,
  pub to:     CurrencyCode,
  pub start:  NaiveDate,
  pub end:    NaiveDate,
  pub trend:  Trend,
  pub points: RateSeries,
}

/// Combine two USD-based series into `to / from`, keyed by `from`'s dates.
///
/// Dates missing from `to_series`, or invalid on either side, are skipped.
pub fn cross_series(from_series: &RateSeries, to_series: &RateSeries) -> RateSeries {
  from_series
    .iter()
    .filter_map(|(date, &from)| {
      let to = to_series.get(date).copied();
      (is_valid_observation(Some(from)) && is_valid_observation(to))
        .then(|| (*date, to.unwrap_or_default() / from))
    })
    .collect()
}

/// The window in which both `from` and `to` have valid observations.
pub async fn overlapping_range<S: RateStore>(
  store: &S,
  from: &CurrencyCode,
  to: &CurrencyCode,
) -> Result<Option<(NaiveDate, NaiveDate)>, S::Error> {
  let bounds = (
    store.first_valid_date(from).await?,
    store.last_valid_date(from).await?,
    store.first_valid_date(to).await?,
    store.last_valid_date(to).await?,
  );
  let (Some(from_start), Some(from_end), Some(to_start), Some(to_end)) = bounds else {
    return Ok(None);
  };
  let start = from_start.max(to_start);
  let end = from_end.min(to_end);
  Ok((start <= end).then_some((start, end)))
}

/// Build the cross-rate chart for `from → to` over `period`.
///
/// Returns `None` when the currencies never overlap or no point survives.
pub async fn chart_series<S: RateStore>(
  store: &S,
  from: &CurrencyCode,
  to: &CurrencyCode,
  period: ChartPeriod,
  max_points: usize,
) -> Result<Option<ChartSeries>, S::Error> {
  let Some((overlap_start, end)) = overlapping_range(store, from, to).await? else {
    return Ok(None);
  };
  let start = period.start_for(overlap_start, end);

  let from_series = store.downsample(from, start, end, max_points).await?;
  let to_series = store.downsample(to, start, end, max_points).await?;
  let points = cross_series(&from_series, &to_series);
  if points.is_empty() {
    return Ok(None);
  }

  Ok(Some(ChartSeries {
    from: from.clone(),
    to: to.clone(),
    start,
    end,
    trend: Trend::of(&points),
    points,
  }))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(s: &str) -> NaiveDate { s.parse().unwrap() }

  #[test]
  fn period_start_is_clamped_to_overlap() {
    let start = d("2025-05-20");
    let end = d("2025-06-01");
    assert_eq!(ChartPeriod::All.start_for(start, end), start);
    assert_eq!(ChartPeriod::Day.start_for(start, end), d("2025-05-31"));
    assert_eq!(ChartPeriod::Week.start_for(start, end), d("2025-05-25"));
    assert_eq!(ChartPeriod::Month.start_for(start, end), start);
    assert_eq!(ChartPeriod::Year.start_for(d("1994-01-03"), end), d("2024-06-01"));
    assert_eq!(ChartPeriod::FiveYears.start_for(d("1994-01-03"), end), d("2020-06-01"));
  }

  #[test]
  fn period_parses_its_display_form() {
    for p in [
      ChartPeriod::Day,
      ChartPeriod::Week,
      ChartPeriod::Month,
      ChartPeriod::Year,
      ChartPeriod::FiveYears,
      ChartPeriod::All,
    ] {
      assert_eq!(p.to_string().parse::<ChartPeriod>().unwrap(), p);
    }
    assert!("fortnight".parse::<ChartPeriod>().is_err());
  }

  #[test]
  fn cross_series_skips_invalid_and_unmatched_dates() {
    let from: RateSeries = [
      (d("2025-01-01"), 2.0),
      (d("2025-01-02"), 4.0),
      (d("2025-01-03"), -1.0),
      (d("2025-01-04"), 5.0),
    ]
    .into_iter()
    .collect();
    let to: RateSeries = [
      (d("2025-01-01"), 1.0),
      (d("2025-01-02"), 0.0),
      (d("2025-01-03"), 3.0),
    ]
    .into_iter()
    .collect();

    let cross = cross_series(&from, &to);
    assert_eq!(cross.len(), 1);
    assert_eq!(cross[&d("2025-01-01")], 0.5);
  }

  #[test]
  fn trend_compares_first_and_last() {
    let mut s = RateSeries::new();
    assert_eq!(Trend::of(&s), Trend::Flat);
    s.insert(d("2025-01-01"), 1.0);
    s.insert(d("2025-01-02"), 0.5);
    s.insert(d("2025-01-03"), 1.5);
    assert_eq!(Trend::of(&s), Trend::Up);
    s.insert(d("2025-01-04"), 0.9);
    assert_eq!(Trend::of(&s), Trend::Down);
    s.insert(d("2025-01-05"), 1.0);
    assert_eq!(Trend::of(&s), Trend::Flat);
  }
}

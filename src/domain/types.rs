//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory across the merge / derive / aggregate stages
//! - exported to CSV/JSON
//! - reloaded later for charting or the terminal viewer

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Trailing window (in records) for the rolling PR average.
pub const DEFAULT_ROLLING_WINDOW: usize = 30;

/// Record counts for the "last N records" PR statistics box.
pub const TRAILING_WINDOWS: [usize; 4] = [7, 30, 60, 90];

/// First calendar month of a fiscal year (July).
pub const FISCAL_YEAR_START_MONTH: u32 = 7;

/// Which daily measurement a source file carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    /// Performance Ratio.
    Pr,
    /// Global Horizontal Irradiance.
    Ghi,
}

impl Metric {
    /// Exact (case-sensitive) CSV column holding the value.
    pub fn column(self) -> &'static str {
        match self {
            Metric::Pr => "PR",
            Metric::Ghi => "GHI",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// One measurement for one date, read from one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    pub date: NaiveDate,
    pub value: f64,
    /// File the value was read from (used in diagnostics).
    pub path: PathBuf,
}

/// A PR and a GHI measurement sharing the same date.
///
/// `ghi` is `None` only when a merged CSV is read back with a blank GHI cell;
/// the pairer always fills it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinedRecord {
    pub date: NaiveDate,
    pub pr: f64,
    pub ghi: Option<f64>,
}

/// Irradiance category used for color coding.
///
/// Ordered from lowest to highest; `Unknown` sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GhiBand {
    Unknown,
    VeryLow,
    Low,
    High,
    VeryHigh,
}

impl GhiBand {
    /// The four measured bands in ascending order (legend order).
    pub const SCALE: [GhiBand; 4] = [GhiBand::VeryLow, GhiBand::Low, GhiBand::High, GhiBand::VeryHigh];

    pub fn as_str(self) -> &'static str {
        match self {
            GhiBand::Unknown => "unknown",
            GhiBand::VeryLow => "very_low",
            GhiBand::Low => "low",
            GhiBand::High => "high",
            GhiBand::VeryHigh => "very_high",
        }
    }

    /// Human-readable legend label.
    pub fn legend_label(self) -> &'static str {
        match self {
            GhiBand::Unknown => "GHI n/a",
            GhiBand::VeryLow => "<2 GHI",
            GhiBand::Low => "2-4 GHI",
            GhiBand::High => "4-6 GHI",
            GhiBand::VeryHigh => ">6 GHI",
        }
    }

    /// Chart color as RGB (navy, skyblue, orange, brown; gray when unknown).
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            GhiBand::Unknown => (128, 128, 128),
            GhiBand::VeryLow => (0, 0, 128),
            GhiBand::Low => (135, 206, 235),
            GhiBand::High => (255, 165, 0),
            GhiBand::VeryHigh => (165, 42, 42),
        }
    }
}

impl fmt::Display for GhiBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A joined record annotated with its derived fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedRecord {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "PR")]
    pub pr: f64,
    #[serde(rename = "GHI")]
    pub ghi: Option<f64>,
    /// Undefined until the trailing window is full.
    #[serde(rename = "PR_Rolling_Avg")]
    pub rolling_pr_avg: Option<f64>,
    #[serde(rename = "Budget_PR")]
    pub budget_pr: f64,
    #[serde(rename = "GHI_Band")]
    pub ghi_band: GhiBand,
    #[serde(rename = "Fiscal_Year")]
    pub fiscal_year: i32,
}

impl DerivedRecord {
    pub fn is_above_budget(&self) -> bool {
        self.pr > self.budget_pr
    }
}

/// Budget compliance for one fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalSummary {
    pub fiscal_year: i32,
    pub count: usize,
    pub above_budget: usize,
    pub percent_above: f64,
}

/// Mean PR over the last `records` entries of a series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailingAverage {
    pub records: usize,
    pub mean: f64,
}

/// Which side of a date filter a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterBound {
    Start,
    End,
}

impl fmt::Display for FilterBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterBound::Start => f.write_str("start"),
            FilterBound::End => f.write_str("end"),
        }
    }
}

/// Inclusive date range; a `None` bound is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateFilter {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn describe(&self) -> String {
        let fmt = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "*".to_string());
        format!("{} .. {}", fmt(self.start), fmt(self.end))
    }
}

/// Declining PR budget: `base * annual_decay ^ budget_year_index`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetSchedule {
    /// Budget PR in the first budget year.
    pub base: f64,
    /// Multiplicative factor applied once per fiscal year.
    pub annual_decay: f64,
    /// Calendar year the schedule is anchored to.
    pub baseline_year: i32,
}

impl Default for BudgetSchedule {
    fn default() -> Self {
        Self {
            base: 73.9,
            annual_decay: 0.992,
            baseline_year: 2019,
        }
    }
}

/// Accepted range for `BudgetSchedule::baseline_year`.
pub const MIN_BASELINE_YEAR: i32 = 1900;
pub const MAX_BASELINE_YEAR: i32 = 2200;

/// Tunables for the derived-metric stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricConfig {
    pub rolling_window: usize,
    pub budget: BudgetSchedule,
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            rolling_window: DEFAULT_ROLLING_WINDOW,
            budget: BudgetSchedule::default(),
        }
    }
}

impl MetricConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.rolling_window == 0 {
            return Err(PipelineError::InvalidConfig(
                "rolling window must be at least 1 record".to_string(),
            ));
        }
        if !(self.budget.base.is_finite() && self.budget.base > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "budget base must be finite and > 0 (got {})",
                self.budget.base
            )));
        }
        if !(MIN_BASELINE_YEAR..=MAX_BASELINE_YEAR).contains(&self.budget.baseline_year) {
            return Err(PipelineError::InvalidConfig(format!(
                "budget baseline year must be in {MIN_BASELINE_YEAR}..={MAX_BASELINE_YEAR} (got {})",
                self.budget.baseline_year
            )));
        }
        if !(self.budget.annual_decay.is_finite() && self.budget.annual_decay > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "budget decay must be finite and > 0 (got {})",
                self.budget.annual_decay
            )));
        }
        Ok(())
    }
}

/// Parse a calendar date.
///
/// Accepts `YYYY-MM-DD` and `YYYY-MM-DD HH:MM:SS`. Merged files written by
/// spreadsheet tools carry datetimes; the time of day is discarded.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d);
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.date());
    }
    Err(format!("Invalid date '{s}'. Expected YYYY-MM-DD."))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn filter_bounds_are_inclusive() {
        let f = DateFilter {
            start: Some(d(2020, 1, 1)),
            end: Some(d(2020, 1, 31)),
        };
        assert!(f.contains(d(2020, 1, 1)));
        assert!(f.contains(d(2020, 1, 31)));
        assert!(!f.contains(d(2019, 12, 31)));
        assert!(!f.contains(d(2020, 2, 1)));
        assert!(DateFilter::default().contains(d(1999, 1, 1)));
    }

    #[test]
    fn parse_date_accepts_iso_dates_and_datetimes() {
        assert_eq!(parse_date("2019-07-01").unwrap(), d(2019, 7, 1));
        assert_eq!(parse_date(" 2019-07-01 00:00:00 ").unwrap(), d(2019, 7, 1));
        assert_eq!(parse_date("2019-07-01 13:45:10").unwrap(), d(2019, 7, 1));
        assert!(parse_date("2019/07/01").is_err());
        assert!(parse_date("07/01/2019").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn metric_config_rejects_zero_window() {
        let cfg = MetricConfig {
            rolling_window: 0,
            ..MetricConfig::default()
        };
        assert!(cfg.validate().is_err());
        assert!(MetricConfig::default().validate().is_ok());
    }

    #[test]
    fn metric_config_rejects_out_of_range_baseline_year() {
        for year in [i32::MIN, 1899, 2201, i32::MAX] {
            let cfg = MetricConfig {
                budget: BudgetSchedule {
                    baseline_year: year,
                    ..BudgetSchedule::default()
                },
                ..MetricConfig::default()
            };
            assert!(cfg.validate().is_err(), "baseline {year} accepted");
        }
    }
}

//! Synthetic PR/GHI source trees.
//!
//! Produces the same on-disk layout the ingest stage reads:
//!
//! ```text
//! <out>/PR/<YYYY-MM>/<YYYY-MM-DD>.csv    Date,PR
//! <out>/GHI/<YYYY-MM>/<YYYY-MM-DD>.csv   Date,GHI
//! ```
//!
//! GHI follows a yearly cycle peaking in late June; PR tracks the budget curve
//! with a mild irradiance penalty plus noise. A configurable share of days is
//! dropped from one side so runs exercise unmatched-date reporting.

use std::f64::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Duration, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{BudgetSchedule, Metric};
use crate::error::{AppError, EXIT_INPUT, EXIT_OUTPUT};

/// Annual GHI mean and amplitude (kWh/m²/day).
const GHI_MEAN: f64 = 4.5;
const GHI_AMPLITUDE: f64 = 2.0;
/// Day of year with peak irradiance.
const GHI_PEAK_DOY: f64 = 172.0;

/// PR points lost per unit of GHI above the mean (hot, bright days run less efficiently).
const PR_GHI_SENSITIVITY: f64 = 0.6;
/// Typical PR margin over budget.
const PR_MARGIN: f64 = 1.5;

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub out_dir: PathBuf,
    pub start: NaiveDate,
    pub days: usize,
    pub seed: u64,
    /// Probability that a day is missing from one of the two trees.
    pub drop_prob: f64,
    pub budget: BudgetSchedule,
}

/// One generated day; `None` marks a side that was dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleDay {
    pub date: NaiveDate,
    pub pr: Option<f64>,
    pub ghi: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleSummary {
    pub days: usize,
    pub pr_files: usize,
    pub ghi_files: usize,
}

/// Generate the synthetic days without touching the filesystem.
pub fn sample_days(config: &SampleConfig) -> Result<Vec<SampleDay>, AppError> {
    if config.days == 0 {
        return Err(AppError::new(EXIT_INPUT, "Sample day count must be > 0."));
    }
    if !(0.0..0.5).contains(&config.drop_prob) {
        return Err(AppError::new(EXIT_INPUT, "Drop probability must be in [0, 0.5)."));
    }

    // Check the last day up front so a huge count fails before allocating.
    day_at(config.start, config.days - 1).ok_or_else(|| overflow(config))?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let ghi_noise = Normal::new(0.0, 1.2).map_err(|e| AppError::new(EXIT_INPUT, format!("Noise distribution error: {e}")))?;
    let pr_noise = Normal::new(0.0, 2.5).map_err(|e| AppError::new(EXIT_INPUT, format!("Noise distribution error: {e}")))?;

    let mut out = Vec::with_capacity(config.days);
    for i in 0..config.days {
        let date = day_at(config.start, i).ok_or_else(|| overflow(config))?;

        let season = (2.0 * PI * (f64::from(date.ordinal()) - GHI_PEAK_DOY) / 365.0).cos();
        let ghi = (GHI_MEAN + GHI_AMPLITUDE * season + ghi_noise.sample(&mut rng)).clamp(0.1, 9.5);

        let pr = config.budget.value_on(date) + PR_MARGIN - PR_GHI_SENSITIVITY * (ghi - GHI_MEAN)
            + pr_noise.sample(&mut rng);
        let pr = pr.clamp(0.0, 100.0);

        // Draw both decisions every day so the sequence is stable across drop settings.
        let dropped = rng.gen_bool(config.drop_prob);
        let drop_side = if rng.gen_bool(0.5) { Metric::Pr } else { Metric::Ghi };

        out.push(SampleDay {
            date,
            pr: (!dropped || drop_side != Metric::Pr).then_some(round4(pr)),
            ghi: (!dropped || drop_side != Metric::Ghi).then_some(round4(ghi)),
        });
    }
    Ok(out)
}

/// Generate and write both source trees under `config.out_dir`.
pub fn write_sample_trees(config: &SampleConfig) -> Result<SampleSummary, AppError> {
    let days = sample_days(config)?;
    let mut summary = SampleSummary {
        days: days.len(),
        ..SampleSummary::default()
    };

    for day in &days {
        if let Some(pr) = day.pr {
            write_day_file(&config.out_dir, Metric::Pr, day.date, pr)?;
            summary.pr_files += 1;
        }
        if let Some(ghi) = day.ghi {
            write_day_file(&config.out_dir, Metric::Ghi, day.date, ghi)?;
            summary.ghi_files += 1;
        }
    }

    tracing::info!(
        out = %config.out_dir.display(),
        days = summary.days,
        pr_files = summary.pr_files,
        ghi_files = summary.ghi_files,
        "wrote synthetic source trees"
    );
    Ok(summary)
}

/// Path of a day's file inside `<root>/<metric>/`.
pub fn day_file_path(root: &Path, metric: Metric, date: NaiveDate) -> PathBuf {
    root.join(metric.column())
        .join(date.format("%Y-%m").to_string())
        .join(format!("{}.csv", date.format("%Y-%m-%d")))
}

fn write_day_file(root: &Path, metric: Metric, date: NaiveDate, value: f64) -> Result<(), AppError> {
    let path = day_file_path(root, metric, date);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::new(EXIT_OUTPUT, format!("Failed to create '{}': {e}", parent.display())))?;
    }
    let body = format!("Date,{}\n{date},{value}\n", metric.column());
    fs::write(&path, body).map_err(|e| AppError::new(EXIT_OUTPUT, format!("Failed to write '{}': {e}", path.display())))
}

fn day_at(start: NaiveDate, offset: usize) -> Option<NaiveDate> {
    let days = Duration::try_days(i64::try_from(offset).ok()?)?;
    start.checked_add_signed(days)
}

fn overflow(config: &SampleConfig) -> AppError {
    AppError::new(
        EXIT_INPUT,
        format!("Sample range overflows the calendar: {} days from {}.", config.days, config.start),
    )
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

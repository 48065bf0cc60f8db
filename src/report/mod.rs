//! Reporting utilities: fiscal-year compliance, trailing PR statistics, and
//! formatted terminal output.
//!
//! Aggregation is a fold over already-annotated records; nothing here mutates
//! the derived series.

use std::collections::BTreeMap;

use crate::domain::{DerivedRecord, FiscalSummary, TrailingAverage};
use crate::error::PipelineError;
use crate::metrics::tail_mean;

pub mod format;

pub use format::*;

#[derive(Debug, Default, Clone, Copy)]
struct FiscalAccumulator {
    count: usize,
    above_budget: usize,
}

/// Group derived records by fiscal year and compute budget compliance.
///
/// Records with a non-finite PR are excluded from both counts. Years with no
/// eligible record are omitted, so `count > 0` on every row. Output is ordered
/// by ascending fiscal year.
pub fn summarize_fiscal_years(derived: &[DerivedRecord]) -> Result<Vec<FiscalSummary>, PipelineError> {
    if derived.is_empty() {
        return Err(PipelineError::EmptySeries {
            stage: "fiscal summary",
        });
    }

    let mut groups: BTreeMap<i32, FiscalAccumulator> = BTreeMap::new();
    for rec in derived.iter().filter(|r| r.pr.is_finite()) {
        let acc = groups.entry(rec.fiscal_year).or_default();
        acc.count += 1;
        if rec.is_above_budget() {
            acc.above_budget += 1;
        }
    }

    Ok(groups
        .into_iter()
        .filter(|(_, acc)| acc.count > 0)
        .map(|(fiscal_year, acc)| FiscalSummary {
            fiscal_year,
            count: acc.count,
            above_budget: acc.above_budget,
            percent_above: 100.0 * acc.above_budget as f64 / acc.count as f64,
        })
        .collect())
}

/// Mean PR over the last N records for each N in `windows` with enough data.
pub fn trailing_averages(derived: &[DerivedRecord], windows: &[usize]) -> Vec<TrailingAverage> {
    let prs: Vec<f64> = derived.iter().map(|r| r.pr).collect();
    windows
        .iter()
        .filter_map(|&n| tail_mean(&prs, n).map(|mean| TrailingAverage { records: n, mean }))
        .collect()
}

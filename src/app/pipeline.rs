//! Shared pipeline logic used by the CLI commands and the TUI.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! ingest -> pair -> assemble (merge), then filter -> derive -> aggregate (analysis).
//!
//! Front-ends only decide where inputs come from and how outputs are presented.

use std::path::Path;

use crate::domain::{DateFilter, DerivedRecord, FiscalSummary, Metric, MetricConfig, TRAILING_WINDOWS, TrailingAverage};
use crate::error::{AppError, Diagnostic, PipelineError};
use crate::io::ingest::{SourceSet, load_source_tree};
use crate::io::summary::SummaryFile;
use crate::merge::{MergedSeries, UnmatchedDate, assemble_series, pair_records};
use crate::plot::ChartReport;

/// All outputs of one merge run.
#[derive(Debug, Clone)]
pub struct MergeOutput {
    pub pr: SourceSet,
    pub ghi: SourceSet,
    /// Number of dates present in both trees.
    pub joined_count: usize,
    pub unmatched: Vec<UnmatchedDate>,
    pub dropped_duplicates: usize,
    pub series: MergedSeries,
}

impl MergeOutput {
    /// Every non-fatal diagnostic raised while merging, ingest first.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut out: Vec<Diagnostic> = self.pr.diagnostics.iter().chain(&self.ghi.diagnostics).cloned().collect();
        out.extend(self.unmatched.iter().map(|u| Diagnostic::MissingPair {
            date: u.date,
            missing: u.missing,
        }));
        out
    }
}

/// Ingest both source trees and build the ordered merged series.
///
/// An empty merged series is fatal: there is nothing to write or analyze.
pub fn run_merge(pr_dir: &Path, ghi_dir: &Path) -> Result<MergeOutput, AppError> {
    let pr = load_source_tree(pr_dir, Metric::Pr)?;
    let ghi = load_source_tree(ghi_dir, Metric::Ghi)?;

    let pairing = pair_records(&pr.records, &ghi.records);
    let joined_count = pairing.joined.len();
    let assembly = assemble_series(pairing.joined);

    if assembly.series.is_empty() {
        return Err(PipelineError::EmptySeries { stage: "merge" }.into());
    }

    Ok(MergeOutput {
        pr,
        ghi,
        joined_count,
        unmatched: pairing.unmatched,
        dropped_duplicates: assembly.dropped_duplicates,
        series: assembly.series,
    })
}

/// All outputs of one analysis run over a merged series.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub filter: DateFilter,
    pub config: MetricConfig,
    pub derived: Vec<DerivedRecord>,
    pub fiscal: Vec<FiscalSummary>,
    pub trailing: Vec<TrailingAverage>,
}

impl AnalysisOutput {
    pub fn chart_report(&self) -> ChartReport<'_> {
        ChartReport {
            derived: &self.derived,
            fiscal: &self.fiscal,
            trailing: &self.trailing,
            rolling_window: self.config.rolling_window,
        }
    }

    pub fn summary_file(&self) -> SummaryFile {
        SummaryFile {
            tool: "prt".to_string(),
            first_date: self.derived.first().map(|r| r.date),
            last_date: self.derived.last().map(|r| r.date),
            records: self.derived.len(),
            rolling_window: self.config.rolling_window,
            budget: self.config.budget,
            fiscal_years: self.fiscal.clone(),
        }
    }
}

/// Filter, derive, and aggregate.
///
/// The filter is applied first, so rolling windows and fiscal summaries only see
/// records inside it.
pub fn run_analysis(
    series: &MergedSeries,
    filter: &DateFilter,
    config: &MetricConfig,
) -> Result<AnalysisOutput, AppError> {
    config.validate()?;

    let filtered = series.filtered(filter);
    if filtered.is_empty() && !series.is_empty() {
        return Err(PipelineError::EmptySeries {
            stage: "the selected date range",
        }
        .into());
    }
    // Debug only: the terminal viewer re-runs this on every key press.
    tracing::debug!(
        records = filtered.len(),
        total = series.len(),
        filter = %filter.describe(),
        "analyzing merged series"
    );

    let derived = crate::metrics::derive_series(&filtered, config)?;
    let fiscal = crate::report::summarize_fiscal_years(&derived)?;
    let trailing = crate::report::trailing_averages(&derived, &TRAILING_WINDOWS);

    Ok(AnalysisOutput {
        filter: *filter,
        config: *config,
        derived,
        fiscal,
        trailing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SampleConfig, write_sample_trees};
    use crate::domain::BudgetSchedule;
    use chrono::NaiveDate;

    fn sample(dir: &Path, days: usize, drop_prob: f64) {
        write_sample_trees(&SampleConfig {
            out_dir: dir.to_path_buf(),
            start: NaiveDate::from_ymd_opt(2019, 7, 1).unwrap(),
            days,
            seed: 7,
            drop_prob,
            budget: BudgetSchedule::default(),
        })
        .unwrap();
    }

    #[test]
    fn merge_then_analyze_sample_trees() {
        let dir = tempfile::tempdir().unwrap();
        sample(dir.path(), 400, 0.05);

        let merge = run_merge(&dir.path().join("PR"), &dir.path().join("GHI")).unwrap();
        assert_eq!(merge.series.len(), merge.joined_count);
        assert_eq!(merge.pr.records.len() + merge.ghi.records.len(), 2 * merge.joined_count + merge.unmatched.len());
        assert_eq!(merge.diagnostics().len(), merge.unmatched.len());

        let analysis = run_analysis(&merge.series, &DateFilter::default(), &MetricConfig::default()).unwrap();
        assert_eq!(analysis.derived.len(), merge.series.len());
        let years: Vec<i32> = analysis.fiscal.iter().map(|f| f.fiscal_year).collect();
        assert_eq!(years, vec![2020, 2021]);
        assert_eq!(analysis.trailing.len(), 4);
        assert_eq!(analysis.summary_file().records, analysis.derived.len());
    }

    #[test]
    fn filter_applies_before_derivation() {
        let dir = tempfile::tempdir().unwrap();
        sample(dir.path(), 60, 0.0);
        let merge = run_merge(&dir.path().join("PR"), &dir.path().join("GHI")).unwrap();

        let filter = DateFilter {
            start: NaiveDate::from_ymd_opt(2019, 7, 11),
            end: NaiveDate::from_ymd_opt(2019, 7, 20),
        };
        let analysis = run_analysis(&merge.series, &filter, &MetricConfig::default()).unwrap();
        assert_eq!(analysis.derived.len(), 10);
        assert!(analysis.derived.iter().all(|r| r.rolling_pr_avg.is_none()));
        assert_eq!(analysis.fiscal[0].count, 10);
    }

    #[test]
    fn filter_excluding_everything_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        sample(dir.path(), 10, 0.0);
        let merge = run_merge(&dir.path().join("PR"), &dir.path().join("GHI")).unwrap();

        let filter = DateFilter {
            start: NaiveDate::from_ymd_opt(2030, 1, 1),
            end: None,
        };
        let err = run_analysis(&merge.series, &filter, &MetricConfig::default()).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_NO_DATA);
    }

    #[test]
    fn empty_trees_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("PR")).unwrap();
        std::fs::create_dir_all(dir.path().join("GHI")).unwrap();
        let err = run_merge(&dir.path().join("PR"), &dir.path().join("GHI")).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_NO_DATA);
    }
}

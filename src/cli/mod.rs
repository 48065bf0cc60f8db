//! Command-line parsing for the PR trend tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline code. Paths can also come from the environment (or a `.env` file),
//! everything else is a flag.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{BudgetSchedule, DEFAULT_ROLLING_WINDOW, MetricConfig, parse_date};

pub mod prompt;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "prt", version, about = "Merge daily PR/GHI data and chart PR against its budget")]
pub struct Cli {
    /// Log per-file detail (debug level).
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Pair the PR and GHI trees by date and write the merged CSV.
    Merge(MergeArgs),
    /// Analyze a merged CSV: rolling average, budget, fiscal compliance, chart.
    Chart(ChartArgs),
    /// `merge` followed by `chart` (the default when no subcommand is given).
    Run(RunArgs),
    /// Explore a merged CSV in an interactive terminal chart.
    View(ViewArgs),
    /// Write synthetic PR/GHI source trees.
    Sample(SampleArgs),
}

/// Locations of the two per-day source trees.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Directory tree of daily PR files.
    #[arg(long, env = "PR_DIR", default_value = "data/PR")]
    pub pr_dir: PathBuf,

    /// Directory tree of daily GHI files.
    #[arg(long, env = "GHI_DIR", default_value = "data/GHI")]
    pub ghi_dir: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct MergeArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Merged CSV to write.
    #[arg(long, env = "MERGED_CSV", default_value = "output/combined_data.csv")]
    pub merged: PathBuf,
}

/// Tunables and date filter for the analysis stages.
#[derive(Debug, Args, Clone)]
pub struct AnalysisArgs {
    /// Rolling-average window, in records.
    #[arg(long, default_value_t = DEFAULT_ROLLING_WINDOW)]
    pub window: usize,

    /// Budget PR in the first budget year.
    #[arg(long, default_value_t = 73.9)]
    pub budget_base: f64,

    /// Yearly budget multiplier.
    #[arg(long, default_value_t = 0.992)]
    pub budget_decay: f64,

    /// Calendar year the budget schedule is anchored to.
    #[arg(long, default_value_t = 2019)]
    pub budget_baseline_year: i32,

    /// Only analyze dates on or after this day (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    pub start: Option<String>,

    /// Only analyze dates on or before this day (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    pub end: Option<String>,

    /// Ask for the start/end dates on stdin.
    #[arg(long, conflicts_with_all = ["start", "end"])]
    pub prompt: bool,
}

impl AnalysisArgs {
    pub fn metric_config(&self) -> MetricConfig {
        MetricConfig {
            rolling_window: self.window,
            budget: BudgetSchedule {
                base: self.budget_base,
                annual_decay: self.budget_decay,
                baseline_year: self.budget_baseline_year,
            },
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct ChartArgs {
    /// Merged CSV to read.
    #[arg(long, env = "MERGED_CSV", default_value = "output/combined_data.csv")]
    pub merged: PathBuf,

    /// SVG chart to write.
    #[arg(long, env = "CHART_PATH", default_value = "output/final_pr_graph.svg")]
    pub chart: PathBuf,

    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Export the derived series (rolling average, budget, band, fiscal year) to CSV.
    #[arg(long, value_name = "CSV")]
    pub derived_output: Option<PathBuf>,

    /// Export the fiscal summary to JSON.
    #[arg(long, value_name = "JSON")]
    pub summary_json: Option<PathBuf>,

    /// Also print an ASCII chart to the terminal.
    #[arg(long)]
    pub plot: bool,

    /// ASCII chart width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// ASCII chart height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    #[command(flatten)]
    pub chart: ChartArgs,
}

impl RunArgs {
    pub fn merge_args(&self) -> MergeArgs {
        MergeArgs {
            sources: self.sources.clone(),
            merged: self.chart.merged.clone(),
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct ViewArgs {
    /// Merged CSV to read.
    #[arg(long, env = "MERGED_CSV", default_value = "output/combined_data.csv")]
    pub merged: PathBuf,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Output directory; `PR/` and `GHI/` are created inside it.
    #[arg(long, default_value = "data")]
    pub out: PathBuf,

    /// First generated day (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date, default_value = "2019-07-01")]
    pub start: NaiveDate,

    /// Number of consecutive days.
    #[arg(long, default_value_t = 730)]
    pub days: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Probability that a day is missing from one of the trees.
    #[arg(long, default_value_t = 0.02)]
    pub drop_prob: f64,
}

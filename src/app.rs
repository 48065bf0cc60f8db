//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - initializes logging
//! - runs the merge and analysis pipelines
//! - prints reports/plots and writes the chart and optional exports

use std::io;
use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{AnalysisArgs, ChartArgs, Cli, Command, MergeArgs, RunArgs, SampleArgs, ViewArgs};
use crate::domain::{BudgetSchedule, DateFilter};
use crate::error::AppError;
use crate::merge::MergedSeries;

pub mod pipeline;

/// Entry point for the `prt` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env is normal; anything else is worth a log line once logging is up.
    let dotenv = dotenvy::dotenv();

    // We want `prt` and `prt --start 2020-01-01` to behave like `prt run ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);
    init_tracing(&cli);

    if let Err(e) = &dotenv {
        if !e.not_found() {
            tracing::warn!("ignoring .env file: {e}");
        }
    }

    match cli.command {
        Command::Merge(args) => handle_merge(&args).map(|_| ()),
        Command::Chart(args) => handle_chart(&args, None),
        Command::Run(args) => handle_run(&args),
        Command::View(args) => handle_view(&args),
        Command::Sample(args) => handle_sample(&args),
    }
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.verbose {
        "pr_trend=debug"
    } else if cli.quiet {
        "pr_trend=warn"
    } else {
        "pr_trend=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Reports own stdout; logs go to stderr.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn handle_merge(args: &MergeArgs) -> Result<MergedSeries, AppError> {
    let merge = pipeline::run_merge(&args.sources.pr_dir, &args.sources.ghi_dir)?;
    crate::io::export::write_merged_csv(&args.merged, &merge.series)?;

    println!("{}", crate::report::format_merge_summary(&merge));
    println!("Merged CSV: {} ({} rows)", args.merged.display(), merge.series.len());

    Ok(merge.series)
}

fn handle_run(args: &RunArgs) -> Result<(), AppError> {
    let series = handle_merge(&args.merge_args())?;
    handle_chart(&args.chart, Some(series))
}

/// Analyze and render. `preloaded` skips re-reading the merged CSV after a merge.
fn handle_chart(args: &ChartArgs, preloaded: Option<MergedSeries>) -> Result<(), AppError> {
    let series = match preloaded {
        Some(series) => series,
        None => load_merged(&args.merged)?,
    };
    let filter = resolve_date_filter(&args.analysis)?;
    let analysis = pipeline::run_analysis(&series, &filter, &args.analysis.metric_config())?;

    crate::plot::render_svg_chart(&args.chart, &analysis.chart_report())?;

    println!("{}", crate::report::format_analysis_summary(&analysis));
    println!("Chart: {}", args.chart.display());

    if args.plot {
        let chart = crate::plot::ChartSeries::from_derived(&analysis.derived);
        println!("{}", crate::plot::render_ascii_plot(&chart, args.width, args.height));
    }

    // Optional exports.
    if let Some(path) = &args.derived_output {
        crate::io::export::write_derived_csv(path, &analysis.derived)?;
        println!("Derived CSV: {}", path.display());
    }
    if let Some(path) = &args.summary_json {
        crate::io::summary::write_summary_json(path, &analysis.summary_file())?;
        println!("Summary JSON: {}", path.display());
    }

    Ok(())
}

fn handle_view(args: &ViewArgs) -> Result<(), AppError> {
    let series = load_merged(&args.merged)?;
    let filter = resolve_date_filter(&args.analysis)?;
    crate::tui::run(series, filter, args.analysis.metric_config())
}

fn handle_sample(args: &SampleArgs) -> Result<(), AppError> {
    let config = crate::data::SampleConfig {
        out_dir: args.out.clone(),
        start: args.start,
        days: args.days,
        seed: args.seed,
        drop_prob: args.drop_prob,
        budget: BudgetSchedule::default(),
    };
    let summary = crate::data::write_sample_trees(&config)?;

    println!(
        "Wrote {} days: {} PR files under {}, {} GHI files under {}",
        summary.days,
        summary.pr_files,
        args.out.join("PR").display(),
        summary.ghi_files,
        args.out.join("GHI").display(),
    );
    Ok(())
}

fn load_merged(path: &Path) -> Result<MergedSeries, AppError> {
    Ok(crate::io::export::read_merged_csv(path)?.series)
}

fn resolve_date_filter(args: &AnalysisArgs) -> Result<DateFilter, AppError> {
    if args.prompt {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut out = io::stdout();
        let (filter, _) = crate::cli::prompt::prompt_date_filter(&mut input, &mut out)?;
        return Ok(filter);
    }
    let (filter, _) = crate::cli::prompt::resolve_filter(args.start.as_deref(), args.end.as_deref());
    Ok(filter)
}

/// Rewrite argv so `prt` defaults to `prt run`.
///
/// Rules:
/// - `prt`                      -> `prt run`
/// - `prt --start 2020-01-01`   -> `prt run --start 2020-01-01`
/// - `prt --help/--version/-h`  -> unchanged (show top-level help/version)
/// - `prt -v` / `prt -q`        -> `prt run -v` / `prt run -q`
/// - `prt -v chart ...`         -> unchanged (global flags before a subcommand)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    // Global flags may precede the subcommand; look past them.
    let first = argv
        .iter()
        .skip(1)
        .position(|a| !is_global_flag(a))
        .map(|i| i + 1);
    let Some(idx) = first else {
        let at = argv.len().min(1);
        argv.insert(at, "run".to_string());
        return argv;
    };
    let arg = argv[idx].as_str();

    let is_top_level_help_or_version = matches!(arg, "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg, "merge" | "chart" | "run" | "view" | "sample");
    if is_subcommand {
        return argv;
    }

    // If the first non-global token is a flag, treat it as "run flags".
    if arg.starts_with('-') {
        argv.insert(1, "run".to_string());
        return argv;
    }

    // Otherwise, leave as-is and let clap report the unknown subcommand.
    argv
}

fn is_global_flag(arg: &str) -> bool {
    matches!(arg, "-v" | "--verbose" | "-q" | "--quiet")
}

use std::fs;
use std::path::Path;

use approx::assert_relative_eq;
use chrono::NaiveDate;

use pr_trend::app::pipeline::{run_analysis, run_merge};
use pr_trend::data::{SampleConfig, write_sample_trees};
use pr_trend::domain::{BudgetSchedule, DateFilter, Metric, MetricConfig};
use pr_trend::error::Diagnostic;
use pr_trend::io::{read_merged_csv, read_summary_json, write_derived_csv, write_merged_csv, write_summary_json};
use pr_trend::plot::render_svg_chart;

fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

#[test]
fn sample_trees_flow_through_every_stage() {
    let dir = tempfile::tempdir().unwrap();
    write_sample_trees(&SampleConfig {
        out_dir: dir.path().join("data"),
        start: NaiveDate::from_ymd_opt(2019, 7, 1).unwrap(),
        days: 500,
        seed: 11,
        drop_prob: 0.03,
        budget: BudgetSchedule::default(),
    })
    .unwrap();

    let merge = run_merge(&dir.path().join("data/PR"), &dir.path().join("data/GHI")).unwrap();
    let records = merge.series.records();
    assert!(records.windows(2).all(|w| w[0].date < w[1].date));
    assert!(merge.diagnostics().iter().all(|d| matches!(d, Diagnostic::MissingPair { .. })));

    // Merged artifact round trip.
    let merged_path = dir.path().join("output/combined_data.csv");
    write_merged_csv(&merged_path, &merge.series).unwrap();
    let back = read_merged_csv(&merged_path).unwrap();
    assert!(back.diagnostics.is_empty());
    assert_eq!(back.series.len(), merge.series.len());
    for (a, b) in records.iter().zip(back.series.records()) {
        assert_eq!(a.date, b.date);
        assert_relative_eq!(a.pr, b.pr, epsilon = 1e-9);
        assert_relative_eq!(a.ghi.unwrap(), b.ghi.unwrap(), epsilon = 1e-9);
    }

    let analysis = run_analysis(&back.series, &DateFilter::default(), &MetricConfig::default()).unwrap();
    let derived = &analysis.derived;
    assert_eq!(derived.len(), back.series.len());
    assert!(derived.windows(2).all(|w| w[1].budget_pr <= w[0].budget_pr));
    assert!(derived.iter().filter(|r| r.fiscal_year == 2020).all(|r| r.budget_pr == 73.9));
    assert!(derived[..29].iter().all(|r| r.rolling_pr_avg.is_none()));
    let first_window: f64 = derived[..30].iter().map(|r| r.pr).sum::<f64>() / 30.0;
    assert_relative_eq!(derived[29].rolling_pr_avg.unwrap(), first_window, epsilon = 1e-9);

    let years: Vec<i32> = analysis.fiscal.iter().map(|f| f.fiscal_year).collect();
    assert_eq!(years, vec![2020, 2021]);
    let total: usize = analysis.fiscal.iter().map(|f| f.count).sum();
    assert_eq!(total, derived.len());

    // Artifacts.
    let chart_path = dir.path().join("output/final_pr_graph.svg");
    render_svg_chart(&chart_path, &analysis.chart_report()).unwrap();
    let svg = fs::read_to_string(&chart_path).unwrap();
    assert!(svg.contains("FY2020") && svg.contains("Last 90d Avg PR"));

    let derived_path = dir.path().join("output/derived.csv");
    write_derived_csv(&derived_path, derived).unwrap();
    let text = fs::read_to_string(&derived_path).unwrap();
    assert!(text.starts_with("Date,PR,GHI,PR_Rolling_Avg,Budget_PR,GHI_Band,Fiscal_Year\n"));
    assert_eq!(text.lines().count(), derived.len() + 1);

    let summary_path = dir.path().join("output/summary.json");
    write_summary_json(&summary_path, &analysis.summary_file()).unwrap();
    let summary = read_summary_json(&summary_path).unwrap();
    assert_eq!(summary.fiscal_years, analysis.fiscal);
    assert_eq!(summary.rolling_window, 30);
}

#[test]
fn unmatched_and_malformed_inputs_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let pr = dir.path().join("PR");
    let ghi = dir.path().join("GHI");

    write_file(&pr, "2019-07/2019-07-01.csv", "Date,PR\n2019-07-01,75.0\n");
    write_file(&pr, "2019-07/2019-07-02.csv", "Date,PR\n2019-07-02,72.0\n");
    write_file(&pr, "2019-07/2019-07-03.csv", "Date,PR\n2019-07-03,not-a-number\n");
    write_file(&ghi, "2019-07/2019-07-01.csv", "Date,GHI\n2019-07-01,2.0\n");
    write_file(&ghi, "2019-07/2019-07-03.csv", "Date,GHI\n2019-07-03,5.0\n");
    write_file(&ghi, "2019-07/2019-07-04.csv", "Date,GHI\n2019-07-04,6.0\n");

    let merge = run_merge(&pr, &ghi).unwrap();
    assert_eq!(merge.series.len(), 1);
    assert_eq!(merge.series.records()[0].pr, 75.0);
    assert_eq!(merge.series.records()[0].ghi, Some(2.0));
    assert_eq!(merge.pr.diagnostics.len(), 1);

    let missing: Vec<(String, Metric)> = merge
        .unmatched
        .iter()
        .map(|u| (u.date.to_string(), u.missing))
        .collect();
    assert_eq!(
        missing,
        vec![
            ("2019-07-02".to_string(), Metric::Ghi),
            ("2019-07-03".to_string(), Metric::Pr),
            ("2019-07-04".to_string(), Metric::Pr),
        ]
    );

    let summary = pr_trend::report::format_merge_summary(&merge);
    assert!(summary.contains("unmatched: 3 (missing GHI: 1, missing PR: 2)"));
}

#[test]
fn fiscal_compliance_matches_hand_computed_year() {
    let dir = tempfile::tempdir().unwrap();
    let merged = dir.path().join("combined.csv");
    // FY2020 budget is 73.9: one of four records is strictly above it.
    fs::write(
        &merged,
        "Date,GHI,PR\n\
         2019-07-01 00:00:00,3.0,80.0\n\
         2019-07-02,,73.9\n\
         2019-07-03,7.5,60.0\n\
         2019-07-04,1.0,70.0\n\
         2019-07-05,1.0,\n",
    )
    .unwrap();

    let file = read_merged_csv(&merged).unwrap();
    assert_eq!(file.rows_read, 5);
    assert_eq!(file.series.len(), 4);
    assert_eq!(file.diagnostics.len(), 1);

    let analysis = run_analysis(&file.series, &DateFilter::default(), &MetricConfig::default()).unwrap();
    assert_eq!(analysis.fiscal.len(), 1);
    assert_eq!(analysis.fiscal[0].count, 4);
    assert_eq!(analysis.fiscal[0].above_budget, 1);
    assert_relative_eq!(analysis.fiscal[0].percent_above, 25.0);
    assert!(analysis.trailing.is_empty());
}

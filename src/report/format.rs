//! Terminal formatting.
//!
//! We keep formatting code in one place so:
//! - the pipeline stages stay free of presentation concerns
//! - the chart boxes and the terminal report print identical lines

use crate::app::pipeline::{AnalysisOutput, MergeOutput};
use crate::domain::{FiscalSummary, Metric, TrailingAverage};
use crate::io::ingest::SourceSet;

/// One line per fiscal year: `FY2020: 12/30 above (40.0%)`.
pub fn fiscal_lines(summary: &[FiscalSummary]) -> Vec<String> {
    summary
        .iter()
        .map(|s| {
            format!(
                "FY{}: {}/{} above ({:.1}%)",
                s.fiscal_year, s.above_budget, s.count, s.percent_above
            )
        })
        .collect()
}

/// One line per trailing window: `Last 30d Avg PR: 74.12`.
pub fn trailing_lines(stats: &[TrailingAverage]) -> Vec<String> {
    stats
        .iter()
        .map(|t| format!("Last {}d Avg PR: {:.2}", t.records, t.mean))
        .collect()
}

/// Summary of a merge run (ingest counts, pairing, resulting series).
pub fn format_merge_summary(merge: &MergeOutput) -> String {
    let mut out = String::new();

    out.push_str("=== prt - PR/GHI merge ===\n");
    out.push_str(&source_line(&merge.pr));
    out.push_str(&source_line(&merge.ghi));

    let missing = |m: Metric| merge.unmatched.iter().filter(|u| u.missing == m).count();
    out.push_str(&format!(
        "Paired: {} dates | unmatched: {} (missing GHI: {}, missing PR: {})\n",
        merge.joined_count,
        merge.unmatched.len(),
        missing(Metric::Ghi),
        missing(Metric::Pr),
    ));

    let range = match (merge.series.first_date(), merge.series.last_date()) {
        (Some(first), Some(last)) => format!("{first} .. {last}"),
        _ => "-".to_string(),
    };
    out.push_str(&format!("Series: {} rows | {range}\n", merge.series.len()));
    out
}

fn source_line(set: &SourceSet) -> String {
    format!(
        "{:<4} {} files under {} -> {} records ({} skipped)\n",
        format!("{}:", set.metric),
        set.files_seen,
        set.root.display(),
        set.records.len(),
        set.diagnostics.len(),
    )
}

/// Summary of an analysis run: range, settings, fiscal table, trailing averages.
pub fn format_analysis_summary(analysis: &AnalysisOutput) -> String {
    let mut out = String::new();

    out.push_str("=== prt - PR vs budget ===\n");
    let first = analysis.derived.first().map(|r| r.date.to_string()).unwrap_or_default();
    let last = analysis.derived.last().map(|r| r.date.to_string()).unwrap_or_default();
    out.push_str(&format!(
        "Records: {} | {first} .. {last} | filter: {}\n",
        analysis.derived.len(),
        analysis.filter.describe(),
    ));
    out.push_str(&format!(
        "Rolling window: {} records | budget: {:.2} x {}^n from FY{}\n",
        analysis.config.rolling_window,
        analysis.config.budget.base,
        analysis.config.budget.annual_decay,
        analysis.config.budget.baseline_year + 1,
    ));

    out.push('\n');
    out.push_str(&format_fiscal_table(&analysis.fiscal));

    let trailing = trailing_lines(&analysis.trailing);
    if !trailing.is_empty() {
        out.push('\n');
        for line in trailing {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}

/// Fiscal compliance as a fixed-width table.
pub fn format_fiscal_table(summary: &[FiscalSummary]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<8} {:>7} {:>7} {:>8}\n", "fy", "count", "above", "pct"));
    out.push_str(&format!("{:-<8} {:-<7} {:-<7} {:-<8}\n", "", "", "", ""));
    for s in summary {
        out.push_str(&format!(
            "{:<8} {:>7} {:>7} {:>7.1}%\n",
            format!("FY{}", s.fiscal_year),
            s.count,
            s.above_budget,
            s.percent_above
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> Vec<FiscalSummary> {
        vec![
            FiscalSummary {
                fiscal_year: 2020,
                count: 30,
                above_budget: 12,
                percent_above: 40.0,
            },
            FiscalSummary {
                fiscal_year: 2021,
                count: 3,
                above_budget: 1,
                percent_above: 100.0 / 3.0,
            },
        ]
    }

    #[test]
    fn fiscal_lines_match_chart_box_format() {
        assert_eq!(
            fiscal_lines(&summary()),
            vec!["FY2020: 12/30 above (40.0%)", "FY2021: 1/3 above (33.3%)"]
        );
    }

    #[test]
    fn trailing_lines_use_two_decimals() {
        let stats = [TrailingAverage { records: 7, mean: 74.125 }, TrailingAverage { records: 30, mean: 70.0 }];
        assert_eq!(trailing_lines(&stats), vec!["Last 7d Avg PR: 74.12", "Last 30d Avg PR: 70.00"]);
    }

    #[test]
    fn fiscal_table_is_aligned() {
        let table = format_fiscal_table(&summary());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], "FY2020        30      12    40.0%");
        assert_eq!(lines[3], "FY2021         3       1    33.3%");
    }
}

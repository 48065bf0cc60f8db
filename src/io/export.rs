//! Merged-series CSV (the canonical intermediate artifact) and derived-series export.
//!
//! The merged file has exactly three columns, `Date,GHI,PR`, one row per date in
//! ascending order. It is written by `prt merge` and read back by `prt chart` /
//! `prt view`.

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{DerivedRecord, JoinedRecord, parse_date};
use crate::error::{AppError, Diagnostic, EXIT_INPUT, EXIT_OUTPUT};
use crate::io::ingest::parse_value;
use crate::merge::{MergedSeries, assemble_series};

const COL_DATE: &str = "Date";
const COL_GHI: &str = "GHI";
const COL_PR: &str = "PR";

#[derive(Debug, Serialize)]
struct MergedRow {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "GHI")]
    ghi: Option<f64>,
    #[serde(rename = "PR")]
    pr: f64,
}

/// A merged CSV read back from disk.
#[derive(Debug, Clone)]
pub struct MergedFile {
    pub series: MergedSeries,
    pub rows_read: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Write the merged series as `Date,GHI,PR`.
pub fn write_merged_csv(path: &Path, series: &MergedSeries) -> Result<(), AppError> {
    let mut writer = create_csv_writer(path)?;
    for r in series.records() {
        writer
            .serialize(MergedRow {
                date: r.date,
                ghi: r.ghi,
                pr: r.pr,
            })
            .map_err(|e| AppError::new(EXIT_OUTPUT, format!("Failed to write merged CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(EXIT_OUTPUT, format!("Failed to flush merged CSV: {e}")))?;
    Ok(())
}

/// Read a merged CSV back into an ordered series.
///
/// Rows without a usable `PR` or `Date` are skipped with a diagnostic. A blank
/// `GHI` cell is kept as undefined GHI. Rows are re-sorted by date.
pub fn read_merged_csv(path: &Path) -> Result<MergedFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            EXIT_INPUT,
            format!("Failed to open merged CSV '{}': {e}", path.display()),
        )
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Failed to read merged CSV headers: {e}")))?
        .clone();
    let columns: HashMap<&str, usize> = [COL_DATE, COL_GHI, COL_PR]
        .into_iter()
        .filter_map(|name| crate::io::ingest::find_column(&headers, name).map(|idx| (name, idx)))
        .collect();
    for name in [COL_DATE, COL_PR] {
        if !columns.contains_key(name) {
            return Err(AppError::new(
                EXIT_INPUT,
                format!("Merged CSV '{}' is missing required column `{name}`", path.display()),
            ));
        }
    }

    let mut joined = Vec::new();
    let mut diagnostics = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: header is line 1, records are 1-based.
        let line = idx + 2;
        rows_read += 1;
        let row_source = format!("{}:{line}", path.display());

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                diagnostics.push(Diagnostic::malformed(&row_source, format!("CSV parse error: {e}")));
                continue;
            }
        };

        match parse_merged_row(&record, &columns) {
            Ok(row) => joined.push(row),
            Err(reason) => diagnostics.push(Diagnostic::malformed(&row_source, reason)),
        }
    }

    for diag in &diagnostics {
        diag.report();
    }

    let assembly = assemble_series(joined);
    tracing::info!(
        path = %path.display(),
        rows = rows_read,
        used = assembly.series.len(),
        "loaded merged series"
    );

    Ok(MergedFile {
        series: assembly.series,
        rows_read,
        diagnostics,
    })
}

fn parse_merged_row(record: &csv::StringRecord, columns: &HashMap<&str, usize>) -> Result<JoinedRecord, String> {
    let cell = |name: &str| columns.get(name).and_then(|&idx| record.get(idx));

    let date = parse_date(cell(COL_DATE).unwrap_or(""))?;
    let pr = parse_value(cell(COL_PR)).map_err(|reason| format!("`PR` {reason}"))?;
    let ghi = match cell(COL_GHI).map(str::trim).filter(|s| !s.is_empty()) {
        None => None,
        Some(raw) => Some(parse_value(Some(raw)).map_err(|reason| format!("`GHI` {reason}"))?),
    };

    Ok(JoinedRecord { date, pr, ghi })
}

/// Write the derived series (one row per record, all derived fields).
pub fn write_derived_csv(path: &Path, derived: &[DerivedRecord]) -> Result<(), AppError> {
    let mut writer = create_csv_writer(path)?;
    for r in derived {
        writer
            .serialize(r)
            .map_err(|e| AppError::new(EXIT_OUTPUT, format!("Failed to write derived CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(EXIT_OUTPUT, format!("Failed to flush derived CSV: {e}")))?;
    Ok(())
}

fn create_csv_writer(path: &Path) -> Result<csv::Writer<File>, AppError> {
    ensure_parent_dir(path)?;
    let file = File::create(path)
        .map_err(|e| AppError::new(EXIT_OUTPUT, format!("Failed to create '{}': {e}", path.display())))?;
    Ok(csv::Writer::from_writer(file))
}

/// Create the parent directory of an output path if it does not exist.
pub fn ensure_parent_dir(path: &Path) -> Result<(), AppError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent).map_err(|e| {
            AppError::new(
                EXIT_OUTPUT,
                format!("Failed to create output directory '{}': {e}", parent.display()),
            )
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MetricConfig;
    use crate::metrics::derive_series;

    fn series() -> MergedSeries {
        let joined = vec![
            JoinedRecord {
                date: NaiveDate::from_ymd_opt(2019, 7, 2).unwrap(),
                pr: 74.123456789012,
                ghi: Some(5.4321),
            },
            JoinedRecord {
                date: NaiveDate::from_ymd_opt(2019, 7, 1).unwrap(),
                pr: 0.1 + 0.2,
                ghi: None,
            },
        ];
        assemble_series(joined).series
    }

    #[test]
    fn merged_csv_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/combined_data.csv");
        let written = series();

        write_merged_csv(&path, &written).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Date,GHI,PR\n2019-07-01,,"));

        let back = read_merged_csv(&path).unwrap();
        assert!(back.diagnostics.is_empty());
        assert_eq!(back.rows_read, 2);
        assert_eq!(back.series, written);
    }

    #[test]
    fn rows_without_pr_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("combined.csv");
        fs::write(
            &path,
            "Date,GHI,PR\n2019-07-03 00:00:00,3.0,70.5\n2019-07-01,2.0,\nnot-a-date,1.0,70\n2019-07-02,x,71\n",
        )
        .unwrap();

        let back = read_merged_csv(&path).unwrap();
        assert_eq!(back.rows_read, 4);
        assert_eq!(back.series.len(), 1);
        assert_eq!(back.series.records()[0].pr, 70.5);
        assert_eq!(back.diagnostics.len(), 3);
    }

    #[test]
    fn missing_pr_column_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("combined.csv");
        fs::write(&path, "Date,GHI\n2019-07-01,2.0\n").unwrap();
        assert_eq!(read_merged_csv(&path).unwrap_err().exit_code(), EXIT_INPUT);
    }

    #[test]
    fn derived_csv_has_all_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("derived.csv");
        let derived = derive_series(&series(), &MetricConfig::default()).unwrap();

        write_derived_csv(&path, &derived).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Date,PR,GHI,PR_Rolling_Avg,Budget_PR,GHI_Band,Fiscal_Year"
        );
        assert!(lines.next().unwrap().ends_with(",unknown,2020"));
    }
}

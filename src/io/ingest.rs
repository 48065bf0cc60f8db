//! Source-tree ingest.
//!
//! Each metric lives in its own directory tree containing one CSV per day. The
//! file stem is the date key (`YYYY-MM-DD`) and the file holds a single data row
//! with the metric's value column (`PR` or `GHI`, case-sensitive).
//!
//! Design goals:
//! - **File-level isolation** (a bad file is skipped and reported, never fatal)
//! - **Deterministic behavior** (files are visited in sorted relative-path order,
//!   so the duplicate-date policy does not depend on directory iteration order)
//! - **Separation of concerns**: no pairing logic here

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::StringRecord;
use rayon::prelude::*;

use crate::domain::{Metric, SourceRecord};
use crate::error::{AppError, Diagnostic, EXIT_INPUT};

/// Directory recursion depth when discovering source files.
const MAX_SEARCH_DEPTH: usize = 8;

/// Ingest output for one metric: usable records plus everything that was skipped.
#[derive(Debug, Clone)]
pub struct SourceSet {
    pub metric: Metric,
    pub root: PathBuf,
    /// One record per date, in sorted path order.
    pub records: Vec<SourceRecord>,
    pub diagnostics: Vec<Diagnostic>,
    pub files_seen: usize,
}

/// Read every `*.csv` file under `root` as a `metric` source record.
///
/// Fails only when `root` itself is unusable. Per-file problems become
/// `Diagnostic::MalformedRecord`s. When two files carry the same date, the
/// first in sorted relative-path order is kept and the later one is rejected.
pub fn load_source_tree(root: &Path, metric: Metric) -> Result<SourceSet, AppError> {
    if !root.exists() {
        return Err(AppError::new(
            EXIT_INPUT,
            format!("{metric} directory not found: {}", root.display()),
        ));
    }
    if !root.is_dir() {
        return Err(AppError::new(
            EXIT_INPUT,
            format!("Expected a directory for {metric} data, got a file: {}", root.display()),
        ));
    }

    let files = discover_csv_files(root);
    tracing::debug!(metric = %metric, root = %root.display(), files = files.len(), "discovered source files");

    // Parsing is independent per file; `collect` on an indexed iterator keeps
    // the sorted order needed for the duplicate policy.
    let parsed: Vec<Result<SourceRecord, Diagnostic>> = files
        .par_iter()
        .map(|path| read_source_file(path, metric))
        .collect();

    let mut records: Vec<SourceRecord> = Vec::with_capacity(parsed.len());
    let mut diagnostics = Vec::new();
    let mut first_by_date: HashMap<NaiveDate, PathBuf> = HashMap::with_capacity(parsed.len());

    for result in parsed {
        match result {
            Ok(rec) => {
                if let Some(kept) = first_by_date.get(&rec.date) {
                    diagnostics.push(Diagnostic::malformed(
                        &rec.path,
                        format!("duplicate {metric} date {} (keeping {})", rec.date, kept.display()),
                    ));
                    continue;
                }
                first_by_date.insert(rec.date, rec.path.clone());
                records.push(rec);
            }
            Err(diag) => diagnostics.push(diag),
        }
    }

    for diag in &diagnostics {
        diag.report();
    }
    tracing::info!(
        metric = %metric,
        files = files.len(),
        records = records.len(),
        skipped = diagnostics.len(),
        "loaded source tree"
    );

    Ok(SourceSet {
        metric,
        root: root.to_path_buf(),
        records,
        diagnostics,
        files_seen: files.len(),
    })
}

/// Read one daily file.
pub fn read_source_file(path: &Path, metric: Metric) -> Result<SourceRecord, Diagnostic> {
    let date = date_key_from_path(path).map_err(|reason| Diagnostic::malformed(path, reason))?;

    let file = File::open(path).map_err(|e| Diagnostic::malformed(path, format!("cannot open file: {e}")))?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| Diagnostic::malformed(path, format!("cannot read CSV header: {e}")))?
        .clone();
    let column = find_column(&headers, metric.column())
        .ok_or_else(|| Diagnostic::malformed(path, format!("missing `{}` column", metric.column())))?;

    let mut rows = reader.records();
    let record = match rows.next() {
        Some(Ok(r)) => r,
        Some(Err(e)) => return Err(Diagnostic::malformed(path, format!("CSV parse error: {e}"))),
        None => return Err(Diagnostic::malformed(path, "no data rows")),
    };
    let extra_rows = rows.count();
    if extra_rows > 0 {
        tracing::debug!(path = %path.display(), extra_rows, "using the first data row only");
    }

    let value = parse_value(record.get(column))
        .map_err(|reason| Diagnostic::malformed(path, format!("`{}` {reason}", metric.column())))?;

    Ok(SourceRecord {
        date,
        value,
        path: path.to_path_buf(),
    })
}

/// Extract the date key from a file stem; only canonical `YYYY-MM-DD` is accepted.
pub fn date_key_from_path(path: &Path) -> Result<NaiveDate, String> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| "file name is not valid UTF-8".to_string())?;
    let date = NaiveDate::parse_from_str(stem, "%Y-%m-%d")
        .map_err(|_| format!("file name '{stem}' is not a YYYY-MM-DD date"))?;
    if date.format("%Y-%m-%d").to_string() != stem {
        return Err(format!("file name '{stem}' is not a canonical YYYY-MM-DD date"));
    }
    Ok(date)
}

/// Discover `*.csv` files under `root`, sorted by relative path.
pub fn discover_csv_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    find_csv_files_inner(root, 0, &mut out);
    out.sort_by(|a, b| relative(root, a).cmp(&relative(root, b)));
    out
}

fn find_csv_files_inner(dir: &Path, depth: usize, out: &mut Vec<PathBuf>) {
    if depth > MAX_SEARCH_DEPTH {
        return;
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), "cannot read directory: {e}");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            if is_hidden(&path) {
                continue;
            }
            find_csv_files_inner(&path, depth + 1, out);
            continue;
        }

        if file_type.is_file() && has_csv_extension(&path) {
            out.push(path);
        }
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        == Some(true)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

fn relative<'a>(root: &Path, path: &'a Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}

pub(crate) fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    headers
        .iter()
        .position(|h| h.trim().trim_start_matches('\u{feff}') == name)
}

pub(crate) fn parse_value(cell: Option<&str>) -> Result<f64, String> {
    let cell = cell.map(str::trim).filter(|s| !s.is_empty()).ok_or("value is empty")?;
    let v = cell
        .parse::<f64>()
        .map_err(|_| format!("value '{cell}' is not a number"))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("value '{cell}' is not finite"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(root: &Path, rel: &str, contents: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reads_nested_tree_in_date_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "2019-08/2019-08-01.csv", "Date,PR\n2019-08-01,71.5\n");
        write(dir.path(), "2019-07/2019-07-01.csv", "Date,PR\n2019-07-01,75.25\n");
        write(dir.path(), "2019-07/notes.txt", "ignored");

        let set = load_source_tree(dir.path(), Metric::Pr).unwrap();
        assert_eq!(set.files_seen, 2);
        assert!(set.diagnostics.is_empty());
        let dates: Vec<String> = set.records.iter().map(|r| r.date.to_string()).collect();
        assert_eq!(dates, vec!["2019-07-01", "2019-08-01"]);
        assert_eq!(set.records[0].value, 75.25);
    }

    #[test]
    fn malformed_files_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a/2019-07-01.csv", "GHI\n4.5\n");
        write(dir.path(), "a/2019-07-02.csv", "ghi\n4.5\n"); // column is case-sensitive
        write(dir.path(), "a/2019-07-03.csv", "GHI\nabc\n");
        write(dir.path(), "a/2019-07-04.csv", "GHI\n");
        write(dir.path(), "a/july-5.csv", "GHI\n1.0\n");
        write(dir.path(), "a/2019-7-6.csv", "GHI\n1.0\n");

        let set = load_source_tree(dir.path(), Metric::Ghi).unwrap();
        assert_eq!(set.files_seen, 6);
        assert_eq!(set.records.len(), 1);
        assert_eq!(set.records[0].value, 4.5);
        assert_eq!(set.diagnostics.len(), 5);
        assert!(
            set.diagnostics
                .iter()
                .all(|d| matches!(d, Diagnostic::MalformedRecord { .. }))
        );
    }

    #[test]
    fn duplicate_dates_keep_first_in_path_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b/2019-07-01.csv", "PR\n60.0\n");
        write(dir.path(), "a/2019-07-01.csv", "PR\n80.0\n");

        let set = load_source_tree(dir.path(), Metric::Pr).unwrap();
        assert_eq!(set.records.len(), 1);
        assert_eq!(set.records[0].value, 80.0);
        assert_eq!(set.diagnostics.len(), 1);
        assert!(set.diagnostics[0].to_string().contains("duplicate PR date 2019-07-01"));
    }

    #[test]
    fn bom_prefixed_header_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "2019-07-01.csv", "\u{feff}PR\n70.0\n");
        let rec = read_source_file(&path, Metric::Pr).unwrap();
        assert_eq!(rec.value, 70.0);
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_source_tree(&dir.path().join("nope"), Metric::Pr).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_INPUT);
    }
}

//! Date-range filter input.
//!
//! Bounds come either from `--start/--end` or from an interactive prompt. In both
//! cases an unparseable bound is a non-fatal `InvalidFilterInput`: it is logged,
//! that bound is dropped, and the run continues.

use std::io::{BufRead, Write};

use chrono::NaiveDate;

use crate::domain::{DateFilter, FilterBound, parse_date};
use crate::error::{AppError, Diagnostic, EXIT_INPUT};

/// Parse one bound; blank input means unbounded.
pub fn parse_filter_bound(input: &str, bound: FilterBound) -> Result<Option<NaiveDate>, Diagnostic> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    parse_date(input).map(Some).map_err(|_| Diagnostic::InvalidFilterInput {
        bound,
        input: input.to_string(),
    })
}

/// Build a filter from raw bound strings, dropping (and reporting) invalid ones.
pub fn resolve_filter(start: Option<&str>, end: Option<&str>) -> (DateFilter, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let mut resolve = |raw: Option<&str>, bound: FilterBound| match parse_filter_bound(raw.unwrap_or(""), bound) {
        Ok(date) => date,
        Err(diag) => {
            diag.report();
            diagnostics.push(diag);
            None
        }
    };

    let filter = DateFilter {
        start: resolve(start, FilterBound::Start),
        end: resolve(end, FilterBound::End),
    };
    if let (Some(s), Some(e)) = (filter.start, filter.end) {
        if s > e {
            tracing::warn!(start = %s, end = %e, "start date is after end date; no records will match");
        }
    }
    (filter, diagnostics)
}

/// Ask for the start and end dates.
///
/// End of input counts as a blank answer.
pub fn prompt_date_filter<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
) -> Result<(DateFilter, Vec<Diagnostic>), AppError> {
    let start = ask(input, out, "Start date (YYYY-MM-DD, blank for no limit): ")?;
    let end = ask(input, out, "End date (YYYY-MM-DD, blank for no limit): ")?;
    Ok(resolve_filter(Some(&start), Some(&end)))
}

fn ask<R: BufRead, W: Write>(input: &mut R, out: &mut W, question: &str) -> Result<String, AppError> {
    write!(out, "{question}")
        .and_then(|_| out.flush())
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Failed to write prompt: {e}")))?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Failed to read input: {e}")))?;
    Ok(line.trim().to_string())
}

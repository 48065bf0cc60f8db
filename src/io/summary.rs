//! Read/write fiscal summary JSON files.
//!
//! The summary JSON is the portable representation of one analysis run:
//! - the budget schedule and rolling window used
//! - the date range actually analyzed
//! - per-fiscal-year compliance rows

use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{BudgetSchedule, FiscalSummary};
use crate::error::{AppError, EXIT_INPUT, EXIT_OUTPUT};
use crate::io::export::ensure_parent_dir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryFile {
    pub tool: String,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub records: usize,
    pub rolling_window: usize,
    pub budget: BudgetSchedule,
    pub fiscal_years: Vec<FiscalSummary>,
}

/// Write a summary JSON file.
pub fn write_summary_json(path: &Path, summary: &SummaryFile) -> Result<(), AppError> {
    ensure_parent_dir(path)?;
    let file = File::create(path)
        .map_err(|e| AppError::new(EXIT_OUTPUT, format!("Failed to create summary JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, summary)
        .map_err(|e| AppError::new(EXIT_OUTPUT, format!("Failed to write summary JSON: {e}")))?;

    Ok(())
}

/// Read a summary JSON file.
pub fn read_summary_json(path: &Path) -> Result<SummaryFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Failed to open summary JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::new(EXIT_INPUT, format!("Failed to parse summary JSON: {e}")))
}

//! Error types.
//!
//! Two tiers:
//!
//! - fatal: `AppError` (carries the process exit code) and `PipelineError`
//!   (typed stage failures that convert into `AppError`)
//! - non-fatal: `Diagnostic`, reported per file / per date / per filter bound and
//!   never aborting the batch

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{FilterBound, Metric};

/// Exit code for usage errors and unusable inputs.
pub const EXIT_INPUT: u8 = 2;
/// Exit code when no data survives to the analysis stages.
pub const EXIT_NO_DATA: u8 = 3;
/// Exit code for output/render failures.
pub const EXIT_OUTPUT: u8 = 4;

#[derive(Clone, Error)]
#[error("{message}")]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

/// Fatal failures raised by the pipeline stages themselves.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// The series reaching a stage has no records.
    #[error("No records available for {stage}: the merged series is empty.")]
    EmptySeries { stage: &'static str },

    /// A tunable is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let code = match err {
            PipelineError::EmptySeries { .. } => EXIT_NO_DATA,
            PipelineError::InvalidConfig(_) => EXIT_INPUT,
        };
        AppError::new(code, err.to_string())
    }
}

/// A non-fatal problem, isolated to one record, date, or filter bound.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Diagnostic {
    /// One side of a date's data is absent; the date is excluded.
    #[error("Missing {missing} data for date {date}; date skipped.")]
    MissingPair { date: NaiveDate, missing: Metric },

    /// A file or row could not be used; it is skipped.
    #[error("Skipping {}: {reason}", .path.display())]
    MalformedRecord { path: PathBuf, reason: String },

    /// A user-supplied filter bound did not parse; that bound is ignored.
    #[error("Invalid {bound} date '{input}'; ignoring this bound.")]
    InvalidFilterInput { bound: FilterBound, input: String },
}

impl Diagnostic {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Diagnostic::MalformedRecord {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Emit the diagnostic to the log.
    pub fn report(&self) {
        tracing::warn!("{self}");
    }
}

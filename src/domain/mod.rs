//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - source and joined measurement records (`SourceRecord`, `JoinedRecord`)
//! - derived outputs (`DerivedRecord`, `GhiBand`, `FiscalSummary`)
//! - run configuration (`DateFilter`, `BudgetSchedule`, `MetricConfig`)

pub mod types;

pub use types::*;

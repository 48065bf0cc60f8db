//! `pr-trend` library crate.
//!
//! The binary (`prt`) is a thin wrapper around this library so that:
//!
//! - the pipeline stages are testable without spawning processes
//! - the merge and analysis stages can be driven from other front-ends
//!
//! Pipeline: `io::ingest` -> `merge` -> `metrics` -> `report`, then `plot` / `tui`
//! for presentation.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod merge;
pub mod metrics;
pub mod plot;
pub mod report;
pub mod tui;

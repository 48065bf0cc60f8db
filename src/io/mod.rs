//! Input/output helpers.
//!
//! - per-day source tree ingest (`ingest`)
//! - merged / derived CSV read and write (`export`)
//! - fiscal summary JSON (`summary`)

pub mod export;
pub mod ingest;
pub mod summary;

pub use export::*;
pub use ingest::*;
pub use summary::*;

//! Merging the two source trees into one ordered series.
//!
//! - `pairer`: keyed join of PR and GHI records by date
//! - `assembler`: chronological ordering into a `MergedSeries`

pub mod assembler;
pub mod pairer;

pub use assembler::*;
pub use pairer::*;

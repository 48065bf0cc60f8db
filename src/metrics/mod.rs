//! Derived-metric engine.
//!
//! Each derivation is a small, pure function so it can be tested in isolation:
//!
//! - `rolling`: trailing mean of PR over a fixed number of records
//! - `budget`: declining budget PR by budget year
//! - `calendar`: fiscal year (July–June) and budget-year index
//! - `band`: GHI category
//!
//! `engine` composes them into a `DerivedRecord` per position.

pub mod band;
pub mod budget;
pub mod calendar;
pub mod engine;
pub mod rolling;

pub use band::*;
pub use calendar::*;
pub use engine::*;
pub use rolling::*;

//! Series assembly: order joined records into the canonical merged series.

use crate::domain::{DateFilter, JoinedRecord};

/// Joined records in strictly ascending date order (no duplicate dates).
///
/// Only constructed through [`assemble_series`] or [`MergedSeries::filtered`], so
/// the ordering invariant always holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedSeries {
    records: Vec<JoinedRecord>,
}

impl MergedSeries {
    pub fn records(&self) -> &[JoinedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_date(&self) -> Option<chrono::NaiveDate> {
        self.records.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<chrono::NaiveDate> {
        self.records.last().map(|r| r.date)
    }

    /// Restrict to records inside `filter` (inclusive bounds).
    pub fn filtered(&self, filter: &DateFilter) -> MergedSeries {
        if filter.is_unbounded() {
            return self.clone();
        }
        MergedSeries {
            records: self
                .records
                .iter()
                .filter(|r| filter.contains(r.date))
                .copied()
                .collect(),
        }
    }
}

/// Assembly output: the ordered series and how many same-date records were dropped.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    pub series: MergedSeries,
    pub dropped_duplicates: usize,
}

/// Sort joined records ascending by date.
///
/// The sort is stable; when two records share a date, the one that came first
/// in the input is kept and the rest are dropped with a warning.
pub fn assemble_series(mut joined: Vec<JoinedRecord>) -> Assembly {
    joined.sort_by_key(|r| r.date);

    let before = joined.len();
    joined.dedup_by_key(|r| r.date);
    let dropped_duplicates = before - joined.len();
    if dropped_duplicates > 0 {
        tracing::warn!(dropped_duplicates, "dropped joined records with duplicate dates (first kept)");
    }

    Assembly {
        series: MergedSeries { records: joined },
        dropped_duplicates,
    }
}

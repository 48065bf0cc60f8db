//! Record pairing: join PR and GHI measurements on their date key.
//!
//! The join is an explicit keyed lookup: GHI values are indexed by date, then PR
//! records are walked in order and looked up. Dates present on only one side are
//! reported as `Diagnostic::MissingPair` and dropped (never defaulted).

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::domain::{JoinedRecord, Metric, SourceRecord};
use crate::error::Diagnostic;

/// A date that only one source had.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnmatchedDate {
    pub date: NaiveDate,
    /// The side with no record for `date`.
    pub missing: Metric,
}

/// Joined records (unordered) plus every date that could not be paired.
#[derive(Debug, Clone, Default)]
pub struct PairOutcome {
    pub joined: Vec<JoinedRecord>,
    /// Sorted by date, then by missing side (PR before GHI).
    pub unmatched: Vec<UnmatchedDate>,
}

impl PairOutcome {
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.unmatched
            .iter()
            .map(|u| Diagnostic::MissingPair {
                date: u.date,
                missing: u.missing,
            })
            .collect()
    }
}

/// Pair PR and GHI records by exact date.
///
/// Each unmatched date is logged as a warning as it is found. If a side contains
/// the same date twice (ingest already rejects this), the first record wins.
pub fn pair_records(pr: &[SourceRecord], ghi: &[SourceRecord]) -> PairOutcome {
    let mut ghi_by_date: HashMap<NaiveDate, f64> = HashMap::with_capacity(ghi.len());
    for rec in ghi {
        ghi_by_date.entry(rec.date).or_insert(rec.value);
    }

    let mut out = PairOutcome {
        joined: Vec::with_capacity(pr.len().min(ghi_by_date.len())),
        unmatched: Vec::new(),
    };
    let mut seen_pr: HashSet<NaiveDate> = HashSet::with_capacity(pr.len());

    for rec in pr {
        if !seen_pr.insert(rec.date) {
            continue;
        }
        match ghi_by_date.get(&rec.date) {
            Some(&ghi_value) => out.joined.push(JoinedRecord {
                date: rec.date,
                pr: rec.value,
                ghi: Some(ghi_value),
            }),
            None => out.unmatched.push(UnmatchedDate {
                date: rec.date,
                missing: Metric::Ghi,
            }),
        }
    }

    for &date in ghi_by_date.keys() {
        if !seen_pr.contains(&date) {
            out.unmatched.push(UnmatchedDate {
                date,
                missing: Metric::Pr,
            });
        }
    }

    out.unmatched
        .sort_by_key(|u| (u.date, u.missing == Metric::Ghi));
    for diag in out.diagnostics() {
        diag.report();
    }

    tracing::info!(
        joined = out.joined.len(),
        unmatched = out.unmatched.len(),
        "paired PR and GHI records"
    );
    out
}

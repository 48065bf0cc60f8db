//! Fiscal calendar helpers.
//!
//! Fiscal years run July 1 – June 30 and are labeled by the calendar year they
//! end in.

use chrono::{Datelike, NaiveDate};

use crate::domain::FISCAL_YEAR_START_MONTH;

/// Fiscal year label for `date`.
pub fn fiscal_year(date: NaiveDate) -> i32 {
    if date.month() >= FISCAL_YEAR_START_MONTH {
        date.year() + 1
    } else {
        date.year()
    }
}

/// Zero-based budget year for `date` relative to `baseline_year`.
///
/// `(year - baseline) + (1 if month >= July) - 1`; negative before the baseline.
/// Widened to `i64` so any baseline year is safe.
pub fn budget_year_index(date: NaiveDate, baseline_year: i32) -> i64 {
    let flip = i64::from(date.month() >= FISCAL_YEAR_START_MONTH);
    (i64::from(date.year()) - i64::from(baseline_year)) + flip - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn fiscal_year_flips_in_july() {
        assert_eq!(fiscal_year(d(2019, 6, 30)), 2019);
        assert_eq!(fiscal_year(d(2019, 7, 1)), 2020);
        assert_eq!(fiscal_year(d(2019, 12, 31)), 2020);
        assert_eq!(fiscal_year(d(2020, 1, 1)), 2020);
    }

    #[test]
    fn budget_year_index_counts_from_baseline() {
        assert_eq!(budget_year_index(d(2019, 7, 1), 2019), 0);
        assert_eq!(budget_year_index(d(2020, 6, 30), 2019), 0);
        assert_eq!(budget_year_index(d(2020, 7, 1), 2019), 1);
        assert_eq!(budget_year_index(d(2024, 3, 15), 2019), 4);
        assert_eq!(budget_year_index(d(2019, 6, 30), 2019), -1);
        assert_eq!(budget_year_index(d(2017, 1, 1), 2019), -3);
    }

    #[test]
    fn budget_year_index_survives_extreme_baselines() {
        assert_eq!(budget_year_index(d(2019, 7, 1), i32::MIN), 2019 - i64::from(i32::MIN));
        assert_eq!(budget_year_index(d(2019, 6, 1), i32::MAX), 2019 - i64::from(i32::MAX) - 1);
    }
}

//! Compose the per-record derivations over a merged series.

use crate::domain::{DerivedRecord, MetricConfig};
use crate::error::PipelineError;
use crate::merge::MergedSeries;
use crate::metrics::{fiscal_year, ghi_band, rolling_mean};

/// Annotate every record of `series` with its derived fields.
///
/// Budget, band, and fiscal year depend only on the record itself; the rolling
/// average depends only on the record and the ones before it. An empty series
/// is an error rather than an empty result.
pub fn derive_series(series: &MergedSeries, config: &MetricConfig) -> Result<Vec<DerivedRecord>, PipelineError> {
    config.validate()?;
    if series.is_empty() {
        return Err(PipelineError::EmptySeries {
            stage: "derived metrics",
        });
    }

    let prs: Vec<f64> = series.records().iter().map(|r| r.pr).collect();
    let rolling = rolling_mean(&prs, config.rolling_window);

    let derived = series
        .records()
        .iter()
        .zip(rolling)
        .map(|(r, rolling_pr_avg)| DerivedRecord {
            date: r.date,
            pr: r.pr,
            ghi: r.ghi,
            rolling_pr_avg,
            budget_pr: config.budget.value_on(r.date),
            ghi_band: ghi_band(r.ghi),
            fiscal_year: fiscal_year(r.date),
        })
        .collect();

    Ok(derived)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GhiBand, JoinedRecord};
    use crate::merge::assemble_series;
    use chrono::{Duration, NaiveDate};

    fn series(n: usize) -> MergedSeries {
        let start = NaiveDate::from_ymd_opt(2019, 6, 1).unwrap();
        let joined = (0..n)
            .map(|i| JoinedRecord {
                date: start + Duration::days(i as i64),
                pr: 70.0 + i as f64,
                ghi: Some(i as f64 % 8.0),
            })
            .collect();
        assemble_series(joined).series
    }

    #[test]
    fn empty_series_fails_clearly() {
        let err = derive_series(&MergedSeries::default(), &MetricConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::EmptySeries { .. }));
    }

    #[test]
    fn fills_all_derived_fields() {
        let s = series(40);
        let derived = derive_series(&s, &MetricConfig::default()).unwrap();
        assert_eq!(derived.len(), 40);

        assert!(derived[..29].iter().all(|d| d.rolling_pr_avg.is_none()));
        // Mean of 70..=99.
        assert_eq!(derived[29].rolling_pr_avg, Some(84.5));

        // 2019-06-01 + 29 days = 2019-06-30, the last day of FY2019.
        assert_eq!(derived[29].fiscal_year, 2019);
        assert_eq!(derived[30].fiscal_year, 2020);
        assert!(derived[29].budget_pr > derived[30].budget_pr);
        assert_eq!(derived[30].budget_pr, 73.9);

        assert_eq!(derived[0].ghi_band, GhiBand::VeryLow);
        assert_eq!(derived[2].ghi_band, GhiBand::Low);
        assert_eq!(derived[6].ghi_band, GhiBand::VeryHigh);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = MetricConfig {
            rolling_window: 0,
            ..MetricConfig::default()
        };
        assert!(matches!(
            derive_series(&series(3), &cfg),
            Err(PipelineError::InvalidConfig(_))
        ));
    }
}

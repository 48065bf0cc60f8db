//! Chart rendering.
//!
//! - `svg`: the rendered chart artifact (Plotters, SVG backend)
//! - `ascii`: a quick terminal sanity-check plot
//!
//! Both consume the same precomputed `ChartSeries`, so render code stays focused
//! on drawing. Dates are mapped to `f64` day numbers for the x axis.

use chrono::{Datelike, NaiveDate};

use crate::domain::{DerivedRecord, GhiBand};

pub mod ascii;
pub mod svg;

pub use ascii::*;
pub use svg::*;

/// Chart title shared by the SVG and terminal renderers.
pub const CHART_TITLE: &str = "Performance Ratio (PR) Evolution with GHI Color Coding";

/// One daily PR observation positioned on the chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    pub x: f64,
    pub pr: f64,
    pub band: GhiBand,
}

/// Everything a renderer needs, in chart coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub points: Vec<ChartPoint>,
    /// Only positions where the rolling average is defined.
    pub rolling: Vec<(f64, f64)>,
    pub budget: Vec<(f64, f64)>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

impl ChartSeries {
    pub fn from_derived(derived: &[DerivedRecord]) -> Self {
        let points: Vec<ChartPoint> = derived
            .iter()
            .map(|r| ChartPoint {
                x: date_to_x(r.date),
                pr: r.pr,
                band: r.ghi_band,
            })
            .collect();
        let rolling: Vec<(f64, f64)> = derived
            .iter()
            .filter_map(|r| r.rolling_pr_avg.map(|avg| (date_to_x(r.date), avg)))
            .collect();
        let budget: Vec<(f64, f64)> = derived.iter().map(|r| (date_to_x(r.date), r.budget_pr)).collect();

        let x_bounds = match (points.first(), points.last()) {
            (Some(first), Some(last)) if last.x > first.x => [first.x, last.x],
            (Some(only), _) => [only.x - 1.0, only.x + 1.0],
            _ => [0.0, 1.0],
        };

        let ys = points
            .iter()
            .map(|p| p.pr)
            .chain(rolling.iter().map(|&(_, y)| y))
            .chain(budget.iter().map(|&(_, y)| y))
            .filter(|y| y.is_finite());
        let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for y in ys {
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
        if !y_min.is_finite() || !y_max.is_finite() {
            y_min = 0.0;
            y_max = 100.0;
        }
        let y_bounds = pad_range(y_min, y_max, 0.05);

        Self {
            points,
            rolling,
            budget,
            x_bounds,
            y_bounds,
        }
    }
}

/// Day number used as the chart x coordinate.
pub fn date_to_x(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

/// Inverse of [`date_to_x`], rounding to the nearest day.
pub fn x_to_date(x: f64) -> Option<NaiveDate> {
    if !x.is_finite() {
        return None;
    }
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
}

/// Axis label in `Mon-YYYY` form.
pub fn fmt_month_year(x: &f64) -> String {
    x_to_date(*x).map(|d| d.format("%b-%Y").to_string()).unwrap_or_default()
}

fn pad_range(min: f64, max: f64, frac: f64) -> [f64; 2] {
    let span = (max - min).abs();
    let pad = (span * frac).max(0.5);
    [min - pad, max + pad]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(day: u32, pr: f64, rolling: Option<f64>) -> DerivedRecord {
        DerivedRecord {
            date: NaiveDate::from_ymd_opt(2020, 1, day).unwrap(),
            pr,
            ghi: Some(3.0),
            rolling_pr_avg: rolling,
            budget_pr: 73.9,
            ghi_band: GhiBand::Low,
            fiscal_year: 2020,
        }
    }

    #[test]
    fn x_round_trips_through_dates() {
        let d = NaiveDate::from_ymd_opt(2021, 3, 14).unwrap();
        assert_eq!(x_to_date(date_to_x(d)), Some(d));
        assert_eq!(fmt_month_year(&date_to_x(d)), "Mar-2021");
    }

    #[test]
    fn series_skips_undefined_rolling_and_bounds_all_lines() {
        let derived = vec![rec(1, 60.0, None), rec(2, 80.0, Some(70.0)), rec(3, 75.0, Some(77.5))];
        let s = ChartSeries::from_derived(&derived);
        assert_eq!(s.points.len(), 3);
        assert_eq!(s.rolling.len(), 2);
        assert_eq!(s.budget.len(), 3);
        assert_eq!(s.x_bounds, [date_to_x(derived[0].date), date_to_x(derived[2].date)]);
        assert!(s.y_bounds[0] < 60.0 && s.y_bounds[1] > 80.0);
    }

    #[test]
    fn single_point_gets_a_nonzero_x_span() {
        let s = ChartSeries::from_derived(&[rec(5, 70.0, None)]);
        assert!(s.x_bounds[1] > s.x_bounds[0]);
        assert!(s.y_bounds[1] > s.y_bounds[0]);
    }
}

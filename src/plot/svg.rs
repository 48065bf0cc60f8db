//! SVG chart artifact.
//!
//! Layout: the chart on the left (PR scatter colored by GHI band, rolling
//! average, dashed budget line, legend) and a side panel on the right with the
//! fiscal-year compliance box and the trailing-window statistics box.

use std::error::Error;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::domain::{DerivedRecord, FiscalSummary, GhiBand, TrailingAverage};
use crate::error::{AppError, EXIT_OUTPUT, PipelineError};
use crate::io::export::ensure_parent_dir;
use crate::plot::{CHART_TITLE, ChartSeries, fmt_month_year};
use crate::report::{fiscal_lines, trailing_lines};

pub const CHART_SIZE: (u32, u32) = (1400, 800);
const SIDE_PANEL_WIDTH: u32 = 280;

const FONT: &str = "sans-serif";
const LINE_HEIGHT: i32 = 20;

const ROLLING_COLOR: RGBColor = RGBColor(220, 20, 20);
const BUDGET_COLOR: RGBColor = RGBColor(0, 100, 0);
const BOX_FILL: RGBColor = RGBColor(245, 245, 245);

/// Inputs for one rendered chart.
#[derive(Debug, Clone, Copy)]
pub struct ChartReport<'a> {
    pub derived: &'a [DerivedRecord],
    pub fiscal: &'a [FiscalSummary],
    pub trailing: &'a [TrailingAverage],
    pub rolling_window: usize,
}

/// Render the chart to an SVG file, creating the parent directory if needed.
pub fn render_svg_chart(path: &Path, report: &ChartReport<'_>) -> Result<(), AppError> {
    if report.derived.is_empty() {
        return Err(PipelineError::EmptySeries { stage: "chart" }.into());
    }
    ensure_parent_dir(path)?;

    draw_chart(path, report)
        .map_err(|e| AppError::new(EXIT_OUTPUT, format!("Failed to render chart '{}': {e}", path.display())))?;

    tracing::info!(path = %path.display(), points = report.derived.len(), "rendered chart");
    Ok(())
}

pub fn band_color(band: GhiBand) -> RGBColor {
    let (r, g, b) = band.rgb();
    RGBColor(r, g, b)
}

fn draw_chart(path: &Path, report: &ChartReport<'_>) -> Result<(), Box<dyn Error>> {
    let series = ChartSeries::from_derived(report.derived);

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let (plot_area, side_area) = root.split_horizontally(CHART_SIZE.0 - SIDE_PANEL_WIDTH);

    {
        let [x0, x1] = series.x_bounds;
        let [y0, y1] = series.y_bounds;
        let mut chart = ChartBuilder::on(&plot_area)
            .caption(CHART_TITLE, (FONT, 22))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(55)
            .build_cartesian_2d(x0..x1, y0..y1)?;

        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc("PR")
            .x_labels(12)
            .y_labels(10)
            .x_label_formatter(&fmt_month_year)
            .y_label_formatter(&|v| format!("{v:.0}"))
            .label_style((FONT, 12))
            .draw()?;

        // 1) Daily PR, one series per band so each gets a legend entry.
        for band in GhiBand::SCALE.into_iter().chain([GhiBand::Unknown]) {
            let color = band_color(band);
            let points: Vec<(f64, f64)> = series
                .points
                .iter()
                .filter(|p| p.band == band)
                .map(|p| (p.x, p.pr))
                .collect();
            if band == GhiBand::Unknown && points.is_empty() {
                continue;
            }
            chart
                .draw_series(
                    points
                        .iter()
                        .map(|&(x, y)| Circle::new((x, y), 3, color.mix(0.7).filled())),
                )?
                .label(band.legend_label())
                .legend(move |(x, y)| Circle::new((x, y), 5, color.filled()));
        }

        // 2) Rolling average.
        chart
            .draw_series(LineSeries::new(series.rolling.iter().copied(), ROLLING_COLOR.stroke_width(2)))?
            .label(format!("{}-d PR Avg", report.rolling_window))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], ROLLING_COLOR.stroke_width(2)));

        // 3) Budget, dashed.
        let dash = (series.budget.len() / 150).max(1);
        chart
            .draw_series(
                dash_segments(&series.budget, dash)
                    .into_iter()
                    .map(|seg| PathElement::new(seg, BUDGET_COLOR.stroke_width(2))),
            )?
            .label("Budget PR")
            .legend(|(x, y)| {
                PathElement::new(vec![(x, y), (x + 8, y)], BUDGET_COLOR.stroke_width(2))
            });

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.85))
            .border_style(&BLACK)
            .label_font((FONT, 13))
            .draw()?;
    }

    let fiscal = fiscal_lines(report.fiscal);
    let fiscal_bottom = draw_text_box(&side_area, (10, 60), "Fiscal years vs budget", &fiscal, BUDGET_COLOR)?;

    let trailing = trailing_lines(report.trailing);
    if !trailing.is_empty() {
        draw_text_box(&side_area, (10, fiscal_bottom + 30), "Trailing PR averages", &trailing, BLACK)?;
    }

    root.present()?;
    Ok(())
}

/// Split a polyline into alternating on/off runs of `dash` segments.
fn dash_segments(points: &[(f64, f64)], dash: usize) -> Vec<Vec<(f64, f64)>> {
    let dash = dash.max(1);
    let mut out = Vec::new();
    let mut start = 0;
    while start + 1 < points.len() {
        let end = (start + dash).min(points.len() - 1);
        out.push(points[start..=end].to_vec());
        start = end + dash;
    }
    out
}

/// Draw a titled text box; returns the box's bottom y coordinate.
fn draw_text_box(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    (x, y): (i32, i32),
    title: &str,
    lines: &[String],
    border: RGBColor,
) -> Result<i32, Box<dyn Error>> {
    let width = SIDE_PANEL_WIDTH as i32 - 2 * x;
    let height = LINE_HEIGHT * (lines.len() as i32 + 1) + 16;
    let bottom = y + height;

    area.draw(&Rectangle::new([(x, y), (x + width, bottom)], BOX_FILL.filled()))?;
    area.draw(&Rectangle::new([(x, y), (x + width, bottom)], border.stroke_width(1)))?;

    let title_style = TextStyle::from((FONT, 15).into_font()).color(&BLACK);
    area.draw(&Text::new(title.to_string(), (x + 8, y + 8), title_style))?;

    let body_style = TextStyle::from((FONT, 13).into_font()).color(&BLACK);
    for (i, line) in lines.iter().enumerate() {
        let ly = y + 8 + LINE_HEIGHT * (i as i32 + 1);
        area.draw(&Text::new(line.clone(), (x + 8, ly), body_style.clone()))?;
    }

    Ok(bottom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    #[test]
    fn dash_segments_alternate() {
        let pts: Vec<(f64, f64)> = (0..7).map(|i| (i as f64, 1.0)).collect();
        let segs = dash_segments(&pts, 2);
        let starts: Vec<f64> = segs.iter().map(|s| s[0].0).collect();
        assert_eq!(starts, vec![0.0, 4.0]);
        assert_eq!(segs[0].len(), 3);
        assert!(dash_segments(&pts[..1], 2).is_empty());
    }

    #[test]
    fn renders_svg_with_legend_and_boxes() {
        let start = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap();
        let derived: Vec<DerivedRecord> = (0..60)
            .map(|i| DerivedRecord {
                date: start + Duration::days(i),
                pr: 70.0 + (i % 7) as f64,
                ghi: Some((i % 9) as f64),
                rolling_pr_avg: (i >= 29).then_some(73.0),
                budget_pr: if i < 30 { 74.49 } else { 73.9 },
                ghi_band: crate::metrics::ghi_band(Some((i % 9) as f64)),
                fiscal_year: if i < 30 { 2020 } else { 2021 },
            })
            .collect();
        let fiscal = crate::report::summarize_fiscal_years(&derived).unwrap();
        let trailing = crate::report::trailing_averages(&derived, &crate::domain::TRAILING_WINDOWS);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charts/pr.svg");
        let report = ChartReport {
            derived: &derived,
            fiscal: &fiscal,
            trailing: &trailing,
            rolling_window: 30,
        };
        render_svg_chart(&path, &report).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Budget PR"));
        assert!(svg.contains("30-d PR Avg"));
        assert!(svg.contains("FY2021"));
        assert!(svg.contains("Last 30d Avg PR"));
    }

    #[test]
    fn empty_series_is_not_rendered() {
        let dir = tempfile::tempdir().unwrap();
        let report = ChartReport {
            derived: &[],
            fiscal: &[],
            trailing: &[],
            rolling_window: 30,
        };
        let err = render_svg_chart(&dir.path().join("x.svg"), &report).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_NO_DATA);
    }
}

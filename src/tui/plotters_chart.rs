//! Plotters-powered PR chart widget for Ratatui.
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`,
//! so the terminal view shares axis handling with the SVG artifact.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::domain::GhiBand;
use crate::plot::{ChartPoint, fmt_month_year};

/// A render-only chart description.
///
/// All series and bounds are computed outside the render call.
pub struct PrPlottersChart<'a> {
    /// Daily PR, colored by GHI band.
    pub points: &'a [ChartPoint],
    /// Rolling average; `None` hides the line.
    pub rolling: Option<&'a [(f64, f64)]>,
    /// Budget PR; `None` hides the line.
    pub budget: Option<&'a [(f64, f64)]>,
    /// X bounds (day numbers).
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

const ROLLING_COLOR: RGBColor = RGBColor(255, 60, 60);
const BUDGET_COLOR: RGBColor = RGBColor(0, 200, 80);

/// Band palette for dark terminal backgrounds (navy is unreadable there).
pub fn terminal_band_color(band: GhiBand) -> RGBColor {
    match band {
        GhiBand::VeryLow => RGBColor(90, 120, 255),
        other => {
            let (r, g, b) = other.rgb();
            RGBColor(r, g, b)
        }
    }
}

/// Same palette as [`terminal_band_color`], as a Ratatui color.
pub fn band_style_color(band: GhiBand) -> Color {
    let RGBColor(r, g, b) = terminal_band_color(band);
    Color::Rgb(r, g, b)
}

impl<'a> Widget for PrPlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to build a chart in a tiny area; show a hint instead.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Mesh lines are clutter at terminal resolution; axes and labels are enough.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&fmt_month_year)
                .y_label_formatter(&|v| format!("{v:.0}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            // Circle radii are mis-scaled by the ratatui backend, so points are pixels.
            chart.draw_series(
                self.points
                    .iter()
                    .filter(|p| p.pr.is_finite())
                    .map(|p| Pixel::new((p.x, p.pr), terminal_band_color(p.band))),
            )?;

            if let Some(budget) = self.budget {
                chart.draw_series(LineSeries::new(budget.iter().copied(), &BUDGET_COLOR))?;
            }
            if let Some(rolling) = self.rolling {
                chart.draw_series(LineSeries::new(rolling.iter().copied(), &ROLLING_COLOR))?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - daily PR: one glyph per GHI band (`.` `o` `O` `@`, `?` when GHI is unknown)
//! - rolling average: `-` line
//! - budget: `=` line

use crate::domain::GhiBand;
use crate::plot::{ChartSeries, x_to_date};

const ROLLING_CHAR: char = '-';
const BUDGET_CHAR: char = '=';

pub fn band_glyph(band: GhiBand) -> char {
    match band {
        GhiBand::VeryLow => '.',
        GhiBand::Low => 'o',
        GhiBand::High => 'O',
        GhiBand::VeryHigh => '@',
        GhiBand::Unknown => '?',
    }
}

/// Render the chart series on a `width` x `height` character grid.
pub fn render_ascii_plot(series: &ChartSeries, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);
    let [x_min, x_max] = series.x_bounds;
    let [y_min, y_max] = series.y_bounds;
    let frame = Frame {
        x_min,
        x_max,
        y_min,
        y_max,
        width,
        height,
    };

    let mut grid = vec![vec![' '; width]; height];

    // Lines first so points overlay them; budget wins over the rolling average.
    draw_polyline(&mut grid, &frame, &series.budget, BUDGET_CHAR);
    draw_polyline(&mut grid, &frame, &series.rolling, ROLLING_CHAR);

    for p in &series.points {
        if !p.pr.is_finite() {
            continue;
        }
        let (x, y) = frame.map(p.x, p.pr);
        grid[y][x] = band_glyph(p.band);
    }

    let label = |x: f64| x_to_date(x).map(|d| d.to_string()).unwrap_or_else(|| "?".to_string());
    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {} .. {} | PR=[{y_min:.2}, {y_max:.2}]\n",
        label(x_min),
        label(x_max)
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out.push_str("Legend:");
    for band in GhiBand::SCALE.into_iter().chain([GhiBand::Unknown]) {
        out.push_str(&format!(" {} {} ", band_glyph(band), band.legend_label()));
    }
    out.push_str(&format!(" {ROLLING_CHAR} rolling avg  {BUDGET_CHAR} budget\n"));

    out
}

struct Frame {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    width: usize,
    height: usize,
}

impl Frame {
    fn map(&self, x: f64, y: f64) -> (usize, usize) {
        (
            map_x(x, self.x_min, self.x_max, self.width),
            map_y(y, self.y_min, self.y_max, self.height),
        )
    }
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y max is row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_polyline(grid: &mut [Vec<char>], frame: &Frame, points: &[(f64, f64)], ch: char) {
    let mut prev = None;
    for &(x, y) in points.iter().filter(|(_, y)| y.is_finite()) {
        let (cx, cy) = frame.map(x, y);
        match prev {
            Some((x0, y0)) => draw_line(grid, x0, y0, cx, cy, ch),
            None => {
                if grid[cy][cx] == ' ' {
                    grid[cy][cx] = ch;
                }
            }
        }
        prev = Some((cx, cy));
    }
}

/// Integer line drawing (Bresenham-ish). Only blank cells are written.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

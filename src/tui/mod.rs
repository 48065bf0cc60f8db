//! Ratatui-based terminal viewer.
//!
//! Shows the PR chart for a merged series with a side panel of fiscal-year
//! compliance and trailing averages. The rolling window and the fiscal year in
//! focus can be changed live; every change re-runs the shared analysis pipeline.

use std::io;
use std::time::Duration;

use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::app::pipeline::{AnalysisOutput, run_analysis};
use crate::domain::{DateFilter, GhiBand, MetricConfig};
use crate::error::{AppError, EXIT_OUTPUT};
use crate::merge::MergedSeries;
use crate::metrics::fiscal_year;
use crate::plot::{ChartSeries, x_to_date};
use crate::report::{fiscal_lines, trailing_lines};

mod plotters_chart;

use plotters_chart::{PrPlottersChart, band_style_color};

/// Start the viewer over an already-loaded merged series.
pub fn run(series: MergedSeries, filter: DateFilter, config: MetricConfig) -> Result<(), AppError> {
    // Analyze before touching the terminal so fatal errors print normally.
    let mut app = App::new(series, filter, config)?;

    let _guard = TerminalGuard::new()?;
    let backend = ratatui::backend::CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(EXIT_OUTPUT, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(EXIT_OUTPUT, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(EXIT_OUTPUT, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    series: MergedSeries,
    /// Filter given on the command line; fiscal focus narrows it further.
    base_filter: DateFilter,
    config: MetricConfig,
    /// Fiscal years present in the base-filtered series, ascending.
    fiscal_years: Vec<i32>,
    /// Index into `fiscal_years`; `None` shows the whole range.
    focus: Option<usize>,
    show_rolling: bool,
    show_budget: bool,
    status: String,
    analysis: AnalysisOutput,
    chart: ChartSeries,
}

impl App {
    fn new(series: MergedSeries, base_filter: DateFilter, config: MetricConfig) -> Result<Self, AppError> {
        let analysis = run_analysis(&series, &base_filter, &config)?;
        let chart = ChartSeries::from_derived(&analysis.derived);

        let mut fiscal_years: Vec<i32> = series
            .filtered(&base_filter)
            .records()
            .iter()
            .map(|r| fiscal_year(r.date))
            .collect();
        fiscal_years.dedup();

        Ok(Self {
            series,
            base_filter,
            config,
            fiscal_years,
            focus: None,
            show_rolling: true,
            show_budget: true,
            status: format!("{} records", analysis.derived.len()),
            analysis,
            chart,
        })
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(EXIT_OUTPUT, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(EXIT_OUTPUT, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(EXIT_OUTPUT, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Apply one key press; returns `true` when the viewer should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('a') => {
                self.show_rolling = !self.show_rolling;
                self.status = format!("rolling average {}", on_off(self.show_rolling));
            }
            KeyCode::Char('b') => {
                self.show_budget = !self.show_budget;
                self.status = format!("budget line {}", on_off(self.show_budget));
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.set_window(self.config.rolling_window.saturating_add(1)),
            KeyCode::Char('-') => self.set_window(self.config.rolling_window.saturating_sub(1)),
            KeyCode::Right | KeyCode::Char('f') => self.cycle_focus(true),
            KeyCode::Left => self.cycle_focus(false),
            _ => {}
        }
        false
    }

    fn set_window(&mut self, window: usize) {
        if window == 0 {
            self.status = "rolling window must be at least 1 record".to_string();
            return;
        }
        let previous = self.config.rolling_window;
        self.config.rolling_window = window;
        if self.reanalyze() {
            self.status = format!("rolling window: {window} records");
        } else {
            self.config.rolling_window = previous;
        }
    }

    fn cycle_focus(&mut self, forward: bool) {
        let n = self.fiscal_years.len();
        if n == 0 {
            return;
        }
        let previous = self.focus;
        self.focus = match (self.focus, forward) {
            (None, true) => Some(0),
            (None, false) => Some(n - 1),
            (Some(i), true) if i + 1 < n => Some(i + 1),
            (Some(i), false) if i > 0 => Some(i - 1),
            (Some(_), _) => None,
        };
        if self.reanalyze() {
            self.status = match self.focus_year() {
                Some(fy) => format!("focus: FY{fy}"),
                None => "focus: all fiscal years".to_string(),
            };
        } else {
            self.focus = previous;
        }
    }

    fn focus_year(&self) -> Option<i32> {
        self.focus.and_then(|i| self.fiscal_years.get(i).copied())
    }

    fn active_filter(&self) -> DateFilter {
        match self.focus_year() {
            Some(fy) => intersect(self.base_filter, fiscal_year_range(fy)),
            None => self.base_filter,
        }
    }

    /// Re-run the analysis with the current settings; on failure the previous
    /// analysis stays and the error is shown in the status bar.
    fn reanalyze(&mut self) -> bool {
        match run_analysis(&self.series, &self.active_filter(), &self.config) {
            Ok(analysis) => {
                self.chart = ChartSeries::from_derived(&analysis.derived);
                self.analysis = analysis;
                true
            }
            Err(err) => {
                self.status = err.to_string();
                false
            }
        }
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(34)])
            .split(chunks[1]);
        self.draw_chart(frame, body[0]);
        self.draw_side_panel(frame, body[1]);

        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let first = self.analysis.derived.first().map(|r| r.date.to_string()).unwrap_or_default();
        let last = self.analysis.derived.last().map(|r| r.date.to_string()).unwrap_or_default();
        let focus = self.focus_year().map(|fy| format!("FY{fy}")).unwrap_or_else(|| "all".to_string());

        let lines = vec![
            Line::from(vec![
                Span::styled("prt", Style::default().fg(Color::Cyan)),
                Span::raw(" | PR vs budget"),
            ]),
            Line::from(Span::styled(
                format!(
                    "records: {} | {first} .. {last} | window: {} | focus: {focus}",
                    self.analysis.derived.len(),
                    self.config.rolling_window,
                ),
                Style::default().fg(Color::Gray),
            )),
        ];

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Performance Ratio").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let (chart_rect, insets) = chart_layout(inner);
        let widget = PrPlottersChart {
            points: &self.chart.points,
            rolling: self.show_rolling.then_some(self.chart.rolling.as_slice()),
            budget: self.show_budget.then_some(self.chart.budget.as_slice()),
            x_bounds: self.chart.x_bounds,
            y_bounds: self.chart.y_bounds,
        };
        frame.render_widget(widget, chart_rect);

        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, self.chart.x_bounds, self.chart.y_bounds);
        }
    }

    fn draw_side_panel(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let heading = Style::default().add_modifier(Modifier::BOLD);
        let mut lines: Vec<Line> = Vec::new();

        lines.push(Line::from(Span::styled("Fiscal years vs budget", heading)));
        for line in fiscal_lines(&self.analysis.fiscal) {
            lines.push(Line::from(line));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Trailing PR averages", heading)));
        let trailing = trailing_lines(&self.analysis.trailing);
        if trailing.is_empty() {
            lines.push(Line::from(Span::styled("not enough records", Style::default().fg(Color::Gray))));
        }
        for line in trailing {
            lines.push(Line::from(line));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Legend", heading)));
        for band in GhiBand::SCALE.into_iter().chain([GhiBand::Unknown]) {
            lines.push(Line::from(vec![
                Span::styled("● ", Style::default().fg(band_style_color(band))),
                Span::raw(band.legend_label()),
            ]));
        }
        lines.push(Line::from(vec![
            Span::styled("── ", Style::default().fg(Color::Rgb(255, 60, 60))),
            Span::raw(format!("{}-d PR Avg", self.config.rolling_window)),
        ]));
        lines.push(Line::from(vec![
            Span::styled("── ", Style::default().fg(Color::Rgb(0, 200, 80))),
            Span::raw("Budget PR"),
        ]));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().title("Summary").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "a avg  b budget  +/- window  ←/→ fiscal year  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

/// July 1 of the previous calendar year through June 30.
fn fiscal_year_range(fy: i32) -> DateFilter {
    DateFilter {
        start: NaiveDate::from_ymd_opt(fy - 1, 7, 1),
        end: NaiveDate::from_ymd_opt(fy, 6, 30),
    }
}

fn intersect(a: DateFilter, b: DateFilter) -> DateFilter {
    let tighter = |x: Option<NaiveDate>, y: Option<NaiveDate>, later: bool| match (x, y) {
        (Some(x), Some(y)) => Some(if later { x.max(y) } else { x.min(y) }),
        (x, None) => x,
        (None, y) => y,
    };
    DateFilter {
        start: tighter(a.start, b.start, true),
        end: tighter(a.end, b.end, false),
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 6,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let Some(date) = x_to_date(x_val) else {
            continue;
        };
        let label = date.format("%b-%y").to_string();
        let label_len = label.len() as u16;
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let start = x.saturating_sub(label_len / 2);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = format!("{y_val:.0}");
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label_len);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("date")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new("PR").style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}

//! Ratatui-based terminal UI.
//!
//! Shows the linear and correlation views on two tabs over the tables already
//! on disk. The threshold and window boundary can be changed live; `r` reloads
//! the tables (e.g. after a `vaxcases extract` in another terminal).

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
};

use crate::app::pipeline::{AnalysisInputs, CorrelationView, LinearView, correlation_view, linear_view, load_inputs};
use crate::domain::{AlignedPair, RunConfig, WindowBoundary};
use crate::error::AppError;
use crate::math::format_coefficient;
use crate::plot::{fmt_date_tick, linear_series, scatter_bounds, scatter_title, threshold_label};

mod plotters_chart;

use plotters_chart::{DualAxisChart, ScatterChart};

const THRESHOLD_STEP: f64 = 0.05;

/// Start the TUI.
pub fn run(config: RunConfig) -> Result<(), AppError> {
    // Load before touching the terminal so input errors print normally.
    let mut app = App::new(config)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::runtime(format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::runtime(format!("Failed to enter alternate screen: {e}")));
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Linear,
    Correlation,
}

impl Tab {
    fn index(self) -> usize {
        match self {
            Tab::Linear => 0,
            Tab::Correlation => 1,
        }
    }

    fn toggle(self) -> Self {
        match self {
            Tab::Linear => Tab::Correlation,
            Tab::Correlation => Tab::Linear,
        }
    }
}

struct App {
    config: RunConfig,
    tab: Tab,
    status: String,
    inputs: AnalysisInputs,
    linear: LinearView,
    correlation: CorrelationView,
}

impl App {
    fn new(config: RunConfig) -> Result<Self, AppError> {
        let inputs = load_inputs(&config)?;
        let linear = linear_view(&inputs, &config);
        let correlation = correlation_view(&inputs, &config)?;
        Ok(Self {
            config,
            tab: Tab::Linear,
            status: "Loaded tables.".to_string(),
            inputs,
            linear,
            correlation,
        })
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::runtime(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))? {
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

    /// Returns `true` to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab | KeyCode::Left | KeyCode::Right => {
                self.tab = self.tab.toggle();
            }
            KeyCode::Char('1') => self.tab = Tab::Linear,
            KeyCode::Char('2') => self.tab = Tab::Correlation,
            KeyCode::Char('+') | KeyCode::Up => self.shift_threshold(THRESHOLD_STEP),
            KeyCode::Char('-') | KeyCode::Down => self.shift_threshold(-THRESHOLD_STEP),
            KeyCode::Char('b') => {
                self.config.window_boundary = match self.config.window_boundary {
                    WindowBoundary::FirstRow => WindowBoundary::Earliest,
                    WindowBoundary::Earliest => WindowBoundary::FirstRow,
                };
                self.linear = linear_view(&self.inputs, &self.config);
                self.status = format!("window boundary: {:?}", self.config.window_boundary);
            }
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
        false
    }

    fn shift_threshold(&mut self, delta: f64) {
        let next = ((self.config.threshold + delta) * 100.0).round() / 100.0;
        self.config.threshold = next.clamp(0.0, 1.0);
        self.recompute_correlation();
        self.status = format!("threshold: {}", threshold_label(self.config.threshold));
    }

    fn recompute_correlation(&mut self) {
        match correlation_view(&self.inputs, &self.config) {
            Ok(view) => self.correlation = view,
            Err(e) => self.status = format!("Correlation failed: {e}"),
        }
    }

    fn reload(&mut self) {
        match load_inputs(&self.config) {
            Ok(inputs) => {
                self.inputs = inputs;
                self.linear = linear_view(&self.inputs, &self.config);
                self.recompute_correlation();
                self.status = format!(
                    "Reloaded: {} rate rows, {} case rows.",
                    self.inputs.rates.len(),
                    self.inputs.cases.points.len()
                );
            }
            Err(e) => self.status = format!("Reload failed: {e}"),
        }
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);
        self.draw_tabs(frame, chunks[1]);
        match self.tab {
            Tab::Linear => self.draw_linear(frame, chunks[2]),
            Tab::Correlation => self.draw_correlation(frame, chunks[2]),
        }
        self.draw_footer(frame, chunks[3]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let span = match (self.inputs.rates.earliest_date(), self.inputs.rates.latest_date()) {
            (Some(a), Some(b)) => format!("{a} → {b}"),
            _ => "-".to_string(),
        };
        let lines = vec![
            Line::from(vec![
                Span::styled("vaxcases", Style::default().fg(Color::Cyan)),
                Span::raw(format!(" {}", self.config.data_dir.display())),
            ]),
            Line::from(Span::styled(
                format!(
                    "rates: {} ({} missing) | span: {span} | case dates: {} | r(all)={} | r({})={}",
                    self.inputs.rates.len(),
                    self.inputs.rates.missing_count(),
                    self.linear.cases.len(),
                    format_coefficient(self.correlation.r_full),
                    threshold_label(self.correlation.threshold),
                    format_coefficient(self.correlation.r_above),
                ),
                Style::default().fg(Color::Gray),
            )),
        ];
        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_tabs(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let tabs = Tabs::new(vec!["1 Linear", "2 Correlation"])
            .select(self.tab.index())
            .block(Block::default().borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White).add_modifier(Modifier::BOLD));
        frame.render_widget(tabs, area);
    }

    fn draw_linear(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .title(crate::plot::LINEAR_TITLE)
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let series = linear_series(&self.linear);
        if series.rate_segments.is_empty() && series.cases.is_empty() {
            frame.render_widget(
                Paragraph::new("No data in the window.").style(Style::default().fg(Color::Yellow)),
                inner,
            );
            return;
        }

        frame.render_widget(
            DualAxisChart {
                rate_segments: &series.rate_segments,
                cases: &series.cases,
                x_bounds: series.x_range,
                rate_bounds: series.rate_range,
                case_bounds: series.case_range,
                fmt_x: fmt_date_tick,
            },
            inner,
        );
    }

    fn draw_correlation(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let halves = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let view = &self.correlation;
        draw_scatter(frame, halves[0], &view.full, &scatter_title("All dates", view.r_full));
        draw_scatter(
            frame,
            halves[1],
            &view.above,
            &scatter_title(&threshold_label(view.threshold), view.r_above),
        );
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "Tab switch  +/- threshold  b window  r reload  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn draw_scatter(frame: &mut ratatui::Frame<'_>, area: Rect, pair: &AlignedPair, title: &str) {
    let block = Block::default()
        .title(format!("{title} (n={})", pair.len()))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Clear, inner);

    if pair.is_empty() {
        frame.render_widget(
            Paragraph::new("No aligned dates.").style(Style::default().fg(Color::Yellow)),
            inner,
        );
        return;
    }

    let points = pair.points();
    let (x_bounds, y_bounds) = scatter_bounds(&points);
    frame.render_widget(
        ScatterChart {
            points: &points,
            x_bounds,
            y_bounds,
        },
        inner,
    );
}

//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - linear view: vaccination rate `*` (left scale), case totals `.` (right scale)
//! - correlation view: one `o` per aligned date, two panels side by side

use crate::app::pipeline::{CorrelationView, LinearView};
use crate::domain::AlignedPair;
use crate::plot::{
    LINEAR_TITLE, fmt_date_tick, linear_series, scatter_bounds, scatter_title, threshold_label,
};

/// Render the dual-axis time series.
pub fn render_linear_ascii(view: &LinearView, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let series = linear_series(view);
    let (x_min, x_max) = series.x_range;
    let (r_min, r_max) = series.rate_range;
    let (c_min, c_max) = series.case_range;

    let mut grid = vec![vec![' '; width]; height];
    for segment in &series.rate_segments {
        draw_polyline(&mut grid, segment, series.x_range, series.rate_range, '*');
    }
    draw_polyline(&mut grid, &series.cases, series.x_range, series.case_range, '.');

    let mut out = String::new();
    out.push_str(LINEAR_TITLE);
    out.push('\n');
    out.push_str(&format!(
        "dates=[{}, {}] | rate(*)=[{r_min:.2}, {r_max:.2}] | cases(.)=[{c_min:.0}, {c_max:.0}]\n",
        fmt_date_tick(x_min),
        fmt_date_tick(x_max),
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

/// Render both scatter panels side by side.
pub fn render_correlation_ascii(view: &CorrelationView, width: usize, height: usize) -> String {
    let panel_width = (width.saturating_sub(3) / 2).max(10);

    let left = render_scatter_lines(
        &view.full,
        &scatter_title("All dates", view.r_full),
        panel_width,
        height,
    );
    let right = render_scatter_lines(
        &view.above,
        &scatter_title(&threshold_label(view.threshold), view.r_above),
        panel_width,
        height,
    );

    let mut out = String::new();
    for (l, r) in left.iter().zip(right.iter()) {
        out.push_str(l);
        out.push_str(" | ");
        out.push_str(r);
        out.push('\n');
    }
    out
}

/// One scatter panel as fixed-width lines: title, ranges, then the grid.
pub fn render_scatter_lines(pair: &AlignedPair, title: &str, width: usize, height: usize) -> Vec<String> {
    let width = width.max(10);
    let height = height.max(5);
    let points = pair.points();

    let ((x_min, x_max), (y_min, y_max)) = scatter_bounds(&points);

    let mut grid = vec![vec![' '; width]; height];
    for &(x, y) in &points {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][col] = 'o';
    }

    let mut lines = Vec::with_capacity(height + 2);
    lines.push(fit_width(title, width));
    lines.push(fit_width(
        &format!("rate=[{x_min:.2}, {x_max:.2}] cases=[{y_min:.1}, {y_max:.1}] n={}", pair.len()),
        width,
    ));
    for row in grid {
        lines.push(row.into_iter().collect());
    }
    lines
}

fn fit_width(s: &str, width: usize) -> String {
    let truncated: String = s.chars().take(width).collect();
    format!("{truncated:<width$}")
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_polyline(
    grid: &mut [Vec<char>],
    points: &[(f64, f64)],
    (x_min, x_max): (f64, f64),
    (y_min, y_max): (f64, f64),
    ch: char,
) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in points {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        if let Some((c0, r0)) = prev {
            draw_line(grid, c0, r0, col, row, ch);
        } else if grid[row][col] == ' ' {
            grid[row][col] = ch;
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish). Only fills blank cells.
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

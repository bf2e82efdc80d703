//! Plotters-powered chart widgets for Ratatui.
//!
//! Plotters output is drawn into the Ratatui buffer through
//! `plotters-ratatui-backend`, which gives us axes, ticks and a secondary
//! y-axis without hand-rolling them for the terminal.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

const RATE_COLOR: RGBColor = RGBColor(255, 80, 80);
const CASES_COLOR: RGBColor = RGBColor(0, 255, 255);

/// Rate (left axis) and case totals (right axis) over a shared date axis.
///
/// All series and bounds are computed outside the render call.
pub struct DualAxisChart<'a> {
    /// Runs of `(day number, rate)`; each is drawn as its own line.
    pub rate_segments: &'a [Vec<(f64, f64)>],
    /// `(day number, cases)`
    pub cases: &'a [(f64, f64)],
    pub x_bounds: (f64, f64),
    pub rate_bounds: (f64, f64),
    pub case_bounds: (f64, f64),
    pub fmt_x: fn(f64) -> String,
}

impl<'a> Widget for DualAxisChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if too_small(area, buf) {
            return;
        }
        if !(valid(self.x_bounds) && valid(self.rate_bounds) && valid(self.case_bounds)) {
            return;
        }

        let (x0, x1) = self.x_bounds;
        let (r0, r1) = self.rate_bounds;
        let (c0, c1) = self.case_bounds;

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Right, 8)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, r0..r1)?
                .set_secondary_coord(x0..x1, c0..c1);

            // Mesh lines are noise at terminal resolution; axes + labels suffice.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_labels(4)
                .y_labels(5)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| format!("{:.0}%", v * 100.0))
                .label_style(("sans-serif", 10).into_font().color(&RATE_COLOR))
                .axis_style(&WHITE)
                .draw()?;

            chart
                .configure_secondary_axes()
                .y_labels(5)
                .y_label_formatter(&|v| format!("{v:.0}"))
                .label_style(("sans-serif", 10).into_font().color(&CASES_COLOR))
                .axis_style(&WHITE)
                .draw()?;

            chart.draw_series(
                self.rate_segments
                    .iter()
                    .map(|seg| PathElement::new(seg.clone(), RATE_COLOR)),
            )?;
            chart.draw_secondary_series(LineSeries::new(self.cases.iter().copied(), &CASES_COLOR))?;

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// Rate vs cases scatter.
pub struct ScatterChart<'a> {
    pub points: &'a [(f64, f64)],
    pub x_bounds: (f64, f64),
    pub y_bounds: (f64, f64),
}

impl<'a> Widget for ScatterChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if too_small(area, buf) {
            return;
        }
        if !(valid(self.x_bounds) && valid(self.y_bounds)) {
            return;
        }

        let (x0, x1) = self.x_bounds;
        let (y0, y1) = self.y_bounds;

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 7)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_labels(4)
                .y_labels(5)
                .x_label_formatter(&|v| format!("{:.0}%", v * 100.0))
                .y_label_formatter(&|v| format!("{v:.0}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .draw()?;

            // `Circle` radii are mis-scaled by the ratatui backend; a colored
            // `Pixel` renders as a clean dot.
            chart.draw_series(
                self.points
                    .iter()
                    .map(|&(x, y)| Pixel::new((x, y), CASES_COLOR)),
            )?;

            Ok(())
        });

        widget.render(area, buf);
    }
}

fn too_small(area: Rect, buf: &mut Buffer) -> bool {
    // Plotters may fail to build a chart in a tiny area; show a hint instead.
    if area.width < 20 || area.height < 8 {
        buf.set_string(
            area.x,
            area.y,
            "Chart area too small (resize terminal).",
            Style::default().fg(Color::Yellow),
        );
        return true;
    }
    false
}

fn valid((lo, hi): (f64, f64)) -> bool {
    lo.is_finite() && hi.is_finite() && hi > lo
}

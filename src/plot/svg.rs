//! SVG rendering with Plotters.
//!
//! - linear view: rate on the left axis, cases on a secondary right axis
//! - correlation view: two scatter panels, titled with their coefficients

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::app::pipeline::{CorrelationView, LinearView};
use crate::domain::AlignedPair;
use crate::error::AppError;
use crate::plot::{
    LINEAR_TITLE, fmt_date_tick, linear_series, scatter_bounds, scatter_title, threshold_label,
};

const SIZE: (u32, u32) = (1200, 700);

fn draw_err<E: std::fmt::Display>(e: E) -> AppError {
    AppError::runtime(format!("Failed to render SVG: {e}"))
}

pub fn render_linear_svg(path: &Path, view: &LinearView) -> Result<(), AppError> {
    let series = linear_series(view);
    let (x0, x1) = series.x_range;
    let (r0, r1) = series.rate_range;
    let (c0, c1) = series.case_range;

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(LINEAR_TITLE, ("sans-serif", 24))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .right_y_label_area_size(70)
        .build_cartesian_2d(x0..x1, r0..r1)
        .map_err(draw_err)?
        .set_secondary_coord(x0..x1, c0..c1);

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(8)
        .x_label_formatter(&|v| fmt_date_tick(*v))
        .y_desc("% vaccinated")
        .y_label_formatter(&|v| format!("{:.0}%", v * 100.0))
        .draw()
        .map_err(draw_err)?;

    chart
        .configure_secondary_axes()
        .y_desc("cases")
        .y_label_formatter(&|v| format!("{v:.0}"))
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_series(
            series
                .rate_segments
                .iter()
                .map(|seg| PathElement::new(seg.clone(), RED)),
        )
        .map_err(draw_err)?
        .label("Vaccinated")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart
        .draw_secondary_series(LineSeries::new(series.cases.iter().copied(), &BLUE))
        .map_err(draw_err)?
        .label("Cases")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}

pub fn render_correlation_svg(path: &Path, view: &CorrelationView) -> Result<(), AppError> {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let panels = root.split_evenly((1, 2));
    draw_scatter(&panels[0], &view.full, &scatter_title("All dates", view.r_full))?;
    draw_scatter(
        &panels[1],
        &view.above,
        &scatter_title(&threshold_label(view.threshold), view.r_above),
    )?;

    root.present().map_err(draw_err)?;
    Ok(())
}

fn draw_scatter(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    pair: &AlignedPair,
    title: &str,
) -> Result<(), AppError> {
    let points = pair.points();
    let ((x0, x1), (y0, y1)) = scatter_bounds(&points);

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 20))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .x_desc("% vaccinated")
        .y_desc("cases")
        .x_label_formatter(&|v| format!("{:.0}%", v * 100.0))
        .y_label_formatter(&|v| format!("{v:.0}"))
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 3, BLUE.mix(0.7).filled())),
        )
        .map_err(draw_err)?;

    Ok(())
}

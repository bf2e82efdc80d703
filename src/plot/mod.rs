//! Renderers for the two views.
//!
//! - `ascii`: fixed-size character grids for plain terminals (deterministic,
//!   handy for golden tests)
//! - `svg`: Plotters SVG files with real axes and a secondary y-axis
//!
//! Both share the axis helpers below. Dates are mapped to `f64` day numbers
//! so every backend works on plain numeric ranges.

use chrono::{Datelike, NaiveDate};

use crate::app::pipeline::LinearView;

pub mod ascii;
pub mod svg;

pub use ascii::*;
pub use svg::*;

pub const LINEAR_TITLE: &str = "Spain Cases VS % Vaccination";

/// Linear view as numeric series plus the axis ranges every backend uses.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSeries {
    /// Runs of known `(day number, rate)`, split at missing rates.
    pub rate_segments: Vec<Vec<(f64, f64)>>,
    /// `(day number, cases)`
    pub cases: Vec<(f64, f64)>,
    /// Shared date axis, unpadded.
    pub x_range: (f64, f64),
    /// Left axis, padded by 5%.
    pub rate_range: (f64, f64),
    /// Right axis, padded by 5%.
    pub case_range: (f64, f64),
}

pub fn linear_series(view: &LinearView) -> LinearSeries {
    let rate_segments = rate_segments(&view.rates);
    let cases: Vec<(f64, f64)> = view
        .cases
        .iter()
        .map(|(d, c)| (date_to_x(d), c as f64))
        .collect();

    let x_range = data_range(
        view.rates
            .iter()
            .map(|(d, _)| date_to_x(*d))
            .chain(cases.iter().map(|(x, _)| *x)),
    );
    let (r0, r1) = data_range(rate_segments.iter().flatten().map(|(_, y)| *y));
    let (c0, c1) = data_range(cases.iter().map(|(_, y)| *y));

    LinearSeries {
        rate_segments,
        cases,
        x_range,
        rate_range: pad_range(r0, r1, 0.05),
        case_range: pad_range(c0, c1, 0.05),
    }
}

fn rate_segments(rates: &[(NaiveDate, Option<f64>)]) -> Vec<Vec<(f64, f64)>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();
    for (date, rate) in rates {
        match rate {
            Some(r) => current.push((date_to_x(*date), *r)),
            None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Padded `(x, y)` ranges of scatter points.
pub fn scatter_bounds(points: &[(f64, f64)]) -> ((f64, f64), (f64, f64)) {
    let (x0, x1) = data_range(points.iter().map(|(x, _)| *x));
    let (y0, y1) = data_range(points.iter().map(|(_, y)| *y));
    (pad_range(x0, x1, 0.05), pad_range(y0, y1, 0.05))
}

pub fn date_to_x(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

pub fn x_to_date(x: f64) -> Option<NaiveDate> {
    if !x.is_finite() {
        return None;
    }
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
}

/// Tick label for a day-number axis.
pub fn fmt_date_tick(x: f64) -> String {
    x_to_date(x)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Min/max of `values`, widened when empty or flat so the range is never empty.
pub fn data_range(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        if v.is_finite() {
            min = min.min(v);
            max = max.max(v);
        }
    }
    if !(min.is_finite() && max.is_finite()) {
        return (0.0, 1.0);
    }
    if max <= min {
        return (min - 0.5, max + 0.5);
    }
    (min, max)
}

pub fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

/// Scatter title: `<label>: r = 0.42`.
pub fn scatter_title(label: &str, r: f64) -> String {
    format!("{label}: r = {}", crate::math::format_coefficient(r))
}

/// Label of the threshold-restricted scatter, e.g. `Rate > 60%`.
pub fn threshold_label(threshold: f64) -> String {
    format!("Rate > {:.0}%", threshold * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_numbers_round_trip_through_ticks() {
        let d = NaiveDate::from_ymd_opt(2021, 5, 1).unwrap();
        assert_eq!(fmt_date_tick(date_to_x(d)), "2021-05-01");
        assert_eq!(fmt_date_tick(f64::NAN), "");
    }

    #[test]
    fn flat_and_empty_ranges_are_widened() {
        assert_eq!(data_range(Vec::<f64>::new()), (0.0, 1.0));
        assert_eq!(data_range([2.0, 2.0]), (1.5, 2.5));
        assert_eq!(data_range([3.0, f64::NAN, -1.0]), (-1.0, 3.0));
    }

    #[test]
    fn linear_series_ranges_cover_both_series() {
        use crate::domain::CaseTotals;
        let d = |day| NaiveDate::from_ymd_opt(2021, 5, day).unwrap();
        let view = LinearView {
            rates: vec![(d(2), Some(0.2)), (d(3), Some(0.4))],
            cases: [(d(1), 10), (d(4), 30)].into_iter().collect::<CaseTotals>(),
        };

        let series = linear_series(&view);
        assert_eq!(series.rate_segments, vec![vec![(date_to_x(d(2)), 0.2), (date_to_x(d(3)), 0.4)]]);
        assert_eq!(series.cases.len(), 2);
        assert_eq!(series.x_range, (date_to_x(d(1)), date_to_x(d(4))));
        assert!(series.rate_range.0 < 0.2 && series.rate_range.1 > 0.4);
        assert!(series.case_range.0 < 10.0 && series.case_range.1 > 30.0);
    }

    #[test]
    fn missing_rates_split_the_line() {
        let d = |day| NaiveDate::from_ymd_opt(2021, 5, day).unwrap();
        let view = LinearView {
            rates: vec![
                (d(1), None),
                (d(2), Some(0.1)),
                (d(3), Some(0.2)),
                (d(4), None),
                (d(5), None),
                (d(6), Some(0.4)),
                (d(7), None),
            ],
            ..LinearView::default()
        };

        let series = linear_series(&view);
        assert_eq!(
            series.rate_segments,
            vec![
                vec![(date_to_x(d(2)), 0.1), (date_to_x(d(3)), 0.2)],
                vec![(date_to_x(d(6)), 0.4)],
            ]
        );
        // The date axis still spans the missing rows.
        assert_eq!(series.x_range, (date_to_x(d(1)), date_to_x(d(7))));
    }

    #[test]
    fn scatter_bounds_pad_both_axes() {
        let ((x0, x1), (y0, y1)) = scatter_bounds(&[(0.0, 0.0), (1.0, 10.0)]);
        assert!((x0 + 0.05).abs() < 1e-12 && (x1 - 1.05).abs() < 1e-12);
        assert!((y0 + 0.5).abs() < 1e-12 && (y1 - 10.5).abs() < 1e-12);
    }

    #[test]
    fn titles_use_two_decimals() {
        assert_eq!(scatter_title("All dates", 0.123), "All dates: r = 0.12");
        assert_eq!(scatter_title(&threshold_label(0.6), f64::NAN), "Rate > 60%: r = NaN");
    }
}

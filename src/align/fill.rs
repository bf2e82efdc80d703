//! Forward-fill of missing rates.

use chrono::NaiveDate;

use crate::domain::RateSeries;

/// Carry the last known rate forward over gaps, in stored order.
///
/// Entries before the first known rate stay `None`; nothing is backward-filled.
pub fn forward_fill(series: &RateSeries) -> Vec<(NaiveDate, Option<f64>)> {
    let mut last = None;
    series
        .points()
        .iter()
        .map(|p| {
            if p.rate.is_some() {
                last = p.rate;
            }
            (p.date, last)
        })
        .collect()
}

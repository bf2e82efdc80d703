//! Exact-date alignment of rates and case totals for the correlation view.

use crate::align::{aggregate_cases, forward_fill};
use crate::domain::{AlignedPair, CasePoint, RateSeries};
use crate::error::AppError;

/// Pair every rate date with that date's case total.
///
/// Rates are ordered by date and forward-filled first. A date is kept only if
/// it has a filled rate *and* at least one case row; the dropped dates are
/// counted on the returned pair.
pub fn correlation_pair(rates: &RateSeries, cases: &[CasePoint]) -> Result<AlignedPair, AppError> {
    let ordered = RateSeries::chronological(rates.points().to_vec());
    let filled = forward_fill(&ordered);

    let rate_dates = ordered.dates();
    let totals = aggregate_cases(cases.iter().filter(|p| rate_dates.contains(&p.date)));

    let mut dates = Vec::with_capacity(filled.len());
    let mut rate_values = Vec::with_capacity(filled.len());
    let mut case_values = Vec::with_capacity(filled.len());
    let mut excluded_leading = 0usize;
    let mut excluded_no_cases = 0usize;

    for (date, rate) in filled {
        let Some(rate) = rate else {
            excluded_leading += 1;
            continue;
        };
        let Some(total) = totals.get(date) else {
            excluded_no_cases += 1;
            continue;
        };
        dates.push(date);
        rate_values.push(rate);
        case_values.push(total as f64);
    }

    let mut pair = AlignedPair::new(dates, rate_values, case_values)?;
    pair.excluded_leading = excluded_leading;
    pair.excluded_no_cases = excluded_no_cases;
    Ok(pair)
}

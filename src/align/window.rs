//! Time-window restriction for the linear view.

use chrono::NaiveDate;

use crate::domain::{CasePoint, CaseTotals, RateSeries, WindowBoundary};

/// Sum cases per date across regions.
pub fn aggregate_cases<'a>(points: impl IntoIterator<Item = &'a CasePoint>) -> CaseTotals {
    points.into_iter().map(|p| (p.date, p.cases)).collect()
}

/// Start of the case window for `rates` under `boundary`.
pub fn window_start(rates: &RateSeries, boundary: WindowBoundary) -> Option<NaiveDate> {
    match boundary {
        WindowBoundary::FirstRow => rates.first().map(|p| p.date),
        WindowBoundary::Earliest => rates.earliest_date(),
    }
}

/// Case totals for every date on or after the window start.
///
/// The result isn't intersected with the rate dates: the linear view plots the
/// two series on a shared calendar axis, not row by row. An empty rate series
/// yields no totals.
pub fn time_window(rates: &RateSeries, cases: &[CasePoint], boundary: WindowBoundary) -> CaseTotals {
    let Some(start) = window_start(rates, boundary) else {
        return CaseTotals::default();
    };
    aggregate_cases(cases.iter().filter(|p| p.date >= start))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RatePoint;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, m, day).unwrap()
    }

    fn case(date: NaiveDate, region: &str, cases: u64) -> CasePoint {
        CasePoint {
            date,
            region: region.to_string(),
            cases,
        }
    }

    #[test]
    fn drops_dates_before_first_rate_and_sums_regions() {
        let rates = RateSeries::new(vec![
            RatePoint::new(d(5, 1), Some(0.1)),
            RatePoint::new(d(5, 3), Some(0.3)),
        ]);
        let cases = vec![
            case(d(4, 30), "A", 999),
            case(d(5, 1), "A", 100),
            case(d(5, 1), "B", 11),
            case(d(5, 2), "A", 50),
            case(d(5, 9), "A", 7),
        ];

        let totals = time_window(&rates, &cases, WindowBoundary::FirstRow);
        let got: Vec<(NaiveDate, u64)> = totals.iter().collect();
        // 05-02 and 05-09 have no rate row but are still in the window.
        assert_eq!(got, vec![(d(5, 1), 111), (d(5, 2), 50), (d(5, 9), 7)]);
    }

    #[test]
    fn first_row_boundary_uses_stored_order() {
        // Stored out of order: the first row is not the earliest date.
        let rates = RateSeries::new(vec![
            RatePoint::new(d(5, 3), Some(0.3)),
            RatePoint::new(d(5, 1), Some(0.1)),
        ]);
        let cases = vec![case(d(5, 1), "A", 1), case(d(5, 2), "A", 2), case(d(5, 3), "A", 3)];

        let first_row = time_window(&rates, &cases, WindowBoundary::FirstRow);
        assert_eq!(first_row.first_date(), Some(d(5, 3)));
        assert_eq!(first_row.len(), 1);

        let earliest = time_window(&rates, &cases, WindowBoundary::Earliest);
        assert_eq!(earliest.first_date(), Some(d(5, 1)));
        assert_eq!(earliest.len(), 3);
    }

    #[test]
    fn every_row_on_or_after_start_is_counted() {
        let rates = RateSeries::new(vec![RatePoint::new(d(5, 2), None)]);
        let cases: Vec<CasePoint> = (1..=5)
            .flat_map(|day| [case(d(5, day), "A", day as u64), case(d(5, day), "B", 10)])
            .collect();

        let totals = time_window(&rates, &cases, WindowBoundary::FirstRow);
        assert!(totals.iter().all(|(date, _)| date >= d(5, 2)));
        let expected: u64 = cases.iter().filter(|c| c.date >= d(5, 2)).map(|c| c.cases).sum();
        assert_eq!(totals.iter().map(|(_, c)| c).sum::<u64>(), expected);
    }

    #[test]
    fn empty_rates_give_empty_window() {
        let cases = vec![case(d(5, 1), "A", 1)];
        assert!(time_window(&RateSeries::default(), &cases, WindowBoundary::FirstRow).is_empty());
    }
}

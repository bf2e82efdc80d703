//! Formatted terminal output for each stage.
//!
//! Formatting lives here so the pipeline stays free of presentation and
//! output changes stay localized.

use std::path::{Path, PathBuf};

use crate::app::pipeline::{AnalysisInputs, CorrelationView};
use crate::data::{FetchFailure, FetchSummary};
use crate::error::AppError;
use crate::io::Extraction;
use crate::math::format_coefficient;
use crate::plot::threshold_label;

/// Skip records / row errors listed before collapsing into a count.
const MAX_LISTED: usize = 10;

pub fn format_fetch_summary(summary: &FetchSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Reports: attempted={} written={} failed={}\n",
        summary.attempted,
        summary.written.len(),
        summary.failures.len()
    ));
    for failure in summary.failures.iter().take(MAX_LISTED) {
        out.push_str(&format!("  - {}\n", format_failure(failure)));
    }
    push_more(&mut out, summary.failures.len());
    out
}

pub fn format_cases_fetch(outcome: &Result<PathBuf, FetchFailure>) -> String {
    match outcome {
        Ok(path) => format!("Cases file: written {}\n", path.display()),
        Err(failure) => format!("Cases file: failed ({})\n", format_failure(failure)),
    }
}

fn format_failure(failure: &FetchFailure) -> String {
    match failure.date {
        Some(date) => format!("{date}: {}", failure.error),
        None => format!("{}: {}", failure.url, failure.error),
    }
}

pub fn format_extraction(extraction: &Extraction, table: &Path, table_error: Option<&AppError>) -> String {
    let series = &extraction.series;
    let mut out = String::new();

    out.push_str(&format!(
        "Extraction: files={} rows={} missing={} skipped={}\n",
        extraction.files_seen,
        series.len(),
        series.missing_count(),
        extraction.skipped.len()
    ));
    if let (Some(first), Some(last)) = (series.earliest_date(), series.latest_date()) {
        out.push_str(&format!("  span: {first} .. {last}\n"));
    }
    for skip in extraction.skipped.iter().take(MAX_LISTED) {
        let name = skip
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| skip.path.display().to_string());
        out.push_str(&format!("  - skipped {name}: {}\n", skip.reason));
    }
    push_more(&mut out, extraction.skipped.len());

    match table_error {
        None => out.push_str(&format!("  table: {}\n", table.display())),
        Some(e) => out.push_str(&format!("  table: NOT written ({e})\n")),
    }
    out
}

pub fn format_inputs(inputs: &AnalysisInputs) -> String {
    let cases = &inputs.cases;
    let mut out = String::new();

    out.push_str(&format!(
        "Rate table: rows={} missing={}\n",
        inputs.rates.len(),
        inputs.rates.missing_count()
    ));
    out.push_str(&format!(
        "Cases: rows read={} used={} errors={}\n",
        cases.rows_read,
        cases.points.len(),
        cases.row_errors.len()
    ));
    for e in cases.row_errors.iter().take(MAX_LISTED) {
        out.push_str(&format!("  - line {}: {}\n", e.line, e.message));
    }
    push_more(&mut out, cases.row_errors.len());
    out
}

pub fn format_correlation(view: &CorrelationView) -> String {
    let mut out = String::new();
    out.push_str("Correlation (rate vs cases):\n");
    out.push_str(&format!(
        "  all dates : r={:>5} n={}\n",
        format_coefficient(view.r_full),
        view.full.len()
    ));
    out.push_str(&format!(
        "  {:<10}: r={:>5} n={}\n",
        threshold_label(view.threshold),
        format_coefficient(view.r_above),
        view.above.len()
    ));
    if view.full.excluded_leading > 0 || view.full.excluded_no_cases > 0 {
        out.push_str(&format!(
            "  excluded: {} before first known rate, {} without cases\n",
            view.full.excluded_leading, view.full.excluded_no_cases
        ));
    }
    out
}

fn push_more(out: &mut String, total: usize) {
    if total > MAX_LISTED {
        out.push_str(&format!("  ... and {} more\n", total - MAX_LISTED));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FetchError;
    use crate::domain::{AlignedPair, RatePoint, RateSeries};
    use crate::io::{SkipReason, SkipRecord};
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 5, day).unwrap()
    }

    #[test]
    fn fetch_summary_lists_failed_dates() {
        let summary = FetchSummary {
            attempted: 2,
            written: vec![PathBuf::from("a.ods")],
            failures: vec![FetchFailure {
                date: Some(d(2)),
                url: "http://x/b.ods".to_string(),
                error: FetchError::Status(404),
            }],
        };
        let txt = format_fetch_summary(&summary);
        assert!(txt.starts_with("Reports: attempted=2 written=1 failed=1\n"));
        assert!(txt.contains("  - 2021-05-02: "));
    }

    #[test]
    fn extraction_lists_skip_reasons_and_collapses_the_tail() {
        let skipped = (0..12)
            .map(|i| SkipRecord {
                path: PathBuf::from(format!("data/Informe_Comunicacion_bad{i}.ods")),
                reason: SkipReason::MissingSheet("Etarios_con_pauta_completa".to_string()),
            })
            .collect();
        let extraction = Extraction {
            series: RateSeries::new(vec![RatePoint::new(d(1), Some(0.1)), RatePoint::new(d(2), None)]),
            skipped,
            files_seen: 14,
        };

        let txt = format_extraction(&extraction, Path::new("rates.csv"), None);
        assert!(txt.starts_with("Extraction: files=14 rows=2 missing=1 skipped=12\n"));
        assert!(txt.contains("span: 2021-05-01 .. 2021-05-02"));
        assert!(txt.contains("skipped Informe_Comunicacion_bad0.ods: missing sheet"));
        assert!(txt.contains("... and 2 more"));
        assert!(txt.ends_with("  table: rates.csv\n"));

        let err = AppError::input("disk full");
        let txt = format_extraction(&extraction, Path::new("rates.csv"), Some(&err));
        assert!(txt.contains("NOT written (disk full)"));
    }

    #[test]
    fn correlation_shows_nan_and_exclusions() {
        let mut full = AlignedPair::new(vec![d(2), d(3)], vec![0.1, 0.3], vec![50.0, 80.0]).unwrap();
        full.excluded_leading = 1;
        let view = CorrelationView {
            above: full.above(0.6),
            full,
            r_full: 1.0,
            r_above: f64::NAN,
            threshold: 0.6,
        };
        let txt = format_correlation(&view);
        assert!(txt.contains("all dates : r= 1.00 n=2"));
        assert!(txt.contains("Rate > 60%: r=  NaN n=0"));
        assert!(txt.contains("1 before first known rate, 0 without cases"));
    }
}

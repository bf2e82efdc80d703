//! Stage pipeline exercised through the public API with a canned transport.

use std::path::Path;

use chrono::NaiveDate;
use vax_cases::app::pipeline::{correlation_view, linear_view, load_inputs, run_stages_with};
use vax_cases::data::{FetchError, Transport};
use vax_cases::domain::{RatePoint, RateSeries, RunConfig, Stages};
use vax_cases::io::{SkipReason, read_rate_table, write_rate_table, write_summary_json};
use vax_cases::plot::{render_correlation_svg, render_linear_svg};

const CASES_CSV: &str = "\
ccaa_iso,fecha,num_casos
A,2021-04-30,999
A,2021-05-01,100
B,2021-05-01,0
A,2021-05-02,50
A,2021-05-03,80
A,2021-05-03,not-a-number
";

/// Reports come back as garbage bytes; the cases URL serves `CASES_CSV`.
struct Canned;

impl Transport for Canned {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if url.ends_with("casos_diag_ccaadecl.csv") {
            Ok(CASES_CSV.as_bytes().to_vec())
        } else if url.contains("20210502") {
            Err(FetchError::Status(404))
        } else {
            Ok(b"not a spreadsheet".to_vec())
        }
    }
}

fn d(m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, m, day).unwrap()
}

fn config(dir: &Path, stages: Stages) -> RunConfig {
    RunConfig {
        data_dir: dir.to_path_buf(),
        start_date: d(5, 1),
        end_date: d(5, 3),
        stages,
        plot_dir: Some(dir.join("plots")),
        ..RunConfig::default()
    }
}

#[test]
fn fetch_and_extract_survive_bad_reports() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(
        dir.path(),
        Stages {
            plot_linear: false,
            plot_correlation: false,
            ..Stages::ALL
        },
    );

    let out = run_stages_with(&config, Canned).unwrap();

    let fetch = out.rate_fetch.unwrap();
    assert_eq!(fetch.attempted, 3);
    assert_eq!(fetch.written.len(), 2);
    assert_eq!(fetch.failures.len(), 1);
    assert_eq!(fetch.failures[0].date, Some(d(5, 2)));

    let extraction = out.extraction.unwrap();
    assert_eq!(extraction.files_seen, 2);
    assert!(extraction.series.is_empty());
    assert!(
        extraction
            .skipped
            .iter()
            .all(|s| matches!(s.reason, SkipReason::Unreadable(_)))
    );

    // Header-only table still gets written.
    let table = read_rate_table(&config.rates_table_path()).unwrap();
    assert!(table.is_empty());

    assert_eq!(out.cases_fetch.unwrap().unwrap(), config.cases_path());
}

#[test]
fn reference_example_flows_into_plots_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(
        dir.path(),
        Stages {
            download_cases: true,
            plot_linear: true,
            plot_correlation: true,
            ..Stages::NONE
        },
    );
    write_rate_table(
        &config.rates_table_path(),
        &RateSeries::new(vec![
            RatePoint::new(d(5, 1), Some(0.10)),
            RatePoint::new(d(5, 2), None),
            RatePoint::new(d(5, 3), Some(0.30)),
        ]),
    )
    .unwrap();

    let out = run_stages_with(&config, Canned).unwrap();
    let analysis = out.analysis.unwrap();

    assert_eq!(analysis.inputs.cases.rows_read, 6);
    assert_eq!(analysis.inputs.cases.row_errors.len(), 1);

    let linear = analysis.linear.unwrap();
    let totals: Vec<(NaiveDate, u64)> = linear.cases.iter().collect();
    assert_eq!(totals, vec![(d(5, 1), 100), (d(5, 2), 50), (d(5, 3), 80)]);

    let corr = analysis.correlation.unwrap();
    assert_eq!(corr.full.rates(), &[0.10, 0.10, 0.30]);
    assert_eq!(corr.full.cases(), &[100.0, 50.0, 80.0]);
    assert!(corr.above.is_empty());

    let plots = dir.path().join("plots");
    std::fs::create_dir_all(&plots).unwrap();
    render_linear_svg(&plots.join("linear.svg"), &linear).unwrap();
    render_correlation_svg(&plots.join("correlation.svg"), &corr).unwrap();
    assert!(plots.join("linear.svg").exists());
    assert!(plots.join("correlation.svg").exists());

    let json_path = dir.path().join("summary.json");
    write_summary_json(&json_path, &corr.summary()).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["correlation"]["n_full"], 3);
    assert!(json["correlation"]["above_threshold"].is_null());
    assert_eq!(json["correlation"]["first_date"], "2021-05-01");
}

#[test]
fn threshold_changes_only_the_restricted_pair() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path(), Stages::NONE);
    write_rate_table(
        &config.rates_table_path(),
        &RateSeries::new(vec![
            RatePoint::new(d(5, 1), Some(0.55)),
            RatePoint::new(d(5, 2), Some(0.61)),
            RatePoint::new(d(5, 3), Some(0.70)),
        ]),
    )
    .unwrap();
    std::fs::write(config.cases_path(), CASES_CSV).unwrap();

    let inputs = load_inputs(&config).unwrap();
    let strict = correlation_view(&inputs, &config).unwrap();
    assert_eq!(strict.above.dates(), &[d(5, 2), d(5, 3)]);

    config.threshold = 0.61;
    let stricter = correlation_view(&inputs, &config).unwrap();
    assert_eq!(stricter.above.dates(), &[d(5, 3)]);
    assert_eq!(stricter.full.len(), strict.full.len());
    assert!(stricter.r_above.is_nan());

    let linear = linear_view(&inputs, &config);
    assert_eq!(linear.rates.len(), 3);
    assert!(linear.rates.iter().all(|(_, r)| r.is_some()));
}

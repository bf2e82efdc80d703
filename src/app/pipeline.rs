//! Shared stage pipeline used by both the CLI and the TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the workflow:
//! fetch reports -> extract rates -> fetch cases -> load tables -> align -> correlate
//!
//! The front-ends then focus on presentation (printing, SVG, widgets).

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, info};

use crate::align::{correlation_pair, time_window};
use crate::data::{FetchFailure, FetchSummary, Fetcher, HttpTransport, Transport};
use crate::domain::{AlignedPair, CaseTotals, RateSeries, RunConfig};
use crate::error::AppError;
use crate::io::{CaseData, Extraction, extract_rates, load_cases, read_rate_table, write_rate_table};
use crate::math::pearson;

/// Data for the dual-axis time series.
#[derive(Debug, Clone, Default)]
pub struct LinearView {
    /// Every rate row, ordered by date. `None` breaks the line.
    pub rates: Vec<(NaiveDate, Option<f64>)>,
    /// Case totals from the window start onwards.
    pub cases: CaseTotals,
}

/// Correlation coefficients for one run.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationSummary {
    pub threshold: f64,
    /// `None` when the coefficient is undefined.
    pub full: Option<f64>,
    pub above_threshold: Option<f64>,
    pub n_full: usize,
    pub n_above: usize,
    pub excluded_leading: usize,
    pub excluded_no_cases: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

/// Data for the two scatter plots.
#[derive(Debug, Clone)]
pub struct CorrelationView {
    pub full: AlignedPair,
    pub above: AlignedPair,
    pub r_full: f64,
    pub r_above: f64,
    pub threshold: f64,
}

impl CorrelationView {
    pub fn summary(&self) -> CorrelationSummary {
        CorrelationSummary {
            threshold: self.threshold,
            full: Some(self.r_full).filter(|r| r.is_finite()),
            above_threshold: Some(self.r_above).filter(|r| r.is_finite()),
            n_full: self.full.len(),
            n_above: self.above.len(),
            excluded_leading: self.full.excluded_leading,
            excluded_no_cases: self.full.excluded_no_cases,
            first_date: self.full.dates().first().copied(),
            last_date: self.full.dates().last().copied(),
        }
    }
}

/// Tables loaded for plotting.
#[derive(Debug, Clone)]
pub struct AnalysisInputs {
    pub rates: RateSeries,
    pub cases: CaseData,
}

/// Everything the enabled plot stages need.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub inputs: AnalysisInputs,
    pub linear: Option<LinearView>,
    pub correlation: Option<CorrelationView>,
}

/// Outcome of every stage that ran; `None` for disabled stages.
#[derive(Debug, Default)]
pub struct RunOutput {
    pub rate_fetch: Option<FetchSummary>,
    pub extraction: Option<Extraction>,
    /// Non-fatal failure writing the rate table.
    pub table_error: Option<AppError>,
    pub cases_fetch: Option<Result<PathBuf, FetchFailure>>,
    pub analysis: Option<Analysis>,
}

/// Run the enabled stages over HTTP.
pub fn run_stages(config: &RunConfig) -> Result<RunOutput, AppError> {
    run_stages_with(config, HttpTransport::new())
}

/// Run the enabled stages with a caller-supplied transport.
pub fn run_stages_with<T: Transport>(config: &RunConfig, transport: T) -> Result<RunOutput, AppError> {
    config.validate()?;
    let stages = config.stages;
    let fetcher = Fetcher::new(transport, config);
    let mut out = RunOutput::default();

    if stages.download_rates {
        out.rate_fetch = Some(fetcher.fetch_rate_reports(config.start_date, config.end_date));
    }

    if stages.extract_rates {
        let (extraction, table_error) = extract_and_store(config)?;
        out.extraction = Some(extraction);
        out.table_error = table_error;
    }

    if stages.download_cases {
        out.cases_fetch = Some(fetcher.fetch_cases_file());
    }

    if stages.plots() {
        let inputs = load_inputs(config)?;
        let linear = stages.plot_linear.then(|| linear_view(&inputs, config));
        let correlation = if stages.plot_correlation {
            Some(correlation_view(&inputs, config)?)
        } else {
            None
        };
        out.analysis = Some(Analysis {
            inputs,
            linear,
            correlation,
        });
    }

    Ok(out)
}

/// Rebuild the rate series and persist it.
///
/// A failed write is logged and returned alongside the extraction; it doesn't
/// stop the run.
pub fn extract_and_store(config: &RunConfig) -> Result<(Extraction, Option<AppError>), AppError> {
    let extraction = extract_rates(config)?;
    let path = config.rates_table_path();
    let table_error = match write_rate_table(&path, &extraction.series) {
        Ok(()) => {
            info!(path = %path.display(), rows = extraction.series.len(), "Rate table written");
            None
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to write rate table");
            Some(e)
        }
    };
    Ok((extraction, table_error))
}

/// Load the rate table and the cases file. Either failing ends the run.
pub fn load_inputs(config: &RunConfig) -> Result<AnalysisInputs, AppError> {
    let rates = read_rate_table(&config.rates_table_path())?;
    let cases = load_cases(&config.cases_path(), config)?;
    Ok(AnalysisInputs { rates, cases })
}

pub fn linear_view(inputs: &AnalysisInputs, config: &RunConfig) -> LinearView {
    let mut rates: Vec<(NaiveDate, Option<f64>)> =
        inputs.rates.points().iter().map(|p| (p.date, p.rate)).collect();
    rates.sort_by_key(|(d, _)| *d);

    LinearView {
        rates,
        cases: time_window(&inputs.rates, &inputs.cases.points, config.window_boundary),
    }
}

pub fn correlation_view(inputs: &AnalysisInputs, config: &RunConfig) -> Result<CorrelationView, AppError> {
    let full = correlation_pair(&inputs.rates, &inputs.cases.points)?;
    let above = full.above(config.threshold);

    let r_full = pearson(full.rates(), full.cases());
    let r_above = pearson(above.rates(), above.cases());
    info!(
        n_full = full.len(),
        n_above = above.len(),
        r_full,
        r_above,
        threshold = config.threshold,
        "Correlation computed"
    );

    Ok(CorrelationView {
        full,
        above,
        r_full,
        r_above,
        threshold: config.threshold,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FetchError;
    use crate::domain::Stages;

    struct Offline;

    impl Transport for Offline {
        fn get(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            Err(FetchError::Network("offline".to_string()))
        }
    }

    fn write_inputs(dir: &std::path::Path) {
        std::fs::write(
            dir.join("vaccination_rate_by_date.csv"),
            "Date,Vaccinated\n20210501,0.10\n20210502,\n20210503,0.30\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("casos_diag_ccaadecl.csv"),
            "ccaa_iso,fecha,num_casos\nA,2021-05-01,100\nA,2021-05-02,50\nA,2021-05-03,80\nA,2021-04-30,999\n",
        )
        .unwrap();
    }

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, m, day).unwrap()
    }

    #[test]
    fn plot_stages_align_the_reference_example() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path());
        let config = RunConfig {
            data_dir: dir.path().to_path_buf(),
            stages: Stages {
                plot_linear: true,
                plot_correlation: true,
                ..Stages::NONE
            },
            ..RunConfig::default()
        };

        let out = run_stages_with(&config, Offline).unwrap();
        let analysis = out.analysis.unwrap();

        let linear = analysis.linear.unwrap();
        let totals: Vec<(NaiveDate, u64)> = linear.cases.iter().collect();
        assert_eq!(totals, vec![(d(5, 1), 100), (d(5, 2), 50), (d(5, 3), 80)]);
        assert_eq!(linear.rates, vec![(d(5, 1), Some(0.10)), (d(5, 2), None), (d(5, 3), Some(0.30))]);

        let corr = analysis.correlation.unwrap();
        assert_eq!(corr.full.rates(), &[0.10, 0.10, 0.30]);
        assert_eq!(corr.full.cases(), &[100.0, 50.0, 80.0]);
        assert!(corr.above.is_empty());
        assert!(corr.r_above.is_nan());
        assert!(corr.r_full.is_finite());

        let summary = corr.summary();
        assert_eq!(summary.n_full, 3);
        assert_eq!(summary.above_threshold, None);
    }

    #[test]
    fn missing_rate_table_is_fatal_when_plotting() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig {
            data_dir: dir.path().to_path_buf(),
            stages: Stages {
                plot_linear: true,
                ..Stages::NONE
            },
            ..RunConfig::default()
        };
        let err = run_stages_with(&config, Offline).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn download_failures_do_not_stop_later_stages() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig {
            data_dir: dir.path().to_path_buf(),
            start_date: d(5, 1),
            end_date: d(5, 3),
            stages: Stages {
                plot_linear: false,
                plot_correlation: false,
                ..Stages::ALL
            },
            ..RunConfig::default()
        };

        let out = run_stages_with(&config, Offline).unwrap();
        assert_eq!(out.rate_fetch.unwrap().failures.len(), 3);
        assert!(out.extraction.unwrap().series.is_empty());
        assert!(out.table_error.is_none());
        assert!(out.cases_fetch.unwrap().is_err());
        assert!(dir.path().join("vaccination_rate_by_date.csv").exists());
    }
}

//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - built by the extractors/loaders
//! - persisted (the rate table) or exported (the analysis summary)
//! - reused by every renderer without copying logic around

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Filename prefix of the daily vaccination reports.
pub const RATE_FILE_PREFIX: &str = "Informe_Comunicacion_";
/// Filename extension of the daily vaccination reports.
pub const RATE_FILE_EXT: &str = "ods";
/// Date token format used in report filenames and in the rate table.
pub const RATE_DATE_FORMAT: &str = "%Y%m%d";

pub const DEFAULT_RATES_BASE_URL: &str =
    "https://www.mscbs.gob.es/profesionales/saludPublica/ccayes/alertasActual/nCov/documentos/";
pub const DEFAULT_CASES_BASE_URL: &str = "https://cnecovid.isciii.es/covid19/resources/";
pub const DEFAULT_SHEET_NAME: &str = "Etarios_con_pauta_completa";
pub const DEFAULT_RATE_COLUMN: &str = "% pauta completa sobre Población a Vacunar INE";
pub const DEFAULT_CASES_FILE: &str = "casos_diag_ccaadecl.csv";
pub const DEFAULT_CASES_DATE_COLUMN: &str = "fecha";
pub const DEFAULT_CASES_COUNT_COLUMN: &str = "num_casos";
pub const DEFAULT_CASES_REGION_COLUMN: &str = "ccaa_iso";
pub const DEFAULT_RATES_FILE: &str = "vaccination_rate_by_date.csv";
pub const DEFAULT_THRESHOLD: f64 = 0.6;

/// Vaccination rate reported for one date.
///
/// `rate` is a fraction in `[0, 1]`; `None` means the report existed but the
/// target cell was empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatePoint {
    pub date: NaiveDate,
    pub rate: Option<f64>,
}

impl RatePoint {
    pub fn new(date: NaiveDate, rate: Option<f64>) -> Self {
        Self { date, rate }
    }
}

/// Rate points in *stored* order, one per date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateSeries {
    points: Vec<RatePoint>,
}

impl RateSeries {
    /// Build a series keeping the given order.
    ///
    /// Later duplicates of a date are dropped (first occurrence wins).
    pub fn new(points: Vec<RatePoint>) -> Self {
        let mut seen = HashSet::with_capacity(points.len());
        let points = points.into_iter().filter(|p| seen.insert(p.date)).collect();
        Self { points }
    }

    /// Build a series sorted by date.
    pub fn chronological(mut points: Vec<RatePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        Self::new(points)
    }

    pub fn points(&self) -> &[RatePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The first row as stored (not necessarily the earliest date).
    pub fn first(&self) -> Option<&RatePoint> {
        self.points.first()
    }

    pub fn earliest_date(&self) -> Option<NaiveDate> {
        self.points.iter().map(|p| p.date).min()
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.points.iter().map(|p| p.date).max()
    }

    pub fn dates(&self) -> HashSet<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn missing_count(&self) -> usize {
        self.points.iter().filter(|p| p.rate.is_none()).count()
    }
}

/// One row of the cases file: cases diagnosed in one region on one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasePoint {
    pub date: NaiveDate,
    pub region: String,
    pub cases: u64,
}

/// Cases summed across regions, keyed by date (ascending).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseTotals(BTreeMap<NaiveDate, u64>);

impl CaseTotals {
    pub fn add(&mut self, date: NaiveDate, cases: u64) {
        *self.0.entry(date).or_insert(0) += cases;
    }

    pub fn get(&self, date: NaiveDate) -> Option<u64> {
        self.0.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, u64)> + '_ {
        self.0.iter().map(|(d, c)| (*d, *c))
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.0.keys().next().copied()
    }
}

impl FromIterator<(NaiveDate, u64)> for CaseTotals {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, u64)>>(iter: I) -> Self {
        let mut totals = CaseTotals::default();
        for (date, cases) in iter {
            totals.add(date, cases);
        }
        totals
    }
}

/// Rates and case totals restricted to the same ordered set of dates.
///
/// `dates`, `rates` and `cases` always have equal length; that is checked in
/// [`AlignedPair::new`] rather than assumed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignedPair {
    dates: Vec<NaiveDate>,
    rates: Vec<f64>,
    cases: Vec<f64>,
    /// Rate dates dropped because no earlier rate was known (leading gap).
    pub excluded_leading: usize,
    /// Rate dates dropped because the cases file has no rows for them.
    pub excluded_no_cases: usize,
}

impl AlignedPair {
    pub fn new(dates: Vec<NaiveDate>, rates: Vec<f64>, cases: Vec<f64>) -> Result<Self, AppError> {
        if dates.len() != rates.len() || rates.len() != cases.len() {
            return Err(AppError::no_data(format!(
                "Aligned series length mismatch: dates={}, rates={}, cases={}.",
                dates.len(),
                rates.len(),
                cases.len()
            )));
        }
        Ok(Self {
            dates,
            rates,
            cases,
            excluded_leading: 0,
            excluded_no_cases: 0,
        })
    }

    /// Keep only entries whose rate strictly exceeds `threshold`.
    pub fn above(&self, threshold: f64) -> AlignedPair {
        let mut out = AlignedPair::default();
        for i in 0..self.len() {
            if self.rates[i] > threshold {
                out.dates.push(self.dates[i]);
                out.rates.push(self.rates[i]);
                out.cases.push(self.cases[i]);
            }
        }
        out
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    pub fn cases(&self) -> &[f64] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// `(rate, cases)` points for scatter plots.
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.rates.iter().copied().zip(self.cases.iter().copied()).collect()
    }
}

/// How the start of the case window is derived from the rate series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum WindowBoundary {
    /// Date of the first row as stored in the rate table.
    FirstRow,
    /// Earliest date anywhere in the rate table.
    Earliest,
}

/// Which view(s) to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlotView {
    Linear,
    Correlation,
    Both,
}

impl PlotView {
    pub fn linear(self) -> bool {
        matches!(self, PlotView::Linear | PlotView::Both)
    }

    pub fn correlation(self) -> bool {
        matches!(self, PlotView::Correlation | PlotView::Both)
    }
}

/// Stage toggles for a `run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stages {
    pub download_rates: bool,
    pub extract_rates: bool,
    pub download_cases: bool,
    pub plot_linear: bool,
    pub plot_correlation: bool,
}

impl Stages {
    pub const ALL: Stages = Stages {
        download_rates: true,
        extract_rates: true,
        download_cases: true,
        plot_linear: true,
        plot_correlation: true,
    };

    pub const NONE: Stages = Stages {
        download_rates: false,
        extract_rates: false,
        download_cases: false,
        plot_linear: false,
        plot_correlation: false,
    };

    pub fn plots(self) -> bool {
        self.plot_linear || self.plot_correlation
    }
}

/// Fully resolved configuration for one invocation.
///
/// Every component receives this (or a borrowed view of it); nothing reads
/// global state.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub data_dir: PathBuf,
    pub rates_base_url: String,
    pub cases_base_url: String,

    pub sheet_name: String,
    pub rate_column: String,

    pub cases_file_name: String,
    pub cases_date_column: String,
    pub cases_count_column: String,
    pub cases_region_column: String,

    pub rates_file_name: String,

    pub threshold: f64,
    pub window_boundary: WindowBoundary,
    pub stages: Stages,

    /// Directory for SVG plots; `None` disables SVG output.
    pub plot_dir: Option<PathBuf>,
    pub ascii: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub export_summary: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2021, 5, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2021, 10, 5).unwrap_or_default(),
            data_dir: PathBuf::from("."),
            rates_base_url: DEFAULT_RATES_BASE_URL.to_string(),
            cases_base_url: DEFAULT_CASES_BASE_URL.to_string(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            rate_column: DEFAULT_RATE_COLUMN.to_string(),
            cases_file_name: DEFAULT_CASES_FILE.to_string(),
            cases_date_column: DEFAULT_CASES_DATE_COLUMN.to_string(),
            cases_count_column: DEFAULT_CASES_COUNT_COLUMN.to_string(),
            cases_region_column: DEFAULT_CASES_REGION_COLUMN.to_string(),
            rates_file_name: DEFAULT_RATES_FILE.to_string(),
            threshold: DEFAULT_THRESHOLD,
            window_boundary: WindowBoundary::FirstRow,
            stages: Stages::ALL,
            plot_dir: Some(PathBuf::from("plots")),
            ascii: true,
            plot_width: 100,
            plot_height: 25,
            export_summary: None,
        }
    }
}

impl RunConfig {
    /// Reject configurations that can't produce a meaningful run.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.end_date < self.start_date {
            return Err(AppError::input(format!(
                "End date {} is before start date {}.",
                self.end_date, self.start_date
            )));
        }
        if !self.threshold.is_finite() {
            return Err(AppError::input("Rate threshold must be a finite number."));
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(AppError::input("Data directory must not be empty."));
        }
        if self.plot_width < 10 || self.plot_height < 5 {
            return Err(AppError::input("Plot size must be at least 10x5."));
        }
        Ok(())
    }

    pub fn rate_report_path(&self, date: NaiveDate) -> PathBuf {
        self.data_dir.join(rate_report_file_name(date))
    }

    /// Glob for every report in `data_dir`. The directory part is escaped so
    /// `[`, `*` or `?` in it match literally.
    pub fn rate_report_glob(&self) -> String {
        let dir = glob::Pattern::escape(&self.data_dir.to_string_lossy());
        Path::new(&dir)
            .join(format!("{RATE_FILE_PREFIX}*.{RATE_FILE_EXT}"))
            .to_string_lossy()
            .into_owned()
    }

    pub fn cases_path(&self) -> PathBuf {
        self.data_dir.join(&self.cases_file_name)
    }

    pub fn rates_table_path(&self) -> PathBuf {
        self.data_dir.join(&self.rates_file_name)
    }

    pub fn plot_path(&self, name: &str) -> Option<PathBuf> {
        self.plot_dir.as_deref().map(|dir: &Path| dir.join(name))
    }
}

/// `Informe_Comunicacion_<YYYYMMDD>.ods`
pub fn rate_report_file_name(date: NaiveDate) -> String {
    format!(
        "{RATE_FILE_PREFIX}{}.{RATE_FILE_EXT}",
        date.format(RATE_DATE_FORMAT)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn rate_series_drops_duplicate_dates_keeping_first() {
        let s = RateSeries::new(vec![
            RatePoint::new(d(2021, 5, 2), Some(0.2)),
            RatePoint::new(d(2021, 5, 1), Some(0.1)),
            RatePoint::new(d(2021, 5, 2), Some(0.9)),
        ]);
        assert_eq!(s.len(), 2);
        assert_eq!(s.first().unwrap().date, d(2021, 5, 2));
        assert_eq!(s.points()[0].rate, Some(0.2));
        assert_eq!(s.earliest_date(), Some(d(2021, 5, 1)));
    }

    #[test]
    fn aligned_pair_rejects_unequal_lengths() {
        let err = AlignedPair::new(vec![d(2021, 5, 1)], vec![0.1, 0.2], vec![1.0]).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn above_is_strict() {
        let pair = AlignedPair::new(
            vec![d(2021, 5, 1), d(2021, 5, 2), d(2021, 5, 3)],
            vec![0.5, 0.6, 0.61],
            vec![10.0, 20.0, 30.0],
        )
        .unwrap();
        let hi = pair.above(0.6);
        assert_eq!(hi.dates(), &[d(2021, 5, 3)]);
        assert_eq!(hi.rates(), &[0.61]);
        assert_eq!(hi.cases(), &[30.0]);
    }

    #[test]
    fn report_file_name_uses_compact_date() {
        assert_eq!(
            rate_report_file_name(d(2021, 5, 1)),
            "Informe_Comunicacion_20210501.ods"
        );
    }

    #[test]
    fn report_glob_escapes_the_data_dir() {
        let config = RunConfig {
            data_dir: PathBuf::from("runs/run[1]*"),
            ..RunConfig::default()
        };
        let pattern = config.rate_report_glob();
        assert!(pattern.starts_with("runs/run[[]1[]][*]"));
        assert!(pattern.ends_with("Informe_Comunicacion_*.ods"));
    }

    #[test]
    fn validate_rejects_reversed_range() {
        let config = RunConfig {
            start_date: d(2021, 6, 1),
            end_date: d(2021, 5, 1),
            ..RunConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().exit_code(), 2);
        assert!(RunConfig::default().validate().is_ok());
    }
}

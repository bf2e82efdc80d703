//! Vaccination-rate extraction from the downloaded report spreadsheets.
//!
//! Each report carries one sheet with a header row and one row per region;
//! the final row is the national aggregate. We take the target column's value
//! on that last row as the report date's rate.
//!
//! Design goals:
//! - **Full rescan** of every report on disk (not limited to the fetch range)
//! - **Per-file isolation**: a bad file is skipped and reported, never fatal
//! - **Chronological output** so the persisted table is ordered by date

use std::path::{Path, PathBuf};

use calamine::{Data, Range, Reader, open_workbook_auto};
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::domain::{
    RATE_DATE_FORMAT, RATE_FILE_EXT, RATE_FILE_PREFIX, RatePoint, RateSeries, RunConfig,
};
use crate::error::AppError;

/// Why a report was left out of the rate series.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Filename doesn't carry a valid `YYYYMMDD` token.
    BadFileName,
    /// The workbook couldn't be opened (corrupt, truncated, not a spreadsheet).
    Unreadable(String),
    MissingSheet(String),
    MissingColumn(String),
    /// Header row present, but no data rows under it.
    NoDataRows,
    /// The last-row cell holds something other than a number.
    NotNumeric(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::BadFileName => write!(f, "filename has no valid date"),
            SkipReason::Unreadable(e) => write!(f, "unreadable workbook: {e}"),
            SkipReason::MissingSheet(s) => write!(f, "missing sheet `{s}`"),
            SkipReason::MissingColumn(c) => write!(f, "missing column `{c}`"),
            SkipReason::NoDataRows => write!(f, "sheet has no data rows"),
            SkipReason::NotNumeric(v) => write!(f, "non-numeric value '{v}'"),
        }
    }
}

/// A report that was skipped, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct SkipRecord {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Extractor output: the rebuilt series plus every skipped file.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub series: RateSeries,
    pub skipped: Vec<SkipRecord>,
    pub files_seen: usize,
}

/// Rebuild the rate series from every report currently in the data directory.
///
/// Only an invalid glob pattern is an error; everything file-specific ends up
/// in [`Extraction::skipped`].
pub fn extract_rates(config: &RunConfig) -> Result<Extraction, AppError> {
    let pattern = config.rate_report_glob();
    let entries = glob::glob(&pattern)
        .map_err(|e| AppError::input(format!("Invalid report glob '{pattern}': {e}")))?;

    let mut points = Vec::new();
    let mut skipped = Vec::new();
    let mut files_seen = 0usize;

    for entry in entries {
        let path = match entry {
            Ok(p) => p,
            Err(e) => {
                skipped.push(SkipRecord {
                    path: e.path().to_path_buf(),
                    reason: SkipReason::Unreadable(e.error().to_string()),
                });
                continue;
            }
        };
        files_seen += 1;

        match extract_one(&path, config) {
            Ok(point) => points.push(point),
            Err(reason) => {
                debug!(path = %path.display(), reason = %reason, "Skipping report");
                skipped.push(SkipRecord { path, reason });
            }
        }
    }

    let series = RateSeries::chronological(points);
    info!(
        files = files_seen,
        rows = series.len(),
        skipped = skipped.len(),
        "Vaccination reports processed"
    );

    Ok(Extraction {
        series,
        skipped,
        files_seen,
    })
}

fn extract_one(path: &Path, config: &RunConfig) -> Result<RatePoint, SkipReason> {
    let date = date_from_file_name(path).ok_or(SkipReason::BadFileName)?;

    let mut workbook =
        open_workbook_auto(path).map_err(|e| SkipReason::Unreadable(e.to_string()))?;

    if !workbook.sheet_names().iter().any(|s| s == &config.sheet_name) {
        return Err(SkipReason::MissingSheet(config.sheet_name.clone()));
    }
    let range = workbook
        .worksheet_range(&config.sheet_name)
        .map_err(|e| SkipReason::Unreadable(e.to_string()))?;

    let rate = rate_from_range(&range, &config.rate_column)?;
    Ok(RatePoint::new(date, rate))
}

/// Read `column`'s value on the last row of `range`.
///
/// The first row is the header. `Ok(None)` means the cell exists but is empty.
pub fn rate_from_range(range: &Range<Data>, column: &str) -> Result<Option<f64>, SkipReason> {
    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| SkipReason::MissingColumn(column.to_string()))?;

    let col = header
        .iter()
        .position(|cell| cell_text(cell).trim() == column)
        .ok_or_else(|| SkipReason::MissingColumn(column.to_string()))?;

    let last = rows.last().ok_or(SkipReason::NoDataRows)?;
    match last.get(col) {
        None => Ok(None),
        Some(cell) => cell_rate(cell),
    }
}

fn cell_rate(cell: &Data) -> Result<Option<f64>, SkipReason> {
    match cell {
        Data::Empty => Ok(None),
        Data::Float(v) if v.is_finite() => Ok(Some(*v)),
        Data::Int(v) => Ok(Some(*v as f64)),
        Data::String(s) => parse_rate_text(s),
        other => Err(SkipReason::NotNumeric(cell_text(other))),
    }
}

/// Numbers exported as text, possibly with a decimal comma.
fn parse_rate_text(s: &str) -> Result<Option<f64>, SkipReason> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let normalized = trimmed.replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(SkipReason::NotNumeric(trimmed.to_string())),
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) => format!("{f}"),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#ERR({e:?})"),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Parse the `YYYYMMDD` token out of `Informe_Comunicacion_<YYYYMMDD>.ods`.
pub fn date_from_file_name(path: &Path) -> Option<NaiveDate> {
    let name = path.file_name()?.to_str()?;
    let token = name
        .strip_prefix(RATE_FILE_PREFIX)?
        .strip_suffix(RATE_FILE_EXT)?
        .strip_suffix('.')?;
    if token.len() != 8 {
        return None;
    }
    NaiveDate::parse_from_str(token, RATE_DATE_FORMAT).ok()
}

//! Cases CSV ingest.
//!
//! The national file has one row per region per date. We keep the raw rows
//! (the aligner decides which dates survive) and report bad rows instead of
//! failing on them.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::debug;

use crate::domain::{CasePoint, RunConfig};
use crate::error::AppError;

/// A row that couldn't be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: parsed rows + row errors.
#[derive(Debug, Clone, Default)]
pub struct CaseData {
    pub points: Vec<CasePoint>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Column names to read; taken from [`RunConfig`].
#[derive(Debug, Clone, Copy)]
struct CaseColumns<'a> {
    date: &'a str,
    count: &'a str,
    region: &'a str,
}

pub fn load_cases(path: &Path, config: &RunConfig) -> Result<CaseData, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::input(format!("Failed to open cases file '{}': {e}", path.display()))
    })?;
    let columns = CaseColumns {
        date: &config.cases_date_column,
        count: &config.cases_count_column,
        region: &config.cases_region_column,
    };
    read_cases(file, columns)
}

fn read_cases<R: std::io::Read>(input: R, columns: CaseColumns<'_>) -> Result<CaseData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read cases header: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for required in [columns.date, columns.count] {
        if !header_map.contains_key(required) {
            return Err(AppError::input(format!(
                "Cases file is missing required column `{required}`."
            )));
        }
    }

    let mut out = CaseData::default();
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        out.rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                out.row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &header_map, columns) {
            Ok(point) => out.points.push(point),
            Err(message) => out.row_errors.push(RowError { line, message }),
        }
    }

    debug!(
        rows = out.rows_read,
        used = out.points.len(),
        errors = out.row_errors.len(),
        "Cases file loaded"
    );
    Ok(out)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        // Some exports prepend a UTF-8 BOM to the first header.
        .map(|(i, h)| (h.trim_start_matches('\u{feff}').trim().to_string(), i))
        .collect()
}

fn parse_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    columns: CaseColumns<'_>,
) -> Result<CasePoint, String> {
    let raw_date = get_required(record, header_map, columns.date)?;
    let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{raw_date}': {e}"))?;

    let raw_cases = get_required(record, header_map, columns.count)?;
    let cases = raw_cases
        .parse::<u64>()
        .map_err(|_| format!("Invalid case count '{raw_cases}'"))?;

    let region = header_map
        .get(columns.region)
        .and_then(|idx| record.get(*idx))
        .unwrap_or("")
        .to_string();

    Ok(CasePoint {
        date,
        region,
        cases,
    })
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

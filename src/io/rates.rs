//! The persisted rate table (`Date,Vaccinated`).
//!
//! `Date` is written as the report's `YYYYMMDD` token; an empty `Vaccinated`
//! cell is a missing rate. Reading keeps the stored row order.

use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{RATE_DATE_FORMAT, RatePoint, RateSeries};
use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
struct RateRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Vaccinated")]
    vaccinated: Option<f64>,
}

/// Write the rate table, replacing any previous file.
pub fn write_rate_table(path: &Path, series: &RateSeries) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::runtime(format!("Failed to create rate table '{}': {e}", path.display()))
    })?;
    let mut writer = csv::Writer::from_writer(file);

    for p in series.points() {
        writer
            .serialize(RateRow {
                date: p.date.format(RATE_DATE_FORMAT).to_string(),
                vaccinated: p.rate,
            })
            .map_err(|e| AppError::runtime(format!("Failed to write rate table row: {e}")))?;
    }

    // An empty series still gets its header so readers see a valid table.
    if series.is_empty() {
        writer
            .write_record(["Date", "Vaccinated"])
            .map_err(|e| AppError::runtime(format!("Failed to write rate table header: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::runtime(format!("Failed to flush rate table: {e}")))?;
    Ok(())
}

/// Load the rate table in stored order.
pub fn read_rate_table(path: &Path) -> Result<RateSeries, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::input(format!("Failed to open rate table '{}': {e}", path.display()))
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut points = Vec::new();
    for (idx, result) in reader.deserialize::<RateRow>().enumerate() {
        // +2: header is line 1.
        let line = idx + 2;
        let row = result
            .map_err(|e| AppError::input(format!("Invalid rate table row at line {line}: {e}")))?;
        let date = parse_table_date(&row.date)
            .ok_or_else(|| AppError::input(format!("Invalid date '{}' at line {line}.", row.date)))?;
        let rate = row.vaccinated.filter(|v| v.is_finite());
        points.push(RatePoint::new(date, rate));
    }

    Ok(RateSeries::new(points))
}

fn parse_table_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, RATE_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn written_table_has_expected_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rates.csv");
        let series = RateSeries::new(vec![
            RatePoint::new(d(2021, 5, 1), Some(0.1)),
            RatePoint::new(d(2021, 5, 2), None),
        ]);

        write_rate_table(&path, &series).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Date,Vaccinated\n20210501,0.1\n20210502,\n");

        assert_eq!(read_rate_table(&path).unwrap(), series);
    }

    #[test]
    fn reading_keeps_stored_order_and_accepts_iso_dates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rates.csv");
        std::fs::write(&path, "Date,Vaccinated\n20210503,0.3\n2021-05-01,0.1\n").unwrap();

        let series = read_rate_table(&path).unwrap();
        assert_eq!(series.first().unwrap().date, d(2021, 5, 3));
        assert_eq!(series.points()[1], RatePoint::new(d(2021, 5, 1), Some(0.1)));
    }

    #[test]
    fn empty_series_still_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rates.csv");
        write_rate_table(&path, &RateSeries::default()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Date,Vaccinated\n");
        assert!(read_rate_table(&path).unwrap().is_empty());
    }

    #[test]
    fn missing_table_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_rate_table(&dir.path().join("nope.csv")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}

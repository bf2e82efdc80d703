//! JSON export of the correlation summary.

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::app::pipeline::CorrelationSummary;
use crate::error::AppError;

#[derive(Debug, Serialize)]
struct SummaryFile<'a> {
    tool: &'static str,
    generated: String,
    correlation: &'a CorrelationSummary,
}

pub fn write_summary_json(path: &Path, summary: &CorrelationSummary) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::runtime(format!("Failed to create summary JSON '{}': {e}", path.display()))
    })?;

    let out = SummaryFile {
        tool: "vaxcases",
        generated: chrono::Local::now().to_rfc3339(),
        correlation: summary,
    };

    serde_json::to_writer_pretty(file, &out)
        .map_err(|e| AppError::runtime(format!("Failed to write summary JSON: {e}")))?;
    Ok(())
}

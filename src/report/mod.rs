//! Reporting: plain-text stage summaries for the terminal.
//!
//! The JSON export of the analysis lives in `crate::io::summary`.

pub mod format;

pub use format::*;

use crate::app::pipeline::RunOutput;
use crate::domain::RunConfig;

/// Summary of every stage that ran, in stage order.
pub fn format_run_output(output: &RunOutput, config: &RunConfig) -> String {
    let mut out = String::new();
    out.push_str("=== vaxcases ===\n");
    out.push_str(&format!("Data dir: {}\n", config.data_dir.display()));

    if let Some(summary) = &output.rate_fetch {
        out.push_str(&format!(
            "Range: {} .. {}\n",
            config.start_date, config.end_date
        ));
        out.push_str(&format_fetch_summary(summary));
    }
    if let Some(extraction) = &output.extraction {
        out.push_str(&format_extraction(
            extraction,
            &config.rates_table_path(),
            output.table_error.as_ref(),
        ));
    }
    if let Some(outcome) = &output.cases_fetch {
        out.push_str(&format_cases_fetch(outcome));
    }
    if let Some(analysis) = &output.analysis {
        out.push_str(&format_inputs(&analysis.inputs));
        if let Some(view) = &analysis.correlation {
            out.push_str(&format_correlation(view));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FetchSummary;

    #[test]
    fn only_stages_that_ran_are_reported() {
        let config = RunConfig::default();
        let output = RunOutput {
            rate_fetch: Some(FetchSummary::default()),
            ..RunOutput::default()
        };
        let txt = format_run_output(&output, &config);
        assert!(txt.contains("Range: 2021-05-01 .. 2021-10-05"));
        assert!(txt.contains("Reports: attempted=0"));
        assert!(!txt.contains("Extraction:"));
        assert!(!txt.contains("Correlation"));
    }
}

//! Command-line parsing for `vaxcases`.
//!
//! Argument parsing stays here; turning arguments into a [`RunConfig`] and
//! dispatching happens in `crate::app`.
//!
//! [`RunConfig`]: crate::domain::RunConfig

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{
    DEFAULT_CASES_BASE_URL, DEFAULT_RATE_COLUMN, DEFAULT_RATES_BASE_URL, DEFAULT_SHEET_NAME,
    DEFAULT_THRESHOLD, PlotView, WindowBoundary,
};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "vaxcases",
    version,
    about = "Vaccination rate vs. COVID-19 cases (Spain): fetch, extract, align, correlate, plot"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run every enabled stage: fetch reports, extract rates, fetch cases, plot.
    Run(RunArgs),
    /// Download one vaccination report per day in the date range.
    FetchRates(CommonArgs),
    /// Rebuild the rate table from every report on disk.
    Extract(CommonArgs),
    /// Download the national cases file.
    FetchCases(CommonArgs),
    /// Plot from the tables already on disk.
    Plot(PlotArgs),
    /// Launch the interactive TUI over the tables already on disk.
    Tui(CommonArgs),
}

/// Options shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct CommonArgs {
    /// Directory for downloaded reports, the cases file and the rate table.
    #[arg(long, env = "VAX_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Base URL of the daily vaccination reports.
    #[arg(long, env = "VAX_RATES_URL", default_value = DEFAULT_RATES_BASE_URL)]
    pub rates_url: String,

    /// Base URL of the cases file.
    #[arg(long, env = "VAX_CASES_URL", default_value = DEFAULT_CASES_BASE_URL)]
    pub cases_url: String,

    /// First report date to download (YYYY-MM-DD).
    #[arg(long, default_value = "2021-05-01")]
    pub start: NaiveDate,

    /// Last report date to download, inclusive (YYYY-MM-DD).
    #[arg(long, default_value = "2021-10-05")]
    pub end: NaiveDate,

    /// Report sheet holding the rate column.
    #[arg(long, default_value = DEFAULT_SHEET_NAME)]
    pub sheet: String,

    /// Header of the rate column; the value is read from its last row.
    #[arg(long, default_value = DEFAULT_RATE_COLUMN)]
    pub rate_column: String,

    /// Rate threshold for the restricted correlation (strictly greater than).
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    /// How the start of the case window is derived from the rate table.
    #[arg(long, value_enum, default_value_t = WindowBoundary::FirstRow)]
    pub window: WindowBoundary,
}

/// Plot output options.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Directory for `linear.svg` and `correlation.svg`.
    #[arg(long, default_value = "plots")]
    pub plot_dir: PathBuf,

    /// Skip the SVG files.
    #[arg(long)]
    pub no_svg: bool,

    /// Skip the ASCII plots on stdout.
    #[arg(long)]
    pub no_ascii: bool,

    /// ASCII plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// ASCII plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Write the correlation summary to a JSON file.
    #[arg(long = "export-summary", value_name = "JSON")]
    pub export_summary: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Don't download vaccination reports.
    #[arg(long)]
    pub skip_download_rates: bool,

    /// Don't rebuild the rate table.
    #[arg(long)]
    pub skip_extract: bool,

    /// Don't download the cases file.
    #[arg(long)]
    pub skip_download_cases: bool,

    /// Don't render the time-series view.
    #[arg(long)]
    pub skip_linear: bool,

    /// Don't render the correlation view.
    #[arg(long)]
    pub skip_correlation: bool,
}

#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Which view(s) to render.
    #[arg(long, value_enum, default_value_t = PlotView::Both)]
    pub view: PlotView,
}

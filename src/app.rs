//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the "real main" that:
//! - parses CLI arguments (with `.env` and environment fallbacks)
//! - resolves them into a validated `RunConfig`
//! - runs the enabled stages through `pipeline`
//! - prints reports and ASCII plots, writes SVG files and the JSON summary

use std::fs;
use std::path::Path;

use clap::Parser;
use tracing::{info, warn};

use crate::cli::{Command, CommonArgs, OutputArgs, PlotArgs, RunArgs};
use crate::domain::{RunConfig, Stages};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `vaxcases` binary.
pub fn run() -> Result<(), AppError> {
    // A missing `.env` is the normal case.
    if let Ok(path) = dotenvy::dotenv() {
        info!(path = %path.display(), "Loaded .env");
    }

    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Run(args) => handle_run(&run_config_from_args(&args)),
        Command::FetchRates(common) => handle_run(&stage_config(&common, |s| s.download_rates = true)),
        Command::Extract(common) => handle_run(&stage_config(&common, |s| s.extract_rates = true)),
        Command::FetchCases(common) => handle_run(&stage_config(&common, |s| s.download_cases = true)),
        Command::Plot(args) => handle_run(&plot_config_from_args(&args)),
        Command::Tui(common) => handle_tui(config_from_common(&common)),
    }
}

fn handle_run(config: &RunConfig) -> Result<(), AppError> {
    let output = pipeline::run_stages(config)?;

    println!("{}", crate::report::format_run_output(&output, config));

    if let Some(analysis) = &output.analysis {
        if analysis.inputs.rates.is_empty() {
            return Err(AppError::no_data(format!(
                "Rate table '{}' has no rows; nothing to plot.",
                config.rates_table_path().display()
            )));
        }
        render_outputs(config, analysis)?;
    }
    Ok(())
}

fn handle_tui(config: RunConfig) -> Result<(), AppError> {
    config.validate()?;
    crate::tui::run(config)
}

/// SVG files, ASCII plots and the JSON summary for one analysis.
fn render_outputs(config: &RunConfig, analysis: &pipeline::Analysis) -> Result<(), AppError> {
    if let Some(view) = &analysis.linear {
        if let Some(path) = config.plot_path("linear.svg") {
            ensure_parent(&path)?;
            crate::plot::render_linear_svg(&path, view)?;
            info!(path = %path.display(), "Linear view written");
        }
        if config.ascii {
            println!(
                "{}",
                crate::plot::render_linear_ascii(view, config.plot_width, config.plot_height)
            );
        }
    }

    if let Some(view) = &analysis.correlation {
        if let Some(path) = config.plot_path("correlation.svg") {
            ensure_parent(&path)?;
            crate::plot::render_correlation_svg(&path, view)?;
            info!(path = %path.display(), "Correlation view written");
        }
        if config.ascii {
            println!(
                "{}",
                crate::plot::render_correlation_ascii(view, config.plot_width, config.plot_height)
            );
        }
    }

    if let Some(path) = &config.export_summary {
        match &analysis.correlation {
            Some(view) => {
                ensure_parent(path)?;
                crate::io::write_summary_json(path, &view.summary())?;
                info!(path = %path.display(), "Summary written");
            }
            None => warn!("--export-summary needs the correlation view; nothing written"),
        }
    }
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<(), AppError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir).map_err(|e| {
            AppError::runtime(format!("Failed to create directory '{}': {e}", dir.display()))
        }),
        _ => Ok(()),
    }
}

pub fn config_from_common(args: &CommonArgs) -> RunConfig {
    RunConfig {
        start_date: args.start,
        end_date: args.end,
        data_dir: args.data_dir.clone(),
        rates_base_url: args.rates_url.clone(),
        cases_base_url: args.cases_url.clone(),
        sheet_name: args.sheet.clone(),
        rate_column: args.rate_column.clone(),
        threshold: args.threshold,
        window_boundary: args.window,
        ..RunConfig::default()
    }
}

fn apply_output(config: &mut RunConfig, args: &OutputArgs) {
    config.plot_dir = (!args.no_svg).then(|| args.plot_dir.clone());
    config.ascii = !args.no_ascii;
    config.plot_width = args.width;
    config.plot_height = args.height;
    config.export_summary = args.export_summary.clone();
}

pub fn run_config_from_args(args: &RunArgs) -> RunConfig {
    let mut config = config_from_common(&args.common);
    apply_output(&mut config, &args.output);
    config.stages = Stages {
        download_rates: !args.skip_download_rates,
        extract_rates: !args.skip_extract,
        download_cases: !args.skip_download_cases,
        plot_linear: !args.skip_linear,
        plot_correlation: !args.skip_correlation,
    };
    config
}

pub fn plot_config_from_args(args: &PlotArgs) -> RunConfig {
    let mut config = config_from_common(&args.common);
    apply_output(&mut config, &args.output);
    config.stages = Stages {
        plot_linear: args.view.linear(),
        plot_correlation: args.view.correlation(),
        ..Stages::NONE
    };
    config
}

/// Config for a single-stage subcommand.
fn stage_config(args: &CommonArgs, enable: impl FnOnce(&mut Stages)) -> RunConfig {
    let mut config = config_from_common(args);
    let mut stages = Stages::NONE;
    enable(&mut stages);
    config.stages = stages;
    config
}

/// Rewrite argv so `vaxcases` defaults to `vaxcases run`.
///
/// Rules:
/// - `vaxcases`                     -> `vaxcases run`
/// - `vaxcases --data-dir d ...`    -> `vaxcases run --data-dir d ...`
/// - `vaxcases --help/--version/-h` -> unchanged (top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("run".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "run".to_string());
    }
    argv
}

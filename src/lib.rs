//! `vax-cases` library crate.
//!
//! The binary (`vaxcases`) is a thin wrapper around this library so that:
//!
//! - the alignment and correlation logic is testable without spawning processes
//! - the CLI and the TUI share one stage pipeline (`app::pipeline`)

pub mod align;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;
pub mod tui;

//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - rate observations (`RatePoint`, `RateSeries`)
//! - case observations and their per-date totals (`CasePoint`, `CaseTotals`)
//! - the aligned rate/case arrays fed to the correlation (`AlignedPair`)
//! - run configuration (`RunConfig`, `Stages`, `WindowBoundary`)

pub mod types;

pub use types::*;

//! Statistics used by the analysis.

pub mod correlation;

pub use correlation::*;

//! Remote data sources: the dated vaccination reports and the cases file.

pub mod fetch;

pub use fetch::*;

//! Input/output helpers.
//!
//! - rate extraction from report spreadsheets (`extract`)
//! - the persisted rate table (`rates`)
//! - cases CSV ingest (`cases`)
//! - analysis summary export (`summary`)

pub mod cases;
pub mod extract;
pub mod rates;
pub mod summary;

pub use cases::*;
pub use extract::*;
pub use rates::*;
pub use summary::*;

//! Date alignment of the rate series and the case rows.
//!
//! Two restrictions feed the two views:
//!
//! - `window`: case totals from the start of the rate series onwards (linear view)
//! - `pairs`: forward-filled rates matched date-for-date with case totals
//!   (correlation view), plus the threshold subset via `AlignedPair::above`

pub mod fill;
pub mod pairs;
pub mod window;

pub use fill::*;
pub use pairs::*;
pub use window::*;

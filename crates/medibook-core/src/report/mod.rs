//! Analytics reporting and export.

mod analytics;

pub use analytics::*;

//! Terminal front end for the reconciliation engine
//!
//! - `differ` renders plans and drift reports
//! - `executor` drives apply with a confirmation prompt and progress bar

pub mod differ;
pub mod executor;

pub use differ::{display_drift, display_plan};
pub use executor::{ApplyOptions, execute};

//! Terminal output for dinedash
//!
//! This crate provides the table and JSON output formatters and the ASCII
//! charts of the analytics view.

pub mod charts;
pub mod output;

pub use charts::ChartRenderer;
pub use output::{JsonFormatter, OutputFormatter, TableFormatter, get_formatter};

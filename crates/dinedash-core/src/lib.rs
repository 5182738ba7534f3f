//! Core types and pure logic for dinedash
//!
//! This crate holds the domain types, the error type, timezone handling,
//! the date-window resolver, record filters, aggregation and the dashboard
//! state container. Nothing here performs I/O.

pub mod aggregation;
pub mod error;
pub mod filters;
pub mod store;
pub mod timezone;
pub mod types;
pub mod window;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use error::{DashboardError, Result};
pub use types::{DailyDate, DeliveryCategory, EstimateMinutes, Order, OrderId, Reservation};
pub use window::{DateFilter, TimeWindow};

//! dinedash - Terminal back office for restaurant orders and reservations
//!
//! This library provides functionality to:
//! - Poll orders and reservations from the restaurant's REST API
//! - Filter them by date range and order category
//! - Aggregate them into daily histograms, splits and peak days
//! - Mark orders delivered and email preparation-time estimates
//! - Render everything as tables, ASCII charts or JSON, once or live
//!
//! # Examples
//!
//! ```no_run
//! use dinedash::{
//!     api::{DEFAULT_API_URL, DEFAULT_TIMEOUT, HttpApi},
//!     refresh::{RefreshLoop, new_store},
//!     store::DashboardState,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> dinedash::Result<()> {
//!     let api = Arc::new(HttpApi::new(DEFAULT_API_URL, DEFAULT_TIMEOUT)?);
//!     let store = new_store(DashboardState::new());
//!     let refresh = RefreshLoop::new(api, store.clone(), chrono_tz::UTC);
//!
//!     refresh.activate();
//!     refresh.run_cycle().await;
//!
//!     let state = store.read().await;
//!     println!("{} orders loaded", state.orders().len());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod live_monitor;
pub mod refresh;

pub use dinedash_api as api;
pub use dinedash_core::{aggregation, error, filters, store, timezone, types, window};
pub use dinedash_terminal::{charts, output};

// Re-export commonly used types
pub use error::{DashboardError, Result};
pub use types::{DailyDate, DeliveryCategory, EstimateMinutes, Order, OrderId, Reservation};
pub use window::{DateFilter, TimeWindow};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

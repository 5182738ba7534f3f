//! Back-office API access for dinedash
//!
//! [`DashboardApi`] is the seam between the dashboard and the restaurant's
//! REST server. [`HttpApi`] implements it with reqwest; [`schema`] holds the
//! request bodies and the shape validation applied to every response.

pub mod client;
pub mod schema;

pub use client::{DEFAULT_API_URL, DEFAULT_TIMEOUT, DashboardApi, HttpApi};
pub use schema::TimeEstimateRequest;

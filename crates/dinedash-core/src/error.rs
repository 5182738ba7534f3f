//! Error types for dinedash
//!
//! This module defines the error types used throughout the dinedash crates.
//! All errors are derived from `thiserror` for convenient error handling
//! and automatic `From` implementations.
//!
//! Every variant renders to a single human-readable sentence. The refresh
//! loop stores that sentence as the dashboard's error banner, so the
//! `Display` output is what staff actually see.
//!
//! # Example
//!
//! ```
//! use dinedash_core::error::{DashboardError, Result};
//!
//! fn validate_minutes(minutes: u32) -> Result<u32> {
//!     if minutes == 0 {
//!         return Err(DashboardError::InvalidArgument("minutes must be positive".into()));
//!     }
//!     Ok(minutes)
//! }
//! ```

use thiserror::Error;

use crate::types::OrderId;

/// Main error type for dinedash operations
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Transport-level failure talking to the back-office API
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("{context}: {status}")]
    Status {
        /// What was being attempted, e.g. "Error fetching orders"
        context: String,
        /// Status reason phrase (or code when the reason is unknown)
        status: String,
    },

    /// A response body did not have the expected shape
    #[error("{0}")]
    Shape(String),

    /// A refresh cycle failed; carries the message shown on the dashboard
    #[error("{0}")]
    Refresh(String),

    /// A write endpoint reported an application-level failure
    #[error("{0}")]
    Mutation(String),

    /// No order with this identifier is currently loaded
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// A preparation-time estimate was already sent for this order
    #[error("Time estimate already sent for order {0}")]
    EstimateAlreadySent(OrderId),

    /// Invalid timezone
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl DashboardError {
    /// Build a status error from an HTTP status code
    pub fn status(context: impl Into<String>, status: reqwest::StatusCode) -> Self {
        let status = status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| status.as_u16().to_string());
        Self::Status {
            context: context.into(),
            status,
        }
    }

    /// Whether the failure came from talking to the API (as opposed to local validation)
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Network(_)
                | Self::Status { .. }
                | Self::Shape(_)
                | Self::Refresh(_)
                | Self::Mutation(_)
        )
    }
}

/// Convenience type alias for Results in dinedash
pub type Result<T> = std::result::Result<T, DashboardError>;

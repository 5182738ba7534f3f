//! Payload schemas for the back-office API
//!
//! The read endpoints wrap their collection in a named field
//! (`{"orders": [...]}`, `{"reservations": [...]}`). A body without that
//! field, or with something other than an array under it, is a shape error.
//! Inside a well-formed array, elements are validated one by one: an element
//! that cannot be read is skipped and logged rather than failing the whole
//! refresh.
//!
//! Scalar order fields are read leniently (`null`, `"5.00"` for a price),
//! so an order is only lost when its structure is unusable.

use dinedash_core::error::{DashboardError, Result};
use dinedash_core::types::{Order, OrderId, Reservation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Body of `POST /markAsDelivered`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkDeliveredRequest {
    /// Order to mark
    pub order_id: OrderId,
}

/// Body of `POST /timeDetails`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEstimateRequest {
    /// Customer to notify
    pub email: String,
    /// Human-readable estimate, e.g. "20 minutes"
    pub expected_time: String,
}

/// Error body a write endpoint may return with a failure status
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    /// Server-provided message
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorBody {
    /// Extract the message from a raw error body, if there is one
    pub fn message_from(body: &str) -> Option<String> {
        serde_json::from_str::<ApiErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .filter(|m| !m.trim().is_empty())
    }
}

/// Validate an orders payload
///
/// Orders without a `dishes` array cannot be rendered and are dropped.
pub fn parse_orders(body: Value) -> Result<Vec<Order>> {
    let items = take_collection(body, "orders")?;
    Ok(items
        .into_iter()
        .enumerate()
        .filter(|(index, item)| {
            let has_dishes = item.get("dishes").is_some_and(Value::is_array);
            if !has_dishes {
                debug!(index, "Dropping order without a dishes list");
            }
            has_dishes
        })
        .filter_map(|(index, item)| parse_element::<Order>(index, item, "order"))
        .collect())
}

/// Validate a reservations payload
pub fn parse_reservations(body: Value) -> Result<Vec<Reservation>> {
    let items = take_collection(body, "reservations")?;
    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| parse_element::<Reservation>(index, item, "reservation"))
        .collect())
}

fn take_collection(body: Value, field: &str) -> Result<Vec<Value>> {
    let shape_error =
        || DashboardError::Shape(format!("Invalid {field} data structure received from server"));

    match body {
        Value::Object(mut map) => match map.remove(field) {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(shape_error()),
        },
        _ => Err(shape_error()),
    }
}

fn parse_element<T: DeserializeOwned>(index: usize, item: Value, kind: &str) -> Option<T> {
    match serde_json::from_value(item) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!("Skipping malformed {} at index {}: {}", kind, index, e);
            None
        }
    }
}

//! Core domain types for dinedash
//!
//! Orders and reservations are deserialized straight from the back-office
//! API payloads. Timestamps are kept in their raw string form and parsed on
//! demand, because a record with a missing or malformed timestamp is still
//! displayable when no date window is active.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Strongly-typed order identifier
///
/// # Examples
/// ```
/// use dinedash_core::types::OrderId;
///
/// let id = OrderId::new("665f1c2e9b");
/// assert_eq!(id.as_str(), "665f1c2e9b");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Create a new OrderId from any string-like type
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the customer receives an order
///
/// The API sends a free-form string. `tapAndCollect` and `pickup` are both
/// collected at the counter; anything unrecognized is preserved verbatim and
/// belongs to neither bucket of a category split.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeliveryCategory {
    /// Driven to the customer's address
    Delivery,
    /// Collected by the customer (`tapAndCollect`)
    TapAndCollect,
    /// Collected by the customer (`pickup`)
    Pickup,
    /// Any other value the API sent
    Other(String),
}

impl DeliveryCategory {
    /// Whether the customer collects the order themselves
    pub fn is_pickup_like(&self) -> bool {
        matches!(self, Self::TapAndCollect | Self::Pickup)
    }

    /// Whether the order is delivered to an address
    pub fn is_delivery(&self) -> bool {
        matches!(self, Self::Delivery)
    }

    /// The wire spelling of this category
    pub fn as_str(&self) -> &str {
        match self {
            Self::Delivery => "delivery",
            Self::TapAndCollect => "tapAndCollect",
            Self::Pickup => "pickup",
            Self::Other(s) => s,
        }
    }
}

impl Default for DeliveryCategory {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for DeliveryCategory {
    fn from(value: String) -> Self {
        match value.as_str() {
            "delivery" => Self::Delivery,
            "tapAndCollect" => Self::TapAndCollect,
            "pickup" => Self::Pickup,
            _ => Self::Other(value),
        }
    }
}

impl From<DeliveryCategory> for String {
    fn from(value: DeliveryCategory) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for DeliveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single dish on an order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Dish name
    #[serde(default)]
    pub name: Option<String>,
    /// Number of portions
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub quantity: u32,
    /// Unit price in the restaurant's currency
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub price: f64,
}

impl LineItem {
    /// Unit price, clamped so a malformed negative price never renders
    pub fn unit_price(&self) -> f64 {
        self.price.max(0.0)
    }

    /// Quantity times unit price
    pub fn subtotal(&self) -> f64 {
        self.unit_price() * f64::from(self.quantity)
    }
}

/// A customer order as returned by the orders endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Server-assigned identifier
    #[serde(rename = "_id", default, deserialize_with = "deserialize_null_default")]
    pub id: OrderId,
    /// Ordered line items
    #[serde(default)]
    pub dishes: Vec<LineItem>,
    /// Raw order timestamp
    #[serde(default)]
    pub order_time: Option<String>,
    /// Delivery category
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub delivery_option: DeliveryCategory,
    /// Whether the order has been handed over
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub is_delivered: bool,
    /// Customer email
    #[serde(default)]
    pub email: Option<String>,
    /// Customer name, shown next to delivery addresses
    #[serde(default)]
    pub name: Option<String>,
    /// Delivery address
    #[serde(default)]
    pub address: Option<String>,
}

impl Order {
    /// Sum of all line item subtotals
    pub fn total_price(&self) -> f64 {
        self.dishes.iter().map(LineItem::subtotal).sum()
    }

    /// An order can be rendered only when it carries at least one dish
    pub fn is_renderable(&self) -> bool {
        !self.dishes.is_empty()
    }
}

/// A table reservation as returned by the reservations endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    /// Server-assigned identifier
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    /// Customer name
    #[serde(default)]
    pub name: Option<String>,
    /// Customer email
    #[serde(default)]
    pub email: Option<String>,
    /// Customer phone number
    #[serde(default)]
    pub phone: Option<String>,
    /// Raw reservation date-time
    #[serde(default)]
    pub date: Option<String>,
    /// Clock time as typed by the customer, display only
    #[serde(default)]
    pub time: Option<String>,
    /// Party size
    #[serde(default, deserialize_with = "deserialize_party_size")]
    pub guests: Option<u32>,
    /// Free-text special requests
    #[serde(default)]
    pub special_requests: Option<String>,
}

/// A scalar the API may send typed, as text, or as something else entirely
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Typed(T),
    Text(String),
    Other(IgnoredAny),
}

/// Read a scalar leniently: `null`, unparsable text and values of the
/// wrong type all become the default
fn deserialize_lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr + Default,
{
    Ok(match Option::<Lenient<T>>::deserialize(deserializer)? {
        Some(Lenient::Typed(value)) => value,
        Some(Lenient::Text(s)) => s.trim().parse().unwrap_or_default(),
        Some(Lenient::Other(_)) | None => T::default(),
    })
}

/// Treat an explicit `null` like a missing key
fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept the party size as either a JSON number or a numeric string
fn deserialize_party_size<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PartySize {
        Number(u32),
        Text(String),
    }

    Ok(match Option::<PartySize>::deserialize(deserializer)? {
        Some(PartySize::Number(n)) => Some(n),
        Some(PartySize::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

/// Preparation-time estimate offered to customers, in minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EstimateMinutes(u32);

impl EstimateMinutes {
    /// The choices offered at the counter
    pub const CHOICES: [u32; 3] = [10, 20, 30];

    /// Create an estimate, accepting only one of [`Self::CHOICES`]
    pub fn new(minutes: u32) -> Option<Self> {
        Self::CHOICES.contains(&minutes).then_some(Self(minutes))
    }

    /// Minutes value
    pub fn minutes(&self) -> u32 {
        self.0
    }

    /// Wire representation, e.g. "20 minutes"
    pub fn expected_time(&self) -> String {
        format!("{} minutes", self.0)
    }
}

impl Default for EstimateMinutes {
    fn default() -> Self {
        Self(10)
    }
}

impl fmt::Display for EstimateMinutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} minutes", self.0)
    }
}

/// Daily date for aggregation
///
/// Represents a calendar date in the viewer's timezone, used as the bucket
/// key of daily histograms.
///
/// # Examples
/// ```
/// use dinedash_core::types::DailyDate;
/// use chrono::NaiveDate;
///
/// let date = DailyDate::new(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
/// assert_eq!(date.format("%Y-%m-%d"), "2024-03-15");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DailyDate(NaiveDate);

impl DailyDate {
    /// Create a new DailyDate
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Get the inner NaiveDate
    pub fn inner(&self) -> &NaiveDate {
        &self.0
    }

    /// Calendar date of an instant in the given timezone
    pub fn from_instant(instant: &DateTime<Utc>, tz: &Tz) -> Self {
        Self(instant.with_timezone(tz).date_naive())
    }

    /// Format with a chrono format string
    pub fn format(&self, fmt: &str) -> String {
        self.0.format(fmt).to_string()
    }
}

impl fmt::Display for DailyDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a raw API timestamp into an instant
///
/// Accepted forms:
/// - RFC 3339 with an offset, e.g. `2024-03-15T18:30:00.000Z`
/// - a naive date-time such as `2024-03-15T18:30`, read as wall-clock time in `tz`
/// - a bare date `2024-03-15`, read as midnight UTC
///
/// Returns `None` for anything else, and for wall-clock times that do not
/// exist in `tz`.
///
/// # Examples
/// ```
/// use dinedash_core::types::parse_instant;
///
/// let utc = chrono_tz::UTC;
/// assert!(parse_instant("2024-03-15T18:30:00Z", &utc).is_some());
/// assert!(parse_instant("2024-03-15", &utc).is_some());
/// assert!(parse_instant("not a date", &utc).is_none());
/// ```
pub fn parse_instant(raw: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

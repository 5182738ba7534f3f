//! Filtering stages for orders and reservations
//!
//! Two independent, composable stages narrow a collection before it is
//! rendered or aggregated:
//!
//! - [`RecordFilter`] keeps records whose timestamp falls in a [`TimeWindow`]
//! - [`CategoryFilter`] keeps orders of the requested delivery categories
//!
//! Both borrow from the input and preserve its relative order, so applying
//! them in either order yields the same records.
//!
//! # Examples
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use dinedash_core::filters::{CategoryFilter, RecordFilter};
//! use dinedash_core::types::{DeliveryCategory, Order};
//! use dinedash_core::window::DateFilter;
//!
//! let orders = vec![Order {
//!     order_time: Some("2024-03-15T12:00:00Z".into()),
//!     delivery_option: DeliveryCategory::Pickup,
//!     ..Default::default()
//! }];
//!
//! let now = Utc.with_ymd_and_hms(2024, 3, 16, 12, 0, 0).unwrap();
//! let recent = RecordFilter::for_selection::<Order>(DateFilter::Last3Days, now, chrono_tz::UTC);
//! let pickups = CategoryFilter::pickup();
//!
//! let visible = pickups.apply(recent.apply(&orders));
//! assert_eq!(visible.len(), 1);
//! ```

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::types::{DeliveryCategory, Order, Reservation, parse_instant};
use crate::window::{DateFilter, TimeWindow};

/// Which timestamp attribute of a record to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimestampField {
    /// `orderTime` on orders
    OrderTime,
    /// `date` on reservations
    ReservationDate,
}

impl TimestampField {
    /// Wire name of the attribute
    pub fn as_str(&self) -> &'static str {
        match self {
            TimestampField::OrderTime => "orderTime",
            TimestampField::ReservationDate => "date",
        }
    }
}

/// A record that carries one or more raw timestamp attributes
pub trait Timestamped {
    /// The attribute tables and charts use for this record type
    const PRIMARY_FIELD: TimestampField;

    /// Raw value of a timestamp attribute, if the record has it
    fn raw_timestamp(&self, field: TimestampField) -> Option<&str>;

    /// Parsed value of a timestamp attribute
    fn timestamp(&self, field: TimestampField, tz: &Tz) -> Option<DateTime<Utc>> {
        self.raw_timestamp(field).and_then(|raw| parse_instant(raw, tz))
    }
}

impl Timestamped for Order {
    const PRIMARY_FIELD: TimestampField = TimestampField::OrderTime;

    fn raw_timestamp(&self, field: TimestampField) -> Option<&str> {
        match field {
            TimestampField::OrderTime => self.order_time.as_deref(),
            TimestampField::ReservationDate => None,
        }
    }
}

impl Timestamped for Reservation {
    const PRIMARY_FIELD: TimestampField = TimestampField::ReservationDate;

    fn raw_timestamp(&self, field: TimestampField) -> Option<&str> {
        match field {
            TimestampField::ReservationDate => self.date.as_deref(),
            TimestampField::OrderTime => None,
        }
    }
}

/// Time-window stage
#[derive(Debug, Clone, Copy)]
pub struct RecordFilter {
    /// Window records must fall in
    pub window: TimeWindow,
    /// Attribute to test
    pub field: TimestampField,
    /// Viewer's timezone, for same-day windows and naive timestamps
    pub tz: Tz,
}

impl RecordFilter {
    /// Create a filter from an already resolved window
    pub fn new(window: TimeWindow, field: TimestampField, tz: Tz) -> Self {
        Self { window, field, tz }
    }

    /// Resolve a selection and filter on the record type's primary field
    pub fn for_selection<T: Timestamped>(filter: DateFilter, now: DateTime<Utc>, tz: Tz) -> Self {
        Self::new(TimeWindow::resolve(filter, now, &tz), T::PRIMARY_FIELD, tz)
    }

    /// Check if a record passes the filter
    ///
    /// With an unbounded window every record passes, even one without a
    /// timestamp. Otherwise the timestamp must exist, parse and be in window.
    pub fn matches<T: Timestamped>(&self, record: &T) -> bool {
        if !self.window.is_bounded() {
            return true;
        }
        record
            .timestamp(self.field, &self.tz)
            .is_some_and(|instant| self.window.contains(&instant, &self.tz))
    }

    /// Keep the matching records, in their original order
    pub fn apply<'a, T, I>(&self, records: I) -> Vec<&'a T>
    where
        T: Timestamped + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        records.into_iter().filter(|r| self.matches(*r)).collect()
    }
}

/// Delivery-category stage for orders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFilter {
    pickup_like: bool,
    delivery: bool,
    others: bool,
}

impl CategoryFilter {
    /// Orders collected at the counter (`tapAndCollect` or `pickup`)
    pub fn pickup() -> Self {
        Self {
            pickup_like: true,
            delivery: false,
            others: false,
        }
    }

    /// Orders delivered to an address
    pub fn delivery() -> Self {
        Self {
            pickup_like: false,
            delivery: true,
            others: false,
        }
    }

    /// Every order, whatever its category
    pub fn any() -> Self {
        Self {
            pickup_like: true,
            delivery: true,
            others: true,
        }
    }

    /// Check if an order's category is requested
    pub fn matches(&self, order: &Order) -> bool {
        match &order.delivery_option {
            DeliveryCategory::Delivery => self.delivery,
            DeliveryCategory::TapAndCollect | DeliveryCategory::Pickup => self.pickup_like,
            DeliveryCategory::Other(_) => self.others,
        }
    }

    /// Keep the matching orders, in their original order
    pub fn apply<'a, I>(&self, orders: I) -> Vec<&'a Order>
    where
        I: IntoIterator<Item = &'a Order>,
    {
        orders.into_iter().filter(|o| self.matches(o)).collect()
    }
}

impl Default for CategoryFilter {
    fn default() -> Self {
        Self::any()
    }
}

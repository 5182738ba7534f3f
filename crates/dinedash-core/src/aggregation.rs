//! Aggregation over filtered orders and reservations
//!
//! Everything here is a pure function of its inputs and is recomputed on
//! every render; nothing is cached or updated incrementally.
//!
//! - [`DailyHistogram`]: record count per calendar day, in first-seen order
//! - [`CategorySplit`]: delivery vs. pickup-like order counts
//! - [`StatusSplit`]: upcoming vs. past reservation counts
//! - [`AggregateSnapshot`]: the analytics view's full set of figures
//! - [`PendingCounts`]: the menu badges of the table views
//!
//! # Examples
//!
//! ```
//! use dinedash_core::aggregation::{DailyHistogram, percentage};
//! use dinedash_core::filters::TimestampField;
//! use dinedash_core::types::Order;
//!
//! let orders = vec![
//!     Order { order_time: Some("2024-03-15T12:00:00Z".into()), ..Default::default() },
//!     Order { order_time: Some("2024-03-15T13:00:00Z".into()), ..Default::default() },
//!     Order { order_time: Some("2024-03-16T09:00:00Z".into()), ..Default::default() },
//! ];
//!
//! let histogram = DailyHistogram::from_records(&orders, TimestampField::OrderTime, &chrono_tz::UTC);
//! assert_eq!(histogram.total(), 3);
//! assert_eq!(histogram.best_day().unwrap().count, 2);
//! assert_eq!(percentage(2, 3), 67);
//! assert_eq!(percentage(1, 0), 0);
//! ```

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::filters::{CategoryFilter, RecordFilter, Timestamped, TimestampField};
use crate::types::{DailyDate, DeliveryCategory, Order, Reservation};
use crate::window::DateFilter;

/// Integer percentage of `part` in `whole`, rounded half up
///
/// A zero `whole` yields 0 rather than an undefined ratio.
pub fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    let (part, whole) = (part as u64, whole as u64);
    ((part * 200 + whole) / (whole * 2)) as u32
}

/// Record count for one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    /// Calendar day in the viewer's timezone
    pub date: DailyDate,
    /// Number of records on that day
    pub count: usize,
}

/// Record counts per calendar day
///
/// Buckets iterate in the order their dates were first encountered in the
/// input, not in date order. Consumers that want a timeline sort
/// [`DailyHistogram::sorted`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyHistogram {
    buckets: Vec<DailyCount>,
    /// Records skipped because their timestamp was missing or unparsable
    pub unbucketed: usize,
}

impl DailyHistogram {
    /// Bucket records by the calendar day of a timestamp attribute
    pub fn from_records<'a, T, I>(records: I, field: TimestampField, tz: &Tz) -> Self
    where
        T: Timestamped + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let mut histogram = Self::default();
        let mut index: HashMap<DailyDate, usize> = HashMap::new();

        for record in records {
            let Some(instant) = record.timestamp(field, tz) else {
                histogram.unbucketed += 1;
                continue;
            };
            let date = DailyDate::from_instant(&instant, tz);
            match index.get(&date) {
                Some(&i) => histogram.buckets[i].count += 1,
                None => {
                    index.insert(date, histogram.buckets.len());
                    histogram.buckets.push(DailyCount { date, count: 1 });
                }
            }
        }

        histogram
    }

    /// Buckets in first-encountered order
    pub fn buckets(&self) -> &[DailyCount] {
        &self.buckets
    }

    /// Buckets in chronological order
    pub fn sorted(&self) -> Vec<DailyCount> {
        let mut buckets = self.buckets.clone();
        buckets.sort_by_key(|b| b.date);
        buckets
    }

    /// Count for a given day
    pub fn get(&self, date: &DailyDate) -> Option<usize> {
        self.buckets.iter().find(|b| &b.date == date).map(|b| b.count)
    }

    /// Sum of all bucket counts
    pub fn total(&self) -> usize {
        self.buckets.iter().map(|b| b.count).sum()
    }

    /// Number of distinct days
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether no record could be bucketed
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// The busiest day
    ///
    /// On a tie the day encountered first wins.
    pub fn best_day(&self) -> Option<DailyCount> {
        self.buckets.iter().fold(None, |best: Option<DailyCount>, b| match best {
            Some(current) if current.count >= b.count => Some(current),
            _ => Some(*b),
        })
    }
}

/// Orders split by how they reach the customer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySplit {
    /// Delivered to an address
    pub delivery: usize,
    /// Collected (`tapAndCollect` or `pickup`)
    pub pickup: usize,
}

impl CategorySplit {
    /// Count orders per category; unknown categories land in neither bucket
    pub fn from_orders<'a, I>(orders: I) -> Self
    where
        I: IntoIterator<Item = &'a Order>,
    {
        orders
            .into_iter()
            .fold(Self::default(), |mut split, order| {
                match order.delivery_option {
                    DeliveryCategory::Delivery => split.delivery += 1,
                    DeliveryCategory::TapAndCollect | DeliveryCategory::Pickup => {
                        split.pickup += 1
                    }
                    DeliveryCategory::Other(_) => {}
                }
                split
            })
    }

    /// Sum of both buckets
    pub fn total(&self) -> usize {
        self.delivery + self.pickup
    }
}

/// Reservations split around the current instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSplit {
    /// At or after `now`
    pub upcoming: usize,
    /// Everything else, including reservations without a usable date
    pub past: usize,
}

impl StatusSplit {
    /// Partition reservations into upcoming and past
    pub fn from_reservations<'a, I>(reservations: I, now: DateTime<Utc>, tz: &Tz) -> Self
    where
        I: IntoIterator<Item = &'a Reservation>,
    {
        reservations
            .into_iter()
            .fold(Self::default(), |mut split, reservation| {
                if is_upcoming(reservation, now, tz) {
                    split.upcoming += 1;
                } else {
                    split.past += 1;
                }
                split
            })
    }

    /// Sum of both buckets, equal to the input length
    pub fn total(&self) -> usize {
        self.upcoming + self.past
    }
}

/// Whether a reservation is at or after `now`
pub fn is_upcoming(reservation: &Reservation, now: DateTime<Utc>, tz: &Tz) -> bool {
    reservation
        .timestamp(TimestampField::ReservationDate, tz)
        .is_some_and(|instant| instant >= now)
}

/// Every figure shown by the analytics view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    /// Selection the snapshot was computed for
    pub filter: DateFilter,
    /// Reference instant
    pub computed_at: DateTime<Utc>,
    /// Orders in window
    pub total_orders: usize,
    /// Reservations in window
    pub total_reservations: usize,
    /// Orders per category
    pub order_types: CategorySplit,
    /// Reservations per status
    pub reservation_status: StatusSplit,
    /// Orders per day
    pub orders_per_day: DailyHistogram,
    /// Reservations per day
    pub reservations_per_day: DailyHistogram,
    /// Busiest order day
    pub best_order_day: Option<DailyCount>,
    /// Busiest reservation day
    pub best_reservation_day: Option<DailyCount>,
    /// Mean guests per reservation; missing party sizes count as zero
    pub average_party_size: f64,
}

impl AggregateSnapshot {
    /// Filter both collections and aggregate them
    pub fn compute(
        orders: &[Order],
        reservations: &[Reservation],
        filter: DateFilter,
        now: DateTime<Utc>,
        tz: &Tz,
    ) -> Self {
        let orders = RecordFilter::for_selection::<Order>(filter, now, *tz).apply(orders);
        let reservations =
            RecordFilter::for_selection::<Reservation>(filter, now, *tz).apply(reservations);

        let orders_per_day =
            DailyHistogram::from_records(orders.iter().copied(), Order::PRIMARY_FIELD, tz);
        let reservations_per_day = DailyHistogram::from_records(
            reservations.iter().copied(),
            Reservation::PRIMARY_FIELD,
            tz,
        );

        let guests: u64 = reservations
            .iter()
            .map(|r| u64::from(r.guests.unwrap_or(0)))
            .sum();
        let average_party_size = if reservations.is_empty() {
            0.0
        } else {
            guests as f64 / reservations.len() as f64
        };

        Self {
            filter,
            computed_at: now,
            total_orders: orders.len(),
            total_reservations: reservations.len(),
            order_types: CategorySplit::from_orders(orders.iter().copied()),
            reservation_status: StatusSplit::from_reservations(
                reservations.iter().copied(),
                now,
                tz,
            ),
            best_order_day: orders_per_day.best_day(),
            best_reservation_day: reservations_per_day.best_day(),
            orders_per_day,
            reservations_per_day,
            average_party_size,
        }
    }

    /// Share of delivery orders
    pub fn delivery_percentage(&self) -> u32 {
        percentage(self.order_types.delivery, self.total_orders)
    }

    /// Share of pickup-like orders
    pub fn pickup_percentage(&self) -> u32 {
        percentage(self.order_types.pickup, self.total_orders)
    }

    /// Share of upcoming reservations
    pub fn upcoming_percentage(&self) -> u32 {
        percentage(self.reservation_status.upcoming, self.total_reservations)
    }
}

/// Outstanding work shown next to each menu entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCounts {
    /// Undelivered pickup-like orders in window
    pub pickup: usize,
    /// Undelivered delivery orders in window
    pub delivery: usize,
    /// Upcoming reservations in window
    pub upcoming_reservations: usize,
}

impl PendingCounts {
    /// Count outstanding orders and reservations within a selection
    pub fn compute(
        orders: &[Order],
        reservations: &[Reservation],
        filter: DateFilter,
        now: DateTime<Utc>,
        tz: &Tz,
    ) -> Self {
        let in_window = RecordFilter::for_selection::<Order>(filter, now, *tz).apply(orders);
        let pending = |category: CategoryFilter| {
            category
                .apply(in_window.iter().copied())
                .into_iter()
                .filter(|o| !o.is_delivered)
                .count()
        };

        let upcoming_reservations = RecordFilter::for_selection::<Reservation>(filter, now, *tz)
            .apply(reservations)
            .into_iter()
            .filter(|r| is_upcoming(r, now, tz))
            .count();

        Self {
            pickup: pending(CategoryFilter::pickup()),
            delivery: pending(CategoryFilter::delivery()),
            upcoming_reservations,
        }
    }
}

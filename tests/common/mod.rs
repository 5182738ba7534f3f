//! Common test utilities and helpers for dinedash tests
//!
//! Builders for orders and reservations, and a scripted [`MockApi`] that
//! stands in for the back office.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use dinedash::api::{DashboardApi, TimeEstimateRequest};
use dinedash::error::{DashboardError, Result};
use dinedash::types::{DeliveryCategory, LineItem, Order, OrderId, Reservation};
use std::sync::Mutex;
use tokio::sync::Notify;

/// Reference instant used across tests: 2024-03-15 12:00 UTC
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
}

/// Builder for test orders
pub struct OrderBuilder {
    order: Order,
}

impl OrderBuilder {
    /// Undelivered pickup order for one dish at 2024-03-15T10:00:00Z
    pub fn new() -> Self {
        Self {
            order: Order {
                id: OrderId::new("order-1"),
                dishes: vec![LineItem {
                    name: Some("Chicken Tikka".to_string()),
                    quantity: 1,
                    price: 9.5,
                }],
                order_time: Some("2024-03-15T10:00:00Z".to_string()),
                delivery_option: DeliveryCategory::Pickup,
                is_delivered: false,
                email: Some("guest@example.com".to_string()),
                name: None,
                address: None,
            },
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.order.id = OrderId::new(id);
        self
    }

    pub fn time(mut self, raw: &str) -> Self {
        self.order.order_time = Some(raw.to_string());
        self
    }

    pub fn no_time(mut self) -> Self {
        self.order.order_time = None;
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.order.delivery_option = DeliveryCategory::from(category.to_string());
        self
    }

    pub fn delivered(mut self, delivered: bool) -> Self {
        self.order.is_delivered = delivered;
        self
    }

    pub fn email(mut self, email: Option<&str>) -> Self {
        self.order.email = email.map(str::to_string);
        self
    }

    pub fn build(self) -> Order {
        self.order
    }
}

impl Default for OrderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for test reservations
pub struct ReservationBuilder {
    reservation: Reservation,
}

impl ReservationBuilder {
    /// Party of two at 2024-03-15T19:00:00Z
    pub fn new() -> Self {
        Self {
            reservation: Reservation {
                id: Some("res-1".to_string()),
                name: Some("Asha Patel".to_string()),
                email: Some("asha@example.com".to_string()),
                phone: None,
                date: Some("2024-03-15T19:00:00Z".to_string()),
                time: Some("19:00".to_string()),
                guests: Some(2),
                special_requests: None,
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.reservation.name = Some(name.to_string());
        self
    }

    pub fn date(mut self, raw: &str) -> Self {
        self.reservation.date = Some(raw.to_string());
        self
    }

    pub fn build(self) -> Reservation {
        self.reservation
    }
}

impl Default for ReservationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Scripted back office
///
/// Each endpoint returns what it was scripted with; failures are reported
/// as shape errors carrying the scripted message. Every call is recorded.
#[derive(Default)]
pub struct MockApi {
    orders: Mutex<Option<std::result::Result<Vec<Order>, String>>>,
    reservations: Mutex<Option<std::result::Result<Vec<Reservation>, String>>>,
    mark_failure: Mutex<Option<String>>,
    estimate_failure: Mutex<Option<String>>,
    calls: Mutex<Vec<String>>,
    gated: bool,
    /// Signalled when a gated fetch has started
    pub started: Notify,
    /// Releases a gated fetch
    pub release: Notify,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_orders(self, orders: Vec<Order>) -> Self {
        self.set_orders(Ok(orders));
        self
    }

    pub fn with_reservations(self, reservations: Vec<Reservation>) -> Self {
        self.set_reservations(Ok(reservations));
        self
    }

    pub fn failing_orders(self, message: &str) -> Self {
        self.set_orders(Err(message.to_string()));
        self
    }

    pub fn failing_reservations(self, message: &str) -> Self {
        self.set_reservations(Err(message.to_string()));
        self
    }

    pub fn failing_mark(self, message: &str) -> Self {
        *self.mark_failure.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn failing_estimate(self, message: &str) -> Self {
        *self.estimate_failure.lock().unwrap() = Some(message.to_string());
        self
    }

    /// Make fetches wait for [`MockApi::release`]
    pub fn gated(mut self) -> Self {
        self.gated = true;
        self
    }

    pub fn set_orders(&self, orders: std::result::Result<Vec<Order>, String>) {
        *self.orders.lock().unwrap() = Some(orders);
    }

    pub fn set_reservations(&self, reservations: std::result::Result<Vec<Reservation>, String>) {
        *self.reservations.lock().unwrap() = Some(reservations);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn scripted<T: Clone>(
        slot: &Mutex<Option<std::result::Result<Vec<T>, String>>>,
    ) -> Result<Vec<T>> {
        match slot.lock().unwrap().clone() {
            Some(Ok(items)) => Ok(items),
            Some(Err(message)) => Err(DashboardError::Shape(message)),
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl DashboardApi for MockApi {
    async fn fetch_orders(&self) -> Result<Vec<Order>> {
        self.record("fetch_orders".to_string());
        if self.gated {
            self.started.notify_one();
            self.release.notified().await;
        }
        Self::scripted(&self.orders)
    }

    async fn fetch_reservations(&self) -> Result<Vec<Reservation>> {
        self.record("fetch_reservations".to_string());
        Self::scripted(&self.reservations)
    }

    async fn mark_delivered(&self, order_id: &OrderId) -> Result<()> {
        self.record(format!("mark_delivered:{order_id}"));
        match self.mark_failure.lock().unwrap().clone() {
            Some(message) => Err(DashboardError::Mutation(message)),
            None => Ok(()),
        }
    }

    async fn send_time_estimate(&self, request: &TimeEstimateRequest) -> Result<()> {
        self.record(format!(
            "send_time_estimate:{}:{}",
            request.email, request.expected_time
        ));
        match self.estimate_failure.lock().unwrap().clone() {
            Some(message) => Err(DashboardError::Mutation(message)),
            None => Ok(()),
        }
    }
}

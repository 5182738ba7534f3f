//! Shared test utilities for unit tests
//!
//! Integration tests in the root crate keep their own copy of the builders
//! in `tests/common/mod.rs`, since `#[cfg(test)]` items are not visible to
//! other crates.

use once_cell::sync::Lazy;
use std::env;

use crate::types::{DeliveryCategory, LineItem, Order, OrderId, Reservation};

// Global mutex to serialize environment variable modifications in tests
pub static ENV_MUTEX: Lazy<tokio::sync::Mutex<()>> = Lazy::new(|| tokio::sync::Mutex::new(()));

/// RAII guard for environment variable manipulation in tests
pub struct EnvVarGuard {
    vars: Vec<(String, Option<String>)>,
}

impl EnvVarGuard {
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    /// Set an environment variable and remember its original value
    pub fn set(&mut self, key: &str, value: &str) {
        let original = env::var(key).ok();
        self.vars.push((key.to_string(), original));
        // env::set_var is unsafe since Rust 2024; callers hold ENV_MUTEX
        unsafe {
            env::set_var(key, value);
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        for (key, value) in self.vars.iter().rev() {
            unsafe {
                match value {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
        }
    }
}

impl Default for EnvVarGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for test orders
///
/// Defaults to an undelivered pickup order for one dish, placed at
/// 2024-03-15T10:00:00Z.
pub struct OrderBuilder {
    order: Order,
}

impl OrderBuilder {
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

    pub fn time(mut self, rfc3339: &str) -> Self {
        self.order.order_time = Some(rfc3339.to_string());
        self
    }

    pub fn raw_time(self, raw: &str) -> Self {
        self.time(raw)
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

    pub fn no_dishes(mut self) -> Self {
        self.order.dishes.clear();
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
    pub fn new() -> Self {
        Self {
            reservation: Reservation {
                id: Some("res-1".to_string()),
                name: Some("Asha Patel".to_string()),
                email: Some("asha@example.com".to_string()),
                phone: Some("+44 20 7946 0000".to_string()),
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

    pub fn date(mut self, rfc3339: &str) -> Self {
        self.reservation.date = Some(rfc3339.to_string());
        self
    }

    pub fn guests(mut self, guests: Option<u32>) -> Self {
        self.reservation.guests = guests;
        self
    }

    pub fn no_date(mut self) -> Self {
        self.reservation.date = None;
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

//! Output formatting for dinedash
//!
//! This module renders dashboard state in two formats:
//! - Table format for staff at a terminal (prettytable plus ASCII charts)
//! - JSON format for scripts and other tools
//!
//! # Examples
//!
//! ```no_run
//! use chrono::Utc;
//! use dinedash_core::store::{AnalyticsTab, DashboardState};
//! use dinedash_terminal::output::get_formatter;
//!
//! let state = DashboardState::new();
//! let formatter = get_formatter(false);
//! println!(
//!     "{}",
//!     formatter.format_screen(&state, Utc::now(), &chrono_tz::UTC, AnalyticsTab::Summary)
//! );
//! ```

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use colored::{Color, Colorize};
use dinedash_core::aggregation::{AggregateSnapshot, DailyCount, PendingCounts, is_upcoming};
use dinedash_core::filters::{Timestamped, TimestampField};
use dinedash_core::store::{AnalyticsTab, DashboardState, View};
use dinedash_core::types::{Order, Reservation};
use prettytable::{Cell, Row, Table, format, row};
use serde_json::{Value, json};

use crate::charts::{ChartRenderer, SplitPart};

/// Placeholder for missing values
const NOT_AVAILABLE: &str = "N/A";

/// Trait for output formatters
///
/// Each method renders one part of the dashboard. [`format_screen`] puts
/// the parts together for the current view.
///
/// [`format_screen`]: OutputFormatter::format_screen
pub trait OutputFormatter {
    /// Orders of an order view, with per-order estimate state from `state`
    fn format_orders(&self, orders: &[&Order], state: &DashboardState, tz: &Tz) -> String;

    /// Reservations, with their upcoming/past status at `now`
    fn format_reservations(
        &self,
        reservations: &[&Reservation],
        now: DateTime<Utc>,
        tz: &Tz,
    ) -> String;

    /// Headline figures, splits and peak days
    fn format_summary(&self, snapshot: &AggregateSnapshot) -> String;

    /// Orders per day and order types
    fn format_orders_analytics(&self, snapshot: &AggregateSnapshot) -> String;

    /// Reservations per day and reservation status
    fn format_reservations_analytics(&self, snapshot: &AggregateSnapshot) -> String;

    /// The whole screen for the current view
    fn format_screen(
        &self,
        state: &DashboardState,
        now: DateTime<Utc>,
        tz: &Tz,
        tab: AnalyticsTab,
    ) -> String;

    /// Outcome of a successful action
    fn format_notice(&self, message: &str) -> String;
}

/// Table formatter for terminal output
pub struct TableFormatter {
    charts: ChartRenderer,
    colored_output: bool,
}

impl TableFormatter {
    /// Size charts to the terminal and honour NO_COLOR
    pub fn new() -> Self {
        Self {
            charts: ChartRenderer::new(),
            colored_output: std::env::var("NO_COLOR").is_err(),
        }
    }

    /// Fixed chart width and colour setting
    pub fn with_options(width: usize, colored_output: bool) -> Self {
        Self {
            charts: ChartRenderer::with_width(width, colored_output),
            colored_output,
        }
    }

    fn format_currency(amount: f64) -> String {
        format!("${amount:.2}")
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.colored_output {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn or_na(value: Option<&str>) -> &str {
        value.filter(|v| !v.trim().is_empty()).unwrap_or(NOT_AVAILABLE)
    }

    fn new_table() -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table
    }

    fn stats_table(rows: &[(&str, String)]) -> String {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_CLEAN);
        for (label, value) in rows {
            table.add_row(row![b -> label, r -> value]);
        }
        table.to_string()
    }

    fn peak_day(day: Option<&DailyCount>, unit: &str) -> String {
        match day {
            Some(day) => format!("{} ({} {})", day.date, day.count, unit),
            None => format!("{NOT_AVAILABLE} (0 {unit})"),
        }
    }

    fn order_type_parts(snapshot: &AggregateSnapshot) -> [SplitPart<'static>; 2] {
        [
            SplitPart {
                label: "Delivery",
                count: snapshot.order_types.delivery,
                color: Color::Blue,
            },
            SplitPart {
                label: "Tap & Collect",
                count: snapshot.order_types.pickup,
                color: Color::Green,
            },
        ]
    }

    fn reservation_status_parts(snapshot: &AggregateSnapshot) -> [SplitPart<'static>; 2] {
        [
            SplitPart {
                label: "Upcoming",
                count: snapshot.reservation_status.upcoming,
                color: Color::Green,
            },
            SplitPart {
                label: "Past",
                count: snapshot.reservation_status.past,
                color: Color::BrightBlack,
            },
        ]
    }

    fn format_menu(&self, state: &DashboardState, counts: &PendingCounts) -> String {
        let entries = [
            (View::TapAndCollect, counts.pickup),
            (View::DeliveryOrders, counts.delivery),
            (View::Reservations, counts.upcoming_reservations),
            (View::VisualData, 0),
        ];
        let items: Vec<String> = entries
            .iter()
            .map(|(view, badge)| {
                let label = if *badge > 0 {
                    format!("{} ({})", view.label(), badge)
                } else {
                    view.label().to_string()
                };
                if *view == state.view() {
                    self.paint(&format!("> {label}"), Color::Cyan)
                } else {
                    label
                }
            })
            .collect();
        format!("Restaurant Dashboard | {}\n", items.join(" | "))
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for TableFormatter {
    fn format_orders(&self, orders: &[&Order], state: &DashboardState, tz: &Tz) -> String {
        let view = state.view();
        if orders.is_empty() {
            return format!(
                "No {} found for selected date range\n",
                view.label().to_lowercase()
            );
        }

        let show_address = view == View::DeliveryOrders;
        let mut titles = vec!["Order", "Dish", "Qty", "Price", "Order Time", "Order Date", "Email"];
        if show_address {
            titles.push("Address");
        }
        titles.extend(["Status", "Time Estimate", "Time Sent"]);

        let mut table = Self::new_table();
        table.set_titles(Row::new(
            titles.iter().map(|t| Cell::new(t).style_spec("b")).collect(),
        ));

        for order in orders {
            let placed = order
                .timestamp(TimestampField::OrderTime, tz)
                .map(|t| t.with_timezone(tz));
            let (time, date) = match placed {
                Some(t) => (t.format("%H:%M").to_string(), t.format("%Y-%m-%d").to_string()),
                None => (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()),
            };
            let status = if order.is_delivered {
                self.paint("Delivered", Color::Green)
            } else {
                self.paint("Pending", Color::Yellow)
            };
            let sent = state.sent_estimate(&order.id);
            let estimate = match sent {
                Some(sent) => sent.minutes.to_string(),
                None => state.estimate_choice(&order.id).to_string(),
            };
            let sent = sent.map_or_else(|| "-".to_string(), |s| s.describe(tz));

            for (index, item) in order.dishes.iter().enumerate() {
                let mut cells = vec![
                    Cell::new(if index == 0 { order.id.as_str() } else { "" }),
                    Cell::new(Self::or_na(item.name.as_deref())),
                    Cell::new(&item.quantity.to_string()).style_spec("r"),
                    Cell::new(&Self::format_currency(item.unit_price())).style_spec("r"),
                ];
                if index == 0 {
                    cells.push(Cell::new(&time));
                    cells.push(Cell::new(&date));
                    cells.push(Cell::new(Self::or_na(order.email.as_deref())));
                    if show_address {
                        cells.push(Cell::new(&format!(
                            "{}, {}",
                            Self::or_na(order.name.as_deref()),
                            Self::or_na(order.address.as_deref())
                        )));
                    }
                    cells.push(Cell::new(&status));
                    cells.push(Cell::new(&estimate));
                    cells.push(Cell::new(&sent));
                } else {
                    cells.resize(titles.len(), Cell::new(""));
                }
                table.add_row(Row::new(cells));
            }
        }

        table.to_string()
    }

    fn format_reservations(
        &self,
        reservations: &[&Reservation],
        now: DateTime<Utc>,
        tz: &Tz,
    ) -> String {
        if reservations.is_empty() {
            return "No reservations found for selected date range\n".to_string();
        }

        let mut table = Self::new_table();
        table.set_titles(row![
            b -> "Name",
            b -> "Email",
            b -> "Phone",
            b -> "Date",
            b -> "Time",
            b -> "Guests",
            b -> "Special Requests",
            b -> "Status"
        ]);

        for reservation in reservations {
            let date = reservation
                .timestamp(TimestampField::ReservationDate, tz)
                .map_or_else(
                    || NOT_AVAILABLE.to_string(),
                    |t| t.with_timezone(tz).format("%Y-%m-%d").to_string(),
                );
            let guests = reservation
                .guests
                .filter(|g| *g > 0)
                .map_or_else(|| NOT_AVAILABLE.to_string(), |g| g.to_string());
            let requests = reservation
                .special_requests
                .as_deref()
                .filter(|r| !r.trim().is_empty())
                .unwrap_or("None");
            let status = if is_upcoming(reservation, now, tz) {
                self.paint("Upcoming", Color::Green)
            } else {
                self.paint("Past", Color::BrightBlack)
            };

            table.add_row(row![
                Self::or_na(reservation.name.as_deref()),
                Self::or_na(reservation.email.as_deref()),
                Self::or_na(reservation.phone.as_deref()),
                date,
                Self::or_na(reservation.time.as_deref()),
                r -> guests,
                requests,
                status
            ]);
        }

        table.to_string()
    }

    fn format_summary(&self, snapshot: &AggregateSnapshot) -> String {
        let mut output = Self::stats_table(&[
            ("Total Orders", snapshot.total_orders.to_string()),
            ("Total Reservations", snapshot.total_reservations.to_string()),
            (
                "Delivery Orders",
                format!(
                    "{} ({}%)",
                    snapshot.order_types.delivery,
                    snapshot.delivery_percentage()
                ),
            ),
            (
                "Tap & Collect",
                format!(
                    "{} ({}%)",
                    snapshot.order_types.pickup,
                    snapshot.pickup_percentage()
                ),
            ),
        ]);
        output.push('\n');
        output.push_str(
            &self
                .charts
                .split("Order Types Distribution", &Self::order_type_parts(snapshot)),
        );
        output.push_str(
            &self
                .charts
                .split("Reservation Status", &Self::reservation_status_parts(snapshot)),
        );
        output.push_str("\nKey Insights\n");
        output.push_str(&Self::stats_table(&[
            (
                "Peak Order Day",
                Self::peak_day(snapshot.best_order_day.as_ref(), "orders"),
            ),
            (
                "Peak Reservation Day",
                Self::peak_day(snapshot.best_reservation_day.as_ref(), "reservations"),
            ),
            (
                "Upcoming Reservations",
                format!(
                    "{} ({}% of total)",
                    snapshot.reservation_status.upcoming,
                    snapshot.upcoming_percentage()
                ),
            ),
        ]));
        output
    }

    fn format_orders_analytics(&self, snapshot: &AggregateSnapshot) -> String {
        let mut output =
            self.charts
                .histogram("Orders Over Time", &snapshot.orders_per_day, "orders");
        output.push_str(
            &self
                .charts
                .split("Order Types", &Self::order_type_parts(snapshot)),
        );
        output.push_str(&Self::stats_table(&[
            ("Total Orders", snapshot.total_orders.to_string()),
            (
                "Delivery Orders",
                format!(
                    "{} ({}%)",
                    snapshot.order_types.delivery,
                    snapshot.delivery_percentage()
                ),
            ),
            (
                "Tap & Collect",
                format!(
                    "{} ({}%)",
                    snapshot.order_types.pickup,
                    snapshot.pickup_percentage()
                ),
            ),
        ]));
        output
    }

    fn format_reservations_analytics(&self, snapshot: &AggregateSnapshot) -> String {
        let mut output = self.charts.histogram(
            "Reservations Over Time",
            &snapshot.reservations_per_day,
            "reservations",
        );
        output.push_str(
            &self
                .charts
                .split("Reservation Status", &Self::reservation_status_parts(snapshot)),
        );
        output.push_str(&Self::stats_table(&[
            ("Total Reservations", snapshot.total_reservations.to_string()),
            (
                "Upcoming",
                format!(
                    "{} ({}%)",
                    snapshot.reservation_status.upcoming,
                    snapshot.upcoming_percentage()
                ),
            ),
            (
                "Average Party Size",
                format!("{:.1}", snapshot.average_party_size),
            ),
        ]));
        output
    }

    fn format_screen(
        &self,
        state: &DashboardState,
        now: DateTime<Utc>,
        tz: &Tz,
        tab: AnalyticsTab,
    ) -> String {
        let mut output = self.format_menu(state, &state.pending_counts(now, tz));
        let filter = match state.view() {
            View::VisualData => state.analytics_filter(),
            _ => state.table_filter(),
        };
        output.push_str(&format!(
            "{} | {} | updated {}\n\n",
            state.view(),
            filter.label(),
            now.with_timezone(tz).format("%H:%M:%S")
        ));

        if state.is_loading() {
            output.push_str("Loading data...\n");
            return output;
        }
        if let Some(error) = state.error() {
            output.push_str(&self.paint(&format!("Error: {error}"), Color::Red));
            output.push('\n');
            return output;
        }

        let body = match state.view() {
            View::TapAndCollect | View::DeliveryOrders => {
                self.format_orders(&state.visible_orders(now, tz), state, tz)
            }
            View::Reservations => {
                self.format_reservations(&state.visible_reservations(now, tz), now, tz)
            }
            View::VisualData => {
                let snapshot = state.snapshot(now, tz);
                match tab {
                    AnalyticsTab::Summary => self.format_summary(&snapshot),
                    AnalyticsTab::Orders => self.format_orders_analytics(&snapshot),
                    AnalyticsTab::Reservations => self.format_reservations_analytics(&snapshot),
                }
            }
        };
        output.push_str(&body);
        output
    }

    fn format_notice(&self, message: &str) -> String {
        self.paint(message, Color::Green)
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    fn order_json(order: &Order, state: &DashboardState, tz: &Tz) -> Value {
        let placed = order.timestamp(TimestampField::OrderTime, tz);
        json!({
            "id": order.id,
            "dishes": order.dishes.iter().map(|item| json!({
                "name": item.name,
                "quantity": item.quantity,
                "price": item.unit_price(),
                "subtotal": item.subtotal(),
            })).collect::<Vec<_>>(),
            "total": order.total_price(),
            "order_time": placed.map(|t| t.with_timezone(tz).to_rfc3339()),
            "delivery_option": order.delivery_option.as_str(),
            "is_delivered": order.is_delivered,
            "email": order.email,
            "name": order.name,
            "address": order.address,
            "estimate_minutes": state.estimate_choice(&order.id).minutes(),
            "estimate_sent": state.sent_estimate(&order.id).map(|s| s.describe(tz)),
        })
    }

    fn reservation_json(reservation: &Reservation, now: DateTime<Utc>, tz: &Tz) -> Value {
        let date = reservation.timestamp(TimestampField::ReservationDate, tz);
        json!({
            "id": reservation.id,
            "name": reservation.name,
            "email": reservation.email,
            "phone": reservation.phone,
            "date": date.map(|t| t.with_timezone(tz).to_rfc3339()),
            "time": reservation.time,
            "guests": reservation.guests,
            "special_requests": reservation.special_requests,
            "upcoming": is_upcoming(reservation, now, tz),
        })
    }

    fn day_json(day: Option<&DailyCount>) -> Value {
        day.map_or(Value::Null, |d| {
            json!({"date": d.date.to_string(), "count": d.count})
        })
    }

    fn summary_json(snapshot: &AggregateSnapshot) -> Value {
        json!({
            "filter": snapshot.filter.key(),
            "total_orders": snapshot.total_orders,
            "total_reservations": snapshot.total_reservations,
            "order_types": {
                "delivery": snapshot.order_types.delivery,
                "pickup": snapshot.order_types.pickup,
                "delivery_percentage": snapshot.delivery_percentage(),
                "pickup_percentage": snapshot.pickup_percentage(),
            },
            "reservation_status": {
                "upcoming": snapshot.reservation_status.upcoming,
                "past": snapshot.reservation_status.past,
                "upcoming_percentage": snapshot.upcoming_percentage(),
            },
            "best_order_day": Self::day_json(snapshot.best_order_day.as_ref()),
            "best_reservation_day": Self::day_json(snapshot.best_reservation_day.as_ref()),
        })
    }

    fn histogram_json(days: &[DailyCount]) -> Value {
        json!(
            days.iter()
                .map(|d| json!({"date": d.date.to_string(), "count": d.count}))
                .collect::<Vec<_>>()
        )
    }

    fn pretty(value: &Value) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_orders(&self, orders: &[&Order], state: &DashboardState, tz: &Tz) -> String {
        let output = json!({
            "view": state.view(),
            "orders": orders.iter().map(|o| Self::order_json(o, state, tz)).collect::<Vec<_>>(),
        });
        Self::pretty(&output)
    }

    fn format_reservations(
        &self,
        reservations: &[&Reservation],
        now: DateTime<Utc>,
        tz: &Tz,
    ) -> String {
        let output = json!({
            "reservations": reservations
                .iter()
                .map(|r| Self::reservation_json(r, now, tz))
                .collect::<Vec<_>>(),
        });
        Self::pretty(&output)
    }

    fn format_summary(&self, snapshot: &AggregateSnapshot) -> String {
        Self::pretty(&Self::summary_json(snapshot))
    }

    fn format_orders_analytics(&self, snapshot: &AggregateSnapshot) -> String {
        let output = json!({
            "filter": snapshot.filter.key(),
            "total_orders": snapshot.total_orders,
            "orders_per_day": Self::histogram_json(&snapshot.orders_per_day.sorted()),
            "undated_orders": snapshot.orders_per_day.unbucketed,
            "order_types": {
                "delivery": snapshot.order_types.delivery,
                "pickup": snapshot.order_types.pickup,
            },
        });
        Self::pretty(&output)
    }

    fn format_reservations_analytics(&self, snapshot: &AggregateSnapshot) -> String {
        let output = json!({
            "filter": snapshot.filter.key(),
            "total_reservations": snapshot.total_reservations,
            "reservations_per_day": Self::histogram_json(&snapshot.reservations_per_day.sorted()),
            "undated_reservations": snapshot.reservations_per_day.unbucketed,
            "reservation_status": {
                "upcoming": snapshot.reservation_status.upcoming,
                "past": snapshot.reservation_status.past,
            },
            "average_party_size": snapshot.average_party_size,
        });
        Self::pretty(&output)
    }

    fn format_screen(
        &self,
        state: &DashboardState,
        now: DateTime<Utc>,
        tz: &Tz,
        tab: AnalyticsTab,
    ) -> String {
        let counts = state.pending_counts(now, tz);
        let mut output = json!({
            "view": state.view(),
            "table_filter": state.table_filter().key(),
            "analytics_filter": state.analytics_filter().key(),
            "generated_at": now.with_timezone(tz).to_rfc3339(),
            "loading": state.is_loading(),
            "error": state.error(),
            "pending": {
                "pickup": counts.pickup,
                "delivery": counts.delivery,
                "upcoming_reservations": counts.upcoming_reservations,
            },
        });

        let (key, body) = match state.view() {
            View::TapAndCollect | View::DeliveryOrders => (
                "orders",
                json!(
                    state
                        .visible_orders(now, tz)
                        .iter()
                        .map(|o| Self::order_json(o, state, tz))
                        .collect::<Vec<_>>()
                ),
            ),
            View::Reservations => (
                "reservations",
                json!(
                    state
                        .visible_reservations(now, tz)
                        .iter()
                        .map(|r| Self::reservation_json(r, now, tz))
                        .collect::<Vec<_>>()
                ),
            ),
            View::VisualData => {
                let snapshot = state.snapshot(now, tz);
                let mut analytics = Self::summary_json(&snapshot);
                analytics["tab"] = json!(tab.key());
                analytics["orders_per_day"] =
                    Self::histogram_json(&snapshot.orders_per_day.sorted());
                analytics["reservations_per_day"] =
                    Self::histogram_json(&snapshot.reservations_per_day.sorted());
                analytics["average_party_size"] = json!(snapshot.average_party_size);
                ("analytics", analytics)
            }
        };
        output[key] = body;
        Self::pretty(&output)
    }

    fn format_notice(&self, message: &str) -> String {
        Self::pretty(&json!({"status": "ok", "message": message}))
    }
}

/// Pick a formatter
pub fn get_formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(TableFormatter::new())
    }
}

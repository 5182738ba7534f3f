//! Dashboard state container
//!
//! [`DashboardState`] is the single owner of the loaded collections, the
//! active view and filters, and the error/loading flags. It changes only
//! through [`DashboardState::apply`], and every derived view (visible rows,
//! analytics snapshot, menu badges) is computed from it on request.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::aggregation::{AggregateSnapshot, PendingCounts};
use crate::error::{DashboardError, Result};
use crate::filters::{CategoryFilter, RecordFilter, Timestamped};
use crate::types::{EstimateMinutes, Order, OrderId, Reservation};
use crate::window::DateFilter;

/// Screens of the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    /// Orders collected at the counter
    #[default]
    TapAndCollect,
    /// Orders delivered to an address
    DeliveryOrders,
    /// Table reservations
    Reservations,
    /// Charts and summary figures
    VisualData,
}

impl View {
    /// Menu label
    pub fn label(&self) -> &'static str {
        match self {
            View::TapAndCollect => "Tap & Collect",
            View::DeliveryOrders => "Delivery Orders",
            View::Reservations => "Reservations",
            View::VisualData => "Visual Data",
        }
    }

    /// Category stage for order views
    pub fn category_filter(&self) -> Option<CategoryFilter> {
        match self {
            View::TapAndCollect => Some(CategoryFilter::pickup()),
            View::DeliveryOrders => Some(CategoryFilter::delivery()),
            View::Reservations | View::VisualData => None,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Tabs of the analytics view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyticsTab {
    /// Headline figures and peak days
    #[default]
    Summary,
    /// Orders per day and order types
    Orders,
    /// Reservations per day and reservation status
    Reservations,
}

impl AnalyticsTab {
    /// Every tab, in menu order
    pub const ALL: [AnalyticsTab; 3] = [
        AnalyticsTab::Summary,
        AnalyticsTab::Orders,
        AnalyticsTab::Reservations,
    ];

    /// Command-line key
    pub fn key(&self) -> &'static str {
        match self {
            AnalyticsTab::Summary => "summary",
            AnalyticsTab::Orders => "orders",
            AnalyticsTab::Reservations => "reservations",
        }
    }
}

impl FromStr for AnalyticsTab {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        AnalyticsTab::ALL
            .into_iter()
            .find(|tab| tab.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                DashboardError::InvalidArgument(format!(
                    "Unknown analytics tab '{s}', expected summary, orders or reservations"
                ))
            })
    }
}

impl fmt::Display for AnalyticsTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Which filter a [`Action::SetFilter`] targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterScope {
    /// Order and reservation tables
    Tables,
    /// Analytics view
    Analytics,
}

/// Discrete state transitions
#[derive(Debug, Clone)]
pub enum Action {
    /// A refresh cycle succeeded: replace both collections, clear the error
    SetCollections {
        /// Fresh orders
        orders: Vec<Order>,
        /// Fresh reservations
        reservations: Vec<Reservation>,
    },
    /// A refresh cycle failed: empty both collections, show the message
    FetchFailed(String),
    /// A mutation failed: show the message, keep the collections
    SetError(String),
    /// Change the table or analytics date filter
    SetFilter(FilterScope, DateFilter),
    /// Switch screens
    SetView(View),
    /// An order was marked delivered on the server
    PatchOrderDelivered(OrderId),
    /// Staff picked an estimate for an order
    SelectEstimate(OrderId, EstimateMinutes),
    /// An estimate was sent for an order
    RecordEstimateSent {
        /// Order the estimate was sent for
        order_id: OrderId,
        /// Minutes sent
        minutes: EstimateMinutes,
        /// When it was sent
        sent_at: DateTime<Utc>,
    },
}

/// Record of a sent preparation-time estimate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentEstimate {
    /// Minutes sent
    pub minutes: EstimateMinutes,
    /// When it was sent
    pub sent_at: DateTime<Utc>,
}

impl SentEstimate {
    /// Status line, e.g. "20 minutes sent at 18:42:05"
    pub fn describe(&self, tz: &Tz) -> String {
        format!(
            "{} sent at {}",
            self.minutes,
            self.sent_at.with_timezone(tz).format("%H:%M:%S")
        )
    }
}

/// Everything the dashboard knows
#[derive(Debug, Clone)]
pub struct DashboardState {
    orders: Vec<Order>,
    reservations: Vec<Reservation>,
    error: Option<String>,
    loading: bool,
    view: View,
    table_filter: DateFilter,
    analytics_filter: DateFilter,
    estimate_choices: HashMap<OrderId, EstimateMinutes>,
    sent_estimates: HashMap<OrderId, SentEstimate>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            orders: Vec::new(),
            reservations: Vec::new(),
            error: None,
            loading: true,
            view: View::default(),
            table_filter: DateFilter::All,
            analytics_filter: DateFilter::ANALYTICS_DEFAULT,
            estimate_choices: HashMap::new(),
            sent_estimates: HashMap::new(),
        }
    }
}

impl DashboardState {
    /// Fresh state: nothing loaded yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Start on a given screen with a given filter for it
    pub fn with_view(mut self, view: View, filter: Option<DateFilter>) -> Self {
        self.view = view;
        if let Some(filter) = filter {
            match view {
                View::VisualData => self.analytics_filter = filter,
                _ => self.table_filter = filter,
            }
        }
        self
    }

    /// Apply a state transition
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::SetCollections {
                orders,
                reservations,
            } => {
                debug!(
                    orders = orders.len(),
                    reservations = reservations.len(),
                    "Replacing collections"
                );
                self.orders = orders;
                self.reservations = reservations;
                self.error = None;
                self.loading = false;
            }
            Action::FetchFailed(message) => {
                self.orders.clear();
                self.reservations.clear();
                self.error = Some(message);
                self.loading = false;
            }
            Action::SetError(message) => {
                self.error = Some(message);
            }
            Action::SetFilter(FilterScope::Tables, filter) => self.table_filter = filter,
            Action::SetFilter(FilterScope::Analytics, filter) => self.analytics_filter = filter,
            Action::SetView(view) => self.view = view,
            Action::PatchOrderDelivered(order_id) => {
                for order in self.orders.iter_mut().filter(|o| o.id == order_id) {
                    order.is_delivered = true;
                }
            }
            Action::SelectEstimate(order_id, minutes) => {
                self.estimate_choices.insert(order_id, minutes);
            }
            Action::RecordEstimateSent {
                order_id,
                minutes,
                sent_at,
            } => {
                self.sent_estimates
                    .insert(order_id, SentEstimate { minutes, sent_at });
            }
        }
    }

    /// All loaded orders, newest first
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// All loaded reservations, newest first
    pub fn reservations(&self) -> &[Reservation] {
        &self.reservations
    }

    /// Look up a loaded order
    pub fn order(&self, id: &OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| &o.id == id)
    }

    /// Current error banner
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether no cycle has completed yet
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Current screen
    pub fn view(&self) -> View {
        self.view
    }

    /// Date filter of the table views
    pub fn table_filter(&self) -> DateFilter {
        self.table_filter
    }

    /// Date filter of the analytics view
    pub fn analytics_filter(&self) -> DateFilter {
        self.analytics_filter
    }

    /// Estimate currently selected for an order (10 minutes unless changed)
    pub fn estimate_choice(&self, id: &OrderId) -> EstimateMinutes {
        self.estimate_choices.get(id).copied().unwrap_or_default()
    }

    /// Estimate already sent for an order, if any
    pub fn sent_estimate(&self, id: &OrderId) -> Option<&SentEstimate> {
        self.sent_estimates.get(id)
    }

    /// Orders shown by the current order view: table filter then category
    ///
    /// Returns every in-window order when the current view is not an order view.
    pub fn visible_orders(&self, now: DateTime<Utc>, tz: &Tz) -> Vec<&Order> {
        let in_window =
            RecordFilter::for_selection::<Order>(self.table_filter, now, *tz).apply(&self.orders);
        let in_view = match self.view.category_filter() {
            Some(category) => category.apply(in_window),
            None => in_window,
        };
        in_view.into_iter().filter(|o| o.is_renderable()).collect()
    }

    /// Reservations shown by the reservations view
    pub fn visible_reservations(&self, now: DateTime<Utc>, tz: &Tz) -> Vec<&Reservation> {
        RecordFilter::for_selection::<Reservation>(self.table_filter, now, *tz)
            .apply(&self.reservations)
    }

    /// Analytics figures for the analytics filter
    pub fn snapshot(&self, now: DateTime<Utc>, tz: &Tz) -> AggregateSnapshot {
        AggregateSnapshot::compute(
            &self.orders,
            &self.reservations,
            self.analytics_filter,
            now,
            tz,
        )
    }

    /// Menu badges for the table filter
    pub fn pending_counts(&self, now: DateTime<Utc>, tz: &Tz) -> PendingCounts {
        PendingCounts::compute(&self.orders, &self.reservations, self.table_filter, now, tz)
    }
}

/// Sort records newest first by their primary timestamp
///
/// Records without a parsable timestamp sort after all dated ones, keeping
/// their relative order.
pub fn sort_newest_first<T: Timestamped>(records: &mut [T], tz: &Tz) {
    records.sort_by_cached_key(|r| std::cmp::Reverse(r.timestamp(T::PRIMARY_FIELD, tz)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{OrderBuilder, ReservationBuilder};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    fn loaded() -> DashboardState {
        let mut state = DashboardState::new();
        state.apply(Action::SetCollections {
            orders: vec![
                OrderBuilder::new().id("d1").category("delivery").build(),
                OrderBuilder::new().id("p1").category("pickup").build(),
                OrderBuilder::new().id("p2").category("tapAndCollect").no_dishes().build(),
            ],
            reservations: vec![ReservationBuilder::new().date("2024-03-16T19:00:00Z").build()],
        });
        state
    }

    #[test]
    fn test_new_state_is_loading_with_default_filters() {
        let state = DashboardState::new();
        assert!(state.is_loading());
        assert_eq!(state.table_filter(), DateFilter::All);
        assert_eq!(state.analytics_filter(), DateFilter::Last15Days);
        assert_eq!(state.view(), View::TapAndCollect);
    }

    #[test]
    fn test_set_collections_clears_error_and_loading() {
        let mut state = DashboardState::new();
        state.apply(Action::SetError("boom".into()));
        state.apply(Action::SetCollections {
            orders: vec![OrderBuilder::new().build()],
            reservations: vec![],
        });
        assert!(state.error().is_none());
        assert!(!state.is_loading());
        assert_eq!(state.orders().len(), 1);
    }

    #[test]
    fn test_fetch_failed_empties_everything() {
        let mut state = loaded();
        state.apply(Action::FetchFailed("Error fetching reservations: Bad Gateway".into()));
        assert!(state.orders().is_empty());
        assert!(state.reservations().is_empty());
        assert_eq!(state.error(), Some("Error fetching reservations: Bad Gateway"));
    }

    #[test]
    fn test_set_error_keeps_collections() {
        let mut state = loaded();
        state.apply(Action::SetError("Failed to send time estimate".into()));
        assert_eq!(state.orders().len(), 3);
        assert!(state.error().is_some());
    }

    #[test]
    fn test_patch_delivered_touches_only_target() {
        let mut state = loaded();
        state.apply(Action::PatchOrderDelivered(OrderId::new("d1")));
        assert!(state.order(&OrderId::new("d1")).unwrap().is_delivered);
        assert!(!state.order(&OrderId::new("p1")).unwrap().is_delivered);
    }

    #[test]
    fn test_visible_orders_follow_view_and_skip_unrenderable() {
        let mut state = loaded();
        let pickups: Vec<_> = state
            .visible_orders(now(), &chrono_tz::UTC)
            .iter()
            .map(|o| o.id.as_str().to_string())
            .collect();
        assert_eq!(pickups, vec!["p1"]);

        state.apply(Action::SetView(View::DeliveryOrders));
        let deliveries = state.visible_orders(now(), &chrono_tz::UTC);
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].id.as_str(), "d1");
    }

    #[test]
    fn test_filters_are_scoped() {
        let mut state = loaded();
        state.apply(Action::SetFilter(FilterScope::Analytics, DateFilter::Today));
        assert_eq!(state.table_filter(), DateFilter::All);
        assert_eq!(state.snapshot(now(), &chrono_tz::UTC).filter, DateFilter::Today);
    }

    #[test]
    fn test_estimates_default_and_record() {
        let mut state = loaded();
        let id = OrderId::new("p1");
        assert_eq!(state.estimate_choice(&id).minutes(), 10);

        let twenty = EstimateMinutes::new(20).unwrap();
        state.apply(Action::SelectEstimate(id.clone(), twenty));
        assert_eq!(state.estimate_choice(&id), twenty);

        state.apply(Action::RecordEstimateSent {
            order_id: id.clone(),
            minutes: twenty,
            sent_at: Utc.with_ymd_and_hms(2024, 3, 15, 18, 42, 5).unwrap(),
        });
        assert_eq!(
            state.sent_estimate(&id).unwrap().describe(&chrono_tz::UTC),
            "20 minutes sent at 18:42:05"
        );
    }

    #[test]
    fn test_with_view_routes_filter() {
        let state = DashboardState::new().with_view(View::VisualData, Some(DateFilter::Today));
        assert_eq!(state.analytics_filter(), DateFilter::Today);
        assert_eq!(state.table_filter(), DateFilter::All);
    }

    #[test]
    fn test_sort_newest_first_puts_undated_last() {
        let mut orders = vec![
            OrderBuilder::new().id("old").time("2024-03-01T00:00:00Z").build(),
            OrderBuilder::new().id("none").no_time().build(),
            OrderBuilder::new().id("new").time("2024-03-14T00:00:00Z").build(),
        ];
        sort_newest_first(&mut orders, &chrono_tz::UTC);
        let ids: Vec<_> = orders.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "none"]);
    }

    #[test]
    fn test_analytics_tab_parse() {
        assert_eq!("Orders".parse::<AnalyticsTab>().unwrap(), AnalyticsTab::Orders);
        assert_eq!(" summary ".parse::<AnalyticsTab>().unwrap(), AnalyticsTab::Summary);
        assert!(matches!(
            "charts".parse::<AnalyticsTab>(),
            Err(DashboardError::InvalidArgument(_))
        ));
    }
}

//! Refresh loop and staff actions
//!
//! [`RefreshLoop`] pulls both collections from the back office and replaces
//! them in the shared [`DashboardStore`] as one unit. It also carries the two
//! write actions, which patch the store locally on success so the screen
//! reflects them before the next cycle.
//!
//! A cycle remembers the epoch it started in. [`RefreshLoop::deactivate`]
//! and [`RefreshLoop::activate`] both advance the epoch, so a response that
//! lands after either is dropped instead of overwriting newer state.

use chrono::Utc;
use chrono_tz::Tz;
use dinedash_api::{DashboardApi, TimeEstimateRequest};
use dinedash_core::error::{DashboardError, Result};
use dinedash_core::store::{Action, DashboardState, SentEstimate, sort_newest_first};
use dinedash_core::types::{EstimateMinutes, OrderId};
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Default time between cycles
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Dashboard state shared between the loop, the actions and the renderer
pub type DashboardStore = Arc<RwLock<DashboardState>>;

/// Wrap a state in a shareable store
pub fn new_store(state: DashboardState) -> DashboardStore {
    Arc::new(RwLock::new(state))
}

/// What a cycle did to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Both collections were replaced
    Refreshed {
        /// Orders loaded
        orders: usize,
        /// Reservations loaded
        reservations: usize,
    },
    /// A fetch failed; the collections were emptied and the message stored
    Failed(String),
    /// The loop was inactive or its epoch moved on; the store was not touched
    Discarded,
}

/// Periodic fetch of orders and reservations
pub struct RefreshLoop<A: DashboardApi> {
    api: Arc<A>,
    store: DashboardStore,
    tz: Tz,
    epoch: AtomicU64,
    active: AtomicBool,
}

impl<A: DashboardApi> RefreshLoop<A> {
    /// Create an inactive loop
    pub fn new(api: Arc<A>, store: DashboardStore, tz: Tz) -> Self {
        Self {
            api,
            store,
            tz,
            epoch: AtomicU64::new(0),
            active: AtomicBool::new(false),
        }
    }

    /// Shared store
    pub fn store(&self) -> &DashboardStore {
        &self.store
    }

    /// Start a new epoch; returns it
    pub fn activate(&self) -> u64 {
        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        self.active.store(true, Ordering::Release);
        debug!(epoch, "Refresh loop activated");
        epoch
    }

    /// Stop accepting cycle results
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(epoch, "Refresh loop deactivated");
    }

    /// Whether cycle results are currently accepted
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Current epoch
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.is_active() && self.epoch() == epoch
    }

    /// Fetch both collections and apply the result
    ///
    /// Both reads run concurrently and both must finish before the store is
    /// touched. Either failing empties both collections.
    pub async fn run_cycle(&self) -> CycleOutcome {
        if !self.is_active() {
            return CycleOutcome::Discarded;
        }
        let epoch = self.epoch();
        debug!(epoch, "Starting refresh cycle");

        let (orders, reservations) =
            futures::join!(self.api.fetch_orders(), self.api.fetch_reservations());

        let (action, outcome) = match (orders, reservations) {
            (Ok(mut orders), Ok(mut reservations)) => {
                sort_newest_first(&mut orders, &self.tz);
                sort_newest_first(&mut reservations, &self.tz);
                let outcome = CycleOutcome::Refreshed {
                    orders: orders.len(),
                    reservations: reservations.len(),
                };
                (
                    Action::SetCollections {
                        orders,
                        reservations,
                    },
                    outcome,
                )
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!("Refresh failed: {}", e);
                let message = e.to_string();
                (
                    Action::FetchFailed(message.clone()),
                    CycleOutcome::Failed(message),
                )
            }
        };

        let mut state = self.store.write().await;
        if !self.is_current(epoch) {
            debug!(epoch, "Discarding late refresh result");
            return CycleOutcome::Discarded;
        }
        state.apply(action);
        debug!(?outcome, "Refresh cycle applied");
        outcome
    }

    /// Mark an order delivered on the server, then locally
    pub async fn mark_delivered(&self, order_id: &OrderId) -> Result<()> {
        info!("Marking order {} as delivered", order_id);
        match self.api.mark_delivered(order_id).await {
            Ok(()) => {
                self.store
                    .write()
                    .await
                    .apply(Action::PatchOrderDelivered(order_id.clone()));
                Ok(())
            }
            Err(e) => {
                warn!("Failed to mark order {} as delivered: {}", order_id, e);
                self.store.write().await.apply(Action::SetError(e.to_string()));
                Err(e)
            }
        }
    }

    /// Email a preparation-time estimate for a loaded order
    ///
    /// `minutes` replaces the order's current selection; without it the
    /// selection (10 minutes unless changed) is sent. Each order gets at
    /// most one estimate.
    pub async fn send_time_estimate(
        &self,
        order_id: &OrderId,
        minutes: Option<EstimateMinutes>,
    ) -> Result<SentEstimate> {
        let (email, minutes) = {
            let mut state = self.store.write().await;
            if state.sent_estimate(order_id).is_some() {
                return Err(DashboardError::EstimateAlreadySent(order_id.clone()));
            }
            let order = state
                .order(order_id)
                .ok_or_else(|| DashboardError::OrderNotFound(order_id.clone()))?;
            let email = order
                .email
                .clone()
                .filter(|e| !e.trim().is_empty())
                .ok_or_else(|| {
                    DashboardError::InvalidArgument(format!(
                        "Order {order_id} has no email address"
                    ))
                })?;

            if let Some(minutes) = minutes {
                state.apply(Action::SelectEstimate(order_id.clone(), minutes));
            }
            (email, state.estimate_choice(order_id))
        };

        info!("Sending {} estimate for order {}", minutes, order_id);
        let request = TimeEstimateRequest {
            email,
            expected_time: minutes.expected_time(),
        };

        match self.api.send_time_estimate(&request).await {
            Ok(()) => {
                let sent = SentEstimate {
                    minutes,
                    sent_at: Utc::now(),
                };
                self.store.write().await.apply(Action::RecordEstimateSent {
                    order_id: order_id.clone(),
                    minutes: sent.minutes,
                    sent_at: sent.sent_at,
                });
                Ok(sent)
            }
            Err(e) => {
                warn!("Failed to send estimate for order {}: {}", order_id, e);
                self.store.write().await.apply(Action::SetError(e.to_string()));
                Err(e)
            }
        }
    }
}

//! HTTP client for the back-office API

use async_trait::async_trait;
use dinedash_core::error::{DashboardError, Result};
use dinedash_core::types::{Order, OrderId, Reservation};
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::schema::{
    ApiErrorBody, MarkDeliveredRequest, TimeEstimateRequest, parse_orders, parse_reservations,
};

/// Default API host
pub const DEFAULT_API_URL: &str = "https://tajmahal-server.gofastapi.com";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const ORDERS_PATH: &str = "getOrders";
const RESERVATIONS_PATH: &str = "getReservations";
const MARK_DELIVERED_PATH: &str = "markAsDelivered";
const TIME_DETAILS_PATH: &str = "timeDetails";

/// Operations the dashboard needs from the back office
///
/// The refresh loop and action handlers are written against this trait so
/// they can be driven by a scripted implementation in tests.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    /// Fetch every order
    async fn fetch_orders(&self) -> Result<Vec<Order>>;

    /// Fetch every reservation
    async fn fetch_reservations(&self) -> Result<Vec<Reservation>>;

    /// Mark an order as handed over
    async fn mark_delivered(&self, order_id: &OrderId) -> Result<()>;

    /// Email a preparation-time estimate to a customer
    async fn send_time_estimate(&self, request: &TimeEstimateRequest) -> Result<()>;
}

/// `DashboardApi` over HTTP
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    /// Create a client for an API host
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(DashboardError::Config(format!(
                "API URL must start with http:// or https://, got '{base_url}'"
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("dinedash/", env!("CARGO_PKG_VERSION")))
            .build()?;

        info!("Using back-office API at {}", base_url);
        Ok(Self { client, base_url })
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json(&self, path: &str, context: &str) -> Result<Value> {
        let url = self.url(path);
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(DashboardError::status(context, response.status()));
        }
        Ok(response.json().await?)
    }

    async fn failure_message(response: Response) -> Option<String> {
        let body = response.text().await.ok()?;
        ApiErrorBody::message_from(&body)
    }
}

#[async_trait]
impl DashboardApi for HttpApi {
    async fn fetch_orders(&self) -> Result<Vec<Order>> {
        let body = self.get_json(ORDERS_PATH, "Error fetching orders").await?;
        parse_orders(body)
    }

    async fn fetch_reservations(&self) -> Result<Vec<Reservation>> {
        let body = self
            .get_json(RESERVATIONS_PATH, "Error fetching reservations")
            .await?;
        parse_reservations(body)
    }

    async fn mark_delivered(&self, order_id: &OrderId) -> Result<()> {
        let url = self.url(MARK_DELIVERED_PATH);
        debug!("POST {} for order {}", url, order_id);
        let response = self
            .client
            .post(&url)
            .json(&MarkDeliveredRequest {
                order_id: order_id.clone(),
            })
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }
        let message = Self::failure_message(response)
            .await
            .unwrap_or_else(|| "Error marking order as delivered".to_string());
        Err(DashboardError::Mutation(message))
    }

    async fn send_time_estimate(&self, request: &TimeEstimateRequest) -> Result<()> {
        let url = self.url(TIME_DETAILS_PATH);
        debug!("POST {} ({})", url, request.expected_time);
        let response = self.client.post(&url).json(request).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(DashboardError::Mutation(
                "Failed to send time estimate".to_string(),
            ))
        }
    }
}

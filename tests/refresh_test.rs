//! Refresh loop and staff action tests against a scripted back office

mod common;

use common::{MockApi, OrderBuilder, ReservationBuilder, now};
use dinedash::error::DashboardError;
use dinedash::refresh::{CycleOutcome, RefreshLoop, new_store};
use dinedash::store::DashboardState;
use dinedash::types::{EstimateMinutes, OrderId};
use std::sync::Arc;

fn refresh_loop(api: MockApi) -> (Arc<MockApi>, RefreshLoop<MockApi>) {
    let api = Arc::new(api);
    let store = new_store(DashboardState::new());
    let refresh = RefreshLoop::new(api.clone(), store, chrono_tz::UTC);
    refresh.activate();
    (api, refresh)
}

fn loaded_api() -> MockApi {
    MockApi::new()
        .with_orders(vec![
            OrderBuilder::new().id("old").time("2024-03-10T10:00:00Z").build(),
            OrderBuilder::new().id("undated").time("soon").build(),
            OrderBuilder::new().id("new").time("2024-03-15T10:00:00Z").category("delivery").build(),
        ])
        .with_reservations(vec![
            ReservationBuilder::new().name("Early").date("2024-03-01T19:00:00Z").build(),
            ReservationBuilder::new().name("Late").date("2024-03-20T19:00:00Z").build(),
        ])
}

#[tokio::test]
async fn test_cycle_replaces_collections_newest_first() {
    let (api, refresh) = refresh_loop(loaded_api());

    let outcome = refresh.run_cycle().await;
    assert_eq!(
        outcome,
        CycleOutcome::Refreshed {
            orders: 3,
            reservations: 2
        }
    );

    let state = refresh.store().read().await;
    assert!(!state.is_loading());
    assert!(state.error().is_none());
    let ids: Vec<_> = state.orders().iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, vec!["new", "old", "undated"]);
    assert_eq!(state.reservations()[0].name.as_deref(), Some("Late"));

    assert_eq!(api.count_calls("fetch_orders"), 1);
    assert_eq!(api.count_calls("fetch_reservations"), 1);
}

#[tokio::test]
async fn test_one_failed_fetch_empties_both_collections() {
    let (api, refresh) = refresh_loop(loaded_api());
    refresh.run_cycle().await;

    api.set_reservations(Err("Error fetching reservations: Not Found".to_string()));
    let outcome = refresh.run_cycle().await;
    assert_eq!(
        outcome,
        CycleOutcome::Failed("Error fetching reservations: Not Found".to_string())
    );

    let state = refresh.store().read().await;
    assert!(state.orders().is_empty());
    assert!(state.reservations().is_empty());
    assert_eq!(state.error(), Some("Error fetching reservations: Not Found"));
    assert!(!state.is_loading());
}

#[tokio::test]
async fn test_next_successful_cycle_clears_error() {
    let (api, refresh) = refresh_loop(loaded_api().failing_orders("Invalid orders data structure received from server"));
    assert!(matches!(refresh.run_cycle().await, CycleOutcome::Failed(_)));

    api.set_orders(Ok(vec![OrderBuilder::new().build()]));
    assert!(matches!(refresh.run_cycle().await, CycleOutcome::Refreshed { .. }));

    let state = refresh.store().read().await;
    assert!(state.error().is_none());
    assert_eq!(state.orders().len(), 1);
}

#[tokio::test]
async fn test_inactive_loop_does_not_fetch() {
    let (api, refresh) = refresh_loop(loaded_api());
    refresh.deactivate();

    assert_eq!(refresh.run_cycle().await, CycleOutcome::Discarded);
    assert!(api.calls().is_empty());
    assert!(refresh.store().read().await.is_loading());
}

#[tokio::test]
async fn test_late_response_after_deactivate_is_discarded() {
    let (api, refresh) = refresh_loop(loaded_api().gated());
    let refresh = Arc::new(refresh);

    let cycle = {
        let refresh = refresh.clone();
        tokio::spawn(async move { refresh.run_cycle().await })
    };

    api.started.notified().await;
    refresh.deactivate();
    api.release.notify_one();

    assert_eq!(cycle.await.unwrap(), CycleOutcome::Discarded);
    let state = refresh.store().read().await;
    assert!(state.is_loading());
    assert!(state.orders().is_empty());
}

#[tokio::test]
async fn test_late_response_after_reactivate_is_discarded() {
    let (api, refresh) = refresh_loop(loaded_api().gated());
    let refresh = Arc::new(refresh);
    let first_epoch = refresh.epoch();

    let cycle = {
        let refresh = refresh.clone();
        tokio::spawn(async move { refresh.run_cycle().await })
    };

    api.started.notified().await;
    refresh.deactivate();
    refresh.activate();
    assert!(refresh.epoch() > first_epoch);
    api.release.notify_one();

    assert_eq!(cycle.await.unwrap(), CycleOutcome::Discarded);
    assert!(refresh.store().read().await.orders().is_empty());
}

#[tokio::test]
async fn test_mark_delivered_patches_without_refetch() {
    let (api, refresh) = refresh_loop(loaded_api());
    refresh.run_cycle().await;

    refresh.mark_delivered(&OrderId::new("old")).await.unwrap();

    let state = refresh.store().read().await;
    let delivered: Vec<_> = state
        .orders()
        .iter()
        .filter(|o| o.is_delivered)
        .map(|o| o.id.as_str())
        .collect();
    assert_eq!(delivered, vec!["old"]);
    assert_eq!(api.count_calls("fetch_orders"), 1);
    assert_eq!(api.calls().last().unwrap(), "mark_delivered:old");
}

#[tokio::test]
async fn test_mark_delivered_failure_sets_error_keeps_orders() {
    let (_api, refresh) = refresh_loop(loaded_api().failing_mark("Order not found"));
    refresh.run_cycle().await;

    let err = refresh
        .mark_delivered(&OrderId::new("old"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Order not found");

    let state = refresh.store().read().await;
    assert_eq!(state.error(), Some("Order not found"));
    assert_eq!(state.orders().len(), 3);
    assert!(state.orders().iter().all(|o| !o.is_delivered));
}

#[tokio::test]
async fn test_send_time_estimate_records_sent_status() {
    let (api, refresh) = refresh_loop(loaded_api());
    refresh.run_cycle().await;

    let id = OrderId::new("new");
    let sent = refresh
        .send_time_estimate(&id, EstimateMinutes::new(20))
        .await
        .unwrap();
    assert_eq!(sent.minutes.minutes(), 20);
    assert!(sent.sent_at >= now());

    assert_eq!(
        api.calls().last().unwrap(),
        "send_time_estimate:guest@example.com:20 minutes"
    );
    let state = refresh.store().read().await;
    assert_eq!(state.sent_estimate(&id), Some(&sent));
    assert_eq!(state.estimate_choice(&id).minutes(), 20);
}

#[tokio::test]
async fn test_send_time_estimate_defaults_to_ten_minutes() {
    let (api, refresh) = refresh_loop(loaded_api());
    refresh.run_cycle().await;

    refresh
        .send_time_estimate(&OrderId::new("old"), None)
        .await
        .unwrap();
    assert_eq!(
        api.calls().last().unwrap(),
        "send_time_estimate:guest@example.com:10 minutes"
    );
}

#[tokio::test]
async fn test_second_estimate_is_rejected_without_network_call() {
    let (api, refresh) = refresh_loop(loaded_api());
    refresh.run_cycle().await;

    let id = OrderId::new("new");
    refresh.send_time_estimate(&id, None).await.unwrap();
    let err = refresh
        .send_time_estimate(&id, EstimateMinutes::new(30))
        .await
        .unwrap_err();

    assert!(matches!(err, DashboardError::EstimateAlreadySent(ref rejected) if rejected == &id));
    assert_eq!(api.count_calls("send_time_estimate"), 1);
}

#[tokio::test]
async fn test_estimate_for_unknown_order() {
    let (api, refresh) = refresh_loop(loaded_api());
    refresh.run_cycle().await;

    let err = refresh
        .send_time_estimate(&OrderId::new("ghost"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, DashboardError::OrderNotFound(_)));
    assert_eq!(api.count_calls("send_time_estimate"), 0);
}

#[tokio::test]
async fn test_estimate_failure_sets_error_and_allows_retry() {
    let (api, refresh) = refresh_loop(
        MockApi::new()
            .with_orders(vec![OrderBuilder::new().id("o-1").build()])
            .failing_estimate("Failed to send time estimate"),
    );
    refresh.run_cycle().await;

    let id = OrderId::new("o-1");
    let err = refresh.send_time_estimate(&id, None).await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to send time estimate");

    let state = refresh.store().read().await;
    assert_eq!(state.error(), Some("Failed to send time estimate"));
    assert!(state.sent_estimate(&id).is_none());
    drop(state);
    assert_eq!(api.count_calls("send_time_estimate"), 1);
}

#[tokio::test]
async fn test_estimate_requires_email() {
    let (api, refresh) = refresh_loop(
        MockApi::new().with_orders(vec![OrderBuilder::new().id("o-1").email(None).build()]),
    );
    refresh.run_cycle().await;

    let err = refresh
        .send_time_estimate(&OrderId::new("o-1"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, DashboardError::InvalidArgument(_)));
    assert_eq!(api.count_calls("send_time_estimate"), 0);
}

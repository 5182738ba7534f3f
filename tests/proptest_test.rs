//! Property-based tests for dinedash using proptest

use chrono::{DateTime, Duration, TimeZone, Utc};
use dinedash::aggregation::{CategorySplit, DailyHistogram, StatusSplit, percentage};
use dinedash::filters::{CategoryFilter, RecordFilter, TimestampField};
use dinedash::types::{DeliveryCategory, Order, OrderId, Reservation};
use dinedash::window::{DateFilter, TimeWindow};
use proptest::prelude::*;

// Strategies for generating test data

fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 31, 18, 30, 0).unwrap()
}

prop_compose! {
    fn arb_timestamp()(
        minutes_ago in -2_000i64..80_000,
        garbled in prop::bool::weighted(0.1),
        missing in prop::bool::weighted(0.05),
    ) -> Option<String> {
        if missing {
            None
        } else if garbled {
            Some("not a date".to_string())
        } else {
            Some((reference_now() - Duration::minutes(minutes_ago)).to_rfc3339())
        }
    }
}

prop_compose! {
    fn arb_category()(
        category in prop::sample::select(vec!["delivery", "tapAndCollect", "pickup", "dineIn", ""])
    ) -> DeliveryCategory {
        DeliveryCategory::from(category.to_string())
    }
}

prop_compose! {
    fn arb_order()(
        id in 0u32..10_000,
        order_time in arb_timestamp(),
        delivery_option in arb_category(),
        is_delivered in any::<bool>(),
    ) -> Order {
        Order {
            id: OrderId::new(format!("order-{id}")),
            order_time,
            delivery_option,
            is_delivered,
            ..Default::default()
        }
    }
}

prop_compose! {
    fn arb_reservation()(date in arb_timestamp(), guests in prop::option::of(1u32..12)) -> Reservation {
        Reservation {
            date,
            guests,
            ..Default::default()
        }
    }
}

fn arb_filter() -> impl Strategy<Value = DateFilter> {
    prop::sample::select(vec![
        DateFilter::All,
        DateFilter::Today,
        DateFilter::LastDay,
        DateFilter::Last3Days,
        DateFilter::LastWeek,
        DateFilter::Last15Days,
        DateFilter::LastMonth,
    ])
}

fn arb_tz() -> impl Strategy<Value = chrono_tz::Tz> {
    prop::sample::select(vec![
        chrono_tz::UTC,
        chrono_tz::Europe::London,
        chrono_tz::America::New_York,
        chrono_tz::Asia::Kolkata,
    ])
}

fn ids(orders: &[&Order]) -> Vec<String> {
    orders.iter().map(|o| o.id.to_string()).collect()
}

/// Whether `sub` appears in `all` in the same relative order
fn is_ordered_subset(sub: &[&Order], all: &[Order]) -> bool {
    let mut rest = all.iter();
    sub.iter()
        .all(|wanted| rest.any(|candidate| std::ptr::eq(candidate, *wanted)))
}

proptest! {
    #[test]
    fn test_filter_output_is_ordered_subset(
        orders in prop::collection::vec(arb_order(), 0..60),
        filter in arb_filter(),
        tz in arb_tz(),
    ) {
        let filtered = RecordFilter::for_selection::<Order>(filter, reference_now(), tz).apply(&orders);

        prop_assert!(filtered.len() <= orders.len());
        prop_assert!(is_ordered_subset(&filtered, &orders));
        if filter == DateFilter::All {
            prop_assert_eq!(filtered.len(), orders.len());
        }
    }

    #[test]
    fn test_category_and_time_filters_commute(
        orders in prop::collection::vec(arb_order(), 0..60),
        filter in arb_filter(),
        delivery in any::<bool>(),
    ) {
        let time = RecordFilter::for_selection::<Order>(filter, reference_now(), chrono_tz::UTC);
        let category = if delivery { CategoryFilter::delivery() } else { CategoryFilter::pickup() };

        let time_first = category.apply(time.apply(&orders));
        let category_first = time.apply(category.apply(&orders));
        prop_assert_eq!(ids(&time_first), ids(&category_first));
    }

    #[test]
    fn test_histogram_sums_to_dated_records(
        orders in prop::collection::vec(arb_order(), 0..60),
        filter in arb_filter(),
        tz in arb_tz(),
    ) {
        let filtered = RecordFilter::for_selection::<Order>(filter, reference_now(), tz).apply(&orders);
        let histogram = DailyHistogram::from_records(filtered.iter().copied(), TimestampField::OrderTime, &tz);

        prop_assert_eq!(histogram.total() + histogram.unbucketed, filtered.len());
        prop_assert!(histogram.buckets().iter().all(|b| b.count > 0));
        if let Some(best) = histogram.best_day() {
            prop_assert!(histogram.buckets().iter().all(|b| b.count <= best.count));
        }
    }

    #[test]
    fn test_category_split_is_disjoint_and_bounded(
        orders in prop::collection::vec(arb_order(), 0..60),
    ) {
        let split = CategorySplit::from_orders(&orders);
        let classified = orders
            .iter()
            .filter(|o| o.delivery_option.is_delivery() || o.delivery_option.is_pickup_like())
            .count();

        prop_assert!(split.total() <= orders.len());
        prop_assert_eq!(split.total(), classified);
        prop_assert_eq!(split.total() == orders.len(), classified == orders.len());
    }

    #[test]
    fn test_status_split_is_total_partition(
        reservations in prop::collection::vec(arb_reservation(), 0..60),
        tz in arb_tz(),
    ) {
        let split = StatusSplit::from_reservations(&reservations, reference_now(), &tz);
        prop_assert_eq!(split.upcoming + split.past, reservations.len());
    }

    #[test]
    fn test_percentage_is_bounded(part in 0usize..10_000, extra in 0usize..10_000) {
        let whole = part + extra;
        let pct = percentage(part, whole);
        prop_assert!(pct <= 100);
        if whole == 0 {
            prop_assert_eq!(pct, 0);
        }
    }

    #[test]
    fn test_bounded_windows_never_start_in_the_future(filter in arb_filter(), tz in arb_tz()) {
        let now = reference_now();
        match TimeWindow::resolve(filter, now, &tz) {
            TimeWindow::Unbounded => prop_assert_eq!(filter, DateFilter::All),
            TimeWindow::Since(cutoff) => prop_assert!(cutoff <= now),
            TimeWindow::SameDay(_) => prop_assert_eq!(filter, DateFilter::Today),
        }
    }
}

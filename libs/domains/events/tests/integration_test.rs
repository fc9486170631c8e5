//! Integration tests for the PostgreSQL event store
//!
//! Each test starts its own PostgreSQL container (testcontainers), so they
//! need a Docker daemon and are ignored by default:
//!
//! ```text
//! cargo test -p domain_events --test integration_test -- --ignored
//! ```

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use domain_events::*;
use serde_json::{Map, json};
use test_utils::{TestDataBuilder, TestDatabase, assertions::*};

async fn service(db: &TestDatabase) -> EventService<PgEventRepository> {
    EventService::new(PgEventRepository::new(db.connection()))
}

async fn record(
    service: &EventService<PgEventRepository>,
    user_id: &str,
    kind: &str,
    timestamp: DateTime<Utc>,
) {
    service
        .create_event(CreateEvent::new(user_id, kind).at(timestamp))
        .await
        .unwrap();
}

fn typed(event_type: &str, count: u64) -> EventTypeCount {
    EventTypeCount {
        event_type: event_type.into(),
        count,
    }
}

fn user(user_id: &str, count: u64) -> UserCount {
    UserCount {
        user_id: user_id.into(),
        count,
    }
}

fn daily(day: u32, count: u64) -> DailyCount {
    DailyCount {
        date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
        count,
    }
}

#[tokio::test]
#[ignore = "requires Docker for the Postgres testcontainer"]
async fn test_insert_assigns_id_and_round_trips_metadata() {
    let db = TestDatabase::new().await;
    let repo = PgEventRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("insert_round_trip");

    let mut metadata = Map::new();
    metadata.insert("page".into(), json!("/pricing"));
    metadata.insert("nested".into(), json!({"a": [1, 2, 3]}));

    let first = repo
        .insert(CreateEvent::new(builder.user_id("alice"), "view").with_metadata(metadata))
        .await
        .unwrap();
    let second = repo
        .insert(CreateEvent::new(builder.user_id("alice"), "view"))
        .await
        .unwrap();

    assert!(second.id > first.id);
    assert_eq!(
        first.metadata,
        Some(json!({"page": "/pricing", "nested": {"a": [1, 2, 3]}}))
    );
    assert_eq!(second.metadata, None);

    let stored = repo.scan(EventFilter::default()).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].metadata, first.metadata);
}

#[tokio::test]
#[ignore = "requires Docker for the Postgres testcontainer"]
async fn test_scan_orders_by_id_and_paginates() {
    let db = TestDatabase::new().await;
    let repo = PgEventRepository::new(db.connection());

    for kind in ["a", "b", "c", "d", "e"] {
        repo.insert(CreateEvent::new("u1", kind)).await.unwrap();
    }
    repo.insert(CreateEvent::new("u2", "a")).await.unwrap();

    let page = repo
        .scan(EventFilter::for_user("u1").page(1, 3))
        .await
        .unwrap();
    let kinds: Vec<_> = page.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(kinds, vec!["b", "c", "d"]);
    assert!(page.windows(2).all(|w| w[0].id < w[1].id));

    let past_end = repo
        .scan(EventFilter::default().page(100, 10))
        .await
        .unwrap();
    assert!(past_end.is_empty());

    let unbounded = repo
        .scan(EventFilter::default().page(0, u64::MAX))
        .await
        .unwrap();
    assert_eq!(unbounded.len(), 6);

    let skipped_all = repo
        .scan(EventFilter::default().page(u64::MAX, u64::MAX))
        .await
        .unwrap();
    assert!(skipped_all.is_empty());

    let of_type_a = repo.scan(EventFilter::of_type("a")).await.unwrap();
    assert_eq!(of_type_a.len(), 2);
}

#[tokio::test]
#[ignore = "requires Docker for the Postgres testcontainer"]
async fn test_concurrent_inserts_never_share_an_id() {
    let db = TestDatabase::new().await;
    let repo = Arc::new(PgEventRepository::new(db.connection()));

    let handles: Vec<_> = (0..50)
        .map(|i| {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move {
                let input = CreateEvent::new(format!("user-{i}"), "click");
                repo.insert(input).await.unwrap().id
            })
        })
        .collect();

    let mut ids = BTreeSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap());
    }

    assert_eq!(ids.len(), 50);
    let first = assert_some(ids.first().copied(), "first id");
    let last = assert_some(ids.last().copied(), "last id");
    assert_eq!(last - first, 49);
}

#[tokio::test]
#[ignore = "requires Docker for the Postgres testcontainer"]
async fn test_aggregates_match_login_purchase_scenario() {
    let db = TestDatabase::new().await;
    let service = service(&db).await;

    assert_eq!(service.totals().await.unwrap(), EventTotals::default());

    let seed = [
        ("u1", "login"),
        ("u1", "login"),
        ("u1", "purchase"),
        ("u2", "login"),
    ];
    for (user_id, kind) in seed {
        service
            .create_event(CreateEvent::new(user_id, kind))
            .await
            .unwrap();
    }

    assert_eq!(
        service.totals().await.unwrap(),
        EventTotals {
            total_events: 4,
            unique_users: 2,
            unique_event_types: 2,
        }
    );

    let by_type = service.by_event_type().await.unwrap();
    assert_eq!(by_type, vec![typed("login", 3), typed("purchase", 1)]);

    let by_user = service.by_user(10).await.unwrap();
    assert_eq!(by_user, vec![user("u1", 3), user("u2", 1)]);
    assert_eq!(service.by_user(1).await.unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "requires Docker for the Postgres testcontainer"]
async fn test_ties_are_ordered_by_key() {
    let db = TestDatabase::new().await;
    let service = service(&db).await;

    let seed = [
        ("zed", "view"),
        ("Amy", "click"),
        ("zed", "click"),
        ("Amy", "view"),
        ("bob", "add"),
    ];
    for (user_id, kind) in seed {
        service
            .create_event(CreateEvent::new(user_id, kind))
            .await
            .unwrap();
    }

    let by_type = service.by_event_type().await.unwrap();
    assert_ranked(&by_type, |c| (c.event_type.as_str(), c.count), "by_event_type");
    assert_eq!(by_type[0].event_type, "click");

    let by_user = service.by_user(10).await.unwrap();
    assert_ranked(&by_user, |c| (c.user_id.as_str(), c.count), "by_user");
    // Byte order: uppercase sorts before lowercase
    assert_eq!(by_user[0].user_id, "Amy");
}

#[tokio::test]
#[ignore = "requires Docker for the Postgres testcontainer"]
async fn test_count_by_day_buckets_by_utc_date() {
    let db = TestDatabase::new().await;
    let repo = PgEventRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("count_by_day");

    for at in [
        builder.day_at(10, 0, 5),
        builder.day_at(10, 23, 55),
        builder.day_at(11, 12, 0),
        builder.day_at(2, 12, 0),
    ] {
        repo.insert(CreateEvent::new("u1", "tick").at(at))
            .await
            .unwrap();
    }

    let days = repo
        .count_by_day(Some(builder.day_at(5, 0, 0)))
        .await
        .unwrap();

    assert_eq!(days, vec![daily(10, 2), daily(11, 1)]);
    assert_eq!(repo.count_by_day(None).await.unwrap().len(), 3);
}

#[tokio::test]
#[ignore = "requires Docker for the Postgres testcontainer"]
async fn test_time_filters_include_lower_bound() {
    let db = TestDatabase::new().await;
    let repo = PgEventRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("inclusive_bound");
    let since = builder.day_at(15, 12, 0);

    for at in [since, since - Duration::microseconds(1)] {
        repo.insert(CreateEvent::new("u1", "login").at(at))
            .await
            .unwrap();
    }

    let counts = repo
        .count_by_event_type(TypeCountQuery {
            user_id: None,
            since: Some(since),
        })
        .await
        .unwrap();
    assert_eq!(counts, vec![typed("login", 1)]);

    let days = repo.count_by_day(Some(since)).await.unwrap();
    assert_eq!(days, vec![daily(15, 1)]);
}

#[tokio::test]
#[ignore = "requires Docker for the Postgres testcontainer"]
async fn test_over_time_excludes_events_outside_window() {
    let db = TestDatabase::new().await;
    let service = service(&db).await;

    let now = Utc::now();
    record(&service, "u1", "a", now - Duration::days(10)).await;
    record(&service, "u1", "a", now - Duration::hours(1)).await;

    let days = service.over_time(7).await.unwrap();
    assert_eq!(days.iter().map(|d| d.count).sum::<u64>(), 1);
    assert!(service.over_time(0).await.unwrap().is_empty());

    let everything = service.over_time(i64::MAX).await.unwrap();
    assert_eq!(everything.iter().map(|d| d.count).sum::<u64>(), 2);
}

#[tokio::test]
#[ignore = "requires Docker for the Postgres testcontainer"]
async fn test_windows_reaching_before_4713_bc_cover_all_history() {
    let db = TestDatabase::new().await;
    let service = service(&db).await;
    record(&service, "u1", "login", Utc::now() - Duration::days(30)).await;

    let days = service.over_time(3_000_000).await.unwrap();
    assert_eq!(days.iter().map(|d| d.count).sum::<u64>(), 1);

    let recent = service.recent_activity(5_000_000_000).await.unwrap();
    assert_eq!(recent.total_events, 1);
}

#[tokio::test]
#[ignore = "requires Docker for the Postgres testcontainer"]
async fn test_user_activity_and_recent_activity() {
    let db = TestDatabase::new().await;
    let service = service(&db).await;
    let builder = TestDataBuilder::from_test_name("user_activity");
    let alice = builder.user_id("alice");

    let newest = builder.minutes_ago(5);
    record(&service, &alice, "login", builder.minutes_ago(30)).await;
    record(&service, &alice, "purchase", newest).await;
    // Inserted last but older: last_event_at follows the timestamp, not the id
    record(&service, &alice, "login", builder.minutes_ago(600)).await;

    let activity = service.user_activity(&alice).await.unwrap();
    assert_eq!(activity.total_events, 3);
    assert_eq!(
        activity.events_by_type,
        vec![typed("login", 2), typed("purchase", 1)]
    );
    let last = assert_some(activity.last_event_at, "last_event_at");
    assert!((last - newest).num_milliseconds().abs() < 1);

    assert_eq!(
        service.user_activity("nobody").await.unwrap(),
        UserActivity::empty("nobody")
    );

    let recent = service.recent_activity(60).await.unwrap();
    assert_eq!(recent.total_events, 2);
    assert_eq!(recent.by_type.len(), 2);
}

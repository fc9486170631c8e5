use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::EventResult;
use crate::models::{
    CreateEvent, DailyCount, Event, EventFilter, EventTotals, EventTypeCount, TypeCountQuery,
    UserCount,
};

/// Event store.
///
/// Append-only: events are inserted and read, never updated or deleted.
/// Every grouped result is ordered by count descending, ties by key ascending.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Persist an event and return it with its assigned id
    async fn insert(&self, input: CreateEvent) -> EventResult<Event>;

    /// Events matching the filter, ordered by id ascending, then paginated
    async fn scan(&self, filter: EventFilter) -> EventResult<Vec<Event>>;

    async fn totals(&self) -> EventResult<EventTotals>;

    async fn count_by_event_type(&self, query: TypeCountQuery) -> EventResult<Vec<EventTypeCount>>;

    /// The `limit` most active users
    async fn count_by_user(&self, limit: u64) -> EventResult<Vec<UserCount>>;

    /// Per-UTC-day counts from `since` (inclusive), oldest day first.
    /// `None` covers the whole history.
    async fn count_by_day(&self, since: Option<DateTime<Utc>>) -> EventResult<Vec<DailyCount>>;

    async fn count_for_user(&self, user_id: String) -> EventResult<u64>;

    /// Timestamp of the user's latest event
    async fn last_event_at(&self, user_id: String) -> EventResult<Option<DateTime<Utc>>>;
}

/// Process-local store for development and tests
#[derive(Clone, Default)]
pub struct InMemoryEventRepository {
    log: Arc<RwLock<EventLog>>,
}

#[derive(Default)]
struct EventLog {
    // Kept in insertion order, which is also id order
    events: Vec<Event>,
    last_id: i64,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Count occurrences and order them count desc, key asc.
fn rank<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<(String, u64)> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }

    let mut ranked: Vec<(String, u64)> = counts
        .into_iter()
        .map(|(key, count)| (key.to_string(), count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn insert(&self, input: CreateEvent) -> EventResult<Event> {
        let mut log = self.log.write().await;
        log.last_id += 1;

        let event = Event {
            id: log.last_id,
            user_id: input.user_id,
            event_type: input.event_type,
            timestamp: input.timestamp.unwrap_or_else(Utc::now),
            metadata: input.metadata.map(Value::Object),
        };
        log.events.push(event.clone());

        tracing::info!(
            id = event.id,
            user_id = %event.user_id,
            event_type = %event.event_type,
            "Recorded event"
        );
        Ok(event)
    }

    async fn scan(&self, filter: EventFilter) -> EventResult<Vec<Event>> {
        let log = self.log.read().await;
        let user_id = filter.user_id.as_deref();
        let event_type = filter.event_type.as_deref();

        Ok(log
            .events
            .iter()
            .filter(|e| user_id.is_none_or(|u| e.user_id == u))
            .filter(|e| event_type.is_none_or(|t| e.event_type == t))
            .skip(usize::try_from(filter.skip).unwrap_or(usize::MAX))
            .take(usize::try_from(filter.limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn totals(&self) -> EventResult<EventTotals> {
        let log = self.log.read().await;
        let users: HashSet<&str> = log.events.iter().map(|e| e.user_id.as_str()).collect();
        let types: HashSet<&str> = log.events.iter().map(|e| e.event_type.as_str()).collect();

        Ok(EventTotals {
            total_events: log.events.len() as u64,
            unique_users: users.len() as u64,
            unique_event_types: types.len() as u64,
        })
    }

    async fn count_by_event_type(&self, query: TypeCountQuery) -> EventResult<Vec<EventTypeCount>> {
        let log = self.log.read().await;
        let matching = log
            .events
            .iter()
            .filter(|e| query.user_id.as_deref().is_none_or(|u| e.user_id == u))
            .filter(|e| query.since.is_none_or(|since| e.timestamp >= since))
            .map(|e| e.event_type.as_str());

        Ok(rank(matching)
            .into_iter()
            .map(|(event_type, count)| EventTypeCount { event_type, count })
            .collect())
    }

    async fn count_by_user(&self, limit: u64) -> EventResult<Vec<UserCount>> {
        let log = self.log.read().await;

        Ok(rank(log.events.iter().map(|e| e.user_id.as_str()))
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|(user_id, count)| UserCount { user_id, count })
            .collect())
    }

    async fn count_by_day(&self, since: Option<DateTime<Utc>>) -> EventResult<Vec<DailyCount>> {
        let log = self.log.read().await;
        let mut days: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        for event in log
            .events
            .iter()
            .filter(|e| since.is_none_or(|since| e.timestamp >= since))
        {
            *days.entry(event.timestamp.date_naive()).or_default() += 1;
        }

        Ok(days
            .into_iter()
            .map(|(date, count)| DailyCount { date, count })
            .collect())
    }

    async fn count_for_user(&self, user_id: String) -> EventResult<u64> {
        let log = self.log.read().await;
        Ok(log.events.iter().filter(|e| e.user_id == user_id).count() as u64)
    }

    async fn last_event_at(&self, user_id: String) -> EventResult<Option<DateTime<Utc>>> {
        let log = self.log.read().await;
        Ok(log
            .events
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.timestamp)
            .max())
    }
}

use chrono::{DateTime, Datelike, TimeDelta, Utc};
use observability::{AnalyticsMetrics, QueryTimer};
use std::future::Future;
use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use crate::error::{EventError, EventResult};
use crate::models::{
    CreateEvent, DailyCount, Event, EventFilter, EventTotals, EventTypeCount, RecentActivity,
    TypeCountQuery, UserActivity, UserCount,
};
use crate::repository::EventRepository;

/// First calendar year a `timestamptz` can represent (4713 BC). Earlier
/// window starts cannot be bound and cover the whole history anyway.
const EARLIEST_STORABLE_YEAR: i32 = -4712;

/// Ingestion and aggregation over an [`EventRepository`].
///
/// Non-positive limits and windows short-circuit to empty results without
/// touching the store.
#[derive(Clone)]
pub struct EventService<R: EventRepository> {
    repository: Arc<R>,
}

impl<R: EventRepository> EventService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    async fn timed<T>(
        &self,
        query: &'static str,
        fut: impl Future<Output = EventResult<T>>,
    ) -> EventResult<T> {
        let timer = QueryTimer::start(query);
        let result = fut.await;
        timer.finish(result.is_ok());
        result
    }

    #[instrument(
        skip(self, input),
        fields(user_id = %input.user_id, event_type = %input.event_type)
    )]
    pub async fn create_event(&self, input: CreateEvent) -> EventResult<Event> {
        input.validate()?;

        let event = self.repository.insert(input).await?;
        AnalyticsMetrics::record_event_ingested(&event.event_type);
        Ok(event)
    }

    #[instrument(skip(self))]
    pub async fn list_events(&self, filter: EventFilter) -> EventResult<Vec<Event>> {
        let filter = filter.normalized();
        self.timed("list_events", self.repository.scan(filter)).await
    }

    #[instrument(skip(self))]
    pub async fn totals(&self) -> EventResult<EventTotals> {
        self.timed("totals", self.repository.totals()).await
    }

    #[instrument(skip(self))]
    pub async fn by_event_type(&self) -> EventResult<Vec<EventTypeCount>> {
        self.timed(
            "by_event_type",
            self.repository.count_by_event_type(TypeCountQuery::default()),
        )
        .await
    }

    /// The `limit` most active users; empty when `limit <= 0`
    #[instrument(skip(self))]
    pub async fn by_user(&self, limit: i64) -> EventResult<Vec<UserCount>> {
        let Ok(limit) = u64::try_from(limit) else {
            return Ok(Vec::new());
        };
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.timed("by_user", self.repository.count_by_user(limit)).await
    }

    /// Daily counts over the last `days` days; empty when `days <= 0`
    #[instrument(skip(self))]
    pub async fn over_time(&self, days: i64) -> EventResult<Vec<DailyCount>> {
        if days <= 0 {
            return Ok(Vec::new());
        }
        let since = window_start(Utc::now(), TimeDelta::try_days(days));
        self.timed("over_time", self.repository.count_by_day(since)).await
    }

    #[instrument(skip(self))]
    pub async fn user_activity(&self, user_id: &str) -> EventResult<UserActivity> {
        if user_id.trim().is_empty() {
            return Err(EventError::Validation("user_id must not be blank".to_string()));
        }

        self.timed("user_activity", self.load_user_activity(user_id))
            .await
    }

    async fn load_user_activity(&self, user_id: &str) -> EventResult<UserActivity> {
        let total_events = self.repository.count_for_user(user_id.to_string()).await?;
        if total_events == 0 {
            return Ok(UserActivity::empty(user_id));
        }

        let events_by_type = self
            .repository
            .count_by_event_type(TypeCountQuery {
                user_id: Some(user_id.to_string()),
                since: None,
            })
            .await?;
        let last_event_at = self.repository.last_event_at(user_id.to_string()).await?;

        Ok(UserActivity {
            user_id: user_id.to_string(),
            total_events,
            events_by_type,
            last_event_at,
        })
    }

    /// Activity over the last `minutes` minutes. `minutes <= 0` yields zero events.
    #[instrument(skip(self))]
    pub async fn recent_activity(&self, minutes: i64) -> EventResult<RecentActivity> {
        if minutes <= 0 {
            return Ok(RecentActivity {
                time_window_minutes: minutes,
                total_events: 0,
                by_type: Vec::new(),
            });
        }

        let since = window_start(Utc::now(), TimeDelta::try_minutes(minutes));
        let by_type = self
            .timed(
                "recent_activity",
                self.repository.count_by_event_type(TypeCountQuery {
                    user_id: None,
                    since,
                }),
            )
            .await?;

        Ok(RecentActivity {
            time_window_minutes: minutes,
            total_events: by_type.iter().map(|t| t.count).sum(),
            by_type,
        })
    }
}

/// `now - window`, or `None` (unbounded) when the start falls before the
/// earliest storable timestamp or outside the calendar range.
fn window_start(now: DateTime<Utc>, window: Option<TimeDelta>) -> Option<DateTime<Utc>> {
    window
        .and_then(|w| now.checked_sub_signed(w))
        .filter(|start| start.year() > EARLIEST_STORABLE_YEAR)
}

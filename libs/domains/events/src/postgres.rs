use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

use crate::entity::{self, Column, Entity as Events};
use crate::error::EventResult;
use crate::models::{
    CreateEvent, DailyCount, Event, EventFilter, EventTotals, EventTypeCount, TypeCountQuery,
    UserCount,
};
use crate::repository::EventRepository;

/// Calendar date of the event in UTC, independent of the session time zone
const DAY_BUCKET: &str = r#"DATE("events"."timestamp" AT TIME ZONE 'UTC')"#;
// Byte-order tie-break so results match across database collations
const EVENT_TYPE_BYTES: &str = r#""events"."event_type" COLLATE "C""#;
const USER_ID_BYTES: &str = r#""events"."user_id" COLLATE "C""#;

/// [`EventRepository`] backed by the `events` table.
///
/// All aggregation happens in SQL; only grouped rows cross the wire.
pub struct PgEventRepository {
    db: DatabaseConnection,
}

impl PgEventRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// LIMIT/OFFSET are bound as BIGINT; anything larger means "no bound" anyway.
fn to_bound(value: u64) -> u64 {
    value.min(i64::MAX as u64)
}

fn lower_bound(since: DateTime<Utc>) -> DateTimeWithTimeZone {
    since.into()
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn insert(&self, input: CreateEvent) -> EventResult<Event> {
        let active_model: entity::ActiveModel = input.into();
        let model = active_model.insert(&self.db).await?;

        tracing::info!(
            id = model.id,
            user_id = %model.user_id,
            event_type = %model.event_type,
            "Recorded event"
        );
        Ok(model.into())
    }

    async fn scan(&self, filter: EventFilter) -> EventResult<Vec<Event>> {
        let mut query = Events::find();

        if let Some(user_id) = filter.user_id {
            query = query.filter(Column::UserId.eq(user_id));
        }
        if let Some(event_type) = filter.event_type {
            query = query.filter(Column::EventType.eq(event_type));
        }

        let models = query
            .order_by_asc(Column::Id)
            .offset(to_bound(filter.skip))
            .limit(to_bound(filter.limit))
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn totals(&self) -> EventResult<EventTotals> {
        // One statement so the three numbers describe the same snapshot
        let row: Option<(i64, i64, i64)> = Events::find()
            .select_only()
            .column_as(Column::Id.count(), "total_events")
            .column_as(Expr::cust(r#"COUNT(DISTINCT "events"."user_id")"#), "unique_users")
            .column_as(
                Expr::cust(r#"COUNT(DISTINCT "events"."event_type")"#),
                "unique_event_types",
            )
            .into_tuple()
            .one(&self.db)
            .await?;

        let (total_events, unique_users, unique_event_types) = row.unwrap_or_default();
        Ok(EventTotals {
            total_events: to_count(total_events),
            unique_users: to_count(unique_users),
            unique_event_types: to_count(unique_event_types),
        })
    }

    async fn count_by_event_type(&self, query: TypeCountQuery) -> EventResult<Vec<EventTypeCount>> {
        let mut select = Events::find()
            .select_only()
            .column(Column::EventType)
            .column_as(Column::Id.count(), "count")
            .group_by(Column::EventType)
            .order_by_desc(Column::Id.count())
            .order_by_asc(Expr::cust(EVENT_TYPE_BYTES));

        if let Some(user_id) = query.user_id {
            select = select.filter(Column::UserId.eq(user_id));
        }
        if let Some(since) = query.since {
            select = select.filter(Column::Timestamp.gte(lower_bound(since)));
        }

        let rows: Vec<(String, i64)> = select.into_tuple().all(&self.db).await?;
        Ok(rows
            .into_iter()
            .map(|(event_type, count)| EventTypeCount {
                event_type,
                count: to_count(count),
            })
            .collect())
    }

    async fn count_by_user(&self, limit: u64) -> EventResult<Vec<UserCount>> {
        let rows: Vec<(String, i64)> = Events::find()
            .select_only()
            .column(Column::UserId)
            .column_as(Column::Id.count(), "count")
            .group_by(Column::UserId)
            .order_by_desc(Column::Id.count())
            .order_by_asc(Expr::cust(USER_ID_BYTES))
            .limit(to_bound(limit))
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(user_id, count)| UserCount {
                user_id,
                count: to_count(count),
            })
            .collect())
    }

    async fn count_by_day(&self, since: Option<DateTime<Utc>>) -> EventResult<Vec<DailyCount>> {
        let mut select = Events::find()
            .select_only()
            .column_as(Expr::cust(DAY_BUCKET), "day")
            .column_as(Column::Id.count(), "count")
            .group_by(Expr::cust(DAY_BUCKET))
            .order_by_asc(Expr::cust(DAY_BUCKET));

        if let Some(since) = since {
            select = select.filter(Column::Timestamp.gte(lower_bound(since)));
        }

        let rows: Vec<(NaiveDate, i64)> = select.into_tuple().all(&self.db).await?;
        Ok(rows
            .into_iter()
            .map(|(date, count)| DailyCount {
                date,
                count: to_count(count),
            })
            .collect())
    }

    async fn count_for_user(&self, user_id: String) -> EventResult<u64> {
        let count = Events::find()
            .filter(Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn last_event_at(&self, user_id: String) -> EventResult<Option<DateTime<Utc>>> {
        let latest = Events::find()
            .filter(Column::UserId.eq(user_id))
            .order_by_desc(Column::Timestamp)
            .order_by_desc(Column::Id)
            .one(&self.db)
            .await?;

        Ok(latest.map(|model| model.timestamp.with_timezone(&Utc)))
    }
}

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::{ErrorResponse, EventResult};
use crate::models::{
    CreateEvent, DailyCount, Event, EventFilter, EventTotals, EventTypeCount, OverTimeParams,
    RecentActivity, RecentActivityParams, TopUsersParams, UserActivity, UserCount,
};
use crate::repository::EventRepository;
use crate::service::EventService;

const EVENTS_TAG: &str = "events";
const STATS_TAG: &str = "stats";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Event Analytics API",
        description = "Event ingestion and aggregation queries"
    ),
    paths(
        create_event,
        list_events,
        stats_total,
        stats_by_event_type,
        stats_by_user,
        stats_over_time,
        stats_user_activity,
        stats_recent_activity,
    ),
    components(schemas(
        Event,
        CreateEvent,
        EventFilter,
        EventTotals,
        EventTypeCount,
        UserCount,
        DailyCount,
        UserActivity,
        RecentActivity,
        ErrorResponse,
    )),
    tags(
        (name = EVENTS_TAG, description = "Event ingestion and listing"),
        (name = STATS_TAG, description = "Aggregated statistics")
    )
)]
pub struct ApiDoc;

/// Event and statistics routes, mounted at the application root
pub fn router<R: EventRepository + 'static>(service: EventService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/events", get(list_events::<R>).post(create_event::<R>))
        .route("/events/", get(list_events::<R>).post(create_event::<R>))
        .route("/stats/total", get(stats_total::<R>))
        .route("/stats/by-event-type", get(stats_by_event_type::<R>))
        .route("/stats/by-user", get(stats_by_user::<R>))
        .route("/stats/over-time", get(stats_over_time::<R>))
        .route("/stats/user-activity/{user_id}", get(stats_user_activity::<R>))
        .route("/stats/recent-activity", get(stats_recent_activity::<R>))
        .with_state(shared_service)
}

/// Record an event
#[utoipa::path(
    post,
    path = "/events",
    tag = EVENTS_TAG,
    request_body = CreateEvent,
    responses(
        (status = 201, description = "Event stored", body = Event),
        (status = 400, description = "Blank or oversized field", body = ErrorResponse),
        (status = 500, description = "Event store unavailable", body = ErrorResponse)
    )
)]
async fn create_event<R: EventRepository>(
    State(service): State<Arc<EventService<R>>>,
    Json(input): Json<CreateEvent>,
) -> EventResult<impl IntoResponse> {
    let event = service.create_event(input).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// List events in id order
#[utoipa::path(
    get,
    path = "/events",
    tag = EVENTS_TAG,
    params(EventFilter),
    responses(
        (status = 200, description = "Matching events", body = Vec<Event>),
        (status = 500, description = "Event store unavailable", body = ErrorResponse)
    )
)]
async fn list_events<R: EventRepository>(
    State(service): State<Arc<EventService<R>>>,
    Query(filter): Query<EventFilter>,
) -> EventResult<Json<Vec<Event>>> {
    Ok(Json(service.list_events(filter).await?))
}

/// Total events, distinct users and distinct event types
#[utoipa::path(
    get,
    path = "/stats/total",
    tag = STATS_TAG,
    responses(
        (status = 200, description = "Store totals", body = EventTotals),
        (status = 500, description = "Event store unavailable", body = ErrorResponse)
    )
)]
async fn stats_total<R: EventRepository>(
    State(service): State<Arc<EventService<R>>>,
) -> EventResult<Json<EventTotals>> {
    Ok(Json(service.totals().await?))
}

/// Event counts per type, most frequent first
#[utoipa::path(
    get,
    path = "/stats/by-event-type",
    tag = STATS_TAG,
    responses(
        (status = 200, description = "Counts per event type", body = Vec<EventTypeCount>),
        (status = 500, description = "Event store unavailable", body = ErrorResponse)
    )
)]
async fn stats_by_event_type<R: EventRepository>(
    State(service): State<Arc<EventService<R>>>,
) -> EventResult<Json<Vec<EventTypeCount>>> {
    Ok(Json(service.by_event_type().await?))
}

/// Most active users
#[utoipa::path(
    get,
    path = "/stats/by-user",
    tag = STATS_TAG,
    params(TopUsersParams),
    responses(
        (status = 200, description = "Top users by event count", body = Vec<UserCount>),
        (status = 500, description = "Event store unavailable", body = ErrorResponse)
    )
)]
async fn stats_by_user<R: EventRepository>(
    State(service): State<Arc<EventService<R>>>,
    Query(params): Query<TopUsersParams>,
) -> EventResult<Json<Vec<UserCount>>> {
    Ok(Json(service.by_user(params.limit).await?))
}

/// Daily event counts over a look-back window
#[utoipa::path(
    get,
    path = "/stats/over-time",
    tag = STATS_TAG,
    params(OverTimeParams),
    responses(
        (status = 200, description = "Counts per UTC day, oldest first", body = Vec<DailyCount>),
        (status = 500, description = "Event store unavailable", body = ErrorResponse)
    )
)]
async fn stats_over_time<R: EventRepository>(
    State(service): State<Arc<EventService<R>>>,
    Query(params): Query<OverTimeParams>,
) -> EventResult<Json<Vec<DailyCount>>> {
    Ok(Json(service.over_time(params.days).await?))
}

/// Activity summary for one user
#[utoipa::path(
    get,
    path = "/stats/user-activity/{user_id}",
    tag = STATS_TAG,
    params(
        ("user_id" = String, Path, description = "User identifier")
    ),
    responses(
        (status = 200, description = "Activity, zeroed for unknown users", body = UserActivity),
        (status = 400, description = "Blank user_id", body = ErrorResponse),
        (status = 500, description = "Event store unavailable", body = ErrorResponse)
    )
)]
async fn stats_user_activity<R: EventRepository>(
    State(service): State<Arc<EventService<R>>>,
    Path(user_id): Path<String>,
) -> EventResult<Json<UserActivity>> {
    Ok(Json(service.user_activity(&user_id).await?))
}

/// Event counts over the last few minutes
#[utoipa::path(
    get,
    path = "/stats/recent-activity",
    tag = STATS_TAG,
    params(RecentActivityParams),
    responses(
        (status = 200, description = "Recent activity by type", body = RecentActivity),
        (status = 500, description = "Event store unavailable", body = ErrorResponse)
    )
)]
async fn stats_recent_activity<R: EventRepository>(
    State(service): State<Arc<EventService<R>>>,
    Query(params): Query<RecentActivityParams>,
) -> EventResult<Json<RecentActivity>> {
    Ok(Json(service.recent_activity(params.minutes).await?))
}

//! Event records, ingestion input and aggregate shapes

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

pub const DEFAULT_PAGE_LIMIT: u64 = 100;
pub const DEFAULT_TOP_USERS: i64 = 10;
pub const DEFAULT_OVER_TIME_DAYS: i64 = 7;
pub const DEFAULT_RECENT_MINUTES: i64 = 60;

/// A stored event. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Event {
    /// Assigned by the store, strictly increasing
    pub id: i64,
    pub user_id: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    /// Opaque JSON object supplied by the client, `null` when absent
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,
}

/// Body of `POST /events`
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateEvent {
    #[validate(
        length(min = 1, max = 255, message = "user_id must be 1-255 characters"),
        custom(function = "not_blank")
    )]
    pub user_id: String,

    #[validate(
        length(min = 1, max = 255, message = "event_type must be 1-255 characters"),
        custom(function = "not_blank")
    )]
    pub event_type: String,

    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Map<String, Value>>,

    /// Defaults to the time of ingestion. Set it to back-fill history.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl CreateEvent {
    pub fn new(user_id: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            event_type: event_type.into(),
            metadata: None,
            timestamp: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Query parameters of `GET /events`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventFilter {
    /// Only events of this user
    pub user_id: Option<String>,
    /// Only events of this type
    pub event_type: Option<String>,
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_page_limit")]
    pub limit: u64,
}

fn default_page_limit() -> u64 {
    DEFAULT_PAGE_LIMIT
}

impl Default for EventFilter {
    fn default() -> Self {
        Self {
            user_id: None,
            event_type: None,
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl EventFilter {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    pub fn of_type(event_type: impl Into<String>) -> Self {
        Self {
            event_type: Some(event_type.into()),
            ..Self::default()
        }
    }

    pub fn page(mut self, skip: u64, limit: u64) -> Self {
        self.skip = skip;
        self.limit = limit;
        self
    }

    /// Empty-string filters are treated as absent.
    pub fn normalized(mut self) -> Self {
        self.user_id = self.user_id.filter(|v| !v.is_empty());
        self.event_type = self.event_type.filter(|v| !v.is_empty());
        self
    }
}

/// Selection for [`count_by_event_type`]
///
/// [`count_by_event_type`]: crate::EventRepository::count_by_event_type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeCountQuery {
    pub user_id: Option<String>,
    /// Inclusive lower bound on `timestamp`
    pub since: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EventTotals {
    pub total_events: u64,
    pub unique_users: u64,
    pub unique_event_types: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EventTypeCount {
    pub event_type: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserCount {
    pub user_id: String,
    pub count: u64,
}

/// Events on one UTC calendar day, serialized as `YYYY-MM-DD`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserActivity {
    pub user_id: String,
    pub total_events: u64,
    pub events_by_type: Vec<EventTypeCount>,
    pub last_event_at: Option<DateTime<Utc>>,
}

impl UserActivity {
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            total_events: 0,
            events_by_type: Vec::new(),
            last_event_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RecentActivity {
    pub time_window_minutes: i64,
    pub total_events: u64,
    pub by_type: Vec<EventTypeCount>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TopUsersParams {
    /// Number of users to return
    #[serde(default = "default_top_users")]
    #[param(default = 10)]
    pub limit: i64,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OverTimeParams {
    /// Look-back window in days
    #[serde(default = "default_over_time_days")]
    #[param(default = 7)]
    pub days: i64,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentActivityParams {
    /// Look-back window in minutes
    #[serde(default = "default_recent_minutes")]
    #[param(default = 60)]
    pub minutes: i64,
}

fn default_top_users() -> i64 {
    DEFAULT_TOP_USERS
}

fn default_over_time_days() -> i64 {
    DEFAULT_OVER_TIME_DAYS
}

fn default_recent_minutes() -> i64 {
    DEFAULT_RECENT_MINUTES
}

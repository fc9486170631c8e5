//! Events domain: ingestion and aggregation over an append-only event log.
//!
//! ```text
//! ┌─────────────┐
//! │  handlers   │  HTTP routes (axum) + OpenAPI (utoipa)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   service   │  validation, look-back windows, query metrics
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ repository  │  EventRepository trait, in-memory store
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │  postgres   │  sea-orm over the `events` table
//! └─────────────┘
//! ```
//!
//! ```rust,ignore
//! use domain_events::{handlers, EventService, PgEventRepository};
//!
//! let service = EventService::new(PgEventRepository::new(db));
//! let app = handlers::router(service);
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{ErrorResponse, EventError, EventResult};
pub use handlers::ApiDoc;
pub use models::{
    CreateEvent, DailyCount, Event, EventFilter, EventTotals, EventTypeCount, RecentActivity,
    TypeCountQuery, UserActivity, UserCount,
};
pub use postgres::PgEventRepository;
pub use repository::{EventRepository, InMemoryEventRepository};
pub use service::EventService;

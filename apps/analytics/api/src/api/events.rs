use axum::Router;
use domain_events::{EventService, PgEventRepository, handlers};

use crate::state::AppState;

pub fn router(state: &AppState) -> Router {
    let repository = PgEventRepository::new(state.db.clone());
    let service = EventService::new(repository);
    handlers::router(service)
}

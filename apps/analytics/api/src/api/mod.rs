use axum::{Router, routing::get};

pub mod events;
pub mod health;

/// Domain routes. Every sub-router already carries its state.
pub fn routes(state: &crate::state::AppState) -> Router {
    Router::new().merge(events::router(state))
}

/// `/`, `/health` and `/ready`
pub fn system_router(state: crate::state::AppState) -> Router {
    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}

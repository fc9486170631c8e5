//! Service info, liveness and readiness.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use database::postgres::check_health_detailed;
use serde_json::{Value, json};
use utoipa::ToSchema;

use crate::state::AppState;

/// Body of `GET /`
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    /// Route template by operation name
    #[schema(value_type = Object)]
    pub endpoints: Value,
}

/// Service name, version and the route map
#[utoipa::path(
    get,
    path = "/",
    tag = "system",
    responses((status = 200, description = "Service information", body = ServiceInfo))
)]
pub async fn root_handler(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: state.config.app.name,
        version: state.config.app.version,
        description: "Event tracking and analytics service",
        endpoints: json!({
            "create_event": "POST /events",
            "list_events": "GET /events",
            "total_stats": "GET /stats/total",
            "stats_by_event_type": "GET /stats/by-event-type",
            "stats_by_user": "GET /stats/by-user",
            "stats_over_time": "GET /stats/over-time",
            "user_activity": "GET /stats/user-activity/{user_id}",
            "recent_activity": "GET /stats/recent-activity",
            "health": "GET /health",
            "ready": "GET /ready",
            "metrics": "GET /metrics",
            "docs": "GET /swagger-ui",
        }),
    })
}

/// Liveness: the process is up and serving
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses((status = 200, description = "Service is alive"))
)]
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "name": state.config.app.name,
        "version": state.config.app.version,
    }))
}

/// Readiness: the event store answers queries
#[utoipa::path(
    get,
    path = "/ready",
    tag = "system",
    responses(
        (status = 200, description = "Database reachable"),
        (status = 503, description = "Database unreachable")
    )
)]
pub async fn ready_handler(State(state): State<AppState>) -> Response {
    let database = check_health_detailed(&state.db).await;

    let (status, label) = if database.healthy {
        (StatusCode::OK, "ready")
    } else {
        tracing::warn!(error = ?database.error, "Readiness check failed");
        (StatusCode::SERVICE_UNAVAILABLE, "not_ready")
    };

    let body = json!({
        "status": label,
        "checks": {
            "database": {
                "healthy": database.healthy,
                "latency_ms": database.latency_ms(),
                "error": database.error,
            }
        }
    });

    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Environment};
    use axum::body::Body;
    use axum::http::Request;
    use core_config::{app_info, server::ServerConfig};
    use database::postgres::PostgresConfig;
    use http_body_util::BodyExt;
    use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase};
    use std::collections::BTreeMap;
    use tower::ServiceExt;

    fn state_with(db: DatabaseConnection) -> AppState {
        AppState {
            config: Config {
                app: app_info!(),
                database: PostgresConfig::new("postgresql://mock/analytics"),
                server: ServerConfig::default(),
                environment: Environment::Development,
                run_migrations: false,
            },
            db,
        }
    }

    async fn call(db: DatabaseConnection, uri: &str) -> (StatusCode, Value) {
        let app = crate::api::system_router(state_with(db));
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn empty_db() -> DatabaseConnection {
        MockDatabase::new(DatabaseBackend::Postgres).into_connection()
    }

    #[tokio::test]
    async fn test_root_lists_endpoints() {
        let (status, body) = call(empty_db(), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "analytics_api");
        assert_eq!(body["endpoints"]["create_event"], "POST /events");
    }

    #[tokio::test]
    async fn test_health_is_alive_without_database() {
        let (status, body) = call(empty_db(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_ready_when_database_answers() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[BTreeMap::from([("?column?", sea_orm::Value::Int(Some(1)))])]])
            .into_connection();

        let (status, body) = call(db, "/ready").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
        assert_eq!(body["checks"]["database"]["healthy"], true);
    }

    #[tokio::test]
    async fn test_not_ready_when_database_fails() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("connection refused".to_string())])
            .into_connection();

        let (status, body) = call(db, "/ready").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "not_ready");
    }
}

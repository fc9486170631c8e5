use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type EventResult<T> = Result<T, EventError>;

impl From<DbErr> for EventError {
    fn from(err: DbErr) -> Self {
        EventError::Storage(err.to_string())
    }
}

impl From<ValidationErrors> for EventError {
    fn from(err: ValidationErrors) -> Self {
        EventError::Validation(err.to_string())
    }
}

/// JSON error body returned by every endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Numeric code for logs and dashboards
    pub code: i32,
    /// Machine-readable identifier
    pub error: String,
    pub message: String,
}

impl EventError {
    pub fn status(&self) -> StatusCode {
        match self {
            EventError::Validation(_) => StatusCode::BAD_REQUEST,
            EventError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> i32 {
        match self {
            EventError::Validation(_) => 1001,
            EventError::Storage(_) => 2001,
        }
    }
}

impl IntoResponse for EventError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            EventError::Validation(msg) => ErrorResponse {
                code: self.code(),
                error: "ValidationError".to_string(),
                message: msg.clone(),
            },
            EventError::Storage(msg) => {
                // Driver messages stay in the logs
                tracing::error!(error_code = self.code(), "Storage failure: {}", msg);
                ErrorResponse {
                    code: self.code(),
                    error: "StorageError".to_string(),
                    message: "The event store is unavailable".to_string(),
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            EventError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            EventError::Storage("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_db_err_becomes_storage() {
        let err: EventError = DbErr::Custom("pool timed out".into()).into();
        assert!(matches!(err, EventError::Storage(msg) if msg.contains("pool timed out")));
    }

    #[test]
    fn test_into_response_status() {
        let response = EventError::Validation("user_id must not be blank".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = EventError::Storage("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

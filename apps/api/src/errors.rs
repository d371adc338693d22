use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::engine::validator::ValidationReport;
use crate::engine::EngineError;
use crate::offers::lifecycle::LifecycleError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid salary data: {}", .0.join("; "))]
    InvalidSalaryData(Vec<String>),

    #[error("Invalid template: {}", .0.summary())]
    InvalidTemplate(ValidationReport),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Queue error: {0}")]
    Queue(#[from] redis::RedisError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidTemplate(report) => AppError::InvalidTemplate(report),
            EngineError::InvalidSalaryData(errors) => AppError::InvalidSalaryData(errors),
            EngineError::VersionNotFound { .. } => AppError::NotFound(err.to_string()),
        }
    }
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        AppError::Conflict(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(anyhow::Error::new(err).context("JSON serialization failed"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut details: Option<Value> = None;
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::InvalidSalaryData(errors) => {
                details = Some(json!(errors));
                (
                    StatusCode::BAD_REQUEST,
                    "INVALID_SALARY_DATA",
                    "Salary data failed validation".to_string(),
                )
            }
            AppError::InvalidTemplate(report) => {
                details = serde_json::to_value(report).ok();
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "INVALID_TEMPLATE",
                    report.summary(),
                )
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Queue(e) => {
                tracing::error!("Queue error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "QUEUE_ERROR",
                    "Failed to enqueue offer dispatch".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::validator::{ValidationIssue, ValidationRule};
    use crate::models::offer::OfferStatus;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::NotFound("x".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::InvalidSalaryData(vec!["base_salary is required".into()])
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Conflict("stale".into()).into_response().status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_engine_errors_map_to_http_errors() {
        let report = ValidationReport {
            is_valid: false,
            errors: vec![ValidationIssue {
                rule: ValidationRule::RequiredSection,
                section_id: Some("greeting".into()),
                placeholder: None,
                message: "Required section 'greeting' has no content".into(),
            }],
            warnings: vec![],
        };
        let err: AppError = EngineError::InvalidTemplate(report).into();
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);

        let err: AppError = EngineError::VersionNotFound {
            template_id: uuid::Uuid::nil(),
            version: 4,
        }
        .into();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_lifecycle_error_is_conflict() {
        let err: AppError = LifecycleError::InvalidTransition {
            from: OfferStatus::Accepted,
            to: OfferStatus::Sent,
        }
        .into();
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }
}

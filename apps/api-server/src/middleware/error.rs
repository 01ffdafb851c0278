//! Maps domain failures onto the JSON error envelope.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use postpilot_core::error::{DomainError, PublishStage};
use postpilot_shared::ErrorResponse;

/// Application-level error type rendered as an [`ErrorResponse`].
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    QuotaExceeded(String),

    #[error("{0}")]
    EditLimitReached(String),

    #[error("{0}")]
    GenerationFailed(String),

    #[error("{0}")]
    NotAuthorized(String),

    #[error("{message}")]
    PublishFailed {
        message: String,
        stage: PublishStage,
        orphaned_asset: Option<String>,
    },

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated(_) => "UNAUTHENTICATED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::QuotaExceeded(_) => "QUOTA_EXCEEDED",
            AppError::EditLimitReached(_) => "EDIT_LIMIT_REACHED",
            AppError::GenerationFailed(_) => "GENERATION_FAILED",
            AppError::NotAuthorized(_) => "LINKEDIN_NOT_AUTHORIZED",
            AppError::PublishFailed { .. } => "PUBLISH_FAILED",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::QuotaExceeded(_) => StatusCode::PAYMENT_REQUIRED,
            AppError::EditLimitReached(_) | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::GenerationFailed(_) | AppError::PublishFailed { .. } => {
                StatusCode::BAD_GATEWAY
            }
            AppError::NotAuthorized(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error = match self {
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
            AppError::PublishFailed {
                stage,
                orphaned_asset,
                ..
            } => ErrorResponse::new(status.as_u16(), self.code(), self.to_string()).with_details(
                serde_json::json!({
                    "stage": stage.to_string(),
                    "orphaned_asset": orphaned_asset,
                }),
            ),
            _ => ErrorResponse::new(status.as_u16(), self.code(), self.to_string()),
        };

        HttpResponse::build(status).json(error)
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        let message = err.to_string();
        match err {
            DomainError::Unauthenticated => AppError::Unauthenticated(message),
            DomainError::NotFound { .. } => AppError::NotFound(message),
            DomainError::QuotaExceeded => AppError::QuotaExceeded(message),
            DomainError::EditLimitReached { .. } => AppError::EditLimitReached(message),
            DomainError::GenerationFailed(_) => AppError::GenerationFailed(message),
            DomainError::NotAuthorized(_) => AppError::NotAuthorized(message),
            DomainError::PublishFailed {
                stage,
                orphaned_asset,
                ..
            } => AppError::PublishFailed {
                message,
                stage,
                orphaned_asset,
            },
            DomainError::Validation(msg) => AppError::BadRequest(msg),
            DomainError::Conflict(msg) => AppError::Conflict(msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

//! Domain-level error types.

use std::fmt;

use thiserror::Error;

/// Step of the LinkedIn publish saga that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStage {
    RegisterUpload,
    FetchImage,
    UploadImage,
    CreatePost,
}

impl fmt::Display for PublishStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PublishStage::RegisterUpload => "register-upload",
            PublishStage::FetchImage => "fetch-image",
            PublishStage::UploadImage => "upload-image",
            PublishStage::CreatePost => "create-post",
        };
        f.write_str(name)
    }
}

/// Domain errors - business logic failures.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: &'static str, id: String },

    #[error("You have no credits left this month")]
    QuotaExceeded,

    #[error("Edit limit reached: a post can have at most {cap} versions")]
    EditLimitReached { cap: u32 },

    #[error("Error generating post by AI agent: {0}")]
    GenerationFailed(String),

    #[error("LinkedIn account not connected: {0}")]
    NotAuthorized(String),

    #[error("Publishing failed at {stage}: {reason}")]
    PublishFailed {
        stage: PublishStage,
        reason: String,
        /// Asset uploaded before the failure; LinkedIn keeps it, nothing deletes it.
        orphaned_asset: Option<String>,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// A conditional write lost a race with a concurrent writer.
    #[error("Concurrent modification: {0}")]
    Conflict(String),
}

impl From<RepoError> for DomainError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Constraint(msg) | RepoError::Conflict(msg) => DomainError::Conflict(msg),
            RepoError::NotFound => DomainError::Internal("record disappeared".to_string()),
            RepoError::Connection(msg) | RepoError::Query(msg) => DomainError::Internal(msg),
        }
    }
}

// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error("Service unavailable: {service_id} ({reason})")]
    ServiceUnavailable { service_id: String, reason: String },

    #[error("Member {member_id} already holds token {token} in {service_id}")]
    AlreadyInQueue {
        service_id: String,
        member_id: String,
        token: u64,
    },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Corrupt queue state for {service_id}: {reason}")]
    CorruptState { service_id: String, reason: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// Note: sqlx::Error conversion is handled in the infra-sqlite crate
// by converting to AppError::StorageUnavailable(String)

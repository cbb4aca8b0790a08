// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Queue invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Token counter exhausted at {0}")]
    TokensExhausted(u64),
}

pub type Result<T> = std::result::Result<T, DomainError>;

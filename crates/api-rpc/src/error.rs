//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error codes.

use jsonrpsee::types::ErrorObjectOwned;
use serde_json::json;
use tokenline_core::domain::DomainError;
use tokenline_core::error::AppError;

/// RPC Error Codes
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const CONFLICT: i32 = 4002;
    pub const THROTTLED: i32 = 4003;
    pub const SERVICE_UNAVAILABLE: i32 = 4004;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const STORAGE_ERROR: i32 = 5001;
    pub const CORRUPT_STATE: i32 = 5003;
}

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    let message = err.to_string();
    match err {
        AppError::Validation(_)
        | AppError::Domain(DomainError::ValidationError(_))
        | AppError::Serialization(_) => {
            ErrorObjectOwned::owned(code::VALIDATION_ERROR, message, None::<()>)
        }
        AppError::Domain(DomainError::InvariantViolation(_)) => {
            ErrorObjectOwned::owned(code::CORRUPT_STATE, message, None::<()>)
        }
        // Queue can take no more tokens until an operator resets it
        AppError::Domain(DomainError::TokensExhausted(issued)) => ErrorObjectOwned::owned(
            code::SERVICE_UNAVAILABLE,
            message,
            Some(json!({ "total_tokens_issued": issued })),
        ),
        AppError::ServiceNotFound(service_id) => ErrorObjectOwned::owned(
            code::NOT_FOUND,
            message,
            Some(json!({ "service_id": service_id })),
        ),
        AppError::ServiceUnavailable { service_id, reason } => ErrorObjectOwned::owned(
            code::SERVICE_UNAVAILABLE,
            message,
            Some(json!({ "service_id": service_id, "reason": reason })),
        ),
        AppError::AlreadyInQueue {
            service_id,
            member_id,
            token,
        } => ErrorObjectOwned::owned(
            code::CONFLICT,
            message,
            Some(json!({ "service_id": service_id, "member_id": member_id, "token": token })),
        ),
        AppError::Conflict(_) => ErrorObjectOwned::owned(code::CONFLICT, message, None::<()>),
        AppError::StorageUnavailable(_) => {
            ErrorObjectOwned::owned(code::STORAGE_ERROR, message, None::<()>)
        }
        AppError::CorruptState { service_id, .. } => ErrorObjectOwned::owned(
            code::CORRUPT_STATE,
            message,
            Some(json!({ "service_id": service_id })),
        ),
        AppError::Config(_) | AppError::Internal(_) => {
            ErrorObjectOwned::owned(code::INTERNAL_ERROR, message, None::<()>)
        }
    }
}

/// Error returned when the rate limiter rejects a call
pub fn throttled() -> ErrorObjectOwned {
    ErrorObjectOwned::owned(
        code::THROTTLED,
        "Rate limit exceeded. Please slow down.",
        None::<()>,
    )
}

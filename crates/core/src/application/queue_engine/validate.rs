// Request validation (boundary checks before touching storage)

use crate::domain::ANONYMOUS_DISPLAY_NAME;
use crate::error::{AppError, Result};

pub const MAX_SERVICE_ID_LEN: usize = 64;
pub const MAX_MEMBER_ID_LEN: usize = 128;
pub const MAX_DISPLAY_NAME_LEN: usize = 100;

pub fn validate_service_id(service_id: &str) -> Result<()> {
    if service_id.is_empty() {
        return Err(AppError::Validation("service id cannot be empty".to_string()));
    }

    if service_id.len() > MAX_SERVICE_ID_LEN {
        return Err(AppError::Validation(format!(
            "service id too long (max {} chars)",
            MAX_SERVICE_ID_LEN
        )));
    }

    if !service_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::Validation(
            "service id must be alphanumeric, '-' or '_'".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_member_id(member_id: &str) -> Result<()> {
    if member_id.trim().is_empty() {
        return Err(AppError::Validation("member id cannot be empty".to_string()));
    }

    if member_id.len() > MAX_MEMBER_ID_LEN {
        return Err(AppError::Validation(format!(
            "member id too long (max {} chars)",
            MAX_MEMBER_ID_LEN
        )));
    }

    Ok(())
}

/// Trim, cap and default a display name
pub fn normalize_display_name(display_name: &str) -> String {
    let trimmed = display_name.trim();
    if trimmed.is_empty() {
        return ANONYMOUS_DISPLAY_NAME.to_string();
    }
    trimmed.chars().take(MAX_DISPLAY_NAME_LEN).collect()
}

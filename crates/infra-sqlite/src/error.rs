// sqlx::Error -> AppError
//
// Orphan rules prevent `impl From<sqlx::Error> for AppError` here, so every
// query maps through this helper.

use tokenline_core::error::AppError;

/// Convert sqlx::Error to AppError with structured information
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                let code_str = code.as_ref();

                // SQLite error codes: https://www.sqlite.org/rescode.html
                match code_str {
                    "2067" | "1555" => AppError::StorageUnavailable(format!(
                        "Unique constraint violation: {} ({})",
                        db_err.message(),
                        code_str
                    )),
                    "275" => AppError::StorageUnavailable(format!(
                        "Check constraint violation: {} ({})",
                        db_err.message(),
                        code_str
                    )),
                    "5" => AppError::StorageUnavailable(format!(
                        "Database locked (SQLITE_BUSY): {}",
                        db_err.message()
                    )),
                    "6" => AppError::StorageUnavailable(format!(
                        "Table locked (SQLITE_LOCKED): {}",
                        db_err.message()
                    )),
                    "13" => {
                        AppError::StorageUnavailable(format!("Database full: {}", db_err.message()))
                    }
                    _ => AppError::StorageUnavailable(format!(
                        "Database error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            } else {
                AppError::StorageUnavailable(format!("Database error: {}", db_err.message()))
            }
        }
        sqlx::Error::RowNotFound => AppError::StorageUnavailable("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => {
            AppError::StorageUnavailable(format!("Column not found: {}", col))
        }
        sqlx::Error::PoolTimedOut => {
            AppError::StorageUnavailable("Timed out waiting for a connection".to_string())
        }
        // Connection, pool, protocol errors
        _ => AppError::StorageUnavailable(err.to_string()),
    }
}

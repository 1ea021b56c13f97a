// sqlx::Error -> DispatchError

use switchboard_core::error::DispatchError;

/// Convert sqlx::Error to DispatchError with structured information
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> DispatchError {
    match &err {
        sqlx::Error::Database(db_err) => match db_err.code() {
            // SQLite error codes: https://www.sqlite.org/rescode.html
            Some(code) => match code.as_ref() {
                "2067" | "1555" => DispatchError::Database(format!(
                    "Unique constraint violation: {} ({})",
                    db_err.message(),
                    code
                )),
                "787" | "3850" => DispatchError::Database(format!(
                    "Foreign key constraint violation: {} ({})",
                    db_err.message(),
                    code
                )),
                "5" => DispatchError::Database(format!(
                    "Database locked (SQLITE_BUSY): {}",
                    db_err.message()
                )),
                other => DispatchError::Database(format!(
                    "Database error [{}]: {}",
                    other,
                    db_err.message()
                )),
            },
            None => DispatchError::Database(format!("Database error: {}", db_err.message())),
        },
        sqlx::Error::RowNotFound => DispatchError::Database("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => {
            DispatchError::Database(format!("Column not found: {}", col))
        }
        // Connection, pool, protocol errors
        _ => DispatchError::Database(err.to_string()),
    }
}

//! SQL driver error conversion.

use kc_federation::FederationError;
use sqlx::Error as SqlxError;

/// SQLSTATE classes that mean the server or the link to it is gone:
/// connection exception, insufficient resources, operator intervention.
const UNAVAILABLE_SQLSTATE_CLASSES: &[&str] = &["08", "53", "57"];

/// Converts a `SQLx` error to a federation error.
///
/// Connectivity failures become `StorageUnavailable`; statements the server
/// rejected and rows that could not be decoded become `Query`. The driver's
/// message is kept.
#[allow(clippy::needless_pass_by_value)]
pub fn from_sqlx_error(err: SqlxError) -> FederationError {
    match err {
        SqlxError::Database(db_err) => {
            if db_err.code().is_some_and(|code| is_unavailable_sqlstate(&code)) {
                FederationError::unavailable(db_err.to_string())
            } else {
                FederationError::query(db_err.to_string())
            }
        }
        SqlxError::Configuration(_) => FederationError::config(err.to_string()),
        SqlxError::RowNotFound
        | SqlxError::ColumnNotFound(_)
        | SqlxError::ColumnIndexOutOfBounds { .. }
        | SqlxError::ColumnDecode { .. }
        | SqlxError::Decode(_)
        | SqlxError::TypeNotFound { .. } => FederationError::query(err.to_string()),
        SqlxError::PoolTimedOut => FederationError::unavailable("Connection pool timeout"),
        SqlxError::PoolClosed => FederationError::unavailable("Connection pool closed"),
        _ => FederationError::unavailable(err.to_string()),
    }
}

fn is_unavailable_sqlstate(code: &str) -> bool {
    UNAVAILABLE_SQLSTATE_CLASSES
        .iter()
        .any(|class| code.starts_with(class))
}

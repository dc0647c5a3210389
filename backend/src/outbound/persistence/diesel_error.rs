//! Shared Diesel and pool error classification for the repositories.
//!
//! Each repository maps a [`DieselFailure`] into its own port error enum, so
//! the variant analysis of `diesel::result::Error` lives in one place.

use tracing::debug;

use super::pool::PoolError;

/// Infrastructure failure classes the repositories care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DieselFailure {
    /// The connection dropped or could not be established.
    Connection(String),
    /// A unique constraint rejected the write.
    UniqueViolation(String),
    /// A foreign key constraint rejected the write.
    ForeignKeyViolation(String),
    /// Any other query failure.
    Query(String),
}

/// Collapse pool errors into a repository connection error constructor.
pub(crate) fn map_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Classify a Diesel error into the failure classes above.
pub(crate) fn classify_diesel_error(error: diesel::result::Error) -> DieselFailure {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            DieselFailure::Connection("database connection error".to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            DieselFailure::UniqueViolation(info.message().to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            DieselFailure::ForeignKeyViolation(info.message().to_owned())
        }
        DieselError::NotFound => DieselFailure::Query("record not found".to_owned()),
        DieselError::QueryBuilderError(_) => {
            DieselFailure::Query("database query error".to_owned())
        }
        _ => DieselFailure::Query("database error".to_owned()),
    }
}

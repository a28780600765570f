//! Data-layer error types.
//!
//! All adapter operations return [`DbError`] on failure, which can be matched
//! to determine the underlying cause (connection, query, exhausted init).

use thiserror::Error;

/// Errors that can occur in the data layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// Failed to establish or acquire a connection.
    #[error("connection error: {0}")]
    Connection(String),

    /// A statement or document operation failed.
    ///
    /// Never retried automatically; always surfaced to the immediate caller.
    #[error("query error: {0}")]
    Query(String),

    /// Schema initialization gave up after exhausting its retry budget.
    ///
    /// Carries the final attempt's error, not an earlier one.
    #[error("initialization failed after {attempts} attempts")]
    InitExhausted {
        attempts: u32,
        #[source]
        last: Box<DbError>,
    },

    /// An item identifier could not be parsed for the active engine.
    #[error("invalid item id: {0}")]
    InvalidId(String),
}

impl DbError {
    /// Classify a driver error raised while connecting.
    pub fn connection(err: impl std::fmt::Display) -> Self {
        Self::Connection(err.to_string())
    }

    /// Classify a driver error raised while executing.
    pub fn query(err: impl std::fmt::Display) -> Self {
        Self::Query(err.to_string())
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        // Pool acquisition failures are connection problems; everything else
        // that reaches us through an execute/fetch call is a query problem.
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::Connection(err.to_string())
            }
            other => Self::Query(other.to_string()),
        }
    }
}

impl From<mongodb::error::Error> for DbError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::ErrorKind;

        // Server-selection and transport failures are connection problems;
        // anything else surfaced by an operation is a query problem.
        match err.kind.as_ref() {
            ErrorKind::Io(_)
            | ErrorKind::ServerSelection { .. }
            | ErrorKind::DnsResolve { .. }
            | ErrorKind::ConnectionPoolCleared { .. }
            | ErrorKind::Authentication { .. } => Self::Connection(err.to_string()),
            _ => Self::Query(err.to_string()),
        }
    }
}

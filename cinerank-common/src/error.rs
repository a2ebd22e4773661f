//! Common error types for cinerank

use thiserror::Error;

/// Common result type for cinerank operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors shared across the cinerank crates
///
/// Persistence failures are deliberately non-fatal for the session: the
/// engine keeps its optimistic in-memory state and only logs the error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Item or partition the caller named does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rejected at the boundary; no state change occurred
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

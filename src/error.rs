//! Error types for the floodgate limiter.

use thiserror::Error;

/// Main error type for floodgate operations.
///
/// Every error is local and synchronous: it is returned to the caller of the
/// failing call and never retried internally. A failing mutation leaves the
/// limiter untouched.
#[derive(Error, Debug)]
pub enum FloodgateError {
    /// A region with this name is already registered.
    #[error("Region '{0}' already exists")]
    RegionExists(String),

    /// The named region has not been registered.
    #[error("Unknown region '{0}'")]
    RegionNotFound(String),

    /// The limiter has been stopped; mutating calls are no longer accepted.
    #[error("Limiter has been stopped")]
    Stopped,

    /// The region owns a zero-period rate whose one-time budget is spent.
    /// No future tick can free it, so the task is rejected rather than
    /// queued forever.
    #[error("No more admissions are allowed for region '{0}'")]
    RegionExhausted(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for floodgate operations.
pub type Result<T> = std::result::Result<T, FloodgateError>;

//! Error handling types and utilities.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A specialized Result type for application-level operations.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` in configuration loading and the binary.
pub type Result<T> = anyhow::Result<T>;

/// Failure to obtain a fresh corpus from the remote issue source.
///
/// Returned by the cache's refresh paths. The existing snapshot is never
/// modified when one of these is produced.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The remote source did not answer within the configured timeout.
    #[error("issue source did not respond within {0:?}")]
    Timeout(Duration),

    /// Connection, TLS or authentication failure.
    #[error("issue source unreachable: {0}")]
    Transport(String),

    /// The source answered with a non-success status.
    #[error("issue source returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The source answered with data that could not be decoded.
    #[error("issue source returned malformed data: {0}")]
    Malformed(String),

    /// The task doing the work was cancelled, usually by runtime shutdown.
    #[error("request was cancelled before it completed")]
    Cancelled,

    /// The fetched corpus could not be persisted to the local snapshot.
    #[error("failed to write snapshot {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A caller handed the engine input it cannot work with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInput {
    #[error("query text is empty")]
    EmptyQuery,

    #[error("threshold must be a finite number in [0, 1], got {0}")]
    Threshold(f64),
}

//! Sync error taxonomy.

use thiserror::Error;

/// Errors surfaced by the sync engine and its HTTP components.
///
/// `Transport` and `Protocol` are never fatal to the poll loop; the engine
/// retries them with backoff and a fixed delay respectively. The only hard
/// failure is a bootstrap error returned from `SyncEngine::start`.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Connection, DNS, or timeout failure talking to the admin server.
    #[error("transport error: {0}")]
    Transport(String),

    /// The admin server returned a malformed body or a non-success code.
    #[error("protocol error (code {code}): {message}")]
    Protocol { code: i64, message: String },

    /// `start()` was called while the engine is already running.
    #[error("sync engine is already running")]
    AlreadyRunning,
}

impl SyncError {
    /// Classify a reqwest failure that occurred while sending a request.
    pub(crate) fn transport(err: reqwest::Error) -> Self {
        SyncError::Transport(err.to_string())
    }

    /// A response body that could not be decoded into the expected shape.
    pub(crate) fn malformed(detail: impl std::fmt::Display) -> Self {
        SyncError::Protocol {
            code: -1,
            message: format!("malformed response: {}", detail),
        }
    }
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

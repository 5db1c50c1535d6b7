//! Unified error types for frost.
//!
//! Every variant renders with a stable upper-case code prefix so the host
//! surface and the logs agree on failure classes.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the offline resource cache.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., unknown request method).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A manifest URL could not be retrieved during install.
    #[error("MANIFEST_FETCH_FAILED: {url}: {reason}")]
    ManifestFetchFailed { url: String, reason: String },

    /// Writing a response to the persistent store failed.
    #[error("STORE_WRITE_FAILED: {0}")]
    StoreWriteFailed(String),

    /// Network fetch failed.
    #[error("NETWORK_FAILURE: {0}")]
    NetworkFailure(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Deleting a superseded generation failed.
    #[error("STALE_GENERATION_DELETE_FAILED: {version}: {reason}")]
    StaleGenerationDeleteFailed { version: String, reason: String },

    /// The generation has not completed install.
    #[error("GENERATION_NOT_READY: {0}")]
    GenerationNotReady(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::StoreWriteFailed(format!("serialization error: {err}"))
    }
}

impl Error {
    /// Whether no response arrived from the network.
    ///
    /// Only these failures qualify a navigation for the entry point fallback.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::NetworkFailure(_) | Error::FetchTimeout(_) | Error::FetchTooLarge(_))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::FetchTimeout(msg) => (-32006, msg.clone()),
            Error::FetchTooLarge(msg) => (-32007, msg.clone()),
            Error::ManifestFetchFailed { .. } => (-32020, err.to_string()),
            Error::StoreWriteFailed(msg) => (-32021, msg.clone()),
            Error::NetworkFailure(msg) => (-32022, msg.clone()),
            Error::StaleGenerationDeleteFailed { .. } => (-32023, err.to_string()),
            Error::GenerationNotReady(version) => (-32024, format!("generation {version} is not installed")),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

//! Endpoint Error Types

use std::path::PathBuf;

/// Failures talking to a Tenable product or staging its files.
/// All of them are recoverable at the selector, file or endpoint level.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// Most recent run is not completed or too old; a skip, not a failure
    #[error("scan {selector} skipped: {reason}")]
    Ineligible { selector: String, reason: String },

    /// The product accepted the export request but no file materialized
    #[error("failed to export scan {selector}: {message}")]
    ExportFailed { selector: String, message: String },

    #[error("{operation} timed out")]
    Timeout { operation: String },

    #[error("{operation} failed: {source}")]
    Http {
        operation: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} returned HTTP {status}: {body}")]
    Status {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("{operation} returned error {code}: {message}")]
    Api {
        operation: String,
        code: i64,
        message: String,
    },

    #[error("{operation} returned an unexpected response: {source}")]
    Decode {
        operation: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{operation} on {}: {source}", .path.display())]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to read archive {}: {message}", .path.display())]
    Archive { path: PathBuf, message: String },

    #[error("unable to build HTTP client: {message}")]
    Client { message: String },

    #[error(transparent)]
    Staging(#[from] crate::staging::StagingError),
}

impl EndpointError {
    /// Wrap a transport error, promoting timeouts to their own variant
    pub fn from_transport(operation: impl Into<String>, source: reqwest::Error) -> Self {
        let operation = operation.into();
        if source.is_timeout() {
            EndpointError::Timeout { operation }
        } else {
            EndpointError::Http { operation, source }
        }
    }

    pub fn io(operation: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EndpointError::Io {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// True for the expected "nothing new to transfer" outcome
    pub fn is_skip(&self) -> bool {
        matches!(self, EndpointError::Ineligible { .. })
    }
}

pub type EndpointResult<T> = Result<T, EndpointError>;

//! Error types for requests against the monitoring service.

use thiserror::Error;

/// Broad classification of a [`FetchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request did not produce a successful response.
    Transport,
    /// A response arrived but its body was not the expected JSON.
    Decode,
}

/// Errors that can occur when fetching from the monitoring service.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Connection could not be established.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// HTTP request failed for another transport reason.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The service answered with a non-2xx status.
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// The caller cancelled the request.
    #[error("Request cancelled")]
    Cancelled,

    /// Response body was not valid JSON or did not match the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Classify this error as a transport or decode failure.
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Decode(_) => FailureKind::Decode,
            _ => FailureKind::Transport,
        }
    }

    pub fn is_transport(&self) -> bool {
        self.kind() == FailureKind::Transport
    }

    pub fn is_decode(&self) -> bool {
        self.kind() == FailureKind::Decode
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connection(err.to_string())
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}

//! The `error` module defines the error types used within `popfeed`.
//!
//! Every failure is local to the component that detects it. Only
//! [`TransportError`] is surfaced to a caller; the stream errors are logged by
//! the feed layer and [`CloseError`] is swallowed during a resync.

use thiserror::Error;

/// Failure of a request/response call against the backend (topic directory
/// fetch or message write).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid backend url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request to backend failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("backend responded with status {0}")]
    Status(u16),

    #[error("malformed response body: {0}")]
    Decode(String),
}

/// An inbound stream payload that could not be turned into a `FeedEvent`.
#[derive(Debug, Error)]
pub enum StreamDecodeError {
    #[error("event is not valid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("event is missing field `{0}`")]
    MissingField(&'static str),

    #[error("unparsable created timestamp `{0}`")]
    BadTimestamp(String),
}

/// Connection-level failure of the streaming transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StreamTransportError {
    #[error("could not connect to stream endpoint: {0}")]
    Connect(String),

    #[error("stream endpoint responded with status {0}")]
    Status(u16),

    #[error("stream interrupted: {0}")]
    Stream(String),

    #[error("stream ended by server")]
    Ended,
}

impl StreamTransportError {
    /// Whether the transport gives up on this connection for good. A rejected
    /// request is final; dropped or interrupted streams are retried.
    pub fn is_permanent(&self) -> bool {
        matches!(self, StreamTransportError::Status(_))
    }
}

/// Failure while tearing down a stale connection.
#[derive(Debug, Error)]
#[error("failed to close connection {id}: {reason}")]
pub struct CloseError {
    pub id: String,
    pub reason: String,
}

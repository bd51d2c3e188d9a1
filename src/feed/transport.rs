//! The boundary between the feed and whatever carries the stream.
//!
//! A transport opens a connection for a fully built stream URL and reports
//! back through a channel of [`StreamSignal`]s tagged with the connection id,
//! so the feed can tell a live connection's traffic from a stale one's.

use tokio::sync::mpsc::UnboundedSender;
use url::Url;
use uuid::Uuid;

use crate::utils::error::{CloseError, StreamTransportError};

pub type ConnectionId = Uuid;

pub type SignalSender = UnboundedSender<StreamSignal>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Open,
    Closed,
    Failed,
}

/// Something a transport observed on one of its connections.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamSignal {
    /// The server accepted the stream request.
    Opened { id: ConnectionId },
    /// One dispatched stream message, still undecoded.
    Message { id: ConnectionId, data: String },
    /// The connection failed or was interrupted.
    Error {
        id: ConnectionId,
        error: StreamTransportError,
    },
}

impl StreamSignal {
    pub fn connection_id(&self) -> ConnectionId {
        match self {
            StreamSignal::Opened { id }
            | StreamSignal::Message { id, .. }
            | StreamSignal::Error { id, .. } => *id,
        }
    }
}

/// Opens streaming connections. Reconnecting after interruptions is the
/// transport's own business.
pub trait StreamTransport {
    type Handle: StreamHandle;

    /// Starts connecting to `url` and returns immediately. Everything the
    /// connection observes is sent to `signals` tagged with `id`.
    fn open(&self, id: ConnectionId, url: Url, signals: SignalSender) -> Self::Handle;
}

pub trait StreamHandle {
    /// Stops the connection. Must be valid while still connecting, after it
    /// opened, and after it already failed.
    fn close(&mut self) -> Result<(), CloseError>;
}

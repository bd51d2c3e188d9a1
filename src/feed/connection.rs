use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

use crate::feed::buffer::FeedBuffer;
use crate::feed::event::FeedEvent;
use crate::feed::transport::{
    ConnectionId, ConnectionStatus, SignalSender, StreamHandle, StreamSignal, StreamTransport,
};
use crate::subscription::Topic;
use crate::utils::error::StreamTransportError;

/// Characters left unescaped in a filter value, matching what browsers do
/// for a URI component.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Builds the stream filter for a snapshot: one `topic=` parameter per topic,
/// percent-encoded, joined by `&`.
pub fn build_filter(snapshot: &[Topic]) -> String {
    snapshot
        .iter()
        .map(|topic| format!("topic={}", utf8_percent_encode(topic, COMPONENT)))
        .collect::<Vec<_>>()
        .join("&")
}

/// What handling a transport signal amounted to.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalOutcome {
    /// The signal belonged to a connection that is no longer live.
    Ignored,
    /// The live connection reached OPEN for the first time.
    Opened,
    /// An event was decoded and inserted into the buffer.
    Inserted(FeedEvent),
    /// The payload was malformed and dropped.
    Dropped,
    /// The live connection reported a transport failure.
    Failed(StreamTransportError),
}

struct LiveConnection<H> {
    id: ConnectionId,
    snapshot: Vec<Topic>,
    filter: String,
    status: ConnectionStatus,
    handle: H,
}

/// Owns the single streaming connection of a feed view.
///
/// `resync` always closes the current connection before opening the next, so
/// no two connections are ever live at once.
pub struct FeedConnection<T: StreamTransport> {
    transport: T,
    endpoint: Url,
    signals: SignalSender,
    live: Option<LiveConnection<T::Handle>>,
}

impl<T: StreamTransport> FeedConnection<T> {
    /// Creates an idle connection for `endpoint` (the `/sse` URL without a
    /// query). The returned receiver yields every signal the transport emits.
    pub fn new(transport: T, endpoint: Url) -> (Self, UnboundedReceiver<StreamSignal>) {
        let (signals, rx) = mpsc::unbounded_channel();
        let connection = Self {
            transport,
            endpoint,
            signals,
            live: None,
        };
        (connection, rx)
    }

    /// Replaces the live connection with one filtered to `snapshot`, or
    /// leaves none open when `snapshot` is empty.
    pub fn resync(&mut self, snapshot: &[Topic]) {
        self.disconnect();

        if snapshot.is_empty() {
            info!("No topics selected; feed connection stays closed");
            return;
        }

        let filter = build_filter(snapshot);
        let mut url = self.endpoint.clone();
        url.set_query(Some(&filter));

        let id = Uuid::new_v4();
        info!("Opening feed connection {} with filter {}", id, filter);
        let handle = self.transport.open(id, url, self.signals.clone());

        self.live = Some(LiveConnection {
            id,
            snapshot: snapshot.to_vec(),
            filter,
            status: ConnectionStatus::Connecting,
            handle,
        });
    }

    /// Closes the live connection, if any. Close failures are logged and
    /// otherwise ignored.
    pub fn disconnect(&mut self) {
        if let Some(mut stale) = self.live.take() {
            debug!("Closing feed connection {} ({:?})", stale.id, stale.status);
            if let Err(e) = stale.handle.close() {
                warn!("Ignoring error while closing feed connection: {}", e);
            }
        }
    }

    /// Applies one transport signal. Decoded events from the live connection
    /// go into `buffer`; anything from a closed connection is ignored.
    pub fn handle_signal(&mut self, signal: StreamSignal, buffer: &mut FeedBuffer) -> SignalOutcome {
        let Some(live) = self
            .live
            .as_mut()
            .filter(|live| live.id == signal.connection_id())
        else {
            debug!(
                "Ignoring signal from stale connection {}",
                signal.connection_id()
            );
            return SignalOutcome::Ignored;
        };

        match signal {
            StreamSignal::Opened { id } => match live.status {
                ConnectionStatus::Connecting => {
                    info!("Feed connection {} is open", id);
                    live.status = ConnectionStatus::Open;
                    SignalOutcome::Opened
                }
                // A failed connection stays failed until the next resync,
                // even if the transport managed to reconnect.
                _ => {
                    debug!("Feed connection {} reconnected", id);
                    SignalOutcome::Ignored
                }
            },
            StreamSignal::Message { data, .. } => match FeedEvent::decode(&data) {
                Ok(event) => {
                    buffer.insert(event.clone());
                    SignalOutcome::Inserted(event)
                }
                Err(e) => {
                    warn!("Dropping malformed feed event: {} | {}", e, data);
                    SignalOutcome::Dropped
                }
            },
            StreamSignal::Error { id, error } => {
                error!("Feed connection {} failed: {}", id, error);
                live.status = ConnectionStatus::Failed;
                SignalOutcome::Failed(error)
            }
        }
    }

    /// Status of the live connection, or `Closed` when there is none.
    pub fn status(&self) -> ConnectionStatus {
        self.live
            .as_ref()
            .map_or(ConnectionStatus::Closed, |live| live.status)
    }

    /// Whether a connection handle is currently held, whatever its status.
    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }

    /// Id of the live connection; signals carrying any other id are ignored.
    pub fn live_id(&self) -> Option<ConnectionId> {
        self.live.as_ref().map(|live| live.id)
    }

    /// The snapshot the live connection was opened with.
    pub fn snapshot(&self) -> Option<&[Topic]> {
        self.live.as_ref().map(|live| live.snapshot.as_slice())
    }

    /// The encoded topic filter the live connection was opened with.
    pub fn filter(&self) -> Option<&str> {
        self.live.as_ref().map(|live| live.filter.as_str())
    }
}

impl<T: StreamTransport> Drop for FeedConnection<T> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

//! The `feed` module turns a topic selection into a live, bounded feed.
//!
//! - `event`: the decoded `FeedEvent` and its wire format.
//! - `buffer`: the newest-first, capacity-bounded display buffer.
//! - `transport`: the seam between the feed and a concrete streaming transport.
//! - `connection`: owns at most one live stream and resynchronizes it.
//! - `sse`: a Server-Sent Events transport over `reqwest`.

pub mod buffer;
pub mod connection;
pub mod event;
pub mod sse;
pub mod transport;

pub use buffer::FeedBuffer;
pub use connection::{FeedConnection, SignalOutcome, build_filter};
pub use event::FeedEvent;
pub use transport::{ConnectionId, ConnectionStatus, StreamHandle, StreamSignal, StreamTransport};

#[cfg(test)]
pub(crate) mod mock;
#[cfg(test)]
mod tests;

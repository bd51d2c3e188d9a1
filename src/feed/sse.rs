//! Server-Sent Events transport
//!
//! Streams `text/event-stream` responses with `reqwest` and reports them as
//! [`StreamSignal`]s. Responsibilities:
//! - Frame the byte stream into events (`data:`, `event:`, `id:`, `retry:`)
//! - Dispatch only default `message` events, skipping `:` keep-alive comments
//! - Reconnect after interruptions, resuming with `Last-Event-ID`
//! - Give up for good when the server rejects the request
//!
//! Signals are forwarded without decoding; turning them into feed events is
//! the feed connection's job.

use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use crate::feed::transport::{
    ConnectionId, SignalSender, StreamHandle, StreamSignal, StreamTransport,
};
use crate::utils::error::{CloseError, StreamTransportError};

/// One dispatched block of an event stream.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: Option<String>,
    pub id: Option<String>,
    pub retry: Option<u64>,
}

impl SseFrame {
    /// Whether an EventSource would deliver this frame to its `message` listener.
    pub fn is_message(&self) -> bool {
        self.data.is_some() && self.event.as_deref().is_none_or(|e| e == "message")
    }
}

/// Longest partial line kept while waiting for its newline.
const MAX_PENDING_LINE: usize = 1024 * 1024;

/// Incremental event-stream framer. Bytes may be pushed in arbitrary chunks;
/// a frame is emitted at every blank line that ends a non-empty block.
#[derive(Debug, Default)]
pub struct SseParser {
    pending: Vec<u8>,
    current: SseFrame,
    touched: bool,
}

impl SseParser {
    /// Creates a parser with nothing buffered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the next chunk and returns the frames it completed. A trailing
    /// partial line is kept for the next call, up to `MAX_PENDING_LINE` bytes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        let mut pending = std::mem::take(&mut self.pending);
        pending.extend_from_slice(chunk);
        let mut frames = Vec::new();

        let mut start = 0;
        while let Some(offset) = pending[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            let mut line = &pending[start..end];
            if line.last() == Some(&b'\r') {
                line = &line[..line.len() - 1];
            }
            if let Some(frame) = self.feed_line(&String::from_utf8_lossy(line)) {
                frames.push(frame);
            }
            start = end + 1;
        }
        pending.drain(..start);

        if pending.len() > MAX_PENDING_LINE {
            warn!(
                "Discarding {} bytes of an unterminated stream line",
                pending.len()
            );
            pending.clear();
        }
        self.pending = pending;

        frames
    }

    fn feed_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            if !self.touched {
                return None;
            }
            self.touched = false;
            return Some(std::mem::take(&mut self.current));
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => {
                let data = self.current.data.get_or_insert_with(String::new);
                if !data.is_empty() {
                    data.push('\n');
                }
                data.push_str(value);
            }
            "event" => self.current.event = Some(value.to_string()),
            "id" => self.current.id = Some(value.to_string()),
            "retry" => match value.parse() {
                Ok(ms) => self.current.retry = Some(ms),
                Err(_) => return None,
            },
            _ => return None,
        }
        self.touched = true;
        None
    }
}

/// Streams events over HTTP and reconnects after interruptions.
#[derive(Debug, Clone)]
pub struct SseTransport {
    client: reqwest::Client,
    retry: Duration,
}

impl SseTransport {
    /// Creates a transport with its own HTTP client, reconnecting after `retry`.
    pub fn new(retry: Duration) -> Self {
        Self::with_client(reqwest::Client::new(), retry)
    }

    /// Creates a transport sharing an existing HTTP client.
    pub fn with_client(client: reqwest::Client, retry: Duration) -> Self {
        Self { client, retry }
    }
}

/// Handle to a running stream task. Dropping it stops the task.
#[derive(Debug)]
pub struct SseHandle {
    id: ConnectionId,
    task: JoinHandle<()>,
}

impl StreamTransport for SseTransport {
    type Handle = SseHandle;

    /// Spawns the stream task; must be called from within a Tokio runtime.
    fn open(&self, id: ConnectionId, url: Url, signals: SignalSender) -> SseHandle {
        let task = tokio::spawn(run_stream(
            self.client.clone(),
            id,
            url,
            signals,
            self.retry,
        ));
        SseHandle { id, task }
    }
}

impl StreamHandle for SseHandle {
    fn close(&mut self) -> Result<(), CloseError> {
        if !self.task.is_finished() {
            debug!("Stopping stream task for {}", self.id);
        }
        self.task.abort();
        Ok(())
    }
}

impl Drop for SseHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_stream(
    client: reqwest::Client,
    id: ConnectionId,
    url: Url,
    signals: SignalSender,
    mut retry: Duration,
) {
    let mut last_event_id: Option<String> = None;

    loop {
        let error = match stream_once(&client, id, &url, &signals, &mut last_event_id, &mut retry)
            .await
        {
            Ok(()) => StreamTransportError::Ended,
            Err(e) => e,
        };
        let permanent = error.is_permanent();

        if signals.send(StreamSignal::Error { id, error }).is_err() || permanent {
            return;
        }

        warn!("Stream {} interrupted; reconnecting in {:?}", id, retry);
        tokio::time::sleep(retry).await;
    }
}

async fn stream_once(
    client: &reqwest::Client,
    id: ConnectionId,
    url: &Url,
    signals: &SignalSender,
    last_event_id: &mut Option<String>,
    retry: &mut Duration,
) -> Result<(), StreamTransportError> {
    let mut request = client
        .get(url.clone())
        .header(ACCEPT, "text/event-stream")
        .header(CACHE_CONTROL, "no-cache");
    if let Some(last) = last_event_id.as_deref() {
        request = request.header("Last-Event-ID", last);
    }

    let response = request
        .send()
        .await
        .map_err(|e| StreamTransportError::Connect(e.to_string()))?;
    if !response.status().is_success() {
        return Err(StreamTransportError::Status(response.status().as_u16()));
    }

    let _ = signals.send(StreamSignal::Opened { id });

    let mut parser = SseParser::new();
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| StreamTransportError::Stream(e.to_string()))?;
        for frame in parser.push(&chunk) {
            if let Some(ms) = frame.retry {
                *retry = Duration::from_millis(ms);
            }
            if let Some(event_id) = frame.id.as_ref() {
                *last_event_id = Some(event_id.clone());
            }
            if !frame.is_message() {
                continue;
            }
            if let Some(data) = frame.data {
                let _ = signals.send(StreamSignal::Message { id, data });
            }
        }
    }

    Ok(())
}

//! In-memory transport that records every connection it opens and checks
//! that no connection was still live when the next one was opened.

use std::sync::{Arc, Mutex};

use url::Url;

use crate::feed::transport::{ConnectionId, SignalSender, StreamHandle, StreamTransport};
use crate::utils::error::CloseError;

#[derive(Debug, Clone)]
pub struct OpenRecord {
    pub id: ConnectionId,
    pub url: Url,
    pub closed: bool,
    pub signals: SignalSender,
}

#[derive(Debug, Default)]
struct MockState {
    opened: Vec<OpenRecord>,
    live_at_open: Vec<usize>,
    fail_close: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

pub struct MockHandle {
    id: ConnectionId,
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent close report an error after tearing down.
    pub fn fail_closes(&self) {
        self.state.lock().unwrap().fail_close = true;
    }

    pub fn opened(&self) -> Vec<OpenRecord> {
        self.state.lock().unwrap().opened.clone()
    }

    /// The most recently opened connection, as the transport would see it.
    pub fn last_opened(&self) -> Option<OpenRecord> {
        self.state.lock().unwrap().opened.last().cloned()
    }

    pub fn live_count(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .opened
            .iter()
            .filter(|r| !r.closed)
            .count()
    }

    /// Largest number of never-closed handles seen right before an open.
    pub fn max_live_at_open(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .live_at_open
            .iter()
            .copied()
            .max()
            .unwrap_or(0)
    }
}

impl StreamTransport for MockTransport {
    type Handle = MockHandle;

    fn open(&self, id: ConnectionId, url: Url, signals: SignalSender) -> MockHandle {
        let mut state = self.state.lock().unwrap();
        let live = state.opened.iter().filter(|r| !r.closed).count();
        state.live_at_open.push(live);
        state.opened.push(OpenRecord {
            id,
            url,
            closed: false,
            signals,
        });
        MockHandle {
            id,
            state: self.state.clone(),
        }
    }
}

impl StreamHandle for MockHandle {
    fn close(&mut self) -> Result<(), CloseError> {
        let mut state = self.state.lock().unwrap();
        if let Some(record) = state.opened.iter_mut().find(|r| r.id == self.id) {
            record.closed = true;
        }
        if state.fail_close {
            return Err(CloseError {
                id: self.id.to_string(),
                reason: "transport already broken".to_string(),
            });
        }
        Ok(())
    }
}

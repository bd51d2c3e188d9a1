use std::collections::VecDeque;

use crate::feed::event::FeedEvent;

/// Newest-first display buffer holding at most `capacity` events.
///
/// Events are inserted at the front and evicted from the back. Duplicates
/// are kept, so a duplicated delivery shows up as two entries.
#[derive(Debug, Clone)]
pub struct FeedBuffer {
    events: VecDeque<FeedEvent>,
    capacity: usize,
}

impl FeedBuffer {
    /// Creates an empty buffer. Storage grows with the events actually held,
    /// not with `capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity,
        }
    }

    /// Prepends `event`, dropping the oldest entries beyond capacity.
    pub fn insert(&mut self, event: FeedEvent) {
        self.events.push_front(event);
        self.events.truncate(self.capacity);
    }

    /// A copy of the current contents, newest first.
    pub fn contents(&self) -> Vec<FeedEvent> {
        self.events.iter().cloned().collect()
    }

    /// Iterates newest first without copying.
    pub fn iter(&self) -> impl Iterator<Item = &FeedEvent> {
        self.events.iter()
    }

    /// Empties the buffer; the capacity is kept.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Number of events currently held.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events are held.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The configured bound, not the allocated storage.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::feed::{
    ConnectionStatus, FeedBuffer, FeedConnection, FeedEvent, SignalOutcome, StreamSignal,
    StreamTransport,
};
use crate::subscription::{SelectionChange, SubscriptionSet, Topic};

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// A topic's selected marker should flip.
    Selection(SelectionChange),
    /// Whether the connection-pending indicator is shown.
    Pending(bool),
    /// A new event was added to the front of the feed.
    FeedUpdated(FeedEvent),
    StatusChanged(ConnectionStatus),
}

/// Requests accepted by [`SubscriptionController::run`].
#[derive(Debug)]
pub enum Command {
    Toggle(Topic),
    ResetFeed,
    Feed(oneshot::Sender<Vec<FeedEvent>>),
    Selected(oneshot::Sender<Vec<Topic>>),
    Shutdown,
}

/// Orchestrates topic selection and the live feed.
///
/// This is the only component that mutates the subscription set or asks the
/// feed connection to resync.
pub struct SubscriptionController<T: StreamTransport> {
    set: SubscriptionSet,
    connection: FeedConnection<T>,
    buffer: FeedBuffer,
    events: UnboundedSender<ControllerEvent>,
    pending: bool,
}

impl<T: StreamTransport> SubscriptionController<T> {
    /// Starts with an empty selection; `connection` should be idle.
    pub fn new(
        connection: FeedConnection<T>,
        buffer: FeedBuffer,
        events: UnboundedSender<ControllerEvent>,
    ) -> Self {
        Self {
            set: SubscriptionSet::new(),
            connection,
            buffer,
            events,
            pending: false,
        }
    }

    /// Toggles `topic` and resyncs the feed to the new selection.
    pub fn on_topic_toggle(&mut self, topic: &str) -> SelectionChange {
        let change = self.set.toggle(topic);
        info!(
            "Topic {} {}",
            change.topic,
            if change.selected { "selected" } else { "deselected" }
        );
        self.emit(ControllerEvent::Selection(change.clone()));

        self.connection.resync(&self.set.snapshot());
        self.emit(ControllerEvent::StatusChanged(self.connection.status()));
        self.set_pending(!self.set.is_empty());

        change
    }

    /// Applies one signal from the transport.
    pub fn handle_signal(&mut self, signal: StreamSignal) {
        match self.connection.handle_signal(signal, &mut self.buffer) {
            SignalOutcome::Opened => {
                self.emit(ControllerEvent::StatusChanged(ConnectionStatus::Open));
                self.set_pending(false);
            }
            SignalOutcome::Inserted(event) => self.emit(ControllerEvent::FeedUpdated(event)),
            SignalOutcome::Failed(_) => {
                self.emit(ControllerEvent::StatusChanged(ConnectionStatus::Failed));
            }
            SignalOutcome::Ignored | SignalOutcome::Dropped => {}
        }
    }

    /// Empties the feed without touching the selection or the connection.
    pub fn reset_feed(&mut self) {
        self.buffer.clear();
    }

    /// The feed, newest first.
    pub fn feed(&self) -> Vec<FeedEvent> {
        self.buffer.contents()
    }

    /// The selected topics in selection order.
    pub fn selected(&self) -> Vec<Topic> {
        self.set.snapshot()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    /// Whether the "connecting" indicator is showing.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn connection(&self) -> &FeedConnection<T> {
        &self.connection
    }

    /// Serves commands and transport signals on the current task until a
    /// `Shutdown` arrives or every command sender is gone. Each command or
    /// signal is handled to completion before the next one is looked at.
    pub async fn run(
        mut self,
        mut commands: UnboundedReceiver<Command>,
        mut signals: UnboundedReceiver<StreamSignal>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Toggle(topic)) => {
                        self.on_topic_toggle(&topic);
                    }
                    Some(Command::ResetFeed) => self.reset_feed(),
                    Some(Command::Feed(reply)) => {
                        let _ = reply.send(self.feed());
                    }
                    Some(Command::Selected(reply)) => {
                        let _ = reply.send(self.selected());
                    }
                    Some(Command::Shutdown) | None => break,
                },
                Some(signal) = signals.recv() => self.handle_signal(signal),
            }
        }

        debug!("Controller stopping; closing feed connection");
        self.connection.disconnect();
        self.emit(ControllerEvent::StatusChanged(ConnectionStatus::Closed));
    }

    fn set_pending(&mut self, pending: bool) {
        if self.pending != pending {
            self.pending = pending;
            self.emit(ControllerEvent::Pending(pending));
        }
    }

    fn emit(&self, event: ControllerEvent) {
        // Nobody listening is fine; the state is still kept here.
        let _ = self.events.send(event);
    }
}

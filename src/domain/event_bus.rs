//! Change feed of the domain store.
//!
//! Every applied store transition publishes one [`StoreEvent`] on the
//! [`EventBus`]. Views either take a raw receiver or a [`StoreFeed`], which
//! turns receiver lag into an explicit [`FeedMessage::Resync`].

use tokio::sync::broadcast::{self, error::RecvError};

use super::StoreEvent;

/// Broadcast bus for [`StoreEvent`]s.
///
/// The ring buffer holds `capacity` events (at least one). A receiver that
/// falls further behind loses the oldest events and must re-read the store.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of receivers that got the event; with no
    /// receivers the event is dropped.
    pub fn publish(&self, event: StoreEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Creates a raw receiver for all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    /// Creates a lag-aware feed of all future events.
    #[must_use]
    pub fn feed(&self) -> StoreFeed {
        StoreFeed {
            rx: self.sender.subscribe(),
        }
    }
}

/// One item read from a [`StoreFeed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedMessage {
    /// A store change.
    Changed(StoreEvent),
    /// The feed fell behind and `missed` events were dropped. Cached view
    /// data should be re-read from the store.
    Resync {
        /// Number of dropped events.
        missed: u64,
    },
}

/// Receiver side of the [`EventBus`] that reports lag instead of failing.
#[derive(Debug)]
pub struct StoreFeed {
    rx: broadcast::Receiver<StoreEvent>,
}

impl StoreFeed {
    /// Waits for the next message. Returns `None` once every bus handle
    /// has been dropped.
    pub async fn next(&mut self) -> Option<FeedMessage> {
        match self.rx.recv().await {
            Ok(event) => Some(FeedMessage::Changed(event)),
            Err(RecvError::Lagged(missed)) => {
                tracing::warn!(missed, "store feed lagged");
                Some(FeedMessage::Resync { missed })
            }
            Err(RecvError::Closed) => None,
        }
    }
}

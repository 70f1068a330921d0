//! Console event types and broadcast bus
//!
//! Load lifecycle and user-facing notices travel over one `EventBus` so a
//! front end (CLI, UI bridge, test) can subscribe without the pipeline
//! knowing who is listening.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Severity of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Console event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ConsoleEvent {
    /// A load pass started fetching
    LoadStarted {
        load_id: Uuid,
        venue_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A load pass replaced the console state
    LoadCompleted {
        load_id: Uuid,
        paper_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// A load pass failed; state was left untouched
    LoadFailed {
        load_id: Uuid,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// A load pass finished after the console closed and was dropped
    LoadDiscarded {
        load_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// User-facing message (toast/flash equivalent)
    Notice {
        level: NoticeLevel,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl ConsoleEvent {
    pub fn notice(level: NoticeLevel, message: impl Into<String>) -> Self {
        ConsoleEvent::Notice {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Broadcast bus for console events
///
/// Cloning shares the underlying channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ConsoleEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<ConsoleEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ConsoleEvent,
    ) -> Result<usize, broadcast::error::SendError<ConsoleEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ConsoleEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

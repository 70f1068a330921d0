//! User-facing notifications
//!
//! The console reports through an injected `Notifier` rather than a global
//! toast/flash facility.

use orc_common::events::{ConsoleEvent, EventBus, NoticeLevel};

pub trait Notifier: Send + Sync {
    /// Show a message to the user
    fn notify(&self, level: NoticeLevel, message: &str);

    /// Load lifecycle event; ignored unless the notifier forwards events
    fn lifecycle(&self, _event: ConsoleEvent) {}
}

/// Writes notices to the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => tracing::info!(notice = %message, "Console notice"),
            NoticeLevel::Warning => tracing::warn!(notice = %message, "Console notice"),
            NoticeLevel::Error => tracing::error!(notice = %message, "Console notice"),
        }
    }

    fn lifecycle(&self, event: ConsoleEvent) {
        tracing::debug!(event = ?event, "Console lifecycle");
    }
}

/// Broadcasts notices and lifecycle events on an `EventBus`
#[derive(Clone)]
pub struct EventBusNotifier {
    bus: EventBus,
}

impl EventBusNotifier {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }
}

impl Notifier for EventBusNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.bus.emit_lossy(ConsoleEvent::notice(level, message));
    }

    fn lifecycle(&self, event: ConsoleEvent) {
        self.bus.emit_lossy(event);
    }
}

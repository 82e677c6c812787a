use std::sync::Arc;

use buddy_core::LogEvent;
use buddy_logging::buddy_warn;

use crate::{EventSink, Notification, NotificationChannel, NoopEventSink};

/// Fans committed events out to live subscribers.
///
/// The durable write happens in the scan commit; everything here is best
/// effort and never retried.
#[derive(Clone)]
pub struct EventLog {
    notifier: Arc<dyn NotificationChannel>,
    sink: Arc<dyn EventSink>,
    broadcast: bool,
}

impl EventLog {
    pub fn new(notifier: Arc<dyn NotificationChannel>) -> Self {
        Self {
            notifier,
            sink: Arc::new(NoopEventSink),
            broadcast: true,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Disables live notifications; the event sink still receives events.
    pub fn with_broadcast(mut self, broadcast: bool) -> Self {
        self.broadcast = broadcast;
        self
    }

    pub fn publish(&self, event: &LogEvent) {
        if self.broadcast {
            let notification = Notification {
                text: event.notification_text().to_string(),
                severity: event.severity,
            };
            if let Err(err) = self.notifier.broadcast(notification) {
                buddy_warn!("Dropping notification for {:?}: {}", event.event_type, err);
            }
        }
        if let Err(err) = self.sink.dispatch(event.event_type, event.message()) {
            buddy_warn!("Event sink rejected {:?}: {}", event.event_type, err);
        }
    }

    pub fn publish_all(&self, events: &[LogEvent]) {
        for event in events {
            self.publish(event);
        }
    }
}

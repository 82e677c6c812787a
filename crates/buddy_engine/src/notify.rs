use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Mutex};

use buddy_core::{EventType, Severity};
use buddy_logging::{buddy_info, buddy_warn};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification channel closed")]
    Closed,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Live notification for scanner displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub text: String,
    pub severity: Severity,
}

/// Fire-and-forget channel to live subscribers.
pub trait NotificationChannel: Send + Sync {
    fn broadcast(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Writes notifications to the diagnostic log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotificationChannel for LogNotifier {
    fn broadcast(&self, notification: Notification) -> Result<(), NotifyError> {
        match notification.severity {
            Severity::Success => buddy_info!("[scan] {}", notification.text),
            Severity::Warning | Severity::Error => {
                buddy_warn!("[scan:{}] {}", notification.severity.code(), notification.text)
            }
        }
        Ok(())
    }
}

/// Forwards notifications to an in-process receiver.
pub struct ChannelNotifier {
    tx: mpsc::Sender<Notification>,
}

impl ChannelNotifier {
    pub fn new(tx: mpsc::Sender<Notification>) -> Self {
        Self { tx }
    }
}

impl NotificationChannel for ChannelNotifier {
    fn broadcast(&self, notification: Notification) -> Result<(), NotifyError> {
        self.tx.send(notification).map_err(|_| NotifyError::Closed)
    }
}

/// Receives every processed event, e.g. to trigger home automation.
pub trait EventSink: Send + Sync {
    fn dispatch(&self, event_type: EventType, message: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn dispatch(&self, _event_type: EventType, _message: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}

#[derive(Serialize)]
struct EventLine<'a> {
    event_type: i32,
    message: &'a str,
}

/// Appends each event as one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesEventSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesEventSink {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, NotifyError> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for JsonLinesEventSink {
    fn dispatch(&self, event_type: EventType, message: &str) -> Result<(), NotifyError> {
        let mut line = serde_json::to_string(&EventLine {
            event_type: event_type.code(),
            message,
        })?;
        line.push('\n');
        let mut file = self
            .file
            .lock()
            .map_err(|_| NotifyError::Io(io::Error::other("event sink lock poisoned")))?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

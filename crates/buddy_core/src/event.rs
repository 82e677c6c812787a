use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event types forwarded to event receivers, with their stable numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    Error,
    ModeChange,
    Consume,
    ConsumeSpoiled,
    Purchase,
    Open,
    Inventory,
    ChoreExecuted,
    AddKnownBarcode,
    AddNewBarcode,
    AddUnknownBarcode,
    ConsumeProduct,
    ConsumeSpoiledProduct,
    PurchaseProduct,
    OpenProduct,
    GetStockProduct,
    AddToShoppingList,
}

impl EventType {
    pub fn code(self) -> i32 {
        match self {
            EventType::Error => -1,
            EventType::ModeChange => 0,
            EventType::Consume => 1,
            EventType::ConsumeSpoiled => 2,
            EventType::Purchase => 3,
            EventType::Open => 4,
            EventType::Inventory => 5,
            EventType::ChoreExecuted => 6,
            EventType::AddKnownBarcode => 7,
            EventType::AddNewBarcode => 8,
            EventType::AddUnknownBarcode => 9,
            EventType::ConsumeProduct => 10,
            EventType::ConsumeSpoiledProduct => 11,
            EventType::PurchaseProduct => 12,
            EventType::OpenProduct => 13,
            EventType::GetStockProduct => 14,
            EventType::AddToShoppingList => 15,
        }
    }
}

/// Result code sent along with a live notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Severity {
    #[default]
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn code(self) -> u8 {
        match self {
            Severity::Success => 0,
            Severity::Warning => 1,
            Severity::Error => 2,
        }
    }
}

/// One durable log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    /// Verbose rows are hidden unless the reader asks for detail.
    pub verbose: bool,
}

/// A processed event: the durable row plus what is broadcast and dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub entry: LogEntry,
    pub event_type: EventType,
    pub severity: Severity,
    /// Replaces the message in live notifications when set.
    pub display_text: Option<String>,
}

impl LogEvent {
    pub fn new(timestamp: DateTime<Utc>, event_type: EventType, message: impl Into<String>) -> Self {
        Self {
            entry: LogEntry {
                timestamp,
                message: message.into(),
                verbose: false,
            },
            event_type,
            severity: Severity::Success,
            display_text: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.entry.message
    }

    pub fn notification_text(&self) -> &str {
        self.display_text.as_deref().unwrap_or(&self.entry.message)
    }

    pub fn verbose(&mut self) -> &mut Self {
        self.entry.verbose = true;
        self
    }

    pub fn severity(&mut self, severity: Severity) -> &mut Self {
        self.severity = severity;
        self
    }

    pub fn display(&mut self, text: impl Into<String>) -> &mut Self {
        self.display_text = Some(text.into());
        self
    }
}

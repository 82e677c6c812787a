use chrono::{DateTime, Utc};

use crate::{EventType, LogEntry, LogEvent, Mode, PendingScanContext, StoredQuantity, UnknownBarcodeRecord};

/// Per-scan view of the shared scanner state.
///
/// Loaded once when a scan starts. Every change made while handling the scan
/// is staged here and handed to the store in one commit.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanContext {
    now: DateTime<Utc>,
    mode: Mode,
    pending: PendingScanContext,
    mode_changed: bool,
    pending_changed: bool,
    unknown: Vec<UnknownBarcodeRecord>,
    quantities: Vec<StoredQuantity>,
    events: Vec<LogEvent>,
    log: Vec<LogSlot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LogSlot {
    Event(usize),
    Note(LogEntry),
}

/// Everything a scan wants persisted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StateChanges {
    pub mode: Option<Mode>,
    pub pending: Option<PendingScanContext>,
    pub unknown: Vec<UnknownBarcodeRecord>,
    pub quantities: Vec<StoredQuantity>,
    /// Durable rows in emission order, notes and events alike.
    pub log: Vec<LogEntry>,
    /// Events to broadcast and dispatch once the commit succeeded.
    pub events: Vec<LogEvent>,
}

impl StateChanges {
    pub fn is_empty(&self) -> bool {
        self.mode.is_none()
            && self.pending.is_none()
            && self.unknown.is_empty()
            && self.quantities.is_empty()
            && self.log.is_empty()
    }
}

impl ScanContext {
    pub fn new(mode: Mode, pending: PendingScanContext, now: DateTime<Utc>) -> Self {
        Self {
            now,
            mode,
            pending,
            mode_changed: false,
            pending_changed: false,
            unknown: Vec::new(),
            quantities: Vec::new(),
            events: Vec::new(),
            log: Vec::new(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.mode_changed = true;
    }

    pub fn pending(&self) -> &PendingScanContext {
        &self.pending
    }

    pub fn remember_barcode(&mut self, barcode: impl Into<String>, product_name: Option<String>) {
        self.pending = PendingScanContext::new(barcode, product_name);
        self.pending_changed = true;
    }

    /// Staged version of an unknown barcode, if this scan touched it.
    pub fn staged_unknown(&self, barcode: &str) -> Option<&UnknownBarcodeRecord> {
        self.unknown.iter().rev().find(|record| record.barcode == barcode)
    }

    pub fn upsert_unknown(&mut self, record: UnknownBarcodeRecord) {
        self.unknown.retain(|staged| staged.barcode != record.barcode);
        self.unknown.push(record);
    }

    pub fn upsert_quantity(&mut self, quantity: StoredQuantity) {
        self.quantities.retain(|staged| staged.barcode != quantity.barcode);
        self.quantities.push(quantity);
    }

    /// Stages an event and returns it for adjusting severity and display text.
    pub fn emit(&mut self, event_type: EventType, message: impl Into<String>) -> &mut LogEvent {
        let index = self.events.len();
        self.events.push(LogEvent::new(self.now, event_type, message));
        self.log.push(LogSlot::Event(index));
        &mut self.events[index]
    }

    /// Stages a durable log row that is neither broadcast nor dispatched.
    pub fn note(&mut self, message: impl Into<String>, verbose: bool) {
        self.log.push(LogSlot::Note(LogEntry {
            timestamp: self.now,
            message: message.into(),
            verbose,
        }));
    }

    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    pub fn into_changes(self) -> StateChanges {
        let log = self
            .log
            .into_iter()
            .map(|slot| match slot {
                LogSlot::Event(index) => self.events[index].entry.clone(),
                LogSlot::Note(entry) => entry,
            })
            .collect();
        StateChanges {
            mode: self.mode_changed.then_some(self.mode),
            pending: self.pending_changed.then_some(self.pending),
            unknown: self.unknown,
            quantities: self.quantities,
            log,
            events: self.events,
        }
    }
}

use std::collections::BTreeMap;

use buddy_core::{
    LogEntry, Mode, PendingScanContext, ScanContext, StateChanges, StoredQuantity, Tag,
    UnknownBarcodeRecord,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::PersistError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to persist state: {0}")]
    Persist(#[from] PersistError),
    #[error("failed to encode state: {0}")]
    Encode(String),
    #[error("failed to decode state file {path}: {message}")]
    Decode { path: String, message: String },
    #[error("state store unavailable: {0}")]
    Unavailable(String),
}

/// Durable scanner state: the current mode, pending scan, unknown barcodes,
/// stored quantities, chore mappings and tags, plus the append-only log.
pub trait StateStore {
    /// Loads mode and pending scan into a fresh per-scan context.
    fn load_context(&self, now: DateTime<Utc>) -> Result<ScanContext, StoreError>;

    fn unknown_barcode(&self, barcode: &str) -> Result<Option<UnknownBarcodeRecord>, StoreError>;

    fn stored_quantity(&self, barcode: &str) -> Result<Option<StoredQuantity>, StoreError>;

    /// Chore id exactly as stored; callers validate it.
    fn chore_id_for_barcode(&self, barcode: &str) -> Result<Option<String>, StoreError>;

    fn tags(&self) -> Result<Vec<Tag>, StoreError>;

    /// Applies every change of one scan, or none of them.
    ///
    /// State changes land on the latest stored state, not on the one seen by
    /// [`StateStore::load_context`].
    fn commit(&mut self, changes: &StateChanges) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSnapshot {
    pub mode: Mode,
    pub pending: PendingScanContext,
    pub unknown: BTreeMap<String, UnknownBarcodeRecord>,
    pub quantities: BTreeMap<String, StoredQuantity>,
    pub chore_barcodes: BTreeMap<String, String>,
    pub tags: Vec<Tag>,
}

impl StoreSnapshot {
    pub fn apply(&mut self, changes: &StateChanges) {
        if let Some(mode) = changes.mode {
            self.mode = mode;
        }
        if let Some(pending) = &changes.pending {
            self.pending = pending.clone();
        }
        for record in &changes.unknown {
            self.unknown.insert(record.barcode.clone(), record.clone());
        }
        for quantity in &changes.quantities {
            self.quantities
                .insert(quantity.barcode.clone(), quantity.clone());
        }
    }

    pub(crate) fn context(&self, now: DateTime<Utc>) -> ScanContext {
        ScanContext::new(self.mode, self.pending.clone(), now)
    }
}

/// Store without a backing file. Starts in [`Mode::Consume`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    snapshot: StoreSnapshot,
    log: Vec<LogEntry>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            snapshot,
            log: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> &StoreSnapshot {
        &self.snapshot
    }

    pub fn snapshot_mut(&mut self) -> &mut StoreSnapshot {
        &mut self.snapshot
    }

    /// Log rows in commit order.
    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }
}

impl StateStore for MemoryStateStore {
    fn load_context(&self, now: DateTime<Utc>) -> Result<ScanContext, StoreError> {
        Ok(self.snapshot.context(now))
    }

    fn unknown_barcode(&self, barcode: &str) -> Result<Option<UnknownBarcodeRecord>, StoreError> {
        Ok(self.snapshot.unknown.get(barcode).cloned())
    }

    fn stored_quantity(&self, barcode: &str) -> Result<Option<StoredQuantity>, StoreError> {
        Ok(self.snapshot.quantities.get(barcode).cloned())
    }

    fn chore_id_for_barcode(&self, barcode: &str) -> Result<Option<String>, StoreError> {
        Ok(self.snapshot.chore_barcodes.get(barcode).cloned())
    }

    fn tags(&self) -> Result<Vec<Tag>, StoreError> {
        Ok(self.snapshot.tags.clone())
    }

    fn commit(&mut self, changes: &StateChanges) -> Result<(), StoreError> {
        self.snapshot.apply(changes);
        self.log.extend(changes.log.iter().cloned());
        Ok(())
    }
}

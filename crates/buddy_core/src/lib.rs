//! Barcode Buddy core: scan classification, scanner modes and the per-scan
//! state that the engine commits.
mod classify;
mod config;
mod context;
mod event;
mod mode;
mod records;
mod sanitize;

pub use classify::{classify, normalize_scan, parse_quantity, Classification, ClassifyError};
pub use config::{ControlCodes, ScanConfig};
pub use context::{ScanContext, StateChanges};
pub use event::{EventType, LogEntry, LogEvent, Severity};
pub use mode::{Mode, ParseModeError};
pub use records::{
    derive_tags, PendingScanContext, ProductId, Quantity, StoredQuantity, Tag, TagDerivation,
    UnknownBarcodeRecord, NO_NAME,
};
pub use sanitize::{is_numeric_barcode, sanitize_text};

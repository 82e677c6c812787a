//! Barcode Buddy engine: scan processing against the inventory service,
//! state persistence and event fan-out.
mod api;
mod chore;
mod event_log;
mod grocy;
mod notify;
mod persist;
mod processor;
mod store;
mod tracker;

pub use api::{ApiError, ApiFailure, ChoreApi, InventoryApi, ProductInfo, PurchaseResult};
pub use chore::ChoreExecutor;
pub use event_log::EventLog;
pub use grocy::{GrocyClient, GrocySettings};
pub use notify::{
    ChannelNotifier, EventSink, JsonLinesEventSink, LogNotifier, NoopEventSink, Notification,
    NotificationChannel, NotifyError,
};
pub use persist::{ensure_state_dir, AtomicFileWriter, FileStateStore, PersistError};
pub use processor::{Clock, ScanError, ScanOutcome, ScanProcessor};
pub use store::{MemoryStateStore, StateStore, StoreError, StoreSnapshot};
pub use tracker::{UnknownBarcodeTracker, UnknownOutcome};

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};

use buddy_core::{
    EventType, Mode, ProductId, Quantity, ScanConfig, Severity, UnknownBarcodeRecord,
};
use buddy_engine::{
    ApiError, ApiFailure, ChoreApi, EventLog, EventSink, InventoryApi, MemoryStateStore,
    Notification, NotificationChannel, NotifyError, ProductInfo, PurchaseResult, ScanProcessor,
    StateStore,
};
use chrono::{TimeZone, Utc};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(buddy_logging::initialize_for_tests);
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Lookup(String),
    Consume {
        id: ProductId,
        amount: Quantity,
        spoiled: bool,
    },
    Purchase { id: ProductId, amount: Quantity },
    Open(ProductId),
    ShoppingList { id: ProductId, amount: Quantity },
    Catalog(String),
    ExecuteChore(u64),
    ChoreName(u64),
}

#[derive(Default)]
pub struct FakeState {
    pub products: HashMap<String, ProductInfo>,
    pub catalog: HashMap<String, String>,
    pub chores: HashMap<u64, String>,
    pub catalog_fails: bool,
    pub without_best_before: bool,
    pub fail_mutations: bool,
    pub calls: Vec<Call>,
}

/// In-process stand-in for the Grocy API.
#[derive(Default)]
pub struct FakeInventory {
    state: Mutex<FakeState>,
}

impl FakeInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product(self, barcode: &str, product: ProductInfo) -> Self {
        self.edit(|state| {
            state.products.insert(barcode.to_string(), product);
        });
        self
    }

    pub fn with_catalog_name(self, barcode: &str, name: &str) -> Self {
        self.edit(|state| {
            state.catalog.insert(barcode.to_string(), name.to_string());
        });
        self
    }

    pub fn with_chore(self, id: u64, name: &str) -> Self {
        self.edit(|state| {
            state.chores.insert(id, name.to_string());
        });
        self
    }

    pub fn edit(&self, f: impl FnOnce(&mut FakeState)) {
        f(&mut self.state.lock().unwrap());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    fn record(&self, call: Call) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        let mutating = !matches!(call, Call::Lookup(_) | Call::Catalog(_) | Call::ChoreName(_));
        state.calls.push(call);
        if mutating && state.fail_mutations {
            return Err(ApiError::new(ApiFailure::HttpStatus(500), "500 Internal Server Error"));
        }
        Ok(())
    }
}

impl InventoryApi for FakeInventory {
    fn product_by_barcode(&self, barcode: &str) -> Result<Option<ProductInfo>, ApiError> {
        self.record(Call::Lookup(barcode.to_string()))?;
        Ok(self.state.lock().unwrap().products.get(barcode).cloned())
    }

    fn consume(&self, id: ProductId, amount: Quantity, spoiled: bool) -> Result<(), ApiError> {
        self.record(Call::Consume { id, amount, spoiled })
    }

    fn purchase(&self, id: ProductId, amount: Quantity) -> Result<PurchaseResult, ApiError> {
        self.record(Call::Purchase { id, amount })?;
        if self.state.lock().unwrap().without_best_before {
            Ok(PurchaseResult::StockedWithoutBestBefore)
        } else {
            Ok(PurchaseResult::Stocked)
        }
    }

    fn open(&self, id: ProductId) -> Result<(), ApiError> {
        self.record(Call::Open(id))
    }

    fn add_to_shopping_list(&self, id: ProductId, amount: Quantity) -> Result<(), ApiError> {
        self.record(Call::ShoppingList { id, amount })
    }

    fn lookup_name_by_external_catalog(&self, barcode: &str) -> Result<Option<String>, ApiError> {
        self.record(Call::Catalog(barcode.to_string()))?;
        let state = self.state.lock().unwrap();
        if state.catalog_fails {
            return Err(ApiError::new(ApiFailure::Timeout, "catalog timed out"));
        }
        Ok(state.catalog.get(barcode).cloned())
    }
}

impl ChoreApi for FakeInventory {
    fn execute_chore(&self, id: u64) -> Result<(), ApiError> {
        self.record(Call::ExecuteChore(id))
    }

    fn chore_name(&self, id: u64) -> Result<String, ApiError> {
        self.record(Call::ChoreName(id))?;
        self.state
            .lock()
            .unwrap()
            .chores
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::new(ApiFailure::HttpStatus(404), "404 Not Found"))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
    pub fail: bool,
}

impl NotificationChannel for RecordingNotifier {
    fn broadcast(&self, notification: Notification) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Closed);
        }
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<(EventType, String)>>,
    pub fail: bool,
}

impl EventSink for RecordingSink {
    fn dispatch(&self, event_type: EventType, message: &str) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Closed);
        }
        self.events
            .lock()
            .unwrap()
            .push((event_type, message.to_string()));
        Ok(())
    }
}

pub fn product(id: ProductId, name: &str) -> ProductInfo {
    ProductInfo {
        id,
        name: name.to_string(),
        unit: "Piece".to_string(),
        stock_amount: 3.0,
    }
}

pub struct Harness {
    pub processor: ScanProcessor<MemoryStateStore>,
    pub api: Arc<FakeInventory>,
    pub notifier: Arc<RecordingNotifier>,
    pub sink: Arc<RecordingSink>,
}

pub fn harness(config: ScanConfig, api: FakeInventory) -> Harness {
    harness_with(config, api, MemoryStateStore::new(), RecordingNotifier::default())
}

pub fn harness_with(
    config: ScanConfig,
    api: FakeInventory,
    store: MemoryStateStore,
    notifier: RecordingNotifier,
) -> Harness {
    init_logging();
    let api = Arc::new(api);
    let notifier = Arc::new(notifier);
    let sink = Arc::new(RecordingSink::default());
    let events = EventLog::new(notifier.clone()).with_sink(sink.clone());
    let clock = Arc::new(|| Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    let processor = ScanProcessor::new(config, store, api.clone(), api.clone(), events)
        .with_clock(clock);
    Harness {
        processor,
        api,
        notifier,
        sink,
    }
}

impl Harness {
    pub fn mode(&self) -> Mode {
        self.processor.current_mode().unwrap()
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.processor.store_mut().snapshot_mut().mode = mode;
    }

    pub fn events(&self) -> Vec<(EventType, String)> {
        self.sink.events.lock().unwrap().clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifier.sent.lock().unwrap().clone()
    }

    pub fn last_severity(&self) -> Option<Severity> {
        self.notifications().last().map(|n| n.severity)
    }

    pub fn log_messages(&self) -> Vec<String> {
        self.processor
            .store()
            .log()
            .iter()
            .map(|entry| entry.message.clone())
            .collect()
    }

    pub fn unknown(&self, barcode: &str) -> Option<UnknownBarcodeRecord> {
        self.processor.store().unknown_barcode(barcode).unwrap()
    }
}

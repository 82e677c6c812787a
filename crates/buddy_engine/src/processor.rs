use std::sync::Arc;

use buddy_core::{
    classify, normalize_scan, sanitize_text, Classification, ClassifyError, EventType, Mode,
    PendingScanContext, ProductId, Quantity, ScanConfig, ScanContext, Severity,
};
use buddy_logging::{buddy_debug, buddy_error, buddy_info};
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    ApiError, ChoreApi, ChoreExecutor, EventLog, InventoryApi, ProductInfo, PurchaseResult,
    StateStore, StoreError, UnknownBarcodeTracker, UnknownOutcome,
};

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

const NO_BEST_BEFORE_WARNING: &str = " [WARNING]: No default best before date set!";

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Illegal input! {value} needs to be a number")]
    InvalidInput { value: String },
    #[error("no chore is mapped to barcode {0}")]
    UnmappedChore(String),
    #[error("inventory service request failed: {0}")]
    Api(#[from] ApiError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ClassifyError> for ScanError {
    fn from(err: ClassifyError) -> Self {
        match err {
            ClassifyError::InvalidInput { value } => ScanError::InvalidInput { value },
        }
    }
}

/// What a single scan did.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    ModeChanged(Mode),
    QuantitySet { barcode: String, amount: Quantity },
    /// A quantity was scanned before any product barcode.
    NoPendingBarcode,
    InvalidBarcode,
    ChoreExecuted { name: String },
    Known { mode: Mode, product: ProductInfo },
    Unknown(UnknownOutcome),
}

/// Turns raw scans into inventory actions.
///
/// Each scan loads the scanner state once, stages every change and commits it
/// in one store call. Live notifications go out only after the commit.
pub struct ScanProcessor<S> {
    config: ScanConfig,
    store: S,
    inventory: Arc<dyn InventoryApi>,
    chores: Arc<dyn ChoreApi>,
    events: EventLog,
    clock: Clock,
}

impl<S: StateStore> ScanProcessor<S> {
    pub fn new(
        config: ScanConfig,
        store: S,
        inventory: Arc<dyn InventoryApi>,
        chores: Arc<dyn ChoreApi>,
        events: EventLog,
    ) -> Self {
        Self {
            config: config.normalized(),
            store,
            inventory,
            chores,
            events,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn current_mode(&self) -> Result<Mode, ScanError> {
        Ok(self.store.load_context((self.clock)())?.mode())
    }

    pub fn process(&mut self, raw: &str) -> Result<ScanOutcome, ScanError> {
        let scan_no = buddy_logging::begin_scan();
        let mut ctx = self.store.load_context((self.clock)())?;

        let outcome = match self.handle(&mut ctx, raw) {
            Ok(outcome) => outcome,
            Err(err) => {
                buddy_error!("Scan #{} of {:?} aborted: {}", scan_no, raw, err);
                return Err(err);
            }
        };

        let changes = ctx.into_changes();
        self.store.commit(&changes)?;
        self.events.publish_all(&changes.events);
        buddy_debug!("Scan #{} of {:?}: {:?}", scan_no, raw, outcome);
        Ok(outcome)
    }

    /// Sets the mode from a request parameter such as `purchase`.
    ///
    /// Unknown names leave the mode alone.
    pub fn set_mode_from_param(&mut self, param: &str) -> Result<Option<Mode>, ScanError> {
        let mode = match param.parse::<Mode>() {
            Ok(mode) => mode,
            Err(err) => {
                buddy_debug!("Ignoring mode parameter: {}", err);
                return Ok(None);
            }
        };
        let mut ctx = self.store.load_context((self.clock)())?;
        ctx.set_mode(mode);
        self.store.commit(&ctx.into_changes())?;
        buddy_info!("Mode set to {} by parameter", mode);
        Ok(Some(mode))
    }

    /// Links an unknown barcode to the product created for it in the inventory.
    pub fn refresh_barcode(&mut self, barcode: &str) -> Result<Option<ProductId>, ScanError> {
        let barcode = sanitize_text(&normalize_scan(barcode));
        let Some(product) = self.inventory.product_by_barcode(&barcode)? else {
            return Ok(None);
        };
        if let Some(mut record) = self.store.unknown_barcode(&barcode)? {
            let mut ctx = self.store.load_context((self.clock)())?;
            record.matched_product = Some(product.id);
            ctx.upsert_unknown(record);
            self.store.commit(&ctx.into_changes())?;
        }
        Ok(Some(product.id))
    }

    fn handle(&self, ctx: &mut ScanContext, raw: &str) -> Result<ScanOutcome, ScanError> {
        let scan = normalize_scan(raw);
        let store = &self.store;
        let classification = classify::<_, ScanError>(&scan, &self.config, |code| {
            Ok(store.chore_id_for_barcode(code)?.is_some())
        })?;

        match classification {
            Classification::ControlCode(mode) => {
                ctx.set_mode(mode);
                ctx.emit(EventType::ModeChange, format!("Set state to {}", mode.label()))
                    .verbose();
                Ok(ScanOutcome::ModeChanged(mode))
            }
            Classification::QuantityModifier(amount) => self.handle_quantity(ctx, amount),
            Classification::Empty => {
                ctx.emit(EventType::Error, "Invalid barcode found")
                    .verbose()
                    .severity(Severity::Error);
                Ok(ScanOutcome::InvalidBarcode)
            }
            Classification::ChoreCode(code) => {
                let name = ChoreExecutor::new(self.chores.as_ref()).execute(&self.store, &code)?;
                ctx.emit(EventType::ChoreExecuted, format!("Executed chore: {name}"))
                    .verbose();
                Ok(ScanOutcome::ChoreExecuted { name })
            }
            Classification::ProductCandidate(code) => {
                self.handle_product(ctx, &sanitize_text(&code))
            }
        }
    }

    fn handle_quantity(
        &self,
        ctx: &mut ScanContext,
        amount: Quantity,
    ) -> Result<ScanOutcome, ScanError> {
        let pending = ctx.pending().clone();
        let Some(barcode) = pending.last_barcode.clone() else {
            ctx.emit(
                EventType::Error,
                format!("Quantity {amount} scanned before any product barcode"),
            )
            .verbose()
            .severity(Severity::Error);
            return Ok(ScanOutcome::NoPendingBarcode);
        };

        let product_name = match pending.product_name {
            Some(name) => Some(name),
            None => self
                .inventory
                .product_by_barcode(&barcode)?
                .map(|product| product.name),
        };
        let target = PendingScanContext::new(barcode.clone(), product_name.clone());
        ctx.emit(
            EventType::ModeChange,
            format!("Set quantity to {amount} for barcode {}", target.describe()),
        )
        .verbose();
        UnknownBarcodeTracker::new(self.inventory.as_ref()).apply_quantity_override(
            &self.store,
            ctx,
            &barcode,
            amount,
            product_name,
        )?;
        Ok(ScanOutcome::QuantitySet { barcode, amount })
    }

    fn handle_product(&self, ctx: &mut ScanContext, barcode: &str) -> Result<ScanOutcome, ScanError> {
        if barcode.is_empty() {
            ctx.emit(EventType::Error, "Invalid barcode found")
                .verbose()
                .severity(Severity::Error);
            return Ok(ScanOutcome::InvalidBarcode);
        }

        match self.inventory.product_by_barcode(barcode)? {
            None => {
                ctx.remember_barcode(barcode, None);
                let outcome = UnknownBarcodeTracker::new(self.inventory.as_ref())
                    .record_unknown(&self.store, ctx, barcode)?;
                Ok(ScanOutcome::Unknown(outcome))
            }
            Some(product) => {
                ctx.remember_barcode(barcode, Some(product.name.clone()));
                let mode = ctx.mode();
                self.apply_mode_action(ctx, &product, barcode)?;
                Ok(ScanOutcome::Known { mode, product })
            }
        }
    }

    fn apply_mode_action(
        &self,
        ctx: &mut ScanContext,
        product: &ProductInfo,
        barcode: &str,
    ) -> Result<(), ScanError> {
        let ProductInfo {
            id, name, unit, ..
        } = product;

        match ctx.mode() {
            Mode::Consume => {
                self.inventory.consume(*id, 1.0, false)?;
                ctx.emit(
                    EventType::AddKnownBarcode,
                    format!("Product found. Consuming 1 {unit} of {name}. Barcode: {barcode}"),
                )
                .display(format!("Consuming 1 {unit} of {name}"));
            }
            Mode::ConsumeSpoiled => {
                self.inventory.consume(*id, 1.0, true)?;
                ctx.emit(
                    EventType::AddKnownBarcode,
                    format!(
                        "Product found. Consuming 1 spoiled {unit} of {name}. Barcode: {barcode}"
                    ),
                )
                .display(format!("Consuming 1 spoiled {unit} of {name}"));
                self.revert_after_single_action(ctx);
            }
            Mode::Purchase => {
                let amount = self
                    .store
                    .stored_quantity(barcode)?
                    .map_or(1.0, |quantity| quantity.amount);
                let warning = match self.inventory.purchase(*id, amount)? {
                    PurchaseResult::Stocked => "",
                    PurchaseResult::StockedWithoutBestBefore => NO_BEST_BEFORE_WARNING,
                };
                ctx.emit(
                    EventType::AddKnownBarcode,
                    format!(
                        "Product found. Adding {amount} {unit} of {name}. Barcode: {barcode}{warning}"
                    ),
                )
                .display(format!("Adding {amount} {unit} of {name}{warning}"));
            }
            Mode::Open => {
                self.inventory.open(*id)?;
                ctx.emit(
                    EventType::AddKnownBarcode,
                    format!("Product found. Opening 1 {unit} of {name}. Barcode: {barcode}"),
                )
                .display(format!("Opening 1 {unit} of {name}"));
                self.revert_after_single_action(ctx);
            }
            Mode::GetStock => {
                ctx.emit(
                    EventType::AddKnownBarcode,
                    format!(
                        "Currently in stock: {} {unit} of {name}",
                        product.stock_amount
                    ),
                );
            }
            Mode::AddToShoppingList => {
                self.inventory.add_to_shopping_list(*id, 1.0)?;
                ctx.emit(
                    EventType::AddKnownBarcode,
                    format!("Added to shopping list: 1 {unit} of {name}"),
                );
            }
        }
        Ok(())
    }

    fn revert_after_single_action(&self, ctx: &mut ScanContext) {
        if self.config.revert_single && ctx.mode().reverts_after_single_action() {
            ctx.note("Reverting back to Consume", true);
            ctx.set_mode(Mode::Consume);
        }
    }
}

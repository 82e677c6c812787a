use buddy_core::{
    derive_tags, is_numeric_barcode, EventType, Mode, Quantity, ScanContext, Severity,
    StoredQuantity, UnknownBarcodeRecord, NO_NAME,
};
use buddy_logging::{buddy_debug, buddy_warn};

use crate::{InventoryApi, ScanError, StateStore};

/// What happened to an unresolved barcode.
#[derive(Debug, Clone, PartialEq)]
pub enum UnknownOutcome {
    Inserted {
        barcode: String,
        amount: Quantity,
        name: Option<String>,
    },
    Increased {
        barcode: String,
        amount: Quantity,
    },
}

/// Bookkeeping for barcodes the inventory service does not know.
pub struct UnknownBarcodeTracker<'a> {
    inventory: &'a dyn InventoryApi,
}

impl<'a> UnknownBarcodeTracker<'a> {
    pub fn new(inventory: &'a dyn InventoryApi) -> Self {
        Self { inventory }
    }

    /// Adds one scan of `barcode` to its record, creating the record on first sight.
    ///
    /// The amount is 1, or the stored quantity for the barcode while purchasing.
    pub fn record_unknown(
        &self,
        store: &dyn StateStore,
        ctx: &mut ScanContext,
        barcode: &str,
    ) -> Result<UnknownOutcome, ScanError> {
        let amount = match ctx.mode() {
            Mode::Purchase => store
                .stored_quantity(barcode)?
                .map_or(1.0, |quantity| quantity.amount),
            _ => 1.0,
        };

        if let Some(mut record) = existing_record(store, ctx, barcode)? {
            record.amount += amount;
            let total = record.amount;
            ctx.upsert_unknown(record);
            ctx.emit(
                EventType::AddNewBarcode,
                format!("Unknown product already scanned. Increasing quantity. Barcode: {barcode}"),
            )
            .severity(Severity::Warning);
            return Ok(UnknownOutcome::Increased {
                barcode: barcode.to_string(),
                amount: total,
            });
        }

        let guessed = self.guess_name(barcode);
        let record = match &guessed {
            Some(name) => {
                ctx.emit(
                    EventType::AddNewBarcode,
                    format!("Unknown barcode looked up, found name: {name}. Barcode: {barcode}"),
                )
                .severity(Severity::Warning)
                .display(name.clone());
                UnknownBarcodeRecord::new(barcode, amount)
                    .with_guess(name.clone(), derive_tags(name, &store.tags()?))
            }
            None => {
                ctx.emit(
                    EventType::AddUnknownBarcode,
                    format!("Unknown barcode could not be looked up. Barcode: {barcode}"),
                )
                .severity(Severity::Error)
                .display(barcode);
                UnknownBarcodeRecord::new(barcode, amount)
            }
        };
        ctx.upsert_unknown(record);

        Ok(UnknownOutcome::Inserted {
            barcode: barcode.to_string(),
            amount,
            name: guessed,
        })
    }

    /// Stores an explicit quantity for `barcode`.
    ///
    /// An unknown record that holds exactly one unit is corrected to `amount`:
    /// the user scanned the product once and then said how many there are.
    pub fn apply_quantity_override(
        &self,
        store: &dyn StateStore,
        ctx: &mut ScanContext,
        barcode: &str,
        amount: Quantity,
        product_name: Option<String>,
    ) -> Result<(), ScanError> {
        ctx.upsert_quantity(StoredQuantity {
            barcode: barcode.to_string(),
            amount,
            product_name,
        });

        if let Some(mut record) = existing_record(store, ctx, barcode)? {
            if record.amount == 1.0 {
                record.amount = amount;
                ctx.upsert_unknown(record);
            }
        }
        Ok(())
    }

    fn guess_name(&self, barcode: &str) -> Option<String> {
        if !is_numeric_barcode(barcode) {
            buddy_debug!("Skipping catalog lookup for non-numeric barcode {}", barcode);
            return None;
        }
        match self.inventory.lookup_name_by_external_catalog(barcode) {
            Ok(name) => name.filter(|name| !name.is_empty() && name != NO_NAME),
            Err(err) => {
                buddy_warn!(
                    "Scan #{}: catalog lookup for {} failed: {}",
                    buddy_logging::current_scan(),
                    barcode,
                    err
                );
                None
            }
        }
    }
}

fn existing_record(
    store: &dyn StateStore,
    ctx: &ScanContext,
    barcode: &str,
) -> Result<Option<UnknownBarcodeRecord>, ScanError> {
    if let Some(staged) = ctx.staged_unknown(barcode) {
        return Ok(Some(staged.clone()));
    }
    Ok(store.unknown_barcode(barcode)?)
}

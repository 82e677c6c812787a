use buddy_core::sanitize_text;

use crate::{ChoreApi, ScanError, StateStore};

/// Runs the chore mapped to a barcode.
pub struct ChoreExecutor<'a> {
    api: &'a dyn ChoreApi,
}

impl<'a> ChoreExecutor<'a> {
    pub fn new(api: &'a dyn ChoreApi) -> Self {
        Self { api }
    }

    /// Executes the chore for `barcode` and returns its display name.
    pub fn execute(&self, store: &dyn StateStore, barcode: &str) -> Result<String, ScanError> {
        let barcode = sanitize_text(barcode);
        let stored = store
            .chore_id_for_barcode(&barcode)?
            .ok_or_else(|| ScanError::UnmappedChore(barcode.clone()))?;
        let id = stored
            .trim()
            .parse::<u64>()
            .map_err(|_| ScanError::InvalidInput {
                value: sanitize_text(&stored),
            })?;

        self.api.execute_chore(id)?;
        Ok(sanitize_text(&self.api.chore_name(id)?))
    }
}

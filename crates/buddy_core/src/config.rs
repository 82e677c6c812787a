use serde::{Deserialize, Serialize};

use crate::Mode;

/// Literal barcodes that switch the active [`Mode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlCodes {
    pub consume: String,
    pub consume_spoiled: String,
    pub purchase: String,
    pub open: String,
    pub inventory: String,
    pub shopping_list: String,
}

impl Default for ControlCodes {
    fn default() -> Self {
        Self {
            consume: "BBUDDY-C".to_string(),
            consume_spoiled: "BBUDDY-CS".to_string(),
            purchase: "BBUDDY-P".to_string(),
            open: "BBUDDY-O".to_string(),
            inventory: "BBUDDY-I".to_string(),
            shopping_list: "BBUDDY-AS".to_string(),
        }
    }
}

impl ControlCodes {
    pub fn code_for(&self, mode: Mode) -> &str {
        match mode {
            Mode::Consume => &self.consume,
            Mode::ConsumeSpoiled => &self.consume_spoiled,
            Mode::Purchase => &self.purchase,
            Mode::Open => &self.open,
            Mode::GetStock => &self.inventory,
            Mode::AddToShoppingList => &self.shopping_list,
        }
    }

    fn code_for_mut(&mut self, mode: Mode) -> &mut String {
        match mode {
            Mode::Consume => &mut self.consume,
            Mode::ConsumeSpoiled => &mut self.consume_spoiled,
            Mode::Purchase => &mut self.purchase,
            Mode::Open => &mut self.open,
            Mode::GetStock => &mut self.inventory,
            Mode::AddToShoppingList => &mut self.shopping_list,
        }
    }
}

/// Scanner behaviour settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub codes: ControlCodes,
    /// Prefix of a quantity barcode, e.g. `BBUDDY-Q-5`.
    pub quantity_prefix: String,
    /// Return to [`Mode::Consume`] after a single Open or ConsumeSpoiled action.
    pub revert_single: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            codes: ControlCodes::default(),
            quantity_prefix: "BBUDDY-Q-".to_string(),
            revert_single: true,
        }
    }
}

impl ScanConfig {
    /// Trims and uppercases every configured barcode so it compares against
    /// normalized scans.
    pub fn normalized(mut self) -> Self {
        for mode in Mode::ALL {
            let code = self.codes.code_for_mut(mode);
            *code = code.trim().to_uppercase();
        }
        self.quantity_prefix = self.quantity_prefix.trim().to_uppercase();
        self
    }

    /// Pairs of modes whose control codes share the same literal.
    ///
    /// Classification resolves these by taking the first mode in
    /// [`Mode::ALL`] order, so the later mode of each pair is unreachable.
    pub fn duplicate_codes(&self) -> Vec<(Mode, Mode)> {
        let mut duplicates = Vec::new();
        for (i, first) in Mode::ALL.iter().enumerate() {
            let code = self.codes.code_for(*first);
            if code.is_empty() {
                continue;
            }
            for second in &Mode::ALL[i + 1..] {
                if self.codes.code_for(*second) == code {
                    duplicates.push((*first, *second));
                }
            }
        }
        duplicates
    }
}

use serde::{Deserialize, Serialize};

pub type ProductId = u64;

/// Amount of a product. Grocy stores fractional amounts, e.g. 1.5 kg.
pub type Quantity = f64;

/// Placeholder shown for unknown barcodes without a guessed name.
pub const NO_NAME: &str = "N/A";

/// The product barcode scanned most recently, read by quantity barcodes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PendingScanContext {
    pub last_barcode: Option<String>,
    pub product_name: Option<String>,
}

impl PendingScanContext {
    pub fn new(barcode: impl Into<String>, product_name: Option<String>) -> Self {
        Self {
            last_barcode: Some(barcode.into()),
            product_name,
        }
    }

    /// `BARCODE (Name)` when the product is known, the bare barcode otherwise.
    pub fn describe(&self) -> String {
        let barcode = self.last_barcode.as_deref().unwrap_or_default();
        match &self.product_name {
            Some(name) => format!("{barcode} ({name})"),
            None => barcode.to_string(),
        }
    }
}

/// A barcode the inventory service does not know yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnknownBarcodeRecord {
    pub barcode: String,
    pub amount: Quantity,
    pub name: Option<String>,
    #[serde(default)]
    pub tag_candidates: Vec<String>,
    #[serde(default)]
    pub matched_product: Option<ProductId>,
}

impl UnknownBarcodeRecord {
    pub fn new(barcode: impl Into<String>, amount: Quantity) -> Self {
        Self {
            barcode: barcode.into(),
            amount,
            name: None,
            tag_candidates: Vec::new(),
            matched_product: None,
        }
    }

    pub fn with_guess(mut self, name: impl Into<String>, tags: TagDerivation) -> Self {
        self.name = Some(name.into());
        self.tag_candidates = tags.candidates;
        self.matched_product = tags.matched_product;
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(NO_NAME)
    }
}

/// Quantity set explicitly for a barcode by a quantity scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredQuantity {
    pub barcode: String,
    pub amount: Quantity,
    pub product_name: Option<String>,
}

/// A word associated with an existing product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub product_id: ProductId,
}

/// What a guessed product name says about existing tags.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagDerivation {
    /// Product of the first word that matches a stored tag.
    pub matched_product: Option<ProductId>,
    /// Words of the name not yet used as a tag.
    pub candidates: Vec<String>,
}

pub fn derive_tags(name: &str, tags: &[Tag]) -> TagDerivation {
    let mut derived = TagDerivation::default();
    if name == NO_NAME {
        return derived;
    }
    for word in name.split(' ') {
        let word: String = word.chars().filter(|c| !matches!(c, '(' | ')')).collect();
        if word.is_empty() {
            continue;
        }
        match tags.iter().find(|tag| tag.name.eq_ignore_ascii_case(&word)) {
            Some(tag) => {
                derived.matched_product.get_or_insert(tag.product_id);
            }
            None => {
                if !derived.candidates.contains(&word) {
                    derived.candidates.push(word);
                }
            }
        }
    }
    derived
}

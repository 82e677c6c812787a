use std::fmt;

use buddy_core::{ProductId, Quantity};

/// Product as reported by the inventory service for a barcode.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInfo {
    pub id: ProductId,
    pub name: String,
    /// Stock quantity unit, e.g. "Piece".
    pub unit: String,
    pub stock_amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseResult {
    Stocked,
    /// Stocked, but the product has no default best-before period.
    StockedWithoutBestBefore,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: ApiFailure,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFailure {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    InvalidResponse,
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFailure::InvalidUrl => write!(f, "invalid url"),
            ApiFailure::HttpStatus(code) => write!(f, "http status {code}"),
            ApiFailure::Timeout => write!(f, "timeout"),
            ApiFailure::Network => write!(f, "network error"),
            ApiFailure::InvalidResponse => write!(f, "invalid response"),
        }
    }
}

/// Stock operations of the inventory service. Calls block until done.
pub trait InventoryApi: Send + Sync {
    fn product_by_barcode(&self, barcode: &str) -> Result<Option<ProductInfo>, ApiError>;

    fn consume(&self, id: ProductId, amount: Quantity, spoiled: bool) -> Result<(), ApiError>;

    fn purchase(&self, id: ProductId, amount: Quantity) -> Result<PurchaseResult, ApiError>;

    fn open(&self, id: ProductId) -> Result<(), ApiError>;

    fn add_to_shopping_list(&self, id: ProductId, amount: Quantity) -> Result<(), ApiError>;

    /// Guesses a product name from a public product catalog.
    fn lookup_name_by_external_catalog(&self, barcode: &str) -> Result<Option<String>, ApiError>;
}

pub trait ChoreApi: Send + Sync {
    fn execute_chore(&self, id: u64) -> Result<(), ApiError>;

    fn chore_name(&self, id: u64) -> Result<String, ApiError>;
}

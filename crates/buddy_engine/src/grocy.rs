use std::future::Future;
use std::time::Duration;

use buddy_core::{ProductId, Quantity};
use buddy_logging::buddy_debug;
use chrono::{Days, Local};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::{ApiError, ApiFailure, ChoreApi, InventoryApi, ProductInfo, PurchaseResult};

const API_KEY_HEADER: &str = "GROCY-API-KEY";
/// Best-before date Grocy uses for products that never expire.
const NEVER_EXPIRES: &str = "2999-12-31";

#[derive(Debug, Clone)]
pub struct GrocySettings {
    /// Base of the Grocy API, e.g. `https://grocy.example.com/api/`.
    pub api_url: String,
    pub api_key: String,
    /// Base of an OpenFoodFacts compatible product catalog.
    pub catalog_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for GrocySettings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost/api/".to_string(),
            api_key: String::new(),
            catalog_url: "https://world.openfoodfacts.org".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Blocking Grocy client.
///
/// Owns a small tokio runtime and drives every request to completion, so it
/// must not be called from inside another async runtime.
#[derive(Debug)]
pub struct GrocyClient {
    settings: GrocySettings,
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl GrocyClient {
    pub fn new(settings: GrocySettings) -> Result<Self, ApiError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .map_err(|err| ApiError::new(ApiFailure::Network, err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(ApiFailure::Network, err.to_string()))?;
        Ok(Self {
            settings,
            client,
            runtime,
        })
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    fn grocy_url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        join_url(&self.settings.api_url, segments)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        request
            .header(API_KEY_HEADER, &self.settings.api_key)
            .send()
            .await
            .map_err(map_reqwest_error)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = check_status(self.send(self.client.get(url)).await?)?;
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::new(ApiFailure::InvalidResponse, err.to_string()))
    }

    async fn post_json(&self, url: Url, body: serde_json::Value) -> Result<(), ApiError> {
        check_status(self.send(self.client.post(url).json(&body)).await?)?;
        Ok(())
    }
}

impl InventoryApi for GrocyClient {
    fn product_by_barcode(&self, barcode: &str) -> Result<Option<ProductInfo>, ApiError> {
        let url = self.grocy_url(&["stock", "products", "by-barcode", barcode])?;
        self.block_on(async {
            let response = self.send(self.client.get(url)).await?;
            if matches!(
                response.status(),
                StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND
            ) {
                buddy_debug!("Grocy does not know barcode {}", barcode);
                return Ok(None);
            }
            let details: StockDetails = check_status(response)?
                .json()
                .await
                .map_err(|err| ApiError::new(ApiFailure::InvalidResponse, err.to_string()))?;
            details.into_product().map(Some)
        })
    }

    fn consume(&self, id: ProductId, amount: Quantity, spoiled: bool) -> Result<(), ApiError> {
        let url = self.grocy_url(&["stock", "products", &id.to_string(), "consume"])?;
        self.block_on(self.post_json(
            url,
            json!({
                "amount": amount,
                "transaction_type": "consume",
                "spoiled": spoiled,
            }),
        ))
    }

    fn purchase(&self, id: ProductId, amount: Quantity) -> Result<PurchaseResult, ApiError> {
        let product_url = self.grocy_url(&["objects", "products", &id.to_string()])?;
        let add_url = self.grocy_url(&["stock", "products", &id.to_string(), "add"])?;
        self.block_on(async {
            let product: ProductRow = self.get_json(product_url).await?;
            let days = product
                .default_best_before_days
                .as_ref()
                .and_then(Flexible::as_f64)
                .unwrap_or(0.0) as i64;
            let (best_before, result) = match days {
                0 => (
                    NEVER_EXPIRES.to_string(),
                    PurchaseResult::StockedWithoutBestBefore,
                ),
                d if d < 0 => (NEVER_EXPIRES.to_string(), PurchaseResult::Stocked),
                d => {
                    let today = Local::now().date_naive();
                    let date = today
                        .checked_add_days(Days::new(d as u64))
                        .map(|date| date.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| NEVER_EXPIRES.to_string());
                    (date, PurchaseResult::Stocked)
                }
            };
            self.post_json(
                add_url,
                json!({
                    "amount": amount,
                    "transaction_type": "purchase",
                    "best_before_date": best_before,
                }),
            )
            .await?;
            Ok(result)
        })
    }

    fn open(&self, id: ProductId) -> Result<(), ApiError> {
        let url = self.grocy_url(&["stock", "products", &id.to_string(), "open"])?;
        self.block_on(self.post_json(url, json!({ "amount": 1 })))
    }

    fn add_to_shopping_list(&self, id: ProductId, amount: Quantity) -> Result<(), ApiError> {
        let url = self.grocy_url(&["stock", "shoppinglist", "add-product"])?;
        self.block_on(self.post_json(
            url,
            json!({
                "product_id": id,
                "product_amount": amount,
            }),
        ))
    }

    fn lookup_name_by_external_catalog(&self, barcode: &str) -> Result<Option<String>, ApiError> {
        let url = join_url(
            &self.settings.catalog_url,
            &["api", "v0", "product", &format!("{barcode}.json")],
        )?;
        self.block_on(async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(map_reqwest_error)?;
            if response.status() == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            let entry: CatalogEntry = check_status(response)?
                .json()
                .await
                .map_err(|err| ApiError::new(ApiFailure::InvalidResponse, err.to_string()))?;
            Ok(entry.name())
        })
    }
}

impl ChoreApi for GrocyClient {
    fn execute_chore(&self, id: u64) -> Result<(), ApiError> {
        let url = self.grocy_url(&["chores", &id.to_string(), "execute"])?;
        self.block_on(self.post_json(url, json!({})))
    }

    fn chore_name(&self, id: u64) -> Result<String, ApiError> {
        let url = self.grocy_url(&["chores", &id.to_string()])?;
        let details: ChoreDetails = self.block_on(self.get_json(url))?;
        Ok(details.chore.name)
    }
}

fn join_url(base: &str, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url =
        Url::parse(base).map_err(|err| ApiError::new(ApiFailure::InvalidUrl, err.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| ApiError::new(ApiFailure::InvalidUrl, format!("{base} cannot be a base")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ApiError::new(
            ApiFailure::HttpStatus(status.as_u16()),
            status.to_string(),
        ))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(ApiFailure::Timeout, err.to_string());
    }
    ApiError::new(ApiFailure::Network, err.to_string())
}

/// Grocy reports numbers as JSON numbers or numeric strings depending on version.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Flexible {
    Number(f64),
    Text(String),
}

impl Flexible {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Flexible::Number(value) => Some(*value),
            Flexible::Text(text) => text.trim().parse().ok(),
        }
    }

    fn as_id(&self) -> Option<ProductId> {
        self.as_f64()
            .filter(|value| *value >= 0.0 && value.fract() == 0.0)
            .map(|value| value as ProductId)
    }
}

#[derive(Debug, Deserialize)]
struct ProductRow {
    id: Flexible,
    name: String,
    #[serde(default)]
    default_best_before_days: Option<Flexible>,
}

#[derive(Debug, Deserialize)]
struct UnitRow {
    name: String,
}

#[derive(Debug, Deserialize)]
struct StockDetails {
    product: ProductRow,
    #[serde(default)]
    quantity_unit_stock: Option<UnitRow>,
    #[serde(default)]
    stock_amount: Option<Flexible>,
}

impl StockDetails {
    fn into_product(self) -> Result<ProductInfo, ApiError> {
        let id = self.product.id.as_id().ok_or_else(|| {
            ApiError::new(
                ApiFailure::InvalidResponse,
                format!("product id {:?} is not a number", self.product.id),
            )
        })?;
        Ok(ProductInfo {
            id,
            name: self.product.name,
            unit: self.quantity_unit_stock.map(|unit| unit.name).unwrap_or_default(),
            stock_amount: self
                .stock_amount
                .as_ref()
                .and_then(Flexible::as_f64)
                .unwrap_or(0.0),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChoreRow {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ChoreDetails {
    chore: ChoreRow,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogProduct {
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    generic_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(default)]
    status: Option<Flexible>,
    #[serde(default)]
    product: Option<CatalogProduct>,
}

impl CatalogEntry {
    fn name(self) -> Option<String> {
        if self.status.as_ref().and_then(Flexible::as_f64) == Some(0.0) {
            return None;
        }
        let product = self.product?;
        [product.product_name, product.generic_name]
            .into_iter()
            .flatten()
            .map(|name| name.trim().to_string())
            .find(|name| !name.is_empty())
    }
}

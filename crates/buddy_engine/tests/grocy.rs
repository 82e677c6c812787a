use std::time::Duration;

use buddy_engine::{
    ApiFailure, ChoreApi, GrocyClient, GrocySettings, InventoryApi, ProductInfo, PurchaseResult,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "secret-key";

fn settings(server: &MockServer) -> GrocySettings {
    GrocySettings {
        api_url: format!("{}/api/", server.uri()),
        api_key: KEY.to_string(),
        catalog_url: format!("{}/off", server.uri()),
        connect_timeout: Duration::from_secs(2),
        request_timeout: Duration::from_secs(2),
    }
}

/// The client drives its own runtime, so it has to live on a plain thread.
fn with_client<T, F>(settings: GrocySettings, f: F) -> T
where
    T: Send + 'static,
    F: FnOnce(&GrocyClient) -> T + Send + 'static,
{
    std::thread::spawn(move || {
        let client = GrocyClient::new(settings).unwrap();
        f(&client)
    })
    .join()
    .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn product_lookup_sends_api_key_and_parses_details() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/stock/products/by-barcode/4006381333931"))
        .and(header("GROCY-API-KEY", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "product": { "id": "7", "name": "Milk" },
            "quantity_unit_stock": { "name": "Carton" },
            "stock_amount": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let product = with_client(settings(&server), |client| {
        client.product_by_barcode("4006381333931")
    })
    .unwrap();

    assert_eq!(
        product,
        Some(ProductInfo {
            id: 7,
            name: "Milk".to_string(),
            unit: "Carton".to_string(),
            stock_amount: 2.0,
        })
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unknown_barcode_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/stock/products/by-barcode/999"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error_message": "No product with barcode 999 found"
        })))
        .mount(&server)
        .await;

    let product = with_client(settings(&server), |client| client.product_by_barcode("999"));

    assert_eq!(product.unwrap(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn server_error_is_reported_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/stock/products/7/open"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = with_client(settings(&server), |client| client.open(7)).unwrap_err();

    assert_eq!(err.kind, ApiFailure::HttpStatus(500));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn consume_posts_amount_and_spoiled_flag() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/stock/products/7/consume"))
        .and(body_partial_json(json!({ "amount": 1.0, "spoiled": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    with_client(settings(&server), |client| client.consume(7, 1.0, true)).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn purchase_without_default_best_before_uses_never_expires() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/objects/products/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "name": "Milk",
            "default_best_before_days": "0"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/stock/products/7/add"))
        .and(body_partial_json(json!({
            "amount": 3.0,
            "best_before_date": "2999-12-31"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let result = with_client(settings(&server), |client| client.purchase(7, 3.0)).unwrap();

    assert_eq!(result, PurchaseResult::StockedWithoutBestBefore);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn purchase_with_default_best_before_is_stocked() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/objects/products/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "name": "Milk",
            "default_best_before_days": 5
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/stock/products/7/add"))
        .and(body_partial_json(json!({ "amount": 1.0, "transaction_type": "purchase" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let result = with_client(settings(&server), |client| client.purchase(7, 1.0)).unwrap();

    assert_eq!(result, PurchaseResult::Stocked);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shopping_list_posts_product_and_amount() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/stock/shoppinglist/add-product"))
        .and(body_partial_json(json!({ "product_id": 7, "product_amount": 1.0 })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    with_client(settings(&server), |client| client.add_to_shopping_list(7, 1.0)).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn chore_is_executed_then_named() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chores/4/execute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/chores/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chore": { "id": 4, "name": "Water plants" },
            "last_tracked": null
        })))
        .mount(&server)
        .await;

    let name = with_client(settings(&server), |client| {
        client.execute_chore(4)?;
        client.chore_name(4)
    })
    .unwrap();

    assert_eq!(name, "Water plants");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn catalog_lookup_reads_product_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/off/api/v0/product/5000112548167.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 1,
            "product": { "product_name": "Diet Cola" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/off/api/v0/product/1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 0,
            "status_verbose": "product not found"
        })))
        .mount(&server)
        .await;

    let (found, missing) = with_client(settings(&server), |client| {
        (
            client.lookup_name_by_external_catalog("5000112548167"),
            client.lookup_name_by_external_catalog("1"),
        )
    });

    assert_eq!(found.unwrap().as_deref(), Some("Diet Cola"));
    assert_eq!(missing.unwrap(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/stock/products/by-barcode/123"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;
    let settings = GrocySettings {
        request_timeout: Duration::from_millis(200),
        ..settings(&server)
    };

    let err = with_client(settings, |client| client.product_by_barcode("123")).unwrap_err();

    assert_eq!(err.kind, ApiFailure::Timeout);
}

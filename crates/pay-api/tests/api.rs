use axum::http::StatusCode;
use axum_test::TestServer;
use pay_api::{create_router, AppConfig, AppState};
use pay_core::{
    integrity_signature, status, CheckoutSettings, NewProduct, ProductStore, SharedGateway,
    SharedStore, TransactionStore,
};
use pay_store::SqliteStore;
use pay_wompi::{WompiConfig, WompiGateway};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PUBLIC_KEY: &str = "pub_test_abc123";
const PRIVATE_KEY: &str = "prv_test_xyz789";
const SECRET: &str = "test_integrity_secret";

struct Harness {
    server: TestServer,
    store: SqliteStore,
    gateway: MockServer,
}

async fn harness() -> Harness {
    let gateway = MockServer::start().await;

    let store = SqliteStore::in_memory().await.unwrap();
    store
        .insert_product(&NewProduct::new("Producto A", 10_000, 10).with_description("demo"))
        .await
        .unwrap();

    let config = WompiConfig::new(PUBLIC_KEY, PRIVATE_KEY, SECRET).with_api_base_url(gateway.uri());
    let wompi = WompiGateway::new(config).unwrap();

    let state = AppState::from_parts(
        AppConfig::default(),
        Arc::new(wompi) as SharedGateway,
        Arc::new(store.clone()) as SharedStore,
        CheckoutSettings::new(SECRET),
    );
    let server = TestServer::new(create_router(state)).unwrap();

    Harness {
        server,
        store,
        gateway,
    }
}

async fn mount_acceptance_token(gateway: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/merchants/{}", PUBLIC_KEY)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "presigned_acceptance": { "acceptance_token": "acc_tok" } }
        })))
        .mount(gateway)
        .await;
}

async fn mount_submission(gateway: &MockServer, reference: &str, body: Value) {
    Mock::given(method("POST"))
        .and(path("/transactions"))
        .and(body_partial_json(json!({ "reference": reference })))
        .respond_with(ResponseTemplate::new(201).set_body_json(body))
        .mount(gateway)
        .await;
}

/// Open "txn_1" for product 1 with reference "order-1"
async fn open_transaction(h: &Harness) {
    mount_acceptance_token(&h.gateway).await;
    mount_submission(
        &h.gateway,
        "order-1",
        json!({ "data": { "id": "txn_1", "status": "PENDING" } }),
    )
    .await;

    h.server
        .post("/transactions")
        .json(&json!({ "product_id": 1, "reference": "order-1" }))
        .await
        .assert_status_ok();
}

fn payment_body() -> Value {
    json!({
        "transaction_id": "txn_1",
        "expiration_time": null,
        "customer_data": { "full_name": "Ana Gómez", "phone_number": "3001234567" },
        "shipping_address": { "address_line_1": "Calle 123 #45-67", "city": "Bogotá" },
        "amount_in_cents": 1_000_000,
        "currency": "COP",
        "payment_method": { "type": "CARD", "token": "tok_test_1", "installments": 1 },
        "redirect_url": "https://shop.example.com/done"
    })
}

// --- Products ----------------------------------------------------------------

#[tokio::test]
async fn health_reports_service() {
    let h = harness().await;

    let response = h.server.get("/health").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["service"], "storefront");
}

#[tokio::test]
async fn lists_and_fetches_products() {
    let h = harness().await;

    let list = h.server.get("/products").await.json::<Value>();
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["name"], "Producto A");

    let one = h.server.get("/products/1").await;
    one.assert_status_ok();
    assert_eq!(one.json::<Value>()["price"], 10_000);

    h.server
        .get("/products/42")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn partial_update_leaves_stock_alone() {
    let h = harness().await;

    let response = h
        .server
        .put("/products/1")
        .json(&json!({ "price": 12_000 }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["message"], "Product updated");

    let product = h.store.get_product(1).await.unwrap().unwrap();
    assert_eq!(product.price, 12_000);
    assert_eq!(product.stock, 10);

    h.server
        .put("/products/42")
        .json(&json!({ "price": 12_000 }))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    h.server
        .put("/products/1")
        .json(&json!({ "price": 0 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reduce_stock_endpoint() {
    let h = harness().await;

    h.server
        .put("/products/1/reduce-stock")
        .json(&json!({}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let too_many = h
        .server
        .put("/products/1/reduce-stock")
        .json(&json!({ "quantity": 11 }))
        .await;
    too_many.assert_status(StatusCode::BAD_REQUEST);
    assert!(too_many.json::<Value>()["message"]
        .as_str()
        .unwrap()
        .contains("stock cannot be negative"));

    h.server
        .put("/products/42/reduce-stock")
        .json(&json!({ "quantity": 1 }))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    h.server
        .put("/products/1/reduce-stock")
        .json(&json!({ "quantity": 4 }))
        .await
        .assert_status_ok();
    assert_eq!(h.store.get_product(1).await.unwrap().unwrap().stock, 6);
}

#[tokio::test]
async fn delete_product_endpoint() {
    let h = harness().await;

    h.server.delete("/products/1").await.assert_status_ok();
    h.server
        .delete("/products/1")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

// --- Transactions ------------------------------------------------------------

#[tokio::test]
async fn create_transaction_charges_price_in_cents() {
    let h = harness().await;
    mount_acceptance_token(&h.gateway).await;

    let signature = integrity_signature("order-1", 1_000_000, "COP", SECRET, None);
    Mock::given(method("POST"))
        .and(path("/transactions"))
        .and(body_partial_json(json!({
            "acceptance_token": "acc_tok",
            "amount_in_cents": 1_000_000,
            "currency": "COP",
            "reference": "order-1",
            "signature": signature
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": "txn_1", "status": "PENDING" }
        })))
        .expect(1)
        .mount(&h.gateway)
        .await;

    let response = h
        .server
        .post("/transactions")
        .json(&json!({ "product_id": 1, "reference": "order-1" }))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["amount_in_cents"], 1_000_000);
    assert_eq!(body["transaction_id"], "txn_1");
    assert_eq!(body["reference"], "order-1");

    let stored = h.store.find_transaction("txn_1").await.unwrap().unwrap();
    assert_eq!(stored.status, status::PENDING);
    assert_eq!(stored.amount, 1_000_000);
}

#[tokio::test]
async fn create_transaction_for_missing_product_skips_gateway() {
    let h = harness().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.gateway)
        .await;

    h.server
        .post("/transactions")
        .json(&json!({ "product_id": 42 }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_transaction_requires_product_id() {
    let h = harness().await;

    h.server
        .post("/transactions")
        .json(&json!({ "reference": "order-1" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_acceptance_token_is_a_fault() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path(format!("/merchants/{}", PUBLIC_KEY)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
        .mount(&h.gateway)
        .await;

    h.server
        .post("/transactions")
        .json(&json!({ "product_id": 1 }))
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn gateway_rejection_on_create_is_404() {
    let h = harness().await;
    mount_acceptance_token(&h.gateway).await;
    mount_submission(
        &h.gateway,
        "order-1",
        json!({ "error": { "type": "INPUT_VALIDATION_ERROR", "reason": "invalid signature" } }),
    )
    .await;

    let response = h
        .server
        .post("/transactions")
        .json(&json!({ "product_id": 1, "reference": "order-1" }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert!(response.json::<Value>()["message"]
        .as_str()
        .unwrap()
        .contains("invalid signature"));
    assert!(h.store.find_transaction("txn_1").await.unwrap().is_none());
}

#[tokio::test]
async fn pay_requires_every_field() {
    let h = harness().await;

    let response = h
        .server
        .post("/transactions/pay")
        .json(&json!({ "transaction_id": "txn_1", "currency": "COP" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let message = response.json::<Value>()["message"].as_str().unwrap().to_string();
    assert!(message.contains("expiration_time"));
    assert!(message.contains("redirect_url"));
    assert!(!message.contains("currency"));
}

#[tokio::test]
async fn approved_payment_updates_status_and_stock() {
    let h = harness().await;
    open_transaction(&h).await;
    mount_submission(
        &h.gateway,
        "txn_1",
        json!({ "data": { "id": "txn_1", "status": "APPROVED" } }),
    )
    .await;

    let response = h.server.post("/transactions/pay").json(&payment_body()).await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["status"], "APPROVED");
    assert_eq!(
        h.store.find_transaction("txn_1").await.unwrap().unwrap().status,
        status::APPROVED
    );
    assert_eq!(h.store.get_product(1).await.unwrap().unwrap().stock, 9);
}

#[tokio::test]
async fn declined_payment_keeps_stock() {
    let h = harness().await;
    open_transaction(&h).await;
    mount_submission(
        &h.gateway,
        "txn_1",
        json!({ "data": { "id": "txn_1", "status": "DECLINED" } }),
    )
    .await;

    h.server
        .post("/transactions/pay")
        .json(&payment_body())
        .await
        .assert_status_ok();

    assert_eq!(
        h.store.find_transaction("txn_1").await.unwrap().unwrap().status,
        status::DECLINED
    );
    assert_eq!(h.store.get_product(1).await.unwrap().unwrap().stock, 10);
}

#[tokio::test]
async fn paying_unknown_transaction_is_500() {
    let h = harness().await;

    h.server
        .post("/transactions/pay")
        .json(&payment_body())
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn status_refresh_follows_gateway() {
    let h = harness().await;
    open_transaction(&h).await;
    Mock::given(method("GET"))
        .and(path("/transactions/txn_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "txn_1", "status": "APPROVED", "amount_in_cents": 1_000_000 }
        })))
        .mount(&h.gateway)
        .await;

    let response = h.server.get("/transactions/txn_1/status").await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["transaction_id"], "txn_1");
    assert_eq!(body["status"], "APPROVED");
    assert_eq!(body["details"]["amount_in_cents"], 1_000_000);
    assert_eq!(
        h.store.find_transaction("txn_1").await.unwrap().unwrap().status,
        status::APPROVED
    );

    h.server
        .get("/transactions/unknown/status")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn details_join_product_and_delivery() {
    let h = harness().await;
    open_transaction(&h).await;

    let delivery = h
        .server
        .post("/deliveries")
        .json(&json!({ "transaction_id": "txn_1", "address": "Calle 123 #45-67" }))
        .await;
    delivery.assert_status_ok();
    assert!(delivery.json::<Value>()["delivery_id"].as_i64().is_some());

    let details = h.server.get("/transactions/txn_1").await;
    details.assert_status_ok();
    let body = details.json::<Value>();
    assert_eq!(body["transaction"]["transaction_id"], "txn_1");
    assert_eq!(body["product"]["name"], "Producto A");
    assert!(body["customer"].is_null());
    assert_eq!(body["delivery"]["status"], "PENDING");

    h.server
        .get("/transactions/unknown")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delivery_errors() {
    let h = harness().await;
    open_transaction(&h).await;

    h.server
        .post("/deliveries")
        .json(&json!({ "transaction_id": "unknown", "address": "Calle 1" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    h.server
        .post("/deliveries")
        .json(&json!({ "transaction_id": "txn_1", "address": "" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn lists_transactions_with_filters() {
    let h = harness().await;
    open_transaction(&h).await;

    let all = h.server.get("/transactions").await.json::<Value>();
    assert_eq!(all.as_array().unwrap().len(), 1);

    let approved = h
        .server
        .get("/transactions?status=APPROVED")
        .await
        .json::<Value>();
    assert!(approved.as_array().unwrap().is_empty());

    let window = h
        .server
        .get("/transactions?start_date=2000-01-01&end_date=2999-12-31")
        .await
        .json::<Value>();
    assert_eq!(window.as_array().unwrap().len(), 1);

    let past = h
        .server
        .get("/transactions?start_date=2000-01-01&end_date=2000-12-31")
        .await
        .json::<Value>();
    assert!(past.as_array().unwrap().is_empty());

    h.server
        .get("/transactions?start_date=someday&end_date=2000-12-31")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

// --- Customers / webhook -----------------------------------------------------

#[tokio::test]
async fn registers_customers() {
    let h = harness().await;
    let customer = json!({ "name": "Ana", "email": "ana@example.com", "phone": "3001234567" });

    let response = h.server.post("/customers").json(&customer).await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["message"], "Customer created");
    assert!(body["customer_id"].as_i64().is_some());

    h.server
        .post("/customers")
        .json(&customer)
        .await
        .assert_status(StatusCode::CONFLICT);

    h.server
        .post("/customers")
        .json(&json!({ "email": "bob@example.com" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn webhook_overwrites_status() {
    let h = harness().await;
    open_transaction(&h).await;
    h.store
        .update_transaction_status("txn_1", status::APPROVED)
        .await
        .unwrap();

    let response = h
        .server
        .post("/webhook/notifications")
        .json(&json!({
            "event": "transaction.updated",
            "data": { "id": "txn_1", "status": "VOIDED" }
        }))
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>()["message"],
        "Transaction txn_1 updated to status VOIDED"
    );
    assert_eq!(
        h.store.find_transaction("txn_1").await.unwrap().unwrap().status,
        status::VOIDED
    );
}

#[tokio::test]
async fn webhook_rejects_other_events() {
    let h = harness().await;

    h.server
        .post("/webhook/notifications")
        .json(&json!({ "event": "nequi_token.updated", "data": { "id": "x", "status": "y" } }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

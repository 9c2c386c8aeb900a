//! Payment endpoints against a real SQLite database, with only the gateway mocked out.
use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use outlet_order_engine::{
    db_types::{OrderId, PaymentId, PaymentStatusType, PaymentUpdate, ProductId},
    order_objects::{OrderItemRequest, PlaceOrderRequest},
    test_utils::{
        prepare_env::{prepare_test_env, random_db_path},
        seed::{seed_catalog, OPEN_OUTLET},
    },
    GatewayError,
    OrderFlowApi,
    OrderPortsAdapter,
    PaymentFlowApi,
    PaymentManagement,
    SqliteDatabase,
};
use serde_json::json;

use super::{
    helpers::{json, send_request},
    mocks::MockGateway,
};
use crate::routes::{
    CreatePaymentRoute,
    CustomerPaymentByIdRoute,
    PaymentByIdRoute,
    RefundPaymentRoute,
    SearchPaymentsRoute,
};

type Ports = OrderPortsAdapter<SqliteDatabase>;

pub fn configure(db: SqliteDatabase, gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let ports = OrderPortsAdapter::new(db.clone(), "INR");
        cfg.service(CreatePaymentRoute::<SqliteDatabase, Ports, MockGateway>::new())
            .service(SearchPaymentsRoute::<SqliteDatabase, Ports, MockGateway>::new())
            .service(PaymentByIdRoute::<SqliteDatabase, Ports, MockGateway>::new())
            .service(RefundPaymentRoute::<SqliteDatabase, Ports, MockGateway>::new())
            .service(CustomerPaymentByIdRoute::<SqliteDatabase, Ports, MockGateway>::new())
            .app_data(web::Data::new(PaymentFlowApi::new(db, ports, gateway)));
    }
}

pub async fn seeded_db() -> SqliteDatabase {
    let db = prepare_test_env(&random_db_path()).await;
    seed_catalog(&db).await;
    db
}

/// Places an order for two thalis (2 x 99.00) at the open outlet.
pub async fn place_order(db: &SqliteDatabase, customer_id: Option<i64>) -> OrderId {
    let api = OrderFlowApi::new(db.clone(), db.clone());
    let req = PlaceOrderRequest {
        outlet_id: OPEN_OUTLET,
        customer_id,
        items: vec![OrderItemRequest { product_id: ProductId::from("thali"), quantity: 2 }],
    };
    api.place_order(req).await.expect("Order should be placed").order.id
}

pub fn working_gateway(gateway_order_id: &'static str) -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_key_id().returning(|| "rzp_test_endpoint".to_string());
    gateway.expect_create_gateway_order().returning(move |_, _, _| Ok(gateway_order_id.to_string()));
    gateway
}

async fn create_payment(db: &SqliteDatabase, order_id: &OrderId, gateway: MockGateway) -> (StatusCode, String) {
    let req = TestRequest::post().uri(&format!("/payments/create/{order_id}"));
    send_request(req, configure(db.clone(), gateway)).await
}

async fn captured_payment(db: &SqliteDatabase) -> PaymentId {
    let order_id = place_order(db, Some(21)).await;
    let (_, body) = create_payment(db, &order_id, working_gateway("order_cap1")).await;
    let id = PaymentId::from(json(&body)["payment_id"].as_str().unwrap());
    let update = PaymentUpdate::new(PaymentStatusType::Success).with_gateway_payment_id("pay_cap1");
    db.transition_payment(&id, &[PaymentStatusType::Initiated], update).await.unwrap().unwrap();
    id
}

#[actix_web::test]
async fn create_payment_returns_checkout_details() {
    let db = seeded_db().await;
    let order_id = place_order(&db, Some(21)).await;
    let mut gateway = MockGateway::new();
    gateway.expect_key_id().returning(|| "rzp_test_endpoint".to_string());
    gateway
        .expect_create_gateway_order()
        .withf(|amount, currency, _| *amount == 19800 && currency == "INR")
        .times(1)
        .returning(|_, _, _| Ok("order_P1x9".to_string()));
    let (status, body) = create_payment(&db, &order_id, gateway).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let init = json(&body);
    assert_eq!(init["gateway_order_id"], "order_P1x9");
    assert_eq!(init["amount"], "198.00");
    assert_eq!(init["currency"], "INR");
    assert_eq!(init["key_id"], "rzp_test_endpoint");

    let id = init["payment_id"].as_str().unwrap();
    let req = TestRequest::get().uri(&format!("/payments/{id}"));
    let (status, body) = send_request(req, configure(db.clone(), MockGateway::new())).await;
    assert_eq!(status, StatusCode::OK);
    let payment = json(&body);
    assert_eq!(payment["status"], "INITIATED");
    assert_eq!(payment["order_id"], order_id.as_str());
}

#[actix_web::test]
async fn create_payment_failures() {
    let db = seeded_db().await;
    let (status, _) = create_payment(&db, &OrderId::from("no-such-order"), MockGateway::new()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let order_id = place_order(&db, None).await;
    let mut gateway = MockGateway::new();
    gateway.expect_create_gateway_order().returning(|_, _, _| Err(GatewayError::Timeout));
    let (status, body) = create_payment(&db, &order_id, gateway).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json(&body)["error"], "Payment gateway error. Payment gateway did not respond in time");

    // Without the test-mode fallback, an unconfigured gateway is an error too
    let mut gateway = MockGateway::new();
    gateway.expect_create_gateway_order().returning(|_, _, _| Err(GatewayError::NotConfigured("no keys".into())));
    let (status, _) = create_payment(&db, &order_id, gateway).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[actix_web::test]
async fn refunds() {
    let db = seeded_db().await;
    let id = captured_payment(&db).await;
    let uri = format!("/payments/{id}/refund");

    let req = TestRequest::post().uri(&uri).set_json(json!({"amount": "250.00"}));
    let (status, _) = send_request(req, configure(db.clone(), MockGateway::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = TestRequest::post()
        .uri(&uri)
        .insert_header(("content-type", "application/json"))
        .set_payload("{amount:");
    let (status, _) = send_request(req, configure(db.clone(), MockGateway::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut gateway = MockGateway::new();
    gateway
        .expect_create_refund()
        .withf(|id, amount| id == "pay_cap1" && *amount == Some(5000))
        .times(1)
        .returning(|_, _| Ok("rfnd_E1".to_string()));
    let req = TestRequest::post().uri(&uri).set_json(json!({"amount": "50.00", "reason": "late delivery"}));
    let (status, body) = send_request(req, configure(db.clone(), gateway)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let result = json(&body);
    assert_eq!(result["refund_id"], "rfnd_E1");
    assert_eq!(result["amount_refunded"], "50.00");

    // Already refunded
    let req = TestRequest::post().uri(&uri);
    let (status, _) = send_request(req, configure(db.clone(), MockGateway::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let payment = db.fetch_payment(&id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatusType::Refunded);
}

#[actix_web::test]
async fn full_refund_without_body() {
    let db = seeded_db().await;
    let id = captured_payment(&db).await;
    let mut gateway = MockGateway::new();
    gateway
        .expect_create_refund()
        .withf(|id, amount| id == "pay_cap1" && amount.is_none())
        .times(1)
        .returning(|_, _| Ok("rfnd_F1".into()));
    let req = TestRequest::post().uri(&format!("/payments/{id}/refund"));
    let (status, body) = send_request(req, configure(db.clone(), gateway)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["amount_refunded"], "198.00");
}

#[actix_web::test]
async fn customer_scoped_fetch_and_search() {
    let db = seeded_db().await;
    let id = captured_payment(&db).await;

    let req = TestRequest::get().uri(&format!("/customers/21/payments/{id}"));
    let (status, _) = send_request(req, configure(db.clone(), MockGateway::new())).await;
    assert_eq!(status, StatusCode::OK);
    let req = TestRequest::get().uri(&format!("/customers/22/payments/{id}"));
    let (status, _) = send_request(req, configure(db.clone(), MockGateway::new())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let req = TestRequest::get().uri("/payments?status=SUCCESS&size=5");
    let (status, body) = send_request(req, configure(db.clone(), MockGateway::new())).await;
    assert_eq!(status, StatusCode::OK);
    let page = json(&body);
    assert_eq!(page["total_elements"], 1);
    assert_eq!(page["size"], 5);
    assert_eq!(page["content"][0]["id"], id.as_str());

    let req = TestRequest::get().uri("/payments?status=REFUNDED");
    let (_, body) = send_request(req, configure(db.clone(), MockGateway::new())).await;
    assert_eq!(json(&body)["total_elements"], 0);
}

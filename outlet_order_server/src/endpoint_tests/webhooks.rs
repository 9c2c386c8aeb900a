use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use outlet_order_engine::{
    db_types::OrderPaymentStatus,
    OrderFlowApi,
    OrderPortsAdapter,
    PaymentFlowApi,
    SqliteDatabase,
};
use serde_json::json;

use super::{
    helpers::{json, send_request},
    mocks::MockGateway,
    payments::{place_order, seeded_db, working_gateway},
};
use crate::routes::{CreatePaymentRoute, WebhookRoute, SIGNATURE_HEADER};

type Ports = OrderPortsAdapter<SqliteDatabase>;

const GOOD_SIGNATURE: &str = "5f1d8c0f9e2a";

fn configure(db: SqliteDatabase, gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let ports = OrderPortsAdapter::new(db.clone(), "INR");
        cfg.service(WebhookRoute::<SqliteDatabase, Ports, MockGateway>::new())
            .service(CreatePaymentRoute::<SqliteDatabase, Ports, MockGateway>::new())
            .app_data(web::Data::new(PaymentFlowApi::new(db, ports, gateway)));
    }
}

fn verifying_gateway() -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_verify_webhook_signature().returning(|_, sig| sig == GOOD_SIGNATURE);
    gateway
}

async fn deliver(db: &SqliteDatabase, body: &str, signature: Option<&str>) -> (StatusCode, String) {
    let mut req = TestRequest::post().uri("/payments/webhook").set_payload(body.to_string());
    if let Some(sig) = signature {
        req = req.insert_header((SIGNATURE_HEADER, sig));
    }
    send_request(req, configure(db.clone(), verifying_gateway())).await
}

fn captured(gateway_order_id: &str) -> String {
    json!({
        "entity": "event",
        "event": "payment.captured",
        "payload": {"payment": {"entity": {"id": "pay_W3b", "order_id": gateway_order_id, "method": "netbanking"}}}
    })
    .to_string()
}

#[actix_web::test]
async fn rejected_deliveries() {
    let db = seeded_db().await;
    let body = captured("order_W1");
    let (status, _) = deliver(&db, &body, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body_text) = deliver(&db, &body, Some("forged")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body_text)["error"], "Invalid webhook. Signature verification failed");
    let (status, _) = deliver(&db, "", Some(GOOD_SIGNATURE)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = deliver(&db, "not json", Some(GOOD_SIGNATURE)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(db.fetch_webhook_events().await.unwrap().is_empty());
}

#[actix_web::test]
async fn capture_is_reconciled_once() {
    let db = seeded_db().await;
    let order_id = place_order(&db, Some(4)).await;
    let req = TestRequest::post().uri(&format!("/payments/create/{order_id}"));
    let (status, body) = send_request(req, configure(db.clone(), working_gateway("order_W2"))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let body = captured("order_W2");
    let (status, outcome) = deliver(&db, &body, Some(GOOD_SIGNATURE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&outcome), json!({"outcome": "processed", "event_type": "payment.captured"}));
    let (status, outcome) = deliver(&db, &body, Some(GOOD_SIGNATURE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&outcome), json!({"outcome": "duplicate"}));

    let orders = OrderFlowApi::new(db.clone(), db.clone());
    let order = orders.fetch_order(&order_id).await.unwrap().order;
    assert_eq!(order.payment_status, OrderPaymentStatus::Paid);
    let events = db.fetch_webhook_events().await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].dedup_key, "pay_W3b_payment.captured");
}

#[actix_web::test]
async fn orphans_and_unknown_events_are_acknowledged() {
    let db = seeded_db().await;
    let (status, outcome) = deliver(&db, &captured("order_x"), Some(GOOD_SIGNATURE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&outcome), json!({"outcome": "no_change", "event_type": "payment.captured"}));

    let body = json!({"event": "settlement.processed", "payload": {"settlement": {}}}).to_string();
    let (status, outcome) = deliver(&db, &body, Some(GOOD_SIGNATURE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&outcome)["outcome"], "no_change");

    let (status, outcome) = deliver(&db, r#"{"event": ""}"#, Some(GOOD_SIGNATURE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&outcome), json!({"outcome": "ignored"}));
    assert_eq!(db.fetch_webhook_events().await.unwrap().len(), 2);
}

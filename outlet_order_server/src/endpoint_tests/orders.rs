use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use outlet_order_engine::{
    db_types::{Order, OrderId, OrderItem, OrderPaymentStatus, OrderStatusType, OutletProductView, OutletView, ProductId},
    traits::OrderManagementError,
    OrderFlowApi,
};
use serde_json::json;

use super::{
    helpers::{json, send_request},
    mocks::{MockCatalog, MockOrderStore},
};
use crate::routes::{
    CustomerOrderByIdRoute,
    OrderByIdRoute,
    OutletOrderByIdRoute,
    PlaceOrderRoute,
    RevenueSummaryRoute,
    UpdateOrderStatusRoute,
    UpdateOutletOrderStatusRoute,
};

fn configure(store: MockOrderStore, catalog: MockCatalog) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.service(RevenueSummaryRoute::<MockOrderStore, MockCatalog>::new())
            .service(PlaceOrderRoute::<MockOrderStore, MockCatalog>::new())
            .service(OrderByIdRoute::<MockOrderStore, MockCatalog>::new())
            .service(UpdateOrderStatusRoute::<MockOrderStore, MockCatalog>::new())
            .service(CustomerOrderByIdRoute::<MockOrderStore, MockCatalog>::new())
            .service(OutletOrderByIdRoute::<MockOrderStore, MockCatalog>::new())
            .service(UpdateOutletOrderStatusRoute::<MockOrderStore, MockCatalog>::new())
            .app_data(web::Data::new(OrderFlowApi::new(store, catalog)));
    }
}

fn order(status: OrderStatusType) -> Order {
    let ts = Utc.with_ymd_and_hms(2024, 10, 15, 8, 30, 0).unwrap();
    Order {
        id: OrderId::from("8d0c5c3e-4a55-4c1f-9d1e-2f0b6e6c1a01"),
        order_number: "ORD-8D0C5C3E4A55".into(),
        outlet_id: 1,
        customer_id: Some(7),
        status,
        total_amount: "231.33".parse().unwrap(),
        payment_status: OrderPaymentStatus::Unpaid,
        created_at: ts,
        updated_at: ts,
    }
}

fn product(id: &str, base: &str, outlet_price: Option<&str>) -> OutletProductView {
    OutletProductView {
        outlet_id: 1,
        product_id: ProductId::from(id),
        product_name: id.to_uppercase(),
        base_price: base.parse().unwrap(),
        outlet_price: outlet_price.map(|p| p.parse().unwrap()),
        is_available: true,
        minimum_order_quantity: None,
    }
}

fn open_catalog() -> MockCatalog {
    let mut catalog = MockCatalog::new();
    catalog.expect_fetch_outlet().returning(|id| Ok(Some(OutletView { id, name: "Indiranagar".into(), is_active: true })));
    catalog.expect_fetch_outlet_product().returning(|_, id| {
        let view = match id.as_str() {
            "thali" => Some(product("thali", "120.00", Some("99.00"))),
            "lassi" => Some(product("lassi", "33.33", None)),
            _ => None,
        };
        Ok(view)
    });
    catalog
}

fn store_with(order: Order) -> MockOrderStore {
    let mut store = MockOrderStore::new();
    store.expect_fetch_order().returning(move |_| Ok(Some(order.clone())));
    store.expect_fetch_order_items().returning(|_| Ok(vec![]));
    store
}

#[actix_web::test]
async fn place_order() {
    let mut store = MockOrderStore::new();
    store.expect_order_number_exists().times(1).returning(|_| Ok(false));
    store.expect_insert_order().times(1).returning(|new_order| {
        let mut order = order(OrderStatusType::Pending);
        order.id = new_order.id.clone();
        order.order_number = new_order.order_number.clone();
        order.total_amount = new_order.total_amount;
        let items = new_order
            .items
            .into_iter()
            .enumerate()
            .map(|(i, item)| OrderItem {
                id: i as i64 + 1,
                order_id: new_order.id.clone(),
                product_id: item.product_id,
                product_name: item.product_name,
                unit_price: item.unit_price,
                quantity: item.quantity,
                subtotal: item.subtotal,
            })
            .collect();
        Ok((order, items))
    });
    let body = json!({
        "outlet_id": 1,
        "customer_id": 7,
        "items": [{"product_id": "thali", "quantity": 2}, {"product_id": "lassi", "quantity": 1}]
    });
    let req = TestRequest::post().uri("/orders").set_json(body);
    let (status, body) = send_request(req, configure(store, open_catalog())).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let order = json(&body);
    assert_eq!(order["total_amount"], "231.33");
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["payment_status"], "UNPAID");
    assert!(order["order_number"].as_str().unwrap().starts_with("ORD-"));
    assert_eq!(order["items"][0]["unit_price"], "99.00");
    assert_eq!(order["items"][0]["subtotal"], "198.00");
    assert_eq!(order["items"][1]["subtotal"], "33.33");
}

#[actix_web::test]
async fn place_order_rejections() {
    let mut store = MockOrderStore::new();
    store.expect_insert_order().never();
    let body = json!({"outlet_id": 1, "items": [{"product_id": "biryani", "quantity": 1}]});
    let req = TestRequest::post().uri("/orders").set_json(body);
    let (status, body) = send_request(req, configure(store, open_catalog())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "Product biryani is not sold at outlet 1");

    let mut catalog = MockCatalog::new();
    catalog.expect_fetch_outlet().returning(|id| Ok(Some(OutletView { id, name: "Closed".into(), is_active: false })));
    let body = json!({"outlet_id": 2, "items": [{"product_id": "thali", "quantity": 1}]});
    let req = TestRequest::post().uri("/orders").set_json(body);
    let (status, body) = send_request(req, configure(MockOrderStore::new(), catalog)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "Outlet 2 is not accepting orders");

    let body = json!({"outlet_id": 1, "items": []});
    let req = TestRequest::post().uri("/orders").set_json(body);
    let (status, _) = send_request(req, configure(MockOrderStore::new(), MockCatalog::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn fetch_order_scoping() {
    let path = "8d0c5c3e-4a55-4c1f-9d1e-2f0b6e6c1a01";
    let req = TestRequest::get().uri(&format!("/orders/{path}"));
    let (status, body) = send_request(req, configure(store_with(order(OrderStatusType::Ready)), MockCatalog::new())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["status"], "READY");

    let req = TestRequest::get().uri(&format!("/customers/7/orders/{path}"));
    let (status, _) = send_request(req, configure(store_with(order(OrderStatusType::Ready)), MockCatalog::new())).await;
    assert_eq!(status, StatusCode::OK);
    // Somebody else's order looks exactly like a missing one
    let req = TestRequest::get().uri(&format!("/customers/8/orders/{path}"));
    let (status, body) = send_request(req, configure(store_with(order(OrderStatusType::Ready)), MockCatalog::new())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["error"], format!("The data was not found. Order {path} was not found"));

    let req = TestRequest::get().uri(&format!("/outlets/1/orders/{path}"));
    let (status, _) = send_request(req, configure(store_with(order(OrderStatusType::Ready)), MockCatalog::new())).await;
    assert_eq!(status, StatusCode::OK);
    let req = TestRequest::get().uri(&format!("/outlets/3/orders/{path}"));
    let (status, _) = send_request(req, configure(store_with(order(OrderStatusType::Ready)), MockCatalog::new())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let mut store = MockOrderStore::new();
    store.expect_fetch_order().returning(|_| Ok(None));
    let req = TestRequest::get().uri("/orders/nope");
    let (status, _) = send_request(req, configure(store, MockCatalog::new())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn update_status() {
    let mut store = store_with(order(OrderStatusType::Confirmed));
    store
        .expect_update_order_status()
        .withf(|_, expected, new| *expected == OrderStatusType::Confirmed && *new == OrderStatusType::Preparing)
        .times(1)
        .returning(|_, _, new| Ok(order(new)));
    let req = TestRequest::patch()
        .uri("/orders/8d0c5c3e-4a55-4c1f-9d1e-2f0b6e6c1a01/status")
        .set_json(json!({"status": "PREPARING"}));
    let (status, body) = send_request(req, configure(store, MockCatalog::new())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["status"], "PREPARING");
}

#[actix_web::test]
async fn invalid_status_changes_conflict() {
    let mut store = store_with(order(OrderStatusType::Delivered));
    store.expect_update_order_status().never();
    let req = TestRequest::patch()
        .uri("/orders/8d0c5c3e-4a55-4c1f-9d1e-2f0b6e6c1a01/status")
        .set_json(json!({"status": "CANCELLED"}));
    let (status, _) = send_request(req, configure(store, MockCatalog::new())).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let mut store = store_with(order(OrderStatusType::Preparing));
    store.expect_update_order_status().never();
    let req = TestRequest::patch()
        .uri("/outlets/1/orders/8d0c5c3e-4a55-4c1f-9d1e-2f0b6e6c1a01/status")
        .set_json(json!({"status": "CANCELLED"}));
    let (status, _) = send_request(req, configure(store, MockCatalog::new())).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Lost a race against another writer
    let mut store = store_with(order(OrderStatusType::Pending));
    store.expect_update_order_status().returning(|id, expected, _| {
        Err(OrderManagementError::StatusConflict { id: id.clone(), expected })
    });
    let req = TestRequest::patch()
        .uri("/outlets/1/orders/8d0c5c3e-4a55-4c1f-9d1e-2f0b6e6c1a01/status")
        .set_json(json!({"status": "CONFIRMED"}));
    let (status, _) = send_request(req, configure(store, MockCatalog::new())).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Other outlets can't touch it at all
    let mut store = store_with(order(OrderStatusType::Pending));
    store.expect_update_order_status().never();
    let req = TestRequest::patch()
        .uri("/outlets/2/orders/8d0c5c3e-4a55-4c1f-9d1e-2f0b6e6c1a01/status")
        .set_json(json!({"status": "CONFIRMED"}));
    let (status, _) = send_request(req, configure(store, MockCatalog::new())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let req = TestRequest::patch()
        .uri("/orders/8d0c5c3e-4a55-4c1f-9d1e-2f0b6e6c1a01/status")
        .set_json(json!({"status": "SHIPPED"}));
    let (status, _) = send_request(req, configure(MockOrderStore::new(), MockCatalog::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn revenue_summary() {
    let mut store = MockOrderStore::new();
    store.expect_fetch_order().never();
    store.expect_revenue_between().times(1).returning(|_, _| Ok(("1234.50".parse().unwrap(), 3)));
    let req = TestRequest::get().uri("/orders/revenue_summary?from=2024-10-01T00:00:00Z&to=2024-10-31T23:59:59Z");
    let (status, body) = send_request(req, configure(store, MockCatalog::new())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let summary = json(&body);
    assert_eq!(summary["total_revenue"], "1234.50");
    assert_eq!(summary["order_count"], 3);
    assert_eq!(summary["from"], "2024-10-01T00:00:00Z");

    let req = TestRequest::get().uri("/orders/revenue_summary?from=2024-10-31T00:00:00Z&to=2024-10-01T00:00:00Z");
    let (status, _) = send_request(req, configure(MockOrderStore::new(), MockCatalog::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

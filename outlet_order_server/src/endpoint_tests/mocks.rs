use chrono::{DateTime, Utc};
use mockall::mock;
use outlet_order_engine::{
    db_types::{
        Money,
        NewOrder,
        Order,
        OrderId,
        OrderItem,
        OrderPaymentStatus,
        OrderStatusType,
        OutletProductView,
        OutletView,
        ProductId,
    },
    order_objects::{OrderQueryFilter, Pagination},
    traits::{CatalogError, CatalogLookup, GatewayError, OrderManagement, OrderManagementError, PaymentGatewayPort},
};

mock! {
    pub OrderStore {}
    impl Clone for OrderStore {
        fn clone(&self) -> Self;
    }
    impl OrderManagement for OrderStore {
        async fn order_number_exists(&self, order_number: &str) -> Result<bool, OrderManagementError>;
        async fn insert_order(&self, order: NewOrder) -> Result<(Order, Vec<OrderItem>), OrderManagementError>;
        async fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, OrderManagementError>;
        async fn fetch_order_items(&self, id: &OrderId) -> Result<Vec<OrderItem>, OrderManagementError>;
        async fn update_order_status(&self, id: &OrderId, expected: OrderStatusType, new_status: OrderStatusType) -> Result<Order, OrderManagementError>;
        async fn update_payment_status(&self, id: &OrderId, status: OrderPaymentStatus) -> Result<Order, OrderManagementError>;
        async fn search_orders(&self, query: OrderQueryFilter, page: Pagination) -> Result<(Vec<Order>, i64), OrderManagementError>;
        async fn revenue_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<(Money, i64), OrderManagementError>;
    }
}

mock! {
    pub Catalog {}
    impl Clone for Catalog {
        fn clone(&self) -> Self;
    }
    impl CatalogLookup for Catalog {
        async fn fetch_outlet(&self, outlet_id: i64) -> Result<Option<OutletView>, CatalogError>;
        async fn fetch_outlet_product(&self, outlet_id: i64, product_id: &ProductId) -> Result<Option<OutletProductView>, CatalogError>;
    }
}

mock! {
    pub Gateway {}
    impl Clone for Gateway {
        fn clone(&self) -> Self;
    }
    impl PaymentGatewayPort for Gateway {
        fn key_id(&self) -> String;
        async fn create_gateway_order(&self, amount_minor: i64, currency: &str, receipt: &str) -> Result<String, GatewayError>;
        fn verify_webhook_signature(&self, body: &str, signature: &str) -> bool;
        async fn create_refund(&self, gateway_payment_id: &str, amount_minor: Option<i64>) -> Result<String, GatewayError>;
    }
}

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{Money, NewOrder, Order, OrderId, OrderItem, OrderPaymentStatus, OrderStatusType},
    order_objects::{OrderQueryFilter, Pagination},
};

#[derive(Debug, Clone, Error)]
pub enum OrderManagementError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Order number {0} is already in use")]
    DuplicateOrderNumber(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {id} was expected to be {expected}, but another update got there first")]
    StatusConflict { id: OrderId, expected: OrderStatusType },
}

impl From<sqlx::Error> for OrderManagementError {
    fn from(e: sqlx::Error) -> Self {
        OrderManagementError::DatabaseError(e.to_string())
    }
}

/// Storage contract for the Order aggregate.
///
/// Status and payment status are deliberately updated by separate calls that each touch a single column, so that an
/// outlet moving an order along and a gateway callback marking it paid can never overwrite each other.
#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone {
    /// Returns true if an order with this order number has already been stored.
    async fn order_number_exists(&self, order_number: &str) -> Result<bool, OrderManagementError>;

    /// Stores the order and all of its items in a single atomic transaction. The order is stored as `Pending` and
    /// `Unpaid`.
    ///
    /// If the order number collides with an existing order, nothing is stored and
    /// [`OrderManagementError::DuplicateOrderNumber`] is returned.
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, Vec<OrderItem>), OrderManagementError>;

    async fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, OrderManagementError>;

    async fn fetch_order_items(&self, id: &OrderId) -> Result<Vec<OrderItem>, OrderManagementError>;

    /// Compare-and-set on the lifecycle status. The update only happens if the stored status is still `expected`,
    /// otherwise [`OrderManagementError::StatusConflict`] is returned.
    async fn update_order_status(
        &self,
        id: &OrderId,
        expected: OrderStatusType,
        new_status: OrderStatusType,
    ) -> Result<Order, OrderManagementError>;

    /// Sets the payment status. Applying the status the order already has changes nothing.
    async fn update_payment_status(
        &self,
        id: &OrderId,
        status: OrderPaymentStatus,
    ) -> Result<Order, OrderManagementError>;

    /// Newest orders first. Returns the requested page and the total number of matching orders.
    async fn search_orders(
        &self,
        query: OrderQueryFilter,
        page: Pagination,
    ) -> Result<(Vec<Order>, i64), OrderManagementError>;

    /// Sum and count of orders that are both `Delivered` and `Paid`, created within `[from, to]`.
    async fn revenue_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<(Money, i64), OrderManagementError>;
}

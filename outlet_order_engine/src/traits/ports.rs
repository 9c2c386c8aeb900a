use std::collections::HashMap;

use log::*;
use thiserror::Error;

use crate::db_types::{Money, OrderId, OrderPaymentStatus, ProductId};

#[derive(Debug, Clone, Error)]
pub enum OrderPortError {
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The order service failed. {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Error)]
#[error("Inventory deduction failed. {0}")]
pub struct InventoryError(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderAmount {
    pub amount: Money,
    pub currency: String,
    pub customer_id: Option<i64>,
}

/// Lets the payment side read what an order is worth, without knowing anything else about orders.
#[allow(async_fn_in_trait)]
pub trait OrderAmountPort: Clone {
    /// Returns `None` if the order does not exist.
    async fn fetch_order_amount(&self, order_id: &OrderId) -> Result<Option<OrderAmount>, OrderPortError>;
}

/// Lets the payment side report settlement outcomes to the order. Implementations must be idempotent.
#[allow(async_fn_in_trait)]
pub trait OrderPaymentStatusPort: Clone {
    async fn apply_payment_status(&self, order_id: &OrderId, status: OrderPaymentStatus) -> Result<(), OrderPortError>;
}

/// Both directions of the payment→order link.
pub trait OrderPorts: OrderAmountPort + OrderPaymentStatusPort {}

impl<T> OrderPorts for T where T: OrderAmountPort + OrderPaymentStatusPort {}

/// Called after an order has been committed. Failures are logged by the caller and never undo the order.
#[allow(async_fn_in_trait)]
pub trait InventoryDeductionPort: Clone {
    async fn deduct_for_order(
        &self,
        order_id: &OrderId,
        outlet_id: i64,
        quantities: &HashMap<ProductId, u32>,
    ) -> Result<(), InventoryError>;
}

/// Inventory is not tracked. This is the default deduction hook.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpInventoryDeduction;

impl InventoryDeductionPort for NoOpInventoryDeduction {
    async fn deduct_for_order(
        &self,
        order_id: &OrderId,
        outlet_id: i64,
        quantities: &HashMap<ProductId, u32>,
    ) -> Result<(), InventoryError> {
        trace!(
            "📦️ Inventory is not tracked. Skipping deduction of {} lines for order {order_id} @ outlet {outlet_id}",
            quantities.len()
        );
        Ok(())
    }
}

use log::*;

use crate::{
    db_types::{OrderId, OrderPaymentStatus},
    traits::{OrderAmount, OrderAmountPort, OrderManagement, OrderManagementError, OrderPaymentStatusPort, OrderPortError},
};

/// Exposes an [`OrderManagement`] backend to the payment side through the order ports.
///
/// Orders carry no currency of their own, so every amount is quoted in the configured default currency.
#[derive(Debug, Clone)]
pub struct OrderPortsAdapter<B> {
    db: B,
    currency: String,
}

impl<B: OrderManagement> OrderPortsAdapter<B> {
    pub fn new<S: Into<String>>(db: B, currency: S) -> Self {
        Self { db, currency: currency.into() }
    }
}

impl From<OrderManagementError> for OrderPortError {
    fn from(e: OrderManagementError) -> Self {
        match e {
            OrderManagementError::OrderNotFound(id) => Self::OrderNotFound(id),
            e => Self::Backend(e.to_string()),
        }
    }
}

impl<B: OrderManagement> OrderAmountPort for OrderPortsAdapter<B> {
    async fn fetch_order_amount(&self, order_id: &OrderId) -> Result<Option<OrderAmount>, OrderPortError> {
        let order = self.db.fetch_order(order_id).await?;
        Ok(order.map(|o| OrderAmount {
            amount: o.total_amount,
            currency: self.currency.clone(),
            customer_id: o.customer_id,
        }))
    }
}

impl<B: OrderManagement> OrderPaymentStatusPort for OrderPortsAdapter<B> {
    async fn apply_payment_status(&self, order_id: &OrderId, status: OrderPaymentStatus) -> Result<(), OrderPortError> {
        let order = self.db.update_payment_status(order_id, status).await?;
        debug!("📦️ Order {} payment status is {}", order.order_number, order.payment_status);
        Ok(())
    }
}

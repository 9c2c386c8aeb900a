use thiserror::Error;

use crate::{
    db_types::{OrderId, PaymentId},
    traits::{CatalogError, GatewayError, OrderManagementError, OrderPortError, PaymentManagementError},
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("{0}")]
    ValidationError(String),
    #[error("Order {0} was not found")]
    OrderNotFound(OrderId),
    #[error("{0}")]
    InvalidOrderState(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<OrderManagementError> for OrderFlowError {
    fn from(e: OrderManagementError) -> Self {
        match e {
            OrderManagementError::OrderNotFound(id) => Self::OrderNotFound(id),
            OrderManagementError::StatusConflict { .. } => Self::InvalidOrderState(e.to_string()),
            OrderManagementError::DuplicateOrderNumber(_) => Self::ValidationError(e.to_string()),
            OrderManagementError::DatabaseError(s) => Self::DatabaseError(s),
        }
    }
}

impl From<CatalogError> for OrderFlowError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::DatabaseError(s) => Self::DatabaseError(s),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentFlowError {
    #[error("{0}")]
    ValidationError(String),
    #[error("Payment {0} was not found")]
    PaymentNotFound(PaymentId),
    #[error("Order {0} was not found")]
    OrderNotFound(OrderId),
    #[error("Invalid webhook. {0}")]
    InvalidWebhook(String),
    #[error("Webhook signature is missing")]
    UnsignedWebhook,
    #[error("{0}")]
    GatewayError(#[from] GatewayError),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<PaymentManagementError> for PaymentFlowError {
    fn from(e: PaymentManagementError) -> Self {
        match e {
            PaymentManagementError::PaymentNotFound(id) => Self::PaymentNotFound(id),
            PaymentManagementError::DuplicateGatewayOrderId(_) => Self::ValidationError(e.to_string()),
            PaymentManagementError::DatabaseError(s) => Self::DatabaseError(s),
        }
    }
}

impl From<OrderPortError> for PaymentFlowError {
    fn from(e: OrderPortError) -> Self {
        match e {
            OrderPortError::OrderNotFound(id) => Self::OrderNotFound(id),
            OrderPortError::Backend(s) => Self::DatabaseError(s),
        }
    }
}

//! # Backend and port contracts
//!
//! The engine never talks to a database or a payment provider directly. Instead, the APIs in [`crate::ooe_api`] are
//! generic over the traits defined here, and concrete backends (such as [`crate::SqliteDatabase`]) or adapters
//! implement them.
//!
//! ## Storage
//! * [`OrderManagement`] stores and mutates the Order aggregate (orders and their items).
//! * [`PaymentManagement`] stores and mutates the Payment aggregate (payments and the webhook event log).
//! * [`CatalogLookup`] is a read-only view onto the outlet and product catalog, which is owned elsewhere.
//!
//! ## Ports
//! The two aggregates only ever see each other through narrow ports:
//! * [`OrderAmountPort`] and [`OrderPaymentStatusPort`] let the payment side read an order's amount and report payment
//!   outcomes back to it.
//! * [`PaymentGatewayPort`] wraps the external payment provider.
//! * [`InventoryDeductionPort`] is a best-effort hook that fires after an order is placed.
mod catalog;
mod gateway;
mod order_management;
mod payment_management;
mod ports;

pub use catalog::{CatalogError, CatalogLookup};
pub use gateway::{DisabledGateway, GatewayError, PaymentGatewayPort};
pub use order_management::{OrderManagement, OrderManagementError};
pub use payment_management::{InsertWebhookResult, PaymentManagement, PaymentManagementError};
pub use ports::{
    InventoryDeductionPort,
    InventoryError,
    NoOpInventoryDeduction,
    OrderAmount,
    OrderAmountPort,
    OrderPaymentStatusPort,
    OrderPortError,
    OrderPorts,
};

//! Outlet Order Engine
//!
//! The outlet order engine turns a customer's cart into a priced order at a specific outlet, collects payment for it
//! through an external gateway, and keeps the order's payment status in step with what the gateway reports.
//!
//! The library is divided into three main sections:
//! 1. Storage and port contracts ([`mod@traits`]). The engine is generic over these traits, so that backends (SQLite
//!    here) and collaborators (the catalog, the payment gateway, inventory) can be swapped out or mocked.
//! 2. The SQLite backend ([`SqliteDatabase`]). You should never need to access the database directly. The exception is
//!    the data types used in the database. These are defined in the [`mod@db_types`] module and are public.
//! 3. The engine public API (`ooe_api`). [`OrderFlowApi`] owns the Order aggregate: placement, the status state
//!    machine and queries. [`PaymentFlowApi`] owns the Payment aggregate: payment creation, refunds and webhook
//!    reconciliation. The payment side only ever reaches orders through the order ports, which
//!    [`OrderPortsAdapter`] implements on top of any [`OrderManagement`] backend.
pub mod db_types;
pub mod helpers;
mod ooe_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::{db as sqlite_db, SqliteDatabase};
pub use ooe_api::{
    errors::{OrderFlowError, PaymentFlowError},
    order_flow_api::{OrderFlowApi, ORDER_NUMBER_MAX_ATTEMPTS},
    order_objects,
    order_ports::OrderPortsAdapter,
    payment_flow_api::{PaymentFlowApi, TEST_MODE_KEY_ID},
    payment_objects,
};
pub use traits::{
    CatalogLookup,
    DisabledGateway,
    GatewayError,
    InventoryDeductionPort,
    OrderManagement,
    OrderPorts,
    PaymentGatewayPort,
    PaymentManagement,
};

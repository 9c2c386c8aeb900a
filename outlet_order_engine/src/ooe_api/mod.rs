//! # Outlet order engine public API
//!
//! The `ooe_api` module exposes the programmatic API of the engine. Like the storage traits, it is split along the
//! aggregate boundary so that the order side and the payment side can be wired (and tested) independently.
//!
//! * [`order_flow_api`] places orders, drives the order status state machine and answers order queries.
//! * [`payment_flow_api`] creates payments, issues refunds and runs the webhook reconciliation pipeline.
//! * [`order_ports`] is the adapter that exposes the order side to the payment side through the order ports.
//!
//! # API usage
//!
//! An API instance is created by supplying the backends (and ports) that it needs.
//!
//! ```rust,ignore
//! use outlet_order_engine::{OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements OrderManagement and CatalogLookup
//! let api = OrderFlowApi::new(db.clone(), db);
//! let order = api.place_order(request).await?;
//! ```
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod order_ports;
pub mod payment_flow_api;
pub mod payment_objects;
mod webhooks;

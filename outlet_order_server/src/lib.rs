//! # Outlet order server
//! This crate hosts the HTTP server for the outlet ordering platform. It is responsible for:
//! * Accepting orders from customers and status updates from outlets and administrators.
//! * Opening payments with the gateway and issuing refunds.
//! * Receiving gateway webhooks and reconciling payment and order state from them.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes `/health` at the root. Everything else lives under `/api`. See [routes](routes/index.html).
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;

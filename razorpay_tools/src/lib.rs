//! # Razorpay tools
//!
//! A deliberately small client for the two Razorpay REST calls the ordering platform needs (order creation and
//! refunds), plus webhook signature helpers. Configuration is read from `OOS_RAZORPAY_*` environment variables.
mod api;
mod config;
mod error;
mod signature;

mod data_objects;

pub use api::RazorpayApi;
pub use config::RazorpayConfig;
pub use data_objects::{NewRazorpayOrder, NewRefund, RazorpayErrorBody, RazorpayOrder, RazorpayRefund};
pub use error::RazorpayApiError;
pub use signature::{calculate_webhook_signature, verify_webhook_signature};

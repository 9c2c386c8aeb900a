//! Small, pure helpers for generating the identifiers the engine hands out.
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::db_types::OrderId;

pub const ORDER_NUMBER_PREFIX: &str = "ORD-";
const ORDER_NUMBER_LENGTH: usize = 12;
const RECEIPT_ID_LENGTH: usize = 20;

/// A fresh order number candidate: `ORD-` followed by 12 uppercase hex characters drawn from a v4 UUID.
///
/// Candidates are only probabilistically unique; callers must still check them against the store.
pub fn new_order_number() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{ORDER_NUMBER_PREFIX}{}", hex[..ORDER_NUMBER_LENGTH].to_ascii_uppercase())
}

/// The receipt reference sent to the gateway when creating a gateway order for `order_id`.
pub fn payment_receipt(order_id: &OrderId) -> String {
    let compact = order_id.compact();
    let end = compact.len().min(RECEIPT_ID_LENGTH);
    format!("ord_{}", &compact[..end])
}

/// The local stand-in for a gateway order id, used when the gateway is unavailable and the degraded mode is on.
pub fn synthetic_gateway_order_id(order_id: &OrderId) -> String {
    format!("test_order_{}", order_id.compact())
}

/// Hex SHA-256 of a webhook body.
pub fn payload_digest(body: &str) -> String {
    hex::encode(Sha256::digest(body.as_bytes()))
}

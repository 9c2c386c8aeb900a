//! Parsing of gateway webhook bodies.
//!
//! Only the handful of fields the reconciliation pipeline needs are extracted. Everything else in the body is kept
//! verbatim in the webhook event log.
use serde_json::Value;

use crate::helpers::payload_digest;

pub const PAYMENT_CAPTURED: &str = "payment.captured";
pub const PAYMENT_FAILED: &str = "payment.failed";
pub const REFUND_PROCESSED: &str = "refund.processed";
pub const REFUND_CREATED: &str = "refund.created";

/// The handler a webhook event is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookKind {
    PaymentCaptured,
    PaymentFailed,
    Refund,
    Unhandled,
}

impl WebhookKind {
    pub fn from_event(event: &str) -> Self {
        match event {
            PAYMENT_CAPTURED => Self::PaymentCaptured,
            PAYMENT_FAILED => Self::PaymentFailed,
            REFUND_PROCESSED | REFUND_CREATED => Self::Refund,
            _ => Self::Unhandled,
        }
    }
}

/// The parts of a webhook delivery the pipeline acts on.
#[derive(Debug, Clone)]
pub struct WebhookEnvelope {
    pub event: String,
    payload: Value,
}

impl WebhookEnvelope {
    /// Returns `None` when the body has no usable `event` or no `payload` object. Such deliveries are acknowledged and
    /// ignored.
    pub fn from_json(body: &Value) -> Option<Self> {
        let event = body.get("event").and_then(Value::as_str).map(str::trim).filter(|e| !e.is_empty())?;
        let payload = body.get("payload").filter(|p| p.is_object())?;
        Some(Self { event: event.to_string(), payload: payload.clone() })
    }

    pub fn kind(&self) -> WebhookKind {
        WebhookKind::from_event(&self.event)
    }

    /// `payload.payment.entity.id`, falling back to `payload.payment.id`.
    pub fn gateway_payment_id(&self) -> Option<&str> {
        let payment = self.payload.get("payment")?;
        payment
            .pointer("/entity/id")
            .and_then(Value::as_str)
            .or_else(|| payment.get("id").and_then(Value::as_str))
            .filter(|s| !s.is_empty())
    }

    /// `payload.payment.entity.order_id`
    pub fn gateway_order_id(&self) -> Option<&str> {
        self.str_at("/payment/entity/order_id")
    }

    /// `payload.payment.entity.method`
    pub fn payment_method(&self) -> Option<&str> {
        self.str_at("/payment/entity/method")
    }

    /// `payload.refund.entity.payment_id`
    pub fn refunded_payment_id(&self) -> Option<&str> {
        self.str_at("/refund/entity/payment_id")
    }

    fn str_at(&self, pointer: &str) -> Option<&str> {
        self.payload.pointer(pointer).and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    /// The idempotency key of this delivery. It is `<payment id>_<event>` when the body names a payment, and
    /// `<sha256 of the raw body>__<event>` otherwise.
    pub fn dedup_key(&self, raw_body: &str) -> String {
        match self.gateway_payment_id() {
            Some(id) => format!("{id}_{}", self.event),
            None => format!("{}__{}", payload_digest(raw_body), self.event),
        }
    }
}

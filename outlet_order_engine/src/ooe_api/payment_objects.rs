use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Money, PaymentId, PaymentStatusType};

/// Everything a client needs to open the gateway's checkout for a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInitiation {
    pub payment_id: PaymentId,
    pub gateway_order_id: String,
    pub amount: Money,
    pub currency: String,
    pub key_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefundRequest {
    /// Partial refund amount. Absent, zero or negative means a full refund.
    #[serde(default)]
    pub amount: Option<Money>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundResult {
    pub payment_id: PaymentId,
    pub refund_id: String,
    pub amount_refunded: Money,
    pub refunded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentQueryFilter {
    pub status: Option<PaymentStatusType>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl PaymentQueryFilter {
    pub fn with_status(mut self, status: PaymentStatusType) -> Self {
        self.status = Some(status);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.since.is_none() && self.until.is_none()
    }
}

/// What the webhook pipeline did with a delivery. Every variant is a successful acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WebhookOutcome {
    /// The event was recorded and dispatched to its handler.
    Processed { event_type: String },
    /// The event was recorded, but there was nothing to change (unknown payment, already in the target state, or an
    /// event type that is not handled).
    NoChange { event_type: String },
    /// The event had already been recorded.
    Duplicate,
    /// The delivery carried no event type or payload.
    Ignored,
}

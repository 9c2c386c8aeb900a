use std::fmt::Debug;

use chrono::Utc;
use log::*;
use serde_json::Value;

use crate::{
    db_types::{
        Money,
        NewPayment,
        NewWebhookEvent,
        OrderId,
        OrderPaymentStatus,
        Payment,
        PaymentId,
        PaymentMethod,
        PaymentStatusType,
        PaymentUpdate,
    },
    helpers::{payment_receipt, synthetic_gateway_order_id},
    ooe_api::{
        errors::PaymentFlowError,
        order_objects::{Page, Pagination},
        payment_objects::{PaymentInitiation, PaymentQueryFilter, RefundRequest, RefundResult, WebhookOutcome},
        webhooks::{WebhookEnvelope, WebhookKind},
    },
    traits::{InsertWebhookResult, OrderPorts, PaymentGatewayPort, PaymentManagement},
};

/// The public key handed to clients when a payment was created against a synthetic gateway reference.
pub const TEST_MODE_KEY_ID: &str = "test";

/// `PaymentFlowApi` handles the Payment aggregate: creating payments against the gateway, refunds, and reconciling
/// gateway webhooks.
///
/// The order side is only reachable through the [`OrderPorts`] (`O`), and the gateway through `G`.
pub struct PaymentFlowApi<B, O, G> {
    db: B,
    orders: O,
    gateway: G,
    test_mode_fallback: bool,
}

impl<B, O, G> Debug for PaymentFlowApi<B, O, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentFlowApi (test_mode_fallback: {})", self.test_mode_fallback)
    }
}

impl<B, O, G> PaymentFlowApi<B, O, G> {
    pub fn new(db: B, orders: O, gateway: G) -> Self {
        Self { db, orders, gateway, test_mode_fallback: false }
    }

    /// When enabled, an unavailable gateway does not fail payment creation. A synthetic gateway reference is stored
    /// instead, and the client is given the `test` key.
    pub fn with_test_mode_fallback(mut self, enabled: bool) -> Self {
        self.test_mode_fallback = enabled;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, O, G> PaymentFlowApi<B, O, G>
where
    B: PaymentManagement,
    O: OrderPorts,
    G: PaymentGatewayPort,
{
    /// Creates a payment for the full order amount and registers it with the gateway.
    ///
    /// The payment is stored as `Initiated`, whether the gateway reference is real or synthetic.
    pub async fn create_payment(&self, order_id: &OrderId) -> Result<PaymentInitiation, PaymentFlowError> {
        let order = self
            .orders
            .fetch_order_amount(order_id)
            .await?
            .ok_or_else(|| PaymentFlowError::OrderNotFound(order_id.clone()))?;
        if !order.amount.is_positive() {
            return Err(PaymentFlowError::ValidationError(format!(
                "Order {order_id} has a non-positive amount ({}) and cannot be paid",
                order.amount
            )));
        }
        let amount_minor = order.amount.to_minor_units().map_err(|e| PaymentFlowError::ValidationError(e.to_string()))?;
        let receipt = payment_receipt(order_id);
        let (gateway_order_id, key_id) =
            match self.gateway.create_gateway_order(amount_minor, &order.currency, &receipt).await {
                Ok(id) => (id, self.gateway.key_id()),
                Err(e) if e.is_unavailable() && self.test_mode_fallback => {
                    warn!("💳️ Payment gateway is unavailable ({e}). Issuing a synthetic reference for order {order_id}");
                    (synthetic_gateway_order_id(order_id), TEST_MODE_KEY_ID.to_string())
                },
                Err(e) => {
                    warn!("💳️ Could not create a gateway order for order {order_id}. {e}");
                    return Err(e.into());
                },
            };
        let new_payment = NewPayment {
            id: PaymentId::random(),
            order_id: order_id.clone(),
            gateway_order_id,
            amount: order.amount,
            currency: order.currency,
            status: PaymentStatusType::Initiated,
        };
        let payment = self.db.insert_payment(new_payment).await?;
        info!(
            "💳️ Payment {} initiated for order {order_id}. Gateway order {} for {} {}",
            payment.id, payment.gateway_order_id, payment.amount, payment.currency
        );
        Ok(PaymentInitiation {
            payment_id: payment.id,
            gateway_order_id: payment.gateway_order_id,
            amount: payment.amount,
            currency: payment.currency,
            key_id,
        })
    }

    /// Refunds a successful payment, in full or in part.
    ///
    /// A positive `amount` is a partial refund and may not exceed the payment amount. A missing, zero or negative
    /// amount refunds everything. The order is marked as refunded in both cases.
    pub async fn refund(&self, id: &PaymentId, request: RefundRequest) -> Result<RefundResult, PaymentFlowError> {
        let payment = self.fetch_payment(id).await?;
        if payment.status != PaymentStatusType::Success {
            return Err(PaymentFlowError::ValidationError(format!(
                "Only successful payments can be refunded. Payment {id} is {}",
                payment.status
            )));
        }
        let gateway_payment_id = payment.gateway_payment_id.clone().ok_or_else(|| {
            PaymentFlowError::ValidationError(format!("Payment {id} has no gateway payment reference to refund"))
        })?;
        let partial = request.amount.filter(Money::is_positive);
        if let Some(amount) = partial {
            if amount > payment.amount {
                return Err(PaymentFlowError::ValidationError(format!(
                    "Refund amount {amount} exceeds the payment amount {}",
                    payment.amount
                )));
            }
        }
        let amount_minor = partial
            .map(|a| a.to_minor_units())
            .transpose()
            .map_err(|e| PaymentFlowError::ValidationError(e.to_string()))?;
        if let Some(reason) = request.reason.as_deref() {
            debug!("💳️ Refund reason for payment {id}: {reason}");
        }
        let refund_id = self.gateway.create_refund(&gateway_payment_id, amount_minor).await?;
        let refunded_at = Utc::now();
        let update = PaymentUpdate::new(PaymentStatusType::Refunded).with_refunded_at(refunded_at);
        match self.db.transition_payment(id, &[PaymentStatusType::Success], update).await? {
            Some(p) => info!("💳️ Payment {} refunded. Gateway refund {refund_id}", p.id),
            None => warn!(
                "💳️ Gateway refund {refund_id} was issued for payment {id}, but the payment changed status in the \
                 meantime. Leaving the local record as is."
            ),
        }
        self.notify_order(&payment.order_id, OrderPaymentStatus::Refunded).await;
        Ok(RefundResult {
            payment_id: payment.id,
            refund_id,
            amount_refunded: partial.unwrap_or(payment.amount),
            refunded_at,
        })
    }

    pub async fn fetch_payment(&self, id: &PaymentId) -> Result<Payment, PaymentFlowError> {
        self.db.fetch_payment(id).await?.ok_or_else(|| PaymentFlowError::PaymentNotFound(id.clone()))
    }

    /// Fetches a payment on behalf of a customer. Payments for orders the customer did not place are reported as not
    /// found.
    pub async fn fetch_payment_for_customer(&self, id: &PaymentId, customer_id: i64) -> Result<Payment, PaymentFlowError> {
        let payment = self.fetch_payment(id).await?;
        let owner = self.orders.fetch_order_amount(&payment.order_id).await?.and_then(|o| o.customer_id);
        if owner == Some(customer_id) {
            Ok(payment)
        } else {
            Err(PaymentFlowError::PaymentNotFound(id.clone()))
        }
    }

    pub async fn search_payments(
        &self,
        query: PaymentQueryFilter,
        pagination: Pagination,
    ) -> Result<Page<Payment>, PaymentFlowError> {
        let (payments, total) = self.db.search_payments(query, pagination).await?;
        Ok(Page::new(payments, pagination, total))
    }

    /// Runs a gateway webhook delivery through the reconciliation pipeline.
    ///
    /// Errors are only returned for deliveries that should be rejected (empty, unsigned, badly signed or malformed)
    /// and for storage failures. Every other delivery, including duplicates, unknown events, and events for payments
    /// we know nothing about, is acknowledged.
    pub async fn process_webhook(&self, body: &str, signature: Option<&str>) -> Result<WebhookOutcome, PaymentFlowError> {
        if body.trim().is_empty() {
            return Err(PaymentFlowError::InvalidWebhook("The webhook body is empty".into()));
        }
        let signature = signature.map(str::trim).filter(|s| !s.is_empty()).ok_or(PaymentFlowError::UnsignedWebhook)?;
        if !self.gateway.verify_webhook_signature(body, signature) {
            warn!("🪝️ Webhook signature verification failed");
            return Err(PaymentFlowError::InvalidWebhook("Signature verification failed".into()));
        }
        let json = serde_json::from_str::<Value>(body)
            .map_err(|e| PaymentFlowError::InvalidWebhook(format!("The body is not valid JSON. {e}")))?;
        let Some(envelope) = WebhookEnvelope::from_json(&json) else {
            debug!("🪝️ Webhook has no event or payload. Ignoring it.");
            return Ok(WebhookOutcome::Ignored);
        };
        let dedup_key = envelope.dedup_key(body);
        if self.db.webhook_event_exists(&dedup_key).await? {
            info!("🪝️ Webhook {dedup_key} has already been processed");
            return Ok(WebhookOutcome::Duplicate);
        }
        let event = NewWebhookEvent {
            dedup_key: dedup_key.clone(),
            event_type: envelope.event.clone(),
            payload: body.to_string(),
        };
        if let InsertWebhookResult::AlreadyProcessed = self.db.insert_webhook_event(event).await? {
            info!("🪝️ Webhook {dedup_key} was recorded by a concurrent delivery");
            return Ok(WebhookOutcome::Duplicate);
        }
        debug!("🪝️ Webhook {dedup_key} recorded. Dispatching.");
        let changed = match envelope.kind() {
            WebhookKind::PaymentCaptured => self.on_payment_captured(&envelope).await?,
            WebhookKind::PaymentFailed => self.on_payment_failed(&envelope).await?,
            WebhookKind::Refund => self.on_refund(&envelope).await?,
            WebhookKind::Unhandled => {
                info!("🪝️ Ignoring unhandled webhook event {}", envelope.event);
                false
            },
        };
        let event_type = envelope.event;
        if changed {
            Ok(WebhookOutcome::Processed { event_type })
        } else {
            Ok(WebhookOutcome::NoChange { event_type })
        }
    }

    async fn on_payment_captured(&self, envelope: &WebhookEnvelope) -> Result<bool, PaymentFlowError> {
        let (Some(gateway_payment_id), Some(gateway_order_id)) =
            (envelope.gateway_payment_id(), envelope.gateway_order_id())
        else {
            warn!("🪝️ Captured event is missing the payment or order reference. Ignoring it.");
            return Ok(false);
        };
        let Some(payment) = self.payment_for_gateway_order(gateway_order_id).await? else {
            return Ok(false);
        };
        let method = PaymentMethod::from_gateway(envelope.payment_method());
        let update =
            PaymentUpdate::new(PaymentStatusType::Success).with_gateway_payment_id(gateway_payment_id).with_method(method);
        // A capture never resurrects a refunded payment
        let from = [PaymentStatusType::Created, PaymentStatusType::Initiated, PaymentStatusType::Failed];
        self.settle(payment, &from, update, OrderPaymentStatus::Paid).await
    }

    async fn on_payment_failed(&self, envelope: &WebhookEnvelope) -> Result<bool, PaymentFlowError> {
        let Some(gateway_order_id) = envelope.gateway_order_id() else {
            warn!("🪝️ Failed-payment event has no order reference. Ignoring it.");
            return Ok(false);
        };
        let Some(payment) = self.payment_for_gateway_order(gateway_order_id).await? else {
            return Ok(false);
        };
        let mut update = PaymentUpdate::new(PaymentStatusType::Failed);
        if let Some(id) = envelope.gateway_payment_id() {
            update = update.with_gateway_payment_id(id);
        }
        let from = [PaymentStatusType::Created, PaymentStatusType::Initiated];
        self.settle(payment, &from, update, OrderPaymentStatus::Failed).await
    }

    async fn on_refund(&self, envelope: &WebhookEnvelope) -> Result<bool, PaymentFlowError> {
        let Some(gateway_payment_id) = envelope.refunded_payment_id() else {
            warn!("🪝️ Refund event has no payment reference. Ignoring it.");
            return Ok(false);
        };
        let Some(payment) = self.db.fetch_payment_by_gateway_payment_id(gateway_payment_id).await? else {
            info!("🪝️ Refund event for unknown gateway payment {gateway_payment_id}. Nothing to do.");
            return Ok(false);
        };
        let update = PaymentUpdate::new(PaymentStatusType::Refunded).with_refunded_at(Utc::now());
        let from = [
            PaymentStatusType::Created,
            PaymentStatusType::Initiated,
            PaymentStatusType::Success,
            PaymentStatusType::Failed,
        ];
        self.settle(payment, &from, update, OrderPaymentStatus::Refunded).await
    }

    async fn payment_for_gateway_order(&self, gateway_order_id: &str) -> Result<Option<Payment>, PaymentFlowError> {
        let payment = self.db.fetch_payment_by_gateway_order_id(gateway_order_id).await?;
        if payment.is_none() {
            info!("🪝️ Webhook for unknown gateway order {gateway_order_id}. Nothing to do.");
        }
        Ok(payment)
    }

    /// Moves the payment to the update's status if it is in one of the `from` states, and then reports the outcome to
    /// the order. Returns whether anything changed.
    async fn settle(
        &self,
        payment: Payment,
        from: &[PaymentStatusType],
        update: PaymentUpdate,
        order_status: OrderPaymentStatus,
    ) -> Result<bool, PaymentFlowError> {
        let target = update.status;
        if !from.contains(&payment.status) {
            info!("🪝️ Payment {} is {} and will not move to {target}", payment.id, payment.status);
            return Ok(false);
        }
        match self.db.transition_payment(&payment.id, from, update).await? {
            Some(p) => {
                info!("🪝️ Payment {} is now {target}", p.id);
                self.notify_order(&p.order_id, order_status).await;
                Ok(true)
            },
            None => {
                info!("🪝️ Payment {} changed status concurrently. Not moving it to {target}", payment.id);
                Ok(false)
            },
        }
    }

    /// Propagates a payment outcome to the order. The payment record is authoritative, so a failure here is logged and
    /// not surfaced.
    async fn notify_order(&self, order_id: &OrderId, status: OrderPaymentStatus) {
        if let Err(e) = self.orders.apply_payment_status(order_id, status).await {
            error!("💳️ Could not mark order {order_id} as {status}. The payment record is up to date. {e}");
        }
    }
}

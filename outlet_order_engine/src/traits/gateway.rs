use log::*;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Payment gateway is not configured. {0}")]
    NotConfigured(String),
    #[error("Payment gateway authentication failed. {0}")]
    AuthenticationFailed(String),
    #[error("Payment gateway rejected the request. {0}")]
    BadRequest(String),
    #[error("Payment gateway did not respond in time")]
    Timeout,
    #[error("Could not reach the payment gateway. {0}")]
    Transport(String),
    #[error("Unexpected payment gateway error. {0}")]
    Unexpected(String),
}

impl GatewayError {
    /// The conditions under which the gateway should be treated as unavailable rather than broken: it was never
    /// configured, its credentials are wrong, or it refuses requests outright.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::NotConfigured(_) | Self::AuthenticationFailed(_) | Self::BadRequest(_))
    }
}

/// The external payment provider, as seen by the payment workflow.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayPort: Clone {
    /// The public key clients use to open the provider's checkout.
    fn key_id(&self) -> String;

    /// Sets up funds collection for `amount_minor` (paise, cents) and returns the gateway's order reference.
    async fn create_gateway_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<String, GatewayError>;

    fn verify_webhook_signature(&self, body: &str, signature: &str) -> bool;

    /// Refunds a captured payment, fully if `amount_minor` is `None`. Returns the gateway's refund id.
    async fn create_refund(&self, gateway_payment_id: &str, amount_minor: Option<i64>) -> Result<String, GatewayError>;
}

/// The gateway used when no provider credentials are configured. Every call fails with
/// [`GatewayError::NotConfigured`] and no webhook ever verifies.
#[derive(Debug, Clone, Default)]
pub struct DisabledGateway;

impl PaymentGatewayPort for DisabledGateway {
    fn key_id(&self) -> String {
        String::default()
    }

    async fn create_gateway_order(&self, _: i64, _: &str, receipt: &str) -> Result<String, GatewayError> {
        debug!("💳️ Gateway order requested for {receipt}, but the gateway is disabled");
        Err(GatewayError::NotConfigured("No payment gateway credentials have been supplied".into()))
    }

    fn verify_webhook_signature(&self, _: &str, _: &str) -> bool {
        warn!("🪝️ Webhook received, but the gateway is disabled. Rejecting it.");
        false
    }

    async fn create_refund(&self, gateway_payment_id: &str, _: Option<i64>) -> Result<String, GatewayError> {
        debug!("💳️ Refund requested for {gateway_payment_id}, but the gateway is disabled");
        Err(GatewayError::NotConfigured("No payment gateway credentials have been supplied".into()))
    }
}

//! Adapts the Razorpay client to the engine's [`PaymentGatewayPort`].
//!
//! The gateway strategy is chosen once at startup: [`ConfiguredGateway::Live`] when Razorpay credentials are present,
//! and [`ConfiguredGateway::Disabled`] otherwise.
use log::*;
use outlet_order_engine::{DisabledGateway, GatewayError, PaymentGatewayPort};
use razorpay_tools::{NewRazorpayOrder, NewRefund, RazorpayApi, RazorpayApiError, RazorpayConfig};

/// Maps a Razorpay client failure onto the engine's gateway error classes. The classification matters: only the
/// "unavailable" classes may be masked by the test-mode fallback.
pub fn to_gateway_error(e: RazorpayApiError) -> GatewayError {
    match e {
        RazorpayApiError::NotConfigured => GatewayError::NotConfigured(e.to_string()),
        RazorpayApiError::Initialization(s) => GatewayError::NotConfigured(s),
        RazorpayApiError::AuthenticationFailed(s) => GatewayError::AuthenticationFailed(s),
        RazorpayApiError::BadRequest { code, description } => GatewayError::BadRequest(format!("{code}: {description}")),
        RazorpayApiError::Timeout => GatewayError::Timeout,
        RazorpayApiError::RestRequestError(s) => GatewayError::Transport(s),
        RazorpayApiError::JsonError(_) | RazorpayApiError::QueryError { .. } => GatewayError::Unexpected(e.to_string()),
    }
}

#[derive(Clone)]
pub struct RazorpayGateway {
    api: RazorpayApi,
}

impl RazorpayGateway {
    pub fn new(config: RazorpayConfig) -> Result<Self, GatewayError> {
        let api = RazorpayApi::new(config).map_err(to_gateway_error)?;
        Ok(Self { api })
    }
}

impl PaymentGatewayPort for RazorpayGateway {
    fn key_id(&self) -> String {
        self.api.key_id().to_string()
    }

    async fn create_gateway_order(&self, amount_minor: i64, currency: &str, receipt: &str) -> Result<String, GatewayError> {
        let order = NewRazorpayOrder { amount: amount_minor, currency: currency.to_string(), receipt: receipt.to_string() };
        let order = self.api.create_order(order).await.map_err(to_gateway_error)?;
        Ok(order.id)
    }

    fn verify_webhook_signature(&self, body: &str, signature: &str) -> bool {
        self.api.verify_webhook_signature(body, signature)
    }

    async fn create_refund(&self, gateway_payment_id: &str, amount_minor: Option<i64>) -> Result<String, GatewayError> {
        let refund = self
            .api
            .refund_payment(gateway_payment_id, NewRefund { amount: amount_minor })
            .await
            .map_err(to_gateway_error)?;
        Ok(refund.id)
    }
}

#[derive(Clone)]
pub enum ConfiguredGateway {
    Live(RazorpayGateway),
    Disabled(DisabledGateway),
}

impl ConfiguredGateway {
    pub fn from_config(config: &RazorpayConfig) -> Self {
        if !config.is_configured() {
            warn!("💳️ No Razorpay credentials. Payment gateway calls will fail as not configured.");
            return Self::Disabled(DisabledGateway);
        }
        match RazorpayGateway::new(config.clone()) {
            Ok(gateway) => {
                info!("💳️ Razorpay gateway configured for key {}", config.key_id);
                Self::Live(gateway)
            },
            Err(e) => {
                error!("💳️ Could not create the Razorpay client. The payment gateway is disabled. {e}");
                Self::Disabled(DisabledGateway)
            },
        }
    }
}

impl PaymentGatewayPort for ConfiguredGateway {
    fn key_id(&self) -> String {
        match self {
            Self::Live(g) => g.key_id(),
            Self::Disabled(g) => g.key_id(),
        }
    }

    async fn create_gateway_order(&self, amount_minor: i64, currency: &str, receipt: &str) -> Result<String, GatewayError> {
        match self {
            Self::Live(g) => g.create_gateway_order(amount_minor, currency, receipt).await,
            Self::Disabled(g) => g.create_gateway_order(amount_minor, currency, receipt).await,
        }
    }

    fn verify_webhook_signature(&self, body: &str, signature: &str) -> bool {
        match self {
            Self::Live(g) => g.verify_webhook_signature(body, signature),
            Self::Disabled(g) => g.verify_webhook_signature(body, signature),
        }
    }

    async fn create_refund(&self, gateway_payment_id: &str, amount_minor: Option<i64>) -> Result<String, GatewayError> {
        match self {
            Self::Live(g) => g.create_refund(gateway_payment_id, amount_minor).await,
            Self::Disabled(g) => g.create_refund(gateway_payment_id, amount_minor).await,
        }
    }
}

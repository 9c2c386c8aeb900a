use std::{env, time::Duration};

use log::*;
use outlet_common::Secret;

pub const DEFAULT_RAZORPAY_API_URL: &str = "https://api.razorpay.com/v1";
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    /// The public key id. It is also handed to clients so that they can open the checkout widget.
    pub key_id: String,
    pub key_secret: Secret<String>,
    /// Shared secret used to sign webhook deliveries.
    pub webhook_secret: Secret<String>,
    pub api_url: String,
    /// Upper bound for every call to the Razorpay API.
    pub timeout: Duration,
}

impl Default for RazorpayConfig {
    fn default() -> Self {
        Self {
            key_id: String::default(),
            key_secret: Secret::default(),
            webhook_secret: Secret::default(),
            api_url: DEFAULT_RAZORPAY_API_URL.to_string(),
            timeout: DEFAULT_GATEWAY_TIMEOUT,
        }
    }
}

impl RazorpayConfig {
    pub fn new_from_env_or_default() -> Self {
        let key_id = env::var("OOS_RAZORPAY_KEY_ID").unwrap_or_else(|_| {
            warn!("OOS_RAZORPAY_KEY_ID not set. The payment gateway will be disabled.");
            String::default()
        });
        let key_secret = Secret::new(env::var("OOS_RAZORPAY_KEY_SECRET").unwrap_or_else(|_| {
            warn!("OOS_RAZORPAY_KEY_SECRET not set.");
            String::default()
        }));
        let webhook_secret = Secret::new(env::var("OOS_RAZORPAY_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!("OOS_RAZORPAY_WEBHOOK_SECRET not set. Every webhook delivery will be rejected.");
            String::default()
        }));
        let api_url = env::var("OOS_RAZORPAY_API_URL").unwrap_or_else(|_| DEFAULT_RAZORPAY_API_URL.to_string());
        let timeout = env::var("OOS_GATEWAY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("Invalid value for OOS_GATEWAY_TIMEOUT_SECS ({s}). {e}"))
                    .ok()
                    .filter(|secs| *secs > 0)
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_GATEWAY_TIMEOUT);
        Self { key_id, key_secret, webhook_secret, api_url, timeout }
    }

    /// The live adapter is only usable when both halves of the API key are present.
    pub fn is_configured(&self) -> bool {
        !self.key_id.trim().is_empty() && !self.key_secret.is_blank()
    }
}

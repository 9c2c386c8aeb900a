use std::env;

use log::*;
use outlet_common::{parse_boolean_flag, DEFAULT_CURRENCY_CODE};
use razorpay_tools::RazorpayConfig;

const DEFAULT_OOS_HOST: &str = "127.0.0.1";
const DEFAULT_OOS_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/outlet_orders.db";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The currency every order amount is quoted in.
    pub default_currency: String,
    /// If true, payment creation falls back to a synthetic gateway reference when the gateway is unavailable (not
    /// configured, bad credentials, or rejecting requests). **Never enable this in production.**
    pub gateway_test_mode_fallback: bool,
    pub razorpay: RazorpayConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OOS_HOST.to_string(),
            port: DEFAULT_OOS_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            default_currency: DEFAULT_CURRENCY_CODE.to_string(),
            gateway_test_mode_fallback: false,
            razorpay: RazorpayConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("OOS_HOST").ok().unwrap_or_else(|| DEFAULT_OOS_HOST.into());
        let port = env::var("OOS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for OOS_PORT. {e} Using the default, {DEFAULT_OOS_PORT}, instead."
                    );
                    DEFAULT_OOS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_OOS_PORT);
        let database_url = env::var("OOS_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ OOS_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let default_currency = env::var("OOS_DEFAULT_CURRENCY")
            .ok()
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| {
                let valid = s.len() == 3 && s.chars().all(|c| c.is_ascii_alphabetic());
                if !valid {
                    warn!("🪛️ OOS_DEFAULT_CURRENCY ({s}) is not a 3-letter currency code. Using {DEFAULT_CURRENCY_CODE}.");
                }
                valid
            })
            .unwrap_or_else(|| DEFAULT_CURRENCY_CODE.to_string());
        let gateway_test_mode_fallback = parse_boolean_flag(env::var("OOS_GATEWAY_TEST_MODE_FALLBACK").ok(), false);
        if gateway_test_mode_fallback {
            warn!(
                "🚨️🚨️🚨️ The gateway test-mode fallback is enabled. Payments will be issued synthetic gateway references \
                 whenever the gateway is unavailable. DO NOT run production like this. 🚨️🚨️🚨️"
            );
        }
        let razorpay = RazorpayConfig::new_from_env_or_default();
        if !razorpay.is_configured() {
            warn!("🪛️ Razorpay credentials are not configured. The payment gateway is disabled.");
        }
        Self { host, port, database_url, default_currency, gateway_test_mode_fallback, razorpay }
    }
}

use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 of `body`, keyed with the webhook secret. This is what Razorpay sends in the
/// `X-Razorpay-Signature` header.
pub fn calculate_webhook_signature(body: &str, secret: &str) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        // HMAC accepts keys of any length
        Err(_) => return String::default(),
    };
    mac.update(body.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Checks `signature` against the expected HMAC in constant time. An empty secret never verifies.
pub fn verify_webhook_signature(body: &str, signature: &str, secret: &str) -> bool {
    if secret.trim().is_empty() || signature.trim().is_empty() {
        return false;
    }
    let Ok(expected) = hex::decode(signature.trim()) else {
        debug!("Webhook signature is not valid hex");
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

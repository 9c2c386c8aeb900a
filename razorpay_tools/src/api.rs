use std::sync::Arc;

use log::*;
use reqwest::{header::HeaderMap, header::HeaderValue, Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::RazorpayConfig,
    data_objects::{NewRazorpayOrder, NewRefund, RazorpayErrorBody, RazorpayOrder, RazorpayRefund},
    signature::verify_webhook_signature,
    RazorpayApiError,
};

#[derive(Clone)]
pub struct RazorpayApi {
    config: RazorpayConfig,
    client: Arc<Client>,
}

impl RazorpayApi {
    pub fn new(config: RazorpayConfig) -> Result<Self, RazorpayApiError> {
        if !config.is_configured() {
            return Err(RazorpayApiError::NotConfigured);
        }
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| RazorpayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn key_id(&self) -> &str {
        self.config.key_id.as_str()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url.trim_end_matches('/'))
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, RazorpayApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {method} {url}");
        let mut req = self
            .client
            .request(method, url)
            .basic_auth(self.config.key_id.as_str(), Some(self.config.key_secret.reveal().as_str()));
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await?;
        let status = response.status();
        if status.is_success() {
            trace!("REST query successful. {status}");
            return response.json::<T>().await.map_err(|e| RazorpayApiError::JsonError(e.to_string()));
        }
        let message = response.text().await?;
        Err(classify_failure(status, message))
    }

    /// Creates a Razorpay order for `amount` minor units. Returns the Razorpay order record, whose `id` is the
    /// reference the checkout widget needs.
    pub async fn create_order(&self, order: NewRazorpayOrder) -> Result<RazorpayOrder, RazorpayApiError> {
        debug!("Creating Razorpay order for receipt {}", order.receipt);
        let result = self.rest_query::<RazorpayOrder, _>(Method::POST, "/orders", Some(order)).await?;
        info!("Razorpay order {} created", result.id);
        Ok(result)
    }

    /// Refunds a captured payment, in full when `refund.amount` is `None`.
    pub async fn refund_payment(&self, payment_id: &str, refund: NewRefund) -> Result<RazorpayRefund, RazorpayApiError> {
        let path = format!("/payments/{payment_id}/refund");
        debug!("Requesting refund for Razorpay payment {payment_id}");
        let result = self.rest_query::<RazorpayRefund, _>(Method::POST, &path, Some(refund)).await?;
        info!("Razorpay refund {} created for payment {payment_id}", result.id);
        Ok(result)
    }

    pub fn verify_webhook_signature(&self, body: &str, signature: &str) -> bool {
        verify_webhook_signature(body, signature, self.config.webhook_secret.reveal())
    }
}

/// Maps a non-2xx response onto the error kinds callers care about.
fn classify_failure(status: StatusCode, message: String) -> RazorpayApiError {
    let body = serde_json::from_str::<RazorpayErrorBody>(&message).unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED => RazorpayApiError::AuthenticationFailed(body.error.description),
        StatusCode::BAD_REQUEST if body.error.code == "BAD_REQUEST_ERROR" => RazorpayApiError::BadRequest {
            code: body.error.code,
            description: body.error.description,
        },
        _ => RazorpayApiError::QueryError { status: status.as_u16(), message },
    }
}

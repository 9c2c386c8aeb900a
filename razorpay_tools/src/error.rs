use thiserror::Error;

#[derive(Debug, Error)]
pub enum RazorpayApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Razorpay is not configured. Set OOS_RAZORPAY_KEY_ID and OOS_RAZORPAY_KEY_SECRET.")]
    NotConfigured,
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Razorpay rejected the request. {code}: {description}")]
    BadRequest { code: String, description: String },
    #[error("The request to Razorpay timed out")]
    Timeout,
    #[error("Invalid REST request: {0}")]
    RestRequestError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
}

impl From<reqwest::Error> for RazorpayApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::JsonError(e.to_string())
        } else {
            Self::RestRequestError(e.to_string())
        }
    }
}

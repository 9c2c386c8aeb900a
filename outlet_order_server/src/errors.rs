use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use outlet_order_engine::{GatewayError, OrderFlowError, PaymentFlowError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("Invalid webhook. {0}")]
    InvalidWebhook(String),
    #[error("Webhook signature is missing")]
    UnsignedWebhook,
    #[error("Payment gateway error. {0}")]
    GatewayError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InvalidWebhook(_) => StatusCode::BAD_REQUEST,
            Self::UnsignedWebhook => StatusCode::UNAUTHORIZED,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidState(_) => StatusCode::CONFLICT,
            Self::GatewayError(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            error!("💻️ {self}");
        }
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::ValidationError(s) => Self::ValidationError(s),
            OrderFlowError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::InvalidOrderState(s) => Self::InvalidState(s),
            OrderFlowError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
        }
    }
}

impl From<PaymentFlowError> for ServerError {
    fn from(e: PaymentFlowError) -> Self {
        match e {
            PaymentFlowError::ValidationError(s) => Self::ValidationError(s),
            PaymentFlowError::PaymentNotFound(_) | PaymentFlowError::OrderNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            PaymentFlowError::InvalidWebhook(s) => Self::InvalidWebhook(s),
            PaymentFlowError::UnsignedWebhook => Self::UnsignedWebhook,
            PaymentFlowError::GatewayError(g) => g.into(),
            PaymentFlowError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
        }
    }
}

impl From<GatewayError> for ServerError {
    fn from(e: GatewayError) -> Self {
        Self::GatewayError(e.to_string())
    }
}

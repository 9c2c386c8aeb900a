use serde::{Deserialize, Serialize};

/// Body for `POST /orders`. Amounts are always in minor units (paise).
#[derive(Debug, Clone, Serialize)]
pub struct NewRazorpayOrder {
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RazorpayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Body for `POST /payments/{id}/refund`. An absent amount refunds the full payment.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewRefund {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RazorpayRefund {
    pub id: String,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RazorpayErrorBody {
    #[serde(default)]
    pub error: RazorpayErrorDetail,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RazorpayErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
}

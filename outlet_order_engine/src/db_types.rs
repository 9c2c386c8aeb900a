use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use outlet_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

//--------------------------------------        Ids            ---------------------------------------------------------
string_id!(OrderId);
string_id!(PaymentId);
string_id!(ProductId);

impl OrderId {
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The id as lowercase hex, without dashes.
    pub fn compact(&self) -> String {
        self.0.replace('-', "")
    }
}

impl PaymentId {
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
/// The fulfilment lifecycle of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusType {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatusType {
    /// `Delivered` and `Cancelled` orders can never change status again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Forward progression is not enforced, so any non-terminal order can move to any other non-cancelled status.
    /// Cancellation is only possible before preparation starts.
    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            Self::Cancelled => matches!(self, Self::Pending | Self::Confirmed),
            _ => true,
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Preparing => "PREPARING",
            Self::Ready => "READY",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "PREPARING" => Ok(Self::Preparing),
            "READY" => Ok(Self::Ready),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------  OrderPaymentStatus   ---------------------------------------------------------
/// The settlement state of an order, as reported by the payment side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderPaymentStatus {
    Unpaid,
    Paid,
    Failed,
    Refunded,
}

impl Display for OrderPaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unpaid => "UNPAID",
            Self::Paid => "PAID",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
        };
        f.write_str(s)
    }
}

impl FromStr for OrderPaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UNPAID" => Ok(Self::Unpaid),
            "PAID" => Ok(Self::Paid),
            "FAILED" => Ok(Self::Failed),
            "REFUNDED" => Ok(Self::Refunded),
            _ => Err(ConversionError(format!("Invalid order payment status: {s}"))),
        }
    }
}

//--------------------------------------  PaymentStatusType    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatusType {
    Created,
    Initiated,
    Success,
    Failed,
    Refunded,
}

impl Display for PaymentStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Created => "CREATED",
            Self::Initiated => "INITIATED",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
        };
        f.write_str(s)
    }
}

impl FromStr for PaymentStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CREATED" => Ok(Self::Created),
            "INITIATED" => Ok(Self::Initiated),
            "SUCCESS" => Ok(Self::Success),
            "FAILED" => Ok(Self::Failed),
            "REFUNDED" => Ok(Self::Refunded),
            _ => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------    PaymentMethod      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Upi,
    Card,
    Netbanking,
    Wallet,
    Emi,
    Other,
}

impl PaymentMethod {
    /// Maps the gateway's `method` field. Anything unrecognised (or absent) is `Other`.
    pub fn from_gateway(method: Option<&str>) -> Self {
        match method.map(|m| m.trim().to_ascii_lowercase()).as_deref() {
            Some("upi") => Self::Upi,
            Some("card") => Self::Card,
            Some("netbanking") => Self::Netbanking,
            Some("wallet") => Self::Wallet,
            Some("emi") => Self::Emi,
            _ => Self::Other,
        }
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub outlet_id: i64,
    pub customer_id: Option<i64>,
    pub status: OrderStatusType,
    pub total_amount: Money,
    pub payment_status: OrderPaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line of an order. Name and price are snapshots taken when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub subtotal: Money,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub subtotal: Money,
}

/// A fully priced order, ready to be stored. New orders are always `Pending` and `Unpaid`.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: OrderId,
    pub order_number: String,
    pub outlet_id: i64,
    pub customer_id: Option<i64>,
    pub total_amount: Money,
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    pub fn with_order_number(mut self, order_number: String) -> Self {
        self.order_number = order_number;
        self
    }
}

//--------------------------------------       Payment         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub gateway_order_id: String,
    pub gateway_payment_id: Option<String>,
    pub gateway_signature: Option<String>,
    pub amount: Money,
    pub currency: String,
    pub status: PaymentStatusType,
    pub method: Option<PaymentMethod>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub gateway_order_id: String,
    pub amount: Money,
    pub currency: String,
    pub status: PaymentStatusType,
}

/// A guarded status change for a payment. Optional fields are only written when present.
#[derive(Debug, Clone)]
pub struct PaymentUpdate {
    pub status: PaymentStatusType,
    pub gateway_payment_id: Option<String>,
    pub method: Option<PaymentMethod>,
    pub refunded_at: Option<DateTime<Utc>>,
}

impl PaymentUpdate {
    pub fn new(status: PaymentStatusType) -> Self {
        Self { status, gateway_payment_id: None, method: None, refunded_at: None }
    }

    pub fn with_gateway_payment_id<S: Into<String>>(mut self, id: S) -> Self {
        self.gateway_payment_id = Some(id.into());
        self
    }

    pub fn with_method(mut self, method: PaymentMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_refunded_at(mut self, at: DateTime<Utc>) -> Self {
        self.refunded_at = Some(at);
        self
    }
}

//--------------------------------------     WebhookEvent      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub id: i64,
    pub dedup_key: String,
    pub event_type: String,
    pub payload: String,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWebhookEvent {
    pub dedup_key: String,
    pub event_type: String,
    pub payload: String,
}

//--------------------------------------    Catalog views      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OutletView {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
}

/// A product as it is offered at one particular outlet.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OutletProductView {
    pub outlet_id: i64,
    pub product_id: ProductId,
    pub product_name: String,
    pub base_price: Money,
    pub outlet_price: Option<Money>,
    pub is_available: bool,
    pub minimum_order_quantity: Option<i64>,
}

impl OutletProductView {
    /// The outlet override wins over the catalog base price.
    pub fn unit_price(&self) -> Money {
        self.outlet_price.unwrap_or(self.base_price)
    }

    /// Missing or nonsensical minimums are treated as 1.
    pub fn effective_minimum(&self) -> u32 {
        match self.minimum_order_quantity {
            Some(min) if min > 1 => u32::try_from(min).unwrap_or(u32::MAX),
            _ => 1,
        }
    }
}

use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Money, Order, OrderItem, OrderStatusType, ProductId};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub outlet_id: i64,
    /// Absent for guest orders.
    #[serde(default)]
    pub customer_id: Option<i64>,
    pub items: Vec<OrderItemRequest>,
}

/// An order together with its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullOrder {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl FullOrder {
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        Self { order, items }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatusType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub outlet_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub status: Option<OrderStatusType>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl OrderQueryFilter {
    pub fn with_outlet_id(mut self, outlet_id: i64) -> Self {
        self.outlet_id = Some(outlet_id);
        self
    }

    pub fn with_customer_id(mut self, customer_id: i64) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status = Some(status);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.outlet_id.is_none() &&
            self.customer_id.is_none() &&
            self.status.is_none() &&
            self.since.is_none() &&
            self.until.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "No filters.");
        }
        if let Some(outlet_id) = &self.outlet_id {
            write!(f, "outlet_id: {outlet_id}. ")?;
        }
        if let Some(customer_id) = &self.customer_id {
            write!(f, "customer_id: {customer_id}. ")?;
        }
        if let Some(status) = &self.status {
            write!(f, "status: {status}. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until {until}. ")?;
        }
        Ok(())
    }
}

/// Zero-based page selection. Page sizes are clamped to `1..=MAX_PAGE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 0, size: DEFAULT_PAGE_SIZE }
    }
}

impl Pagination {
    pub fn new(page: Option<u32>, size: Option<u32>) -> Self {
        let size = size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        Self { page: page.unwrap_or(0), size }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, pagination: Pagination, total_elements: i64) -> Self {
        let size = i64::from(pagination.size);
        let total_pages = (total_elements + size - 1) / size;
        Self { content, page: pagination.page, size: pagination.size, total_elements, total_pages }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueSummary {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub total_revenue: Money,
    pub order_count: i64,
}

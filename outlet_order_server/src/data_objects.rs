use chrono::{DateTime, Utc};
use outlet_order_engine::{
    db_types::{OrderStatusType, PaymentStatusType},
    order_objects::{OrderQueryFilter, Pagination},
    payment_objects::PaymentQueryFilter,
};
use serde::{Deserialize, Serialize};

/// Query string for `GET /api/orders`. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderSearchParams {
    pub outlet_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub status: Option<OrderStatusType>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl OrderSearchParams {
    pub fn into_query(self) -> (OrderQueryFilter, Pagination) {
        let filter = OrderQueryFilter {
            outlet_id: self.outlet_id,
            customer_id: self.customer_id,
            status: self.status,
            since: self.since,
            until: self.until,
        };
        (filter, Pagination::new(self.page, self.size))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentSearchParams {
    pub status: Option<PaymentStatusType>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl PaymentSearchParams {
    pub fn into_query(self) -> (PaymentQueryFilter, Pagination) {
        let filter = PaymentQueryFilter { status: self.status, since: self.since, until: self.until };
        (filter, Pagination::new(self.page, self.size))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevenueParams {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

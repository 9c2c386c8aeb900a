use thiserror::Error;

use crate::{
    db_types::{NewPayment, NewWebhookEvent, Payment, PaymentId, PaymentStatusType, PaymentUpdate, WebhookEvent},
    order_objects::Pagination,
    payment_objects::PaymentQueryFilter,
};

#[derive(Debug, Clone, Error)]
pub enum PaymentManagementError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Cannot insert payment, since gateway order {0} is already linked to a payment")]
    DuplicateGatewayOrderId(String),
    #[error("The requested payment {0} does not exist")]
    PaymentNotFound(PaymentId),
}

impl From<sqlx::Error> for PaymentManagementError {
    fn from(e: sqlx::Error) -> Self {
        PaymentManagementError::DatabaseError(e.to_string())
    }
}

pub enum InsertWebhookResult {
    Inserted(WebhookEvent),
    /// An event with the same deduplication key was already recorded.
    AlreadyProcessed,
}

/// Storage contract for the Payment aggregate and the webhook event log.
#[allow(async_fn_in_trait)]
pub trait PaymentManagement: Clone {
    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, PaymentManagementError>;

    async fn fetch_payment(&self, id: &PaymentId) -> Result<Option<Payment>, PaymentManagementError>;

    async fn fetch_payment_by_gateway_order_id(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<Payment>, PaymentManagementError>;

    async fn fetch_payment_by_gateway_payment_id(
        &self,
        gateway_payment_id: &str,
    ) -> Result<Option<Payment>, PaymentManagementError>;

    /// Applies `update` only if the payment is currently in one of the `from` states.
    ///
    /// Returns the updated payment, or `None` if the payment was not in an allowed state (which includes losing a race
    /// against a concurrent update). A missing payment is an error.
    async fn transition_payment(
        &self,
        id: &PaymentId,
        from: &[PaymentStatusType],
        update: PaymentUpdate,
    ) -> Result<Option<Payment>, PaymentManagementError>;

    /// Newest payments first. Returns the requested page and the total number of matching payments.
    async fn search_payments(
        &self,
        query: PaymentQueryFilter,
        page: Pagination,
    ) -> Result<(Vec<Payment>, i64), PaymentManagementError>;

    async fn webhook_event_exists(&self, dedup_key: &str) -> Result<bool, PaymentManagementError>;

    /// Records a webhook event. The insert is backed by a unique constraint on the deduplication key, so of two
    /// concurrent deliveries of the same event exactly one gets [`InsertWebhookResult::Inserted`].
    async fn insert_webhook_event(&self, event: NewWebhookEvent) -> Result<InsertWebhookResult, PaymentManagementError>;
}

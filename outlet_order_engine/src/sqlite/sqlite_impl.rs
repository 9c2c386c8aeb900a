//! `SqliteDatabase` is the concrete SQLite backend of the outlet order engine.
//!
//! It implements [`OrderManagement`], [`PaymentManagement`] and [`CatalogLookup`], composing the free functions in
//! [`super::db`] into transactions wherever more than one statement is involved.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{migrate::Migrator, SqlitePool};

use super::db::{catalog, db_url, new_pool, orders, payments, webhook_events};
use crate::{
    db_types::{
        Money,
        NewOrder,
        NewPayment,
        NewWebhookEvent,
        Order,
        OrderId,
        OrderItem,
        OrderPaymentStatus,
        OrderStatusType,
        OutletProductView,
        OutletView,
        Payment,
        PaymentId,
        PaymentStatusType,
        PaymentUpdate,
        ProductId,
        WebhookEvent,
    },
    order_objects::{OrderQueryFilter, Pagination},
    payment_objects::PaymentQueryFilter,
    traits::{
        CatalogError,
        CatalogLookup,
        InsertWebhookResult,
        OrderManagement,
        OrderManagementError,
        PaymentManagement,
        PaymentManagementError,
    },
};

static MIGRATOR: Migrator = sqlx::migrate!("./src/sqlite/migrations");

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({})", self.url)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn order_number_exists(&self, order_number: &str) -> Result<bool, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let exists = orders::order_number_exists(order_number, &mut conn).await?;
        Ok(exists)
    }

    async fn insert_order(&self, order: NewOrder) -> Result<(Order, Vec<OrderItem>), OrderManagementError> {
        let mut tx = self.pool.begin().await?;
        let stored = orders::insert_order(&order, &mut tx).await?;
        let mut items = Vec::with_capacity(order.items.len());
        for item in &order.items {
            let item = orders::insert_order_item(&stored.id, item, &mut tx).await?;
            items.push(item);
        }
        tx.commit().await?;
        debug!("🗃️ Order {} stored with {} items", stored.order_number, items.len());
        Ok((stored, items))
    }

    async fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, id: &OrderId) -> Result<Vec<OrderItem>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_order_items(id, &mut conn).await?;
        Ok(items)
    }

    async fn update_order_status(
        &self,
        id: &OrderId,
        expected: OrderStatusType,
        new_status: OrderStatusType,
    ) -> Result<Order, OrderManagementError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::update_order_status(id, expected, new_status, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn update_payment_status(
        &self,
        id: &OrderId,
        status: OrderPaymentStatus,
    ) -> Result<Order, OrderManagementError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::update_payment_status(id, status, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn search_orders(
        &self,
        query: OrderQueryFilter,
        page: Pagination,
    ) -> Result<(Vec<Order>, i64), OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let result = orders::search_orders(query, page, &mut conn).await?;
        Ok(result)
    }

    async fn revenue_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<(Money, i64), OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let result = orders::revenue_between(from, to, &mut conn).await?;
        Ok(result)
    }
}

impl PaymentManagement for SqliteDatabase {
    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, PaymentManagementError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::insert_payment(payment, &mut conn).await?;
        debug!("🗃️ Payment {} stored for order {}", payment.id, payment.order_id);
        Ok(payment)
    }

    async fn fetch_payment(&self, id: &PaymentId) -> Result<Option<Payment>, PaymentManagementError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment(id, &mut conn).await?;
        Ok(payment)
    }

    async fn fetch_payment_by_gateway_order_id(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<Payment>, PaymentManagementError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment_by_gateway_order_id(gateway_order_id, &mut conn).await?;
        Ok(payment)
    }

    async fn fetch_payment_by_gateway_payment_id(
        &self,
        gateway_payment_id: &str,
    ) -> Result<Option<Payment>, PaymentManagementError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment_by_gateway_payment_id(gateway_payment_id, &mut conn).await?;
        Ok(payment)
    }

    async fn transition_payment(
        &self,
        id: &PaymentId,
        from: &[PaymentStatusType],
        update: PaymentUpdate,
    ) -> Result<Option<Payment>, PaymentManagementError> {
        let mut tx = self.pool.begin().await?;
        let target = update.status;
        let result = payments::transition_payment(id, from, update, &mut tx).await?;
        if result.is_none() && payments::fetch_payment(id, &mut tx).await?.is_none() {
            return Err(PaymentManagementError::PaymentNotFound(id.clone()));
        }
        tx.commit().await?;
        match &result {
            Some(_) => debug!("🗃️ Payment {id} moved to {target}"),
            None => trace!("🗃️ Payment {id} was not in any of {from:?}. Not moving it to {target}"),
        }
        Ok(result)
    }

    async fn search_payments(
        &self,
        query: PaymentQueryFilter,
        page: Pagination,
    ) -> Result<(Vec<Payment>, i64), PaymentManagementError> {
        let mut conn = self.pool.acquire().await?;
        let result = payments::search_payments(query, page, &mut conn).await?;
        Ok(result)
    }

    async fn webhook_event_exists(&self, dedup_key: &str) -> Result<bool, PaymentManagementError> {
        let mut conn = self.pool.acquire().await?;
        let exists = webhook_events::webhook_event_exists(dedup_key, &mut conn).await?;
        Ok(exists)
    }

    async fn insert_webhook_event(&self, event: NewWebhookEvent) -> Result<InsertWebhookResult, PaymentManagementError> {
        let mut conn = self.pool.acquire().await?;
        let key = event.dedup_key.clone();
        match webhook_events::insert_webhook_event(event, &mut conn).await? {
            Some(event) => {
                trace!("🗃️ Webhook event {key} recorded with id {}", event.id);
                Ok(InsertWebhookResult::Inserted(event))
            },
            None => Ok(InsertWebhookResult::AlreadyProcessed),
        }
    }
}

impl CatalogLookup for SqliteDatabase {
    async fn fetch_outlet(&self, outlet_id: i64) -> Result<Option<OutletView>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let outlet = catalog::fetch_outlet(outlet_id, &mut conn).await?;
        Ok(outlet)
    }

    async fn fetch_outlet_product(
        &self,
        outlet_id: i64,
        product_id: &ProductId,
    ) -> Result<Option<OutletProductView>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let product = catalog::fetch_outlet_product(outlet_id, product_id, &mut conn).await?;
        Ok(product)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using the URL in `OOS_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    /// The database file is created if it does not exist yet.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date with the embedded migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        MIGRATOR.run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    /// Adds an outlet to the catalog, replacing any outlet with the same id.
    pub async fn upsert_outlet(&self, outlet: &OutletView) -> Result<(), sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        catalog::upsert_outlet(outlet, &mut conn).await
    }

    /// Lists a product at an outlet, replacing any previous listing.
    pub async fn upsert_outlet_product(&self, product: &OutletProductView) -> Result<(), sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        catalog::upsert_outlet_product(product, &mut conn).await
    }

    /// The full webhook event log, oldest first.
    pub async fn fetch_webhook_events(&self) -> Result<Vec<WebhookEvent>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        webhook_events::fetch_webhook_events(&mut conn).await
    }
}

use std::{collections::HashMap, fmt::Debug};

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    db_types::{
        Money,
        NewOrder,
        NewOrderItem,
        Order,
        OrderId,
        OrderItem,
        OrderPaymentStatus,
        OrderStatusType,
        OutletProductView,
    },
    helpers::new_order_number,
    ooe_api::{
        errors::OrderFlowError,
        order_objects::{FullOrder, OrderItemRequest, OrderQueryFilter, Page, Pagination, PlaceOrderRequest, RevenueSummary},
    },
    traits::{CatalogLookup, InventoryDeductionPort, NoOpInventoryDeduction, OrderManagement, OrderManagementError},
};

/// How many order number candidates are tried before placement gives up.
pub const ORDER_NUMBER_MAX_ATTEMPTS: usize = 5;

/// `OrderFlowApi` is the primary API for the Order aggregate: order placement, the order status state machine, and
/// order queries.
///
/// The catalog (`C`) is an external, read-only collaborator. The inventory hook (`I`) is invoked after every successful
/// placement and defaults to a no-op.
pub struct OrderFlowApi<B, C, I = NoOpInventoryDeduction> {
    db: B,
    catalog: C,
    inventory: I,
}

impl<B, C, I> Debug for OrderFlowApi<B, C, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B, C> OrderFlowApi<B, C> {
    pub fn new(db: B, catalog: C) -> Self {
        Self { db, catalog, inventory: NoOpInventoryDeduction }
    }
}

impl<B, C, I> OrderFlowApi<B, C, I> {
    pub fn with_inventory(db: B, catalog: C, inventory: I) -> Self {
        Self { db, catalog, inventory }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, C, I> OrderFlowApi<B, C, I>
where
    B: OrderManagement,
    C: CatalogLookup,
    I: InventoryDeductionPort,
{
    /// Places a new order.
    ///
    /// 1. The outlet must exist and be active.
    /// 2. Every product must be listed at the outlet, available, and ordered in at least its minimum quantity.
    /// 3. Each line is priced at the outlet price (or the base price if the outlet has no override), and the line
    ///    subtotal is rounded half-up to 2 decimal places. The order total is the sum of the subtotals.
    /// 4. The order and its items are stored atomically as `Pending` and `Unpaid`, under a freshly generated order
    ///    number.
    /// 5. The inventory hook is called. Its failure is logged, but never affects the order.
    ///
    /// Nothing is stored if any validation step fails.
    pub async fn place_order(&self, request: PlaceOrderRequest) -> Result<FullOrder, OrderFlowError> {
        if request.items.is_empty() {
            return Err(OrderFlowError::ValidationError("At least one order item is required".into()));
        }
        let outlet = self
            .catalog
            .fetch_outlet(request.outlet_id)
            .await?
            .ok_or_else(|| OrderFlowError::ValidationError(format!("Outlet {} does not exist", request.outlet_id)))?;
        if !outlet.is_active {
            return Err(OrderFlowError::ValidationError(format!("Outlet {} is not accepting orders", outlet.id)));
        }
        let mut items = Vec::with_capacity(request.items.len());
        let mut total = Money::zero();
        for line in &request.items {
            let view = self.catalog.fetch_outlet_product(outlet.id, &line.product_id).await?.ok_or_else(|| {
                OrderFlowError::ValidationError(format!(
                    "Product {} is not sold at outlet {}",
                    line.product_id, outlet.id
                ))
            })?;
            let item = price_line(&view, line)?;
            total = (total + item.subtotal).rounded();
            items.push(item);
        }
        let quantities = items.iter().map(|i| (i.product_id.clone(), i.quantity)).collect::<HashMap<_, _>>();
        let new_order = NewOrder {
            id: OrderId::random(),
            order_number: String::default(),
            outlet_id: outlet.id,
            customer_id: request.customer_id,
            total_amount: total,
            items,
        };
        let (order, items) = self.insert_with_unique_number(new_order).await?;
        info!("📦️ Order {} ({}) placed at outlet {} for {}", order.order_number, order.id, order.outlet_id, total);
        if let Err(e) = self.inventory.deduct_for_order(&order.id, order.outlet_id, &quantities).await {
            warn!("📦️ Inventory deduction for order {} failed. The order stands. {e}", order.order_number);
        }
        Ok(FullOrder::new(order, items))
    }

    async fn insert_with_unique_number(
        &self,
        order: NewOrder,
    ) -> Result<(Order, Vec<OrderItem>), OrderFlowError> {
        for attempt in 1..=ORDER_NUMBER_MAX_ATTEMPTS {
            let candidate = new_order_number();
            if self.db.order_number_exists(&candidate).await? {
                debug!("📦️ Order number {candidate} is taken (attempt {attempt})");
                continue;
            }
            match self.db.insert_order(order.clone().with_order_number(candidate)).await {
                Ok(result) => return Ok(result),
                Err(OrderManagementError::DuplicateOrderNumber(n)) => {
                    debug!("📦️ Order number {n} was taken concurrently (attempt {attempt})");
                },
                Err(e) => return Err(e.into()),
            }
        }
        error!(
            "📦️ Could not generate a unique order number after {ORDER_NUMBER_MAX_ATTEMPTS} attempts. This should \
             practically never happen and points to a broken random source or a corrupted orders table."
        );
        Err(OrderFlowError::ValidationError("Could not generate unique order number".into()))
    }

    /// Admin status update. Ownership is not checked, but the state machine rules are.
    pub async fn update_status(&self, id: &OrderId, new_status: OrderStatusType) -> Result<FullOrder, OrderFlowError> {
        let order = self.db.fetch_order(id).await?.ok_or_else(|| OrderFlowError::OrderNotFound(id.clone()))?;
        self.apply_status(order, new_status).await
    }

    /// Outlet status update. An order belonging to another outlet is reported as not found.
    pub async fn update_status_for_outlet(
        &self,
        outlet_id: i64,
        id: &OrderId,
        new_status: OrderStatusType,
    ) -> Result<FullOrder, OrderFlowError> {
        let order = self.fetch_owned_order(id, |o| o.outlet_id == outlet_id).await?;
        self.apply_status(order, new_status).await
    }

    async fn apply_status(&self, order: Order, new_status: OrderStatusType) -> Result<FullOrder, OrderFlowError> {
        let current = order.status;
        if current.is_terminal() {
            return Err(OrderFlowError::InvalidOrderState(format!(
                "Order {} is {current} and can no longer change status",
                order.order_number
            )));
        }
        if !current.can_transition_to(new_status) {
            return Err(OrderFlowError::InvalidOrderState(format!(
                "Order {} can only be cancelled while PENDING or CONFIRMED. It is {current}",
                order.order_number
            )));
        }
        let updated = self.db.update_order_status(&order.id, current, new_status).await?;
        info!("📦️ Order {} status changed {current} -> {new_status}", updated.order_number);
        let items = self.db.fetch_order_items(&updated.id).await?;
        Ok(FullOrder::new(updated, items))
    }

    /// Applies a payment outcome to the order. This never touches the lifecycle status.
    pub async fn update_payment_status(&self, id: &OrderId, status: OrderPaymentStatus) -> Result<Order, OrderFlowError> {
        let order = self.db.update_payment_status(id, status).await?;
        debug!("📦️ Order {} payment status is now {}", order.order_number, order.payment_status);
        Ok(order)
    }

    pub async fn fetch_order(&self, id: &OrderId) -> Result<FullOrder, OrderFlowError> {
        let order = self.fetch_owned_order(id, |_| true).await?;
        self.with_items(order).await
    }

    /// Fetches an order on behalf of a customer. Orders belonging to anyone else are reported as not found.
    pub async fn fetch_order_for_customer(&self, id: &OrderId, customer_id: i64) -> Result<FullOrder, OrderFlowError> {
        let order = self.fetch_owned_order(id, |o| o.customer_id == Some(customer_id)).await?;
        self.with_items(order).await
    }

    /// Fetches an order on behalf of an outlet. Orders placed at other outlets are reported as not found.
    pub async fn fetch_order_for_outlet(&self, id: &OrderId, outlet_id: i64) -> Result<FullOrder, OrderFlowError> {
        let order = self.fetch_owned_order(id, |o| o.outlet_id == outlet_id).await?;
        self.with_items(order).await
    }

    pub async fn search_orders(
        &self,
        query: OrderQueryFilter,
        pagination: Pagination,
    ) -> Result<Page<FullOrder>, OrderFlowError> {
        trace!("📦️ Searching orders. {query}");
        let (orders, total) = self.db.search_orders(query, pagination).await?;
        let mut content = Vec::with_capacity(orders.len());
        for order in orders {
            content.push(self.with_items(order).await?);
        }
        Ok(Page::new(content, pagination, total))
    }

    /// Revenue from orders that are both delivered and paid. `from` defaults to the epoch and `to` to now.
    pub async fn revenue_summary(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<RevenueSummary, OrderFlowError> {
        let from = from.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        let to = to.unwrap_or_else(Utc::now);
        if from > to {
            return Err(OrderFlowError::ValidationError("The start of the period is after its end".into()));
        }
        let (total_revenue, order_count) = self.db.revenue_between(from, to).await?;
        Ok(RevenueSummary { from, to, total_revenue, order_count })
    }

    async fn fetch_owned_order<F>(&self, id: &OrderId, owns: F) -> Result<Order, OrderFlowError>
    where F: Fn(&Order) -> bool {
        match self.db.fetch_order(id).await? {
            Some(order) if owns(&order) => Ok(order),
            _ => Err(OrderFlowError::OrderNotFound(id.clone())),
        }
    }

    async fn with_items(&self, order: Order) -> Result<FullOrder, OrderFlowError> {
        let items = self.db.fetch_order_items(&order.id).await?;
        Ok(FullOrder::new(order, items))
    }
}

/// Validates one requested line against the outlet's product view and prices it.
pub fn price_line(view: &OutletProductView, line: &OrderItemRequest) -> Result<NewOrderItem, OrderFlowError> {
    if !view.is_available {
        return Err(OrderFlowError::ValidationError(format!(
            "{} is currently unavailable at outlet {}",
            view.product_name, view.outlet_id
        )));
    }
    let minimum = view.effective_minimum();
    if line.quantity < minimum {
        return Err(OrderFlowError::ValidationError(format!(
            "At least {minimum} of {} must be ordered, but {} were requested",
            view.product_name, line.quantity
        )));
    }
    let unit_price = view.unit_price();
    Ok(NewOrderItem {
        product_id: view.product_id.clone(),
        product_name: view.product_name.clone(),
        unit_price,
        quantity: line.quantity,
        subtotal: Money::line_total(unit_price, line.quantity),
    })
}

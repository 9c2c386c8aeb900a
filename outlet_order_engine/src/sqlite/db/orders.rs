use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::is_unique_violation;
use crate::{
    db_types::{Money, NewOrder, NewOrderItem, Order, OrderId, OrderItem, OrderPaymentStatus, OrderStatusType},
    order_objects::{OrderQueryFilter, Pagination},
    traits::OrderManagementError,
};

pub async fn order_number_exists(order_number: &str, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE order_number = $1")
        .bind(order_number)
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

/// Inserts the order header, without its items. This is not atomic. Embed this call, along with [`insert_order_item`],
/// inside a transaction and pass `&mut *tx` as the connection argument.
pub async fn insert_order(order: &NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderManagementError> {
    let now = Utc::now();
    let result = sqlx::query_as(
        r#"
            INSERT INTO orders (
                id,
                order_number,
                outlet_id,
                customer_id,
                status,
                total_amount,
                payment_status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING *;
        "#,
    )
    .bind(order.id.as_str())
    .bind(&order.order_number)
    .bind(order.outlet_id)
    .bind(order.customer_id)
    .bind(OrderStatusType::Pending)
    .bind(order.total_amount)
    .bind(OrderPaymentStatus::Unpaid)
    .bind(now)
    .fetch_one(conn)
    .await;
    match result {
        Ok(order) => Ok(order),
        Err(e) if is_unique_violation(&e) => Err(OrderManagementError::DuplicateOrderNumber(order.order_number.clone())),
        Err(e) => Err(e.into()),
    }
}

pub async fn insert_order_item(
    order_id: &OrderId,
    item: &NewOrderItem,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO order_items (order_id, product_id, product_name, unit_price, quantity, subtotal)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(item.product_id.as_str())
    .bind(&item.product_name)
    .bind(item.unit_price)
    .bind(item.quantity)
    .bind(item.subtotal)
    .fetch_one(conn)
    .await
}

pub async fn fetch_order(id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id.as_str()).fetch_optional(conn).await
}

/// Items are returned in the order they were placed.
pub async fn fetch_order_items(id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(id.as_str())
        .fetch_all(conn)
        .await
}

/// Moves the order from `expected` to `new_status`. Only the `status` column (and `updated_at`) is written.
pub async fn update_order_status(
    id: &OrderId,
    expected: OrderStatusType,
    new_status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderManagementError> {
    let result: Option<Order> = sqlx::query_as(
        "UPDATE orders SET status = $1, updated_at = $2 WHERE id = $3 AND status = $4 RETURNING *",
    )
    .bind(new_status)
    .bind(Utc::now())
    .bind(id.as_str())
    .bind(expected)
    .fetch_optional(&mut *conn)
    .await?;
    match result {
        Some(order) => Ok(order),
        None => match fetch_order(id, conn).await? {
            Some(_) => Err(OrderManagementError::StatusConflict { id: id.clone(), expected }),
            None => Err(OrderManagementError::OrderNotFound(id.clone())),
        },
    }
}

/// Sets the payment status. Only the `payment_status` column (and `updated_at`) is written, and only if it actually
/// changes.
pub async fn update_payment_status(
    id: &OrderId,
    status: OrderPaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderManagementError> {
    let result: Option<Order> = sqlx::query_as(
        "UPDATE orders SET payment_status = $1, updated_at = $2 WHERE id = $3 AND payment_status <> $1 RETURNING *",
    )
    .bind(status)
    .bind(Utc::now())
    .bind(id.as_str())
    .fetch_optional(&mut *conn)
    .await?;
    if let Some(order) = result {
        debug!("🗃️ Order {id} payment status set to {status}");
        return Ok(order);
    }
    trace!("🗃️ Order {id} payment status is already {status}, or the order does not exist");
    fetch_order(id, conn).await?.ok_or_else(|| OrderManagementError::OrderNotFound(id.clone()))
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, query: OrderQueryFilter) {
    if query.is_empty() {
        return;
    }
    builder.push(" WHERE ");
    let mut where_clause = builder.separated(" AND ");
    if let Some(outlet_id) = query.outlet_id {
        where_clause.push("outlet_id = ");
        where_clause.push_bind_unseparated(outlet_id);
    }
    if let Some(cid) = query.customer_id {
        where_clause.push("customer_id = ");
        where_clause.push_bind_unseparated(cid);
    }
    if let Some(status) = query.status {
        where_clause.push("status = ");
        where_clause.push_bind_unseparated(status);
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
}

/// Fetches a page of orders matching the `OrderQueryFilter`, newest first, along with the total number of matches.
pub async fn search_orders(
    query: OrderQueryFilter,
    page: Pagination,
    conn: &mut SqliteConnection,
) -> Result<(Vec<Order>, i64), sqlx::Error> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM orders");
    push_filter(&mut count, query.clone());
    let total: i64 = count.build_query_scalar().fetch_one(&mut *conn).await?;

    let mut builder = QueryBuilder::new("SELECT * FROM orders");
    push_filter(&mut builder, query);
    builder.push(" ORDER BY created_at DESC, rowid DESC LIMIT ");
    builder.push_bind(page.limit());
    builder.push(" OFFSET ");
    builder.push_bind(page.offset());
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {} of {total}", orders.len());
    Ok((orders, total))
}

/// Totals are summed here rather than in SQL, since SQLite would coerce the TEXT amounts into floating point.
pub async fn revenue_between(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(Money, i64), sqlx::Error> {
    let amounts: Vec<Money> = sqlx::query_scalar(
        "SELECT total_amount FROM orders WHERE status = $1 AND payment_status = $2 AND created_at >= $3 AND \
         created_at <= $4",
    )
    .bind(OrderStatusType::Delivered)
    .bind(OrderPaymentStatus::Paid)
    .bind(from)
    .bind(to)
    .fetch_all(conn)
    .await?;
    let count = i64::try_from(amounts.len()).unwrap_or(i64::MAX);
    Ok((amounts.into_iter().sum::<Money>().rounded(), count))
}

use chrono::Utc;
use log::trace;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::is_unique_violation;
use crate::{
    db_types::{NewPayment, Payment, PaymentId, PaymentStatusType, PaymentUpdate},
    order_objects::Pagination,
    payment_objects::PaymentQueryFilter,
    traits::PaymentManagementError,
};

pub async fn insert_payment(payment: NewPayment, conn: &mut SqliteConnection) -> Result<Payment, PaymentManagementError> {
    let now = Utc::now();
    let result = sqlx::query_as(
        r#"
            INSERT INTO payments (id, order_id, gateway_order_id, amount, currency, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING *;
        "#,
    )
    .bind(payment.id.as_str())
    .bind(payment.order_id.as_str())
    .bind(&payment.gateway_order_id)
    .bind(payment.amount)
    .bind(&payment.currency)
    .bind(payment.status)
    .bind(now)
    .fetch_one(conn)
    .await;
    match result {
        Ok(p) => Ok(p),
        Err(e) if is_unique_violation(&e) => Err(PaymentManagementError::DuplicateGatewayOrderId(payment.gateway_order_id)),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_payment(id: &PaymentId, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE id = $1").bind(id.as_str()).fetch_optional(conn).await
}

pub async fn fetch_payment_by_gateway_order_id(
    gateway_order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE gateway_order_id = $1")
        .bind(gateway_order_id)
        .fetch_optional(conn)
        .await
}

/// If the gateway payment id was (wrongly) recorded against more than one payment, the most recent one is returned.
pub async fn fetch_payment_by_gateway_payment_id(
    gateway_payment_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE gateway_payment_id = $1 ORDER BY created_at DESC, rowid DESC LIMIT 1")
        .bind(gateway_payment_id)
        .fetch_optional(conn)
        .await
}

/// Applies the update if, and only if, the payment's current status is one of `from`. The guard is part of the
/// `UPDATE` statement itself, so concurrent transitions cannot both succeed.
///
/// Returns `None` if the guard did not match.
pub async fn transition_payment(
    id: &PaymentId,
    from: &[PaymentStatusType],
    update: PaymentUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    if from.is_empty() {
        return Ok(None);
    }
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE payments SET updated_at = ");
    builder.push_bind(Utc::now());
    builder.push(", status = ");
    builder.push_bind(update.status);
    if let Some(gateway_payment_id) = update.gateway_payment_id {
        builder.push(", gateway_payment_id = ");
        builder.push_bind(gateway_payment_id);
    }
    if let Some(method) = update.method {
        builder.push(", method = ");
        builder.push_bind(method);
    }
    if let Some(refunded_at) = update.refunded_at {
        builder.push(", refunded_at = ");
        builder.push_bind(refunded_at);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id.as_str().to_string());
    builder.push(" AND status IN (");
    let mut statuses = builder.separated(", ");
    for status in from {
        statuses.push_bind(*status);
    }
    statuses.push_unseparated(") RETURNING *");
    trace!("🗃️ Executing query: {}", builder.sql());
    builder.build_query_as::<Payment>().fetch_optional(conn).await
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, query: PaymentQueryFilter) {
    if query.is_empty() {
        return;
    }
    builder.push(" WHERE ");
    let mut where_clause = builder.separated(" AND ");
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

/// A page of payments matching the filter, newest first, and the total number of matches.
pub async fn search_payments(
    query: PaymentQueryFilter,
    page: Pagination,
    conn: &mut SqliteConnection,
) -> Result<(Vec<Payment>, i64), sqlx::Error> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM payments");
    push_filter(&mut count, query.clone());
    let total: i64 = count.build_query_scalar().fetch_one(&mut *conn).await?;

    let mut builder = QueryBuilder::new("SELECT * FROM payments");
    push_filter(&mut builder, query);
    builder.push(" ORDER BY created_at DESC, rowid DESC LIMIT ");
    builder.push_bind(page.limit());
    builder.push(" OFFSET ");
    builder.push_bind(page.offset());
    trace!("🗃️ Executing query: {}", builder.sql());
    let payments = builder.build_query_as::<Payment>().fetch_all(conn).await?;
    Ok((payments, total))
}

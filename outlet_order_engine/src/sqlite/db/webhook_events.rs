use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db_types::{NewWebhookEvent, WebhookEvent};

pub async fn webhook_event_exists(dedup_key: &str, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM webhook_events WHERE dedup_key = $1").bind(dedup_key).fetch_one(conn).await?;
    Ok(count > 0)
}

/// Records the event unless one with the same deduplication key already exists, in which case `None` is returned.
/// The check and the insert are a single statement.
pub async fn insert_webhook_event(
    event: NewWebhookEvent,
    conn: &mut SqliteConnection,
) -> Result<Option<WebhookEvent>, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO webhook_events (dedup_key, event_type, payload, processed_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT(dedup_key) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(event.dedup_key)
    .bind(event.event_type)
    .bind(event.payload)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await
}

pub async fn fetch_webhook_events(conn: &mut SqliteConnection) -> Result<Vec<WebhookEvent>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM webhook_events ORDER BY id ASC").fetch_all(conn).await
}

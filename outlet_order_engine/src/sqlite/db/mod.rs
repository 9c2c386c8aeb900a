//! # SQLite Database methods
//!
//! This module contains the "low-level" SQLite queries behind [`super::SqliteDatabase`].
//!
//! All these interactions are simple functions (rather than stateful structs) that accept a `&mut SqliteConnection`
//! argument. Callers can obtain a connection from a pool, or open a transaction when several statements must succeed
//! or fail together, and call through to the functions without any other changes.
//!
//! Timestamps are always bound from Rust rather than filled in by SQLite, so that every stored timestamp has the same
//! textual format and range queries compare like with like.
use std::{env, str::FromStr};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod catalog;
pub mod orders;
pub mod payments;
pub mod webhook_events;

const SQLITE_DB_URL: &str = "sqlite://data/outlet_orders.db";

pub fn db_url() -> String {
    let result = env::var("OOS_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ OOS_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

/// True if the error is a violation of a UNIQUE (or PRIMARY KEY) constraint.
pub(crate) fn is_unique_violation(e: &SqlxError) -> bool {
    matches!(e, SqlxError::Database(d) if d.is_unique_violation())
}

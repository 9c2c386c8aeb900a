//! SQLite backend for the outlet order engine.
//!
//! [`SqliteDatabase`] implements every storage trait in [`crate::traits`]. The queries themselves live in [`db`].
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;

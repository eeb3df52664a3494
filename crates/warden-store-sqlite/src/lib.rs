//! SQLite backend for the Warden moderation store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every mutation runs inside a single
//! `IMMEDIATE` transaction on that thread, which serialises writers and keeps
//! the ledger row and its violation/audit row atomic.

mod encode;
mod schema;
mod sql;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

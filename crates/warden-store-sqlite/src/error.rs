//! Error type for `warden-store-sqlite`.

use thiserror::Error;
use warden_core::{ErrorClass, StoreError};

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] warden_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A column held a value the domain types cannot represent.
  #[error("decode error: {0}")]
  Decode(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl StoreError for Error {
  fn class(&self) -> ErrorClass {
    match self {
      Self::Core(e) => e.class(),
      Self::Sqlite(e) | Self::Database(tokio_rusqlite::Error::Rusqlite(e)) if is_contention(e) => {
        ErrorClass::Conflict
      }
      _ => ErrorClass::Internal,
    }
  }

  fn field(&self) -> Option<&'static str> {
    match self {
      Self::Core(e) => e.field(),
      _ => None,
    }
  }
}

/// `SQLITE_BUSY` / `SQLITE_LOCKED`: another writer holds the database.
fn is_contention(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if matches!(f.code, rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
  )
}

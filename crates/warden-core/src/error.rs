//! Error types for `warden-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// Caller input was rejected before anything was read or written.
  #[error("{field}: {message}")]
  Validation {
    field:   &'static str,
    message: String,
  },

  /// The requested transition does not apply to the current state.
  #[error("invalid state: {0}")]
  InvalidState(String),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("violation not found: {0}")]
  ViolationNotFound(Uuid),

  #[error("conflict: {0}")]
  Conflict(String),
}

impl Error {
  pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
    Self::Validation { field, message: message.into() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Classification ──────────────────────────────────────────────────────────

/// Coarse failure category shared by every layer.
///
/// Store backends report their errors through [`StoreError::class`] so the
/// HTTP layer can choose a status code without knowing the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
  /// Bad input; fix the request, do not retry as-is.
  Validation,
  /// The action does not apply to the current ledger or appeal state.
  InvalidState,
  NotFound,
  /// Concurrent write or an already-settled appeal; re-fetch and retry.
  Conflict,
  Internal,
}

/// Implemented by every [`ModerationStore`](crate::store::ModerationStore)
/// error type.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn class(&self) -> ErrorClass;

  /// Name of the offending input field for validation failures.
  fn field(&self) -> Option<&'static str> { None }
}

impl StoreError for Error {
  fn class(&self) -> ErrorClass {
    match self {
      Self::Validation { .. } => ErrorClass::Validation,
      Self::InvalidState(_) => ErrorClass::InvalidState,
      Self::UserNotFound(_) | Self::ViolationNotFound(_) => ErrorClass::NotFound,
      Self::Conflict(_) => ErrorClass::Conflict,
    }
  }

  fn field(&self) -> Option<&'static str> {
    match self {
      Self::Validation { field, .. } => Some(field),
      _ => None,
    }
  }
}

/// Reject empty or whitespace-only text.
pub(crate) fn require_text(field: &'static str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::validation(field, "must not be empty"));
  }
  Ok(())
}

//! The `ModerationStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `warden-store-sqlite`).
//! Higher layers (`warden-api`, `warden-server`) depend on this abstraction,
//! not on any concrete backend.
//!
//! Every mutating method is one atomic unit: the ledger read, the state
//! machine step, the ledger write and the violation/audit write either all
//! commit or none do. Mutations on the same user are serialised.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  StoreError,
  action::{ModeratorAction, ModeratorOverride},
  ledger::{AccountStatus, StrikeLedger},
  user::{NewUserProfile, UserProfile},
  view::ModerationStats,
  violation::{AppealDecision, AppealStatus, NewViolation, Violation},
};

// ─── Query / result types ────────────────────────────────────────────────────

/// Parameters for [`ModerationStore::list_ledgers`].
#[derive(Debug, Clone, Default)]
pub struct LedgerQuery {
  /// Restrict to ledgers currently in this status (expired suspensions count
  /// as `active`).
  pub status: Option<AccountStatus>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// A ledger together with the profile it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
  pub user:   UserProfile,
  pub ledger: StrikeLedger,
}

/// Result of [`ModerationStore::record_violation`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationOutcome {
  pub violation:       Violation,
  #[serde(rename = "strikeRecord")]
  pub ledger:          StrikeLedger,
  pub previous_status: AccountStatus,
}

/// Result of [`ModerationStore::resolve_appeal`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppealResolution {
  pub violation:       Violation,
  #[serde(rename = "strikeRecord")]
  pub ledger:          StrikeLedger,
  /// Stored status before the decision, an elapsed suspension included.
  pub previous_status: AccountStatus,
  /// The implied `remove-strike`, present when an approval rolled back a
  /// strike.
  pub action:          Option<ModeratorAction>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Warden moderation store backend.
///
/// Violations and moderator actions are append-only; the ledger is the only
/// row that is rewritten.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ModerationStore: Send + Sync {
  type Error: StoreError;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Create or update a user profile. `created_at` is kept on update.
  fn upsert_user(
    &self,
    input: NewUserProfile,
  ) -> impl Future<Output = Result<UserProfile, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<UserProfile>, Self::Error>> + Send + '_;

  // ── Ledgers ───────────────────────────────────────────────────────────

  /// Snapshot of a user's ledger as of now. A registered user without a
  /// stored ledger reads as a clean one. Returns `None` for unknown users.
  fn get_ledger(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<StrikeLedger>, Self::Error>> + Send + '_;

  /// Return the stored ledger, creating a clean one if the user has none.
  /// Fails with a not-found error for unknown users.
  fn get_or_create_ledger(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<StrikeLedger, Self::Error>> + Send + '_;

  /// Stored ledgers matching `query`, most strikes first.
  fn list_ledgers<'a>(
    &'a self,
    query: &'a LedgerQuery,
  ) -> impl Future<Output = Result<Vec<LedgerEntry>, Self::Error>> + Send + 'a;

  // ── Violations ────────────────────────────────────────────────────────

  /// Record a violation and apply it to the user's ledger.
  ///
  /// The violation's `strike_number` is the ledger's strike count after the
  /// increment, assigned inside the same transaction.
  fn record_violation(
    &self,
    input: NewViolation,
  ) -> impl Future<Output = Result<ViolationOutcome, Self::Error>> + Send + '_;

  fn get_violation(
    &self,
    violation_id: Uuid,
  ) -> impl Future<Output = Result<Option<Violation>, Self::Error>> + Send + '_;

  /// All violations for a user, newest first.
  fn list_violations(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Violation>, Self::Error>> + Send + '_;

  /// Overwrite a violation's appeal status without running the appeal
  /// workflow or touching the ledger.
  fn set_appeal_status(
    &self,
    violation_id: Uuid,
    status: AppealStatus,
  ) -> impl Future<Output = Result<Violation, Self::Error>> + Send + '_;

  // ── Overrides ─────────────────────────────────────────────────────────

  /// Validate and apply a moderator override, writing its audit record in
  /// the same transaction as the ledger change.
  fn apply_override(
    &self,
    user_id: Uuid,
    request: ModeratorOverride,
    moderator_id: Uuid,
  ) -> impl Future<Output = Result<(ModeratorAction, StrikeLedger), Self::Error>> + Send + '_;

  /// The audit trail for a user, newest first.
  fn list_actions(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ModeratorAction>, Self::Error>> + Send + '_;

  // ── Appeals ───────────────────────────────────────────────────────────

  /// File an appeal on one of `user_id`'s own violations. A violation that
  /// belongs to someone else is reported as not found.
  fn submit_appeal(
    &self,
    violation_id: Uuid,
    user_id: Uuid,
    reason: Option<String>,
  ) -> impl Future<Output = Result<Violation, Self::Error>> + Send + '_;

  /// Rule on a pending appeal. Approval rolls back one strike as an implied
  /// `remove-strike` override carrying `reason`.
  fn resolve_appeal(
    &self,
    violation_id: Uuid,
    decision: AppealDecision,
    reason: String,
    moderator_id: Uuid,
  ) -> impl Future<Output = Result<AppealResolution, Self::Error>> + Send + '_;

  /// Violations whose appeal is in `status`, oldest appeal first.
  fn list_appeals(
    &self,
    status: AppealStatus,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Violation>, Self::Error>> + Send + '_;

  // ── Maintenance ───────────────────────────────────────────────────────

  /// Persist the lifting of every suspension that ended at or before `now`
  /// and return the updated ledgers.
  fn expire_suspensions(
    &self,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<StrikeLedger>, Self::Error>> + Send + '_;

  fn stats(&self) -> impl Future<Output = Result<ModerationStats, Self::Error>> + Send + '_;
}

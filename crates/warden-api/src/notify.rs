//! Account status change notifications.
//!
//! Handlers publish a [`StatusChange`] whenever a committed mutation moves a
//! ledger to a different status or suspension window. Delivery happens in
//! whoever subscribes; publishing never blocks and never fails a request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;
use warden_core::ledger::{AccountStatus, StrikeLedger};

/// What caused a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeCause {
  Violation,
  Override,
  Appeal,
  Expiry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
  pub user_id:             Uuid,
  pub previous:            AccountStatus,
  pub current:             AccountStatus,
  pub suspension_end_date: Option<DateTime<Utc>>,
  pub cause:               ChangeCause,
}

/// Fan-out handle for [`StatusChange`] events.
#[derive(Debug, Clone)]
pub struct Notifier {
  tx: broadcast::Sender<StatusChange>,
}

impl Notifier {
  pub fn new(capacity: usize) -> Self {
    let (tx, _) = broadcast::channel(capacity);
    Self { tx }
  }

  pub fn subscribe(&self) -> broadcast::Receiver<StatusChange> { self.tx.subscribe() }

  /// Publish if `ledger` ended up somewhere other than `previous`, or if
  /// `window_moved` says the suspension end date changed in place.
  pub fn ledger_changed(
    &self,
    previous: AccountStatus,
    ledger: &StrikeLedger,
    window_moved: bool,
    cause: ChangeCause,
  ) {
    if previous == ledger.account_status && !window_moved {
      return;
    }
    self.publish(StatusChange {
      user_id: ledger.user_id,
      previous,
      current: ledger.account_status,
      suspension_end_date: ledger.suspension_end_date,
      cause,
    });
  }

  pub fn publish(&self, change: StatusChange) {
    // No subscribers is fine.
    let _ = self.tx.send(change);
  }
}

impl Default for Notifier {
  fn default() -> Self { Self::new(256) }
}

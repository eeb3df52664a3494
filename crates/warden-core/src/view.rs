//! Read models returned by the JSON API. Never stored; always derived.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  ledger::{AccountStatus, StrikeLedger},
  user::UserProfile,
  violation::Violation,
};

/// One row of the moderator strike dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrikeSummary {
  pub user_id:             Uuid,
  pub user:                UserProfile,
  pub current_strikes:     u32,
  pub account_status:      AccountStatus,
  pub total_violations:    u32,
  pub last_violation_date: Option<DateTime<Utc>>,
  pub suspension_end_date: Option<DateTime<Utc>>,
}

impl StrikeSummary {
  pub fn new(user: UserProfile, ledger: StrikeLedger) -> Self {
    Self {
      user_id: ledger.user_id,
      user,
      current_strikes: ledger.current_strikes,
      account_status: ledger.account_status,
      total_violations: ledger.total_violations,
      last_violation_date: ledger.last_violation_date,
      suspension_end_date: ledger.suspension_end_date,
    }
  }
}

/// Everything known about one user's standing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrikeDetail {
  pub user_id:       Uuid,
  pub user:          UserProfile,
  pub strike_record: StrikeLedger,
  /// Newest first.
  pub violations:    Vec<Violation>,
}

/// Ledger-derived counters for the moderation dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationStats {
  pub pending_appeals:    u64,
  pub warning:            u64,
  pub suspended:          u64,
  pub banned:             u64,
  pub users_with_strikes: u64,
  pub total_violations:   u64,
}

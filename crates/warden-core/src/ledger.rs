//! The per-user strike ledger and the account status state machine.
//!
//! A ledger is the single aggregate through which strikes are counted. Its
//! status is driven by the strike count:
//!
//! | strikes | status      |
//! |---------|-------------|
//! | 0       | `active`    |
//! | 1       | `warning`   |
//! | 2       | `suspended` |
//! | 3+      | `banned`    |
//!
//! Escalations (new violations, added strikes) never leave the account in a
//! milder state than it was in, and relaxations (removed strikes, approved
//! appeals) never leave it harsher. A moderator's `ban` therefore survives new
//! strikes, and an `unban` survives strike removals.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, action::OverrideAction, violation::MAX_SUSPENSION_DAYS};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Account standing. Variants are declared in order of severity; the derived
/// `Ord` is relied on by the transition rules.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AccountStatus {
  Active,
  Warning,
  Suspended,
  Banned,
}

impl AccountStatus {
  /// The status the transition table assigns to a strike count. Saturates at
  /// `Banned` for any count of three or more.
  pub fn for_strikes(strikes: u32) -> Self {
    match strikes {
      0 => Self::Active,
      1 => Self::Warning,
      2 => Self::Suspended,
      _ => Self::Banned,
    }
  }
}

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Tunables for automatic transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrikePolicy {
  /// Suspension length used when a transition lands on `suspended` and the
  /// caller supplied no explicit length.
  pub suspension_days: u32,
}

impl Default for StrikePolicy {
  fn default() -> Self { Self { suspension_days: 7 } }
}

impl StrikePolicy {
  /// Reject a default suspension outside `1..=365` days.
  pub fn validate(&self) -> Result<()> {
    if !(1..=MAX_SUSPENSION_DAYS).contains(&self.suspension_days) {
      return Err(Error::validation(
        "suspension_days",
        format!("must be between 1 and {MAX_SUSPENSION_DAYS}"),
      ));
    }
    Ok(())
  }
}

// ─── Ledger ──────────────────────────────────────────────────────────────────

/// Aggregate strike record for one user.
///
/// `suspension_end_date` is `Some` exactly when `account_status` is
/// `Suspended`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrikeLedger {
  pub user_id:             Uuid,
  pub current_strikes:     u32,
  /// Never decremented, even when a strike is removed.
  pub total_violations:    u32,
  pub account_status:      AccountStatus,
  pub suspension_end_date: Option<DateTime<Utc>>,
  pub last_violation_date: Option<DateTime<Utc>>,
  pub updated_at:          DateTime<Utc>,
}

impl StrikeLedger {
  /// A clean ledger: no strikes, `active`.
  pub fn new(user_id: Uuid, now: DateTime<Utc>) -> Self {
    Self {
      user_id,
      current_strikes: 0,
      total_violations: 0,
      account_status: AccountStatus::Active,
      suspension_end_date: None,
      last_violation_date: None,
      updated_at: now,
    }
  }

  pub fn is_suspension_expired(&self, now: DateTime<Utc>) -> bool {
    self.account_status == AccountStatus::Suspended
      && self.suspension_end_date.is_none_or(|end| end <= now)
  }

  /// Lift a suspension whose window has passed. Returns `true` if anything
  /// changed.
  pub fn expire(&mut self, now: DateTime<Utc>) -> bool {
    if !self.is_suspension_expired(now) {
      return false;
    }
    self.account_status = AccountStatus::Active;
    self.suspension_end_date = None;
    self.updated_at = now;
    true
  }

  /// The ledger as it reads at `now`, with an elapsed suspension lifted.
  pub fn as_of(mut self, now: DateTime<Utc>) -> Self {
    if self.is_suspension_expired(now) {
      self.account_status = AccountStatus::Active;
      self.suspension_end_date = None;
    }
    self
  }

  /// Count one violation and run the automatic transition.
  ///
  /// Returns the strike number assigned to the violation, i.e. the strike
  /// count after this violation is counted. On error the ledger is left
  /// untouched.
  pub fn apply_violation(
    &mut self,
    suspension_days: Option<u32>,
    policy: &StrikePolicy,
    now: DateTime<Utc>,
  ) -> Result<u32> {
    let mut next = self.clone();
    next.expire(now);
    next.current_strikes = next.current_strikes.saturating_add(1);
    next.total_violations = next.total_violations.saturating_add(1);
    next.last_violation_date = Some(now);
    next.escalate(suspension_days.unwrap_or(policy.suspension_days), now)?;
    next.updated_at = now;
    *self = next;
    Ok(self.current_strikes)
  }

  /// Apply a moderator override, bypassing the automatic thresholds.
  ///
  /// Fails with [`Error::InvalidState`] when the action does not apply to
  /// the current status; the ledger is left untouched in that case.
  pub fn apply_override(
    &mut self,
    action: &OverrideAction,
    policy: &StrikePolicy,
    now: DateTime<Utc>,
  ) -> Result<()> {
    let mut next = self.clone();
    next.expire(now);

    match *action {
      OverrideAction::Extend { days } => {
        next.require(AccountStatus::Suspended, "extend")?;
        let base = next.suspension_end_date.unwrap_or(now);
        next.suspension_end_date = Some(end_after(base, days)?);
      }
      OverrideAction::Cancel => {
        next.require(AccountStatus::Suspended, "cancel")?;
        next.set_status(AccountStatus::Active, None);
      }
      OverrideAction::AddStrike => {
        next.current_strikes = next.current_strikes.saturating_add(1);
        next.total_violations = next.total_violations.saturating_add(1);
        next.last_violation_date = Some(now);
        next.escalate(policy.suspension_days, now)?;
      }
      OverrideAction::RemoveStrike => {
        if next.current_strikes == 0 {
          return Err(Error::InvalidState(
            "remove-strike requires at least one current strike".into(),
          ));
        }
        next.current_strikes -= 1;
        next.relax(policy.suspension_days, now)?;
      }
      // Both force the status from any state; banning a banned account is
      // a recorded no-op.
      OverrideAction::Ban => next.set_status(AccountStatus::Banned, None),
      OverrideAction::Unban => next.set_status(AccountStatus::Active, None),
    }

    next.updated_at = now;
    *self = next;
    Ok(())
  }

  fn require(&self, status: AccountStatus, action: &str) -> Result<()> {
    if self.account_status != status {
      return Err(Error::InvalidState(format!(
        "{action} requires a {status} account, found {}",
        self.account_status
      )));
    }
    Ok(())
  }

  fn set_status(&mut self, status: AccountStatus, end: Option<DateTime<Utc>>) {
    self.account_status = status;
    self.suspension_end_date = end;
  }

  /// Move to the table status for the current strike count, never to a
  /// milder status than the present one.
  fn escalate(&mut self, days: u32, now: DateTime<Utc>) -> Result<()> {
    let target = AccountStatus::for_strikes(self.current_strikes).max(self.account_status);
    let end = match (target, self.account_status) {
      (AccountStatus::Suspended, AccountStatus::Suspended) => {
        let fresh = end_after(now, days)?;
        Some(self.suspension_end_date.map_or(fresh, |end| end.max(fresh)))
      }
      (AccountStatus::Suspended, _) => Some(end_after(now, days)?),
      _ => None,
    };
    self.set_status(target, end);
    Ok(())
  }

  /// Move to the table status for the current strike count, never to a
  /// harsher status than the present one.
  fn relax(&mut self, days: u32, now: DateTime<Utc>) -> Result<()> {
    let target = AccountStatus::for_strikes(self.current_strikes).min(self.account_status);
    let end = match (target, self.account_status) {
      (AccountStatus::Suspended, AccountStatus::Suspended) => self.suspension_end_date,
      (AccountStatus::Suspended, _) => Some(end_after(now, days)?),
      _ => None,
    };
    self.set_status(target, end);
    Ok(())
  }
}

/// `base` plus `days`, failing instead of overflowing the calendar.
fn end_after(base: DateTime<Utc>, days: u32) -> Result<DateTime<Utc>> {
  Duration::try_days(i64::from(days))
    .and_then(|d| base.checked_add_signed(d))
    .ok_or_else(|| {
      Error::validation("days", "suspension would end beyond the supported date range")
    })
}

//! Moderator overrides and their append-only audit records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  error::require_text,
  ledger::{AccountStatus, StrikeLedger},
};

/// Upper bound for a single `extend` call.
pub const MAX_EXTENSION_DAYS: u32 = 365;

/// Upper bound on a free-text moderator reason.
pub const MAX_REASON_LEN: usize = 2000;

// ─── Kinds ───────────────────────────────────────────────────────────────────

/// The six override verbs, as they appear in URLs and audit records.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ActionKind {
  Extend,
  Cancel,
  AddStrike,
  RemoveStrike,
  Ban,
  Unban,
}

/// An override verb together with its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum OverrideAction {
  Extend { days: u32 },
  Cancel,
  AddStrike,
  RemoveStrike,
  Ban,
  Unban,
}

impl OverrideAction {
  pub fn kind(&self) -> ActionKind {
    match self {
      Self::Extend { .. } => ActionKind::Extend,
      Self::Cancel => ActionKind::Cancel,
      Self::AddStrike => ActionKind::AddStrike,
      Self::RemoveStrike => ActionKind::RemoveStrike,
      Self::Ban => ActionKind::Ban,
      Self::Unban => ActionKind::Unban,
    }
  }

  pub fn days(&self) -> Option<u32> {
    match self {
      Self::Extend { days } => Some(*days),
      _ => None,
    }
  }

  /// Build an action from a URL verb and an optional `days` field.
  ///
  /// `days` is required and must be within `1..=365` for `extend`; it is
  /// ignored for every other verb.
  pub fn from_parts(kind: ActionKind, days: Option<i64>) -> Result<Self> {
    Ok(match kind {
      ActionKind::Extend => {
        let days = days.ok_or_else(|| Error::validation("days", "required for extend"))?;
        Self::Extend { days: check_days(days)? }
      }
      ActionKind::Cancel => Self::Cancel,
      ActionKind::AddStrike => Self::AddStrike,
      ActionKind::RemoveStrike => Self::RemoveStrike,
      ActionKind::Ban => Self::Ban,
      ActionKind::Unban => Self::Unban,
    })
  }
}

fn check_days(days: i64) -> Result<u32> {
  u32::try_from(days)
    .ok()
    .filter(|d| (1..=MAX_EXTENSION_DAYS).contains(d))
    .ok_or_else(|| {
      Error::validation("days", format!("must be between 1 and {MAX_EXTENSION_DAYS}"))
    })
}

// ─── Request ─────────────────────────────────────────────────────────────────

/// Input to [`crate::store::ModerationStore::apply_override`].
#[derive(Debug, Clone)]
pub struct ModeratorOverride {
  pub action: OverrideAction,
  pub reason: String,
}

impl ModeratorOverride {
  pub fn new(action: OverrideAction, reason: impl Into<String>) -> Self {
    Self { action, reason: reason.into() }
  }

  /// Check the request before any ledger is read.
  pub fn validate(&self) -> Result<()> {
    validate_reason(&self.reason)?;
    if let OverrideAction::Extend { days } = self.action {
      check_days(i64::from(days))?;
    }
    Ok(())
  }
}

/// A moderator reason must be present, non-blank and bounded.
pub fn validate_reason(reason: &str) -> Result<()> {
  require_text("reason", reason)?;
  if reason.len() > MAX_REASON_LEN {
    return Err(Error::validation(
      "reason",
      format!("must be at most {MAX_REASON_LEN} bytes"),
    ));
  }
  Ok(())
}

// ─── Audit record ────────────────────────────────────────────────────────────

/// One committed override. Written in the same transaction as the ledger
/// change it describes and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeratorAction {
  pub action_id:         Uuid,
  pub user_id:           Uuid,
  pub action:            ActionKind,
  pub reason:            String,
  pub days:              Option<u32>,
  pub moderator_id:      Uuid,
  /// Set when the override was implied by an approved appeal.
  pub violation_id:      Option<Uuid>,
  pub previous_status:   AccountStatus,
  pub resulting_status:  AccountStatus,
  pub strikes_after:     u32,
  pub created_at:        DateTime<Utc>,
}

impl ModeratorAction {
  /// Describe an override that has just been applied to `ledger`.
  pub fn new(
    request: ModeratorOverride,
    moderator_id: Uuid,
    previous_status: AccountStatus,
    ledger: &StrikeLedger,
  ) -> Self {
    Self {
      action_id: Uuid::new_v4(),
      user_id: ledger.user_id,
      action: request.action.kind(),
      reason: request.reason,
      days: request.action.days(),
      moderator_id,
      violation_id: None,
      previous_status,
      resulting_status: ledger.account_status,
      strikes_after: ledger.current_strikes,
      created_at: ledger.updated_at,
    }
  }

  pub fn for_violation(mut self, violation_id: Uuid) -> Self {
    self.violation_id = Some(violation_id);
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kinds_parse_from_url_segments() {
    assert_eq!("add-strike".parse::<ActionKind>().unwrap(), ActionKind::AddStrike);
    assert_eq!("remove-strike".parse::<ActionKind>().unwrap(), ActionKind::RemoveStrike);
    assert_eq!(ActionKind::Unban.to_string(), "unban");
    assert!("suspend".parse::<ActionKind>().is_err());
  }

  #[test]
  fn extend_requires_days_in_range() {
    assert!(matches!(
      OverrideAction::from_parts(ActionKind::Extend, None),
      Err(Error::Validation { field: "days", .. })
    ));
    assert!(OverrideAction::from_parts(ActionKind::Extend, Some(0)).is_err());
    assert!(OverrideAction::from_parts(ActionKind::Extend, Some(366)).is_err());
    assert!(OverrideAction::from_parts(ActionKind::Extend, Some(-4)).is_err());
    assert_eq!(
      OverrideAction::from_parts(ActionKind::Extend, Some(365)).unwrap(),
      OverrideAction::Extend { days: 365 }
    );
  }

  #[test]
  fn days_ignored_for_other_verbs() {
    let a = OverrideAction::from_parts(ActionKind::Ban, Some(9000)).unwrap();
    assert_eq!(a, OverrideAction::Ban);
    assert_eq!(a.days(), None);
  }

  #[test]
  fn whitespace_reason_is_rejected() {
    let req = ModeratorOverride::new(OverrideAction::Ban, "   \t ");
    assert!(matches!(req.validate(), Err(Error::Validation { field: "reason", .. })));
    assert!(ModeratorOverride::new(OverrideAction::Ban, "spam ring").validate().is_ok());
  }

  #[test]
  fn override_action_wire_shape() {
    let json = serde_json::to_value(OverrideAction::Extend { days: 3 }).unwrap();
    assert_eq!(json, serde_json::json!({ "action": "extend", "days": 3 }));
  }
}

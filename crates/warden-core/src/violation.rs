//! Violation records and the appeal workflow.
//!
//! Violations are never deleted. Apart from creation, the only mutation a
//! violation ever sees is its appeal moving through
//! `none → pending → approved | rejected` (a rejected appeal may be
//! resubmitted).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, action::validate_reason, error::require_text};

/// Longest suspension a single violation may carry.
pub const MAX_SUSPENSION_DAYS: u32 = 365;

// ─── Enumerations ────────────────────────────────────────────────────────────

/// The policy consequence recorded with a violation.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Consequence {
  Warning,
  Suspension,
  ContentRemoval,
  Ban,
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AppealStatus {
  #[default]
  None,
  Pending,
  Approved,
  Rejected,
}

/// A moderator's ruling on a pending appeal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AppealDecision {
  Approve,
  Reject,
}

// ─── Violation ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
  pub violation_id:      Uuid,
  pub user_id:           Uuid,
  /// The user's strike count once this violation was counted.
  pub strike_number:     u32,
  pub violation_type:    String,
  pub description:       String,
  pub consequence:       Consequence,
  pub suspension_days:   Option<u32>,
  /// `None` when the violation was raised by automated flagging.
  pub moderator_id:      Option<Uuid>,
  pub moderator_notes:   Option<String>,
  pub appeal_status:     AppealStatus,
  pub appeal_reason:     Option<String>,
  pub appealed_at:       Option<DateTime<Utc>>,
  /// The moderator's explanation for the appeal decision.
  pub appeal_resolution: Option<String>,
  pub created_at:        DateTime<Utc>,
}

impl Violation {
  /// Move the appeal to `pending`.
  ///
  /// Fails with [`Error::Conflict`] if an appeal is already pending or was
  /// approved.
  pub fn submit_appeal(&mut self, reason: Option<String>, now: DateTime<Utc>) -> Result<()> {
    match self.appeal_status {
      AppealStatus::Pending => {
        return Err(Error::Conflict(format!(
          "violation {} already has a pending appeal",
          self.violation_id
        )));
      }
      AppealStatus::Approved => {
        return Err(Error::Conflict(format!(
          "appeal for violation {} was already approved",
          self.violation_id
        )));
      }
      AppealStatus::None | AppealStatus::Rejected => {}
    }

    self.appeal_status = AppealStatus::Pending;
    self.appeal_reason = reason.filter(|r| !r.trim().is_empty());
    self.appealed_at = Some(now);
    self.appeal_resolution = None;
    Ok(())
  }

  /// Settle a pending appeal. Fails with [`Error::InvalidState`] unless the
  /// appeal is currently `pending`.
  pub fn resolve_appeal(&mut self, decision: AppealDecision, reason: &str) -> Result<()> {
    if self.appeal_status != AppealStatus::Pending {
      return Err(Error::InvalidState(format!(
        "appeal for violation {} is {}, not pending",
        self.violation_id, self.appeal_status
      )));
    }
    self.appeal_status = match decision {
      AppealDecision::Approve => AppealStatus::Approved,
      AppealDecision::Reject => AppealStatus::Rejected,
    };
    self.appeal_resolution = Some(reason.to_owned());
    Ok(())
  }
}

// ─── NewViolation ────────────────────────────────────────────────────────────

/// Input to [`crate::store::ModerationStore::record_violation`].
/// `strike_number` and `created_at` are always assigned by the store.
#[derive(Debug, Clone)]
pub struct NewViolation {
  pub user_id:         Uuid,
  pub violation_type:  String,
  pub description:     String,
  pub consequence:     Consequence,
  pub suspension_days: Option<u32>,
  pub moderator_id:    Option<Uuid>,
  pub moderator_notes: Option<String>,
}

impl NewViolation {
  /// Convenience constructor for an automated flag with no suspension
  /// override and no moderator.
  pub fn new(
    user_id: Uuid,
    violation_type: impl Into<String>,
    description: impl Into<String>,
    consequence: Consequence,
  ) -> Self {
    Self {
      user_id,
      violation_type: violation_type.into(),
      description: description.into(),
      consequence,
      suspension_days: None,
      moderator_id: None,
      moderator_notes: None,
    }
  }

  pub fn validate(&self) -> Result<()> {
    require_text("violationType", &self.violation_type)?;
    require_text("description", &self.description)?;
    if let Some(days) = self.suspension_days
      && !(1..=MAX_SUSPENSION_DAYS).contains(&days)
    {
      return Err(Error::validation(
        "suspensionDays",
        format!("must be between 1 and {MAX_SUSPENSION_DAYS}"),
      ));
    }
    Ok(())
  }

  /// Materialise the record once the store has assigned a strike number.
  pub fn into_violation(self, strike_number: u32, now: DateTime<Utc>) -> Violation {
    Violation {
      violation_id: Uuid::new_v4(),
      user_id: self.user_id,
      strike_number,
      violation_type: self.violation_type,
      description: self.description,
      consequence: self.consequence,
      suspension_days: self.suspension_days,
      moderator_id: self.moderator_id,
      moderator_notes: self.moderator_notes.filter(|n| !n.trim().is_empty()),
      appeal_status: AppealStatus::None,
      appeal_reason: None,
      appealed_at: None,
      appeal_resolution: None,
      created_at: now,
    }
  }
}

/// Validate the moderator's explanation attached to an appeal decision.
pub fn validate_resolution(reason: &str) -> Result<()> { validate_reason(reason) }

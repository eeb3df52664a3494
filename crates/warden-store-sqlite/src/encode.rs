//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision, `Z` suffix) so that string comparison in SQL matches
//! chronological order. Enumerations are stored by their wire names. UUIDs are
//! stored as hyphenated lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use uuid::Uuid;
use warden_core::{
  action::ModeratorAction,
  ledger::StrikeLedger,
  user::UserProfile,
  violation::Violation,
};

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

/// Parse a strum-backed enumeration from its stored wire name.
pub fn decode_enum<T: FromStr>(what: &str, s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown {what}: {s:?}")))
}

// ─── Column lists ────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "user_id, username, display_name, created_at";

pub const LEDGER_COLUMNS: &str = "user_id, current_strikes, total_violations, account_status, \
                                  suspension_end_date, last_violation_date, updated_at";

pub const VIOLATION_COLUMNS: &str = "violation_id, user_id, strike_number, violation_type, \
                                     description, consequence, suspension_days, moderator_id, \
                                     moderator_notes, appeal_status, appeal_reason, appealed_at, \
                                     appeal_resolution, created_at";

pub const ACTION_COLUMNS: &str = "action_id, user_id, action, reason, days, moderator_id, \
                                  violation_id, previous_status, resulting_status, \
                                  strikes_after, created_at";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:      String,
  pub username:     String,
  pub display_name: Option<String>,
  pub created_at:   String,
}

impl RawUser {
  /// Read [`USER_COLUMNS`] starting at column `at`.
  pub fn from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:      row.get(at)?,
      username:     row.get(at + 1)?,
      display_name: row.get(at + 2)?,
      created_at:   row.get(at + 3)?,
    })
  }

  pub fn into_user(self) -> Result<UserProfile> {
    Ok(UserProfile {
      user_id:      decode_uuid(&self.user_id)?,
      username:     self.username,
      display_name: self.display_name,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `ledgers` row.
pub struct RawLedger {
  pub user_id:             String,
  pub current_strikes:     u32,
  pub total_violations:    u32,
  pub account_status:      String,
  pub suspension_end_date: Option<String>,
  pub last_violation_date: Option<String>,
  pub updated_at:          String,
}

impl RawLedger {
  /// Read [`LEDGER_COLUMNS`] starting at column `at`.
  pub fn from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:             row.get(at)?,
      current_strikes:     row.get(at + 1)?,
      total_violations:    row.get(at + 2)?,
      account_status:      row.get(at + 3)?,
      suspension_end_date: row.get(at + 4)?,
      last_violation_date: row.get(at + 5)?,
      updated_at:          row.get(at + 6)?,
    })
  }

  pub fn into_ledger(self) -> Result<StrikeLedger> {
    Ok(StrikeLedger {
      user_id:             decode_uuid(&self.user_id)?,
      current_strikes:     self.current_strikes,
      total_violations:    self.total_violations,
      account_status:      decode_enum("account status", &self.account_status)?,
      suspension_end_date: decode_opt_dt(self.suspension_end_date)?,
      last_violation_date: decode_opt_dt(self.last_violation_date)?,
      updated_at:          decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `violations` row.
pub struct RawViolation {
  pub violation_id:      String,
  pub user_id:           String,
  pub strike_number:     u32,
  pub violation_type:    String,
  pub description:       String,
  pub consequence:       String,
  pub suspension_days:   Option<u32>,
  pub moderator_id:      Option<String>,
  pub moderator_notes:   Option<String>,
  pub appeal_status:     String,
  pub appeal_reason:     Option<String>,
  pub appealed_at:       Option<String>,
  pub appeal_resolution: Option<String>,
  pub created_at:        String,
}

impl RawViolation {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      violation_id:      row.get(0)?,
      user_id:           row.get(1)?,
      strike_number:     row.get(2)?,
      violation_type:    row.get(3)?,
      description:       row.get(4)?,
      consequence:       row.get(5)?,
      suspension_days:   row.get(6)?,
      moderator_id:      row.get(7)?,
      moderator_notes:   row.get(8)?,
      appeal_status:     row.get(9)?,
      appeal_reason:     row.get(10)?,
      appealed_at:       row.get(11)?,
      appeal_resolution: row.get(12)?,
      created_at:        row.get(13)?,
    })
  }

  pub fn into_violation(self) -> Result<Violation> {
    Ok(Violation {
      violation_id:      decode_uuid(&self.violation_id)?,
      user_id:           decode_uuid(&self.user_id)?,
      strike_number:     self.strike_number,
      violation_type:    self.violation_type,
      description:       self.description,
      consequence:       decode_enum("consequence", &self.consequence)?,
      suspension_days:   self.suspension_days,
      moderator_id:      decode_opt_uuid(self.moderator_id)?,
      moderator_notes:   self.moderator_notes,
      appeal_status:     decode_enum("appeal status", &self.appeal_status)?,
      appeal_reason:     self.appeal_reason,
      appealed_at:       decode_opt_dt(self.appealed_at)?,
      appeal_resolution: self.appeal_resolution,
      created_at:        decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `moderator_actions` row.
pub struct RawAction {
  pub action_id:        String,
  pub user_id:          String,
  pub action:           String,
  pub reason:           String,
  pub days:             Option<u32>,
  pub moderator_id:     String,
  pub violation_id:     Option<String>,
  pub previous_status:  String,
  pub resulting_status: String,
  pub strikes_after:    u32,
  pub created_at:       String,
}

impl RawAction {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      action_id:        row.get(0)?,
      user_id:          row.get(1)?,
      action:           row.get(2)?,
      reason:           row.get(3)?,
      days:             row.get(4)?,
      moderator_id:     row.get(5)?,
      violation_id:     row.get(6)?,
      previous_status:  row.get(7)?,
      resulting_status: row.get(8)?,
      strikes_after:    row.get(9)?,
      created_at:       row.get(10)?,
    })
  }

  pub fn into_action(self) -> Result<ModeratorAction> {
    Ok(ModeratorAction {
      action_id:        decode_uuid(&self.action_id)?,
      user_id:          decode_uuid(&self.user_id)?,
      action:           decode_enum("action", &self.action)?,
      reason:           self.reason,
      days:             self.days,
      moderator_id:     decode_uuid(&self.moderator_id)?,
      violation_id:     decode_opt_uuid(self.violation_id)?,
      previous_status:  decode_enum("account status", &self.previous_status)?,
      resulting_status: decode_enum("account status", &self.resulting_status)?,
      strikes_after:    self.strikes_after,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

//! Synchronous row-level helpers, run on the `tokio_rusqlite` thread inside
//! a transaction (or a plain read).

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _, params};
use uuid::Uuid;
use warden_core::{
  action::ModeratorAction,
  ledger::StrikeLedger,
  user::UserProfile,
  violation::Violation,
};

use crate::{
  Result,
  encode::{
    ACTION_COLUMNS, LEDGER_COLUMNS, RawAction, RawLedger, RawUser, RawViolation, USER_COLUMNS,
    VIOLATION_COLUMNS, encode_dt, encode_uuid,
  },
};

/// Status as it reads at `:now`: a suspension whose window has passed
/// counts as `active`.
pub const EFFECTIVE_STATUS: &str = "CASE WHEN l.account_status = 'suspended' \
                                    AND l.suspension_end_date <= :now \
                                    THEN 'active' ELSE l.account_status END";

// ─── Users ───────────────────────────────────────────────────────────────────

pub fn load_user(conn: &Connection, user_id: Uuid) -> Result<Option<UserProfile>> {
  let raw = conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
      params![encode_uuid(user_id)],
      |row| RawUser::from_row(row, 0),
    )
    .optional()?;
  raw.map(RawUser::into_user).transpose()
}

// ─── Ledgers ─────────────────────────────────────────────────────────────────

pub fn load_ledger(conn: &Connection, user_id: Uuid) -> Result<Option<StrikeLedger>> {
  let raw = conn
    .query_row(
      &format!("SELECT {LEDGER_COLUMNS} FROM ledgers WHERE user_id = ?1"),
      params![encode_uuid(user_id)],
      |row| RawLedger::from_row(row, 0),
    )
    .optional()?;
  raw.map(RawLedger::into_ledger).transpose()
}

/// Load a ledger for mutation: the user must exist and a missing ledger
/// starts clean.
///
/// The stored status is returned as-is, elapsed suspension included, so the
/// caller can record it as the previous status before the state machine
/// lifts the suspension.
pub fn ledger_for_update(
  conn: &Connection,
  user_id: Uuid,
  now: DateTime<Utc>,
) -> Result<StrikeLedger> {
  if load_user(conn, user_id)?.is_none() {
    return Err(warden_core::Error::UserNotFound(user_id).into());
  }
  Ok(load_ledger(conn, user_id)?.unwrap_or_else(|| StrikeLedger::new(user_id, now)))
}

pub fn save_ledger(conn: &Connection, ledger: &StrikeLedger) -> Result<()> {
  conn.execute(
    "INSERT INTO ledgers (
       user_id, current_strikes, total_violations, account_status,
       suspension_end_date, last_violation_date, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
     ON CONFLICT (user_id) DO UPDATE SET
       current_strikes     = excluded.current_strikes,
       total_violations    = excluded.total_violations,
       account_status      = excluded.account_status,
       suspension_end_date = excluded.suspension_end_date,
       last_violation_date = excluded.last_violation_date,
       updated_at          = excluded.updated_at",
    params![
      encode_uuid(ledger.user_id),
      ledger.current_strikes,
      ledger.total_violations,
      ledger.account_status.as_ref(),
      ledger.suspension_end_date.map(encode_dt),
      ledger.last_violation_date.map(encode_dt),
      encode_dt(ledger.updated_at),
    ],
  )?;
  Ok(())
}

/// Stored ledgers that are suspended with a window ending at or before `now`.
pub fn expired_ledgers(conn: &Connection, now: DateTime<Utc>) -> Result<Vec<StrikeLedger>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {LEDGER_COLUMNS} FROM ledgers
     WHERE account_status = 'suspended' AND suspension_end_date <= ?1"
  ))?;
  let raws = stmt
    .query_map(params![encode_dt(now)], |row| RawLedger::from_row(row, 0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawLedger::into_ledger).collect()
}

// ─── Violations ──────────────────────────────────────────────────────────────

pub fn insert_violation(conn: &Connection, v: &Violation) -> Result<()> {
  conn.execute(
    &format!(
      "INSERT INTO violations ({VIOLATION_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
    ),
    params![
      encode_uuid(v.violation_id),
      encode_uuid(v.user_id),
      v.strike_number,
      v.violation_type,
      v.description,
      v.consequence.as_ref(),
      v.suspension_days,
      v.moderator_id.map(encode_uuid),
      v.moderator_notes,
      v.appeal_status.as_ref(),
      v.appeal_reason,
      v.appealed_at.map(encode_dt),
      v.appeal_resolution,
      encode_dt(v.created_at),
    ],
  )?;
  Ok(())
}

pub fn load_violation(conn: &Connection, violation_id: Uuid) -> Result<Option<Violation>> {
  let raw = conn
    .query_row(
      &format!("SELECT {VIOLATION_COLUMNS} FROM violations WHERE violation_id = ?1"),
      params![encode_uuid(violation_id)],
      RawViolation::from_row,
    )
    .optional()?;
  raw.map(RawViolation::into_violation).transpose()
}

/// Write back the appeal columns, the only mutable part of a violation.
pub fn save_appeal(conn: &Connection, v: &Violation) -> Result<()> {
  conn.execute(
    "UPDATE violations
     SET appeal_status = ?2, appeal_reason = ?3, appealed_at = ?4, appeal_resolution = ?5
     WHERE violation_id = ?1",
    params![
      encode_uuid(v.violation_id),
      v.appeal_status.as_ref(),
      v.appeal_reason,
      v.appealed_at.map(encode_dt),
      v.appeal_resolution,
    ],
  )?;
  Ok(())
}

pub fn query_violations(
  conn: &Connection,
  filter_and_order: &str,
  params: impl rusqlite::Params,
) -> Result<Vec<Violation>> {
  let mut stmt =
    conn.prepare(&format!("SELECT {VIOLATION_COLUMNS} FROM violations {filter_and_order}"))?;
  let raws = stmt
    .query_map(params, RawViolation::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawViolation::into_violation).collect()
}

// ─── Audit ───────────────────────────────────────────────────────────────────

pub fn insert_action(conn: &Connection, a: &ModeratorAction) -> Result<()> {
  conn.execute(
    &format!(
      "INSERT INTO moderator_actions ({ACTION_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
    ),
    params![
      encode_uuid(a.action_id),
      encode_uuid(a.user_id),
      a.action.as_ref(),
      a.reason,
      a.days,
      encode_uuid(a.moderator_id),
      a.violation_id.map(encode_uuid),
      a.previous_status.as_ref(),
      a.resulting_status.as_ref(),
      a.strikes_after,
      encode_dt(a.created_at),
    ],
  )?;
  Ok(())
}

pub fn list_actions(conn: &Connection, user_id: Uuid) -> Result<Vec<ModeratorAction>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {ACTION_COLUMNS} FROM moderator_actions
     WHERE user_id = ?1
     ORDER BY created_at DESC, rowid DESC"
  ))?;
  let raws = stmt
    .query_map(params![encode_uuid(user_id)], RawAction::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawAction::into_action).collect()
}

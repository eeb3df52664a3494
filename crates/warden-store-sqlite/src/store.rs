//! [`SqliteStore`]: the SQLite implementation of [`ModerationStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior, named_params, params};
use uuid::Uuid;

use warden_core::{
  action::{ModeratorAction, ModeratorOverride, OverrideAction},
  ledger::{StrikeLedger, StrikePolicy},
  store::{AppealResolution, LedgerEntry, LedgerQuery, ModerationStore, ViolationOutcome},
  user::{NewUserProfile, UserProfile},
  view::ModerationStats,
  violation::{AppealDecision, AppealStatus, NewViolation, Violation, validate_resolution},
};

use crate::{
  Error, Result,
  encode::{RawLedger, RawUser, encode_dt, encode_uuid},
  schema::SCHEMA,
  sql::{self, EFFECTIVE_STATUS},
};

const DEFAULT_LIST_LIMIT: usize = 50;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Warden moderation store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
  policy:          StrikePolicy,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, policy: StrikePolicy::default() };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, policy: StrikePolicy::default() };
    store.init_schema().await?;
    Ok(store)
  }

  /// Replace the automatic-transition policy.
  pub fn with_policy(mut self, policy: StrikePolicy) -> Self {
    self.policy = policy;
    self
  }

  pub fn policy(&self) -> StrikePolicy { self.policy }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` on the database thread without a transaction.
  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    let outcome = self.conn.call(move |conn| Ok(f(conn))).await?;
    outcome
  }

  /// Run `f` inside one `IMMEDIATE` transaction. Any error rolls the whole
  /// unit back.
  async fn write<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&Transaction<'_>) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    let outcome = self
      .conn
      .call(move |conn| Ok(in_transaction(conn, f)))
      .await?;
    outcome
  }
}

fn in_transaction<T>(
  conn: &mut Connection,
  f: impl FnOnce(&Transaction<'_>) -> Result<T>,
) -> Result<T> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  let value = f(&tx)?;
  tx.commit()?;
  Ok(value)
}

// ─── ModerationStore impl ────────────────────────────────────────────────────

impl ModerationStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn upsert_user(&self, input: NewUserProfile) -> Result<UserProfile> {
    input.validate()?;
    let now = Utc::now();

    self
      .write(move |tx| {
        tx.execute(
          "INSERT INTO users (user_id, username, display_name, created_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (user_id) DO UPDATE SET
             username     = excluded.username,
             display_name = excluded.display_name",
          params![
            encode_uuid(input.user_id),
            input.username.trim(),
            input.display_name,
            encode_dt(now),
          ],
        )?;
        sql::load_user(tx, input.user_id)?
          .ok_or_else(|| warden_core::Error::UserNotFound(input.user_id).into())
      })
      .await
  }

  async fn get_user(&self, user_id: Uuid) -> Result<Option<UserProfile>> {
    self.read(move |conn| sql::load_user(conn, user_id)).await
  }

  // ── Ledgers ───────────────────────────────────────────────────────────────

  async fn get_ledger(&self, user_id: Uuid) -> Result<Option<StrikeLedger>> {
    let now = Utc::now();

    self
      .read(move |conn| {
        if sql::load_user(conn, user_id)?.is_none() {
          return Ok(None);
        }
        let ledger = sql::load_ledger(conn, user_id)?
          .unwrap_or_else(|| StrikeLedger::new(user_id, now));
        Ok(Some(ledger.as_of(now)))
      })
      .await
  }

  async fn get_or_create_ledger(&self, user_id: Uuid) -> Result<StrikeLedger> {
    let now = Utc::now();

    self
      .write(move |tx| {
        let mut ledger = sql::ledger_for_update(tx, user_id, now)?;
        ledger.expire(now);
        sql::save_ledger(tx, &ledger)?;
        Ok(ledger)
      })
      .await
  }

  async fn list_ledgers(&self, query: &LedgerQuery) -> Result<Vec<LedgerEntry>> {
    let now        = Utc::now();
    let now_str    = encode_dt(now);
    let status     = query.status.map(|s| s.as_ref().to_owned());
    let limit_val  = query.limit.unwrap_or(DEFAULT_LIST_LIMIT) as i64;
    let offset_val = query.offset.unwrap_or(0) as i64;

    self
      .read(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT
             l.user_id, l.current_strikes, l.total_violations, l.account_status,
             l.suspension_end_date, l.last_violation_date, l.updated_at,
             u.user_id, u.username, u.display_name, u.created_at
           FROM ledgers l
           JOIN users u ON u.user_id = l.user_id
           WHERE :status IS NULL OR ({EFFECTIVE_STATUS}) = :status
           ORDER BY l.current_strikes DESC, l.last_violation_date DESC, l.user_id
           LIMIT :limit OFFSET :offset"
        ))?;

        let rows = stmt
          .query_map(
            named_params! {
              ":status": status,
              ":now":    now_str,
              ":limit":  limit_val,
              ":offset": offset_val,
            },
            |row| Ok((RawLedger::from_row(row, 0)?, RawUser::from_row(row, 7)?)),
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        rows
          .into_iter()
          .map(|(ledger, user)| {
            Ok(LedgerEntry {
              user:   user.into_user()?,
              ledger: ledger.into_ledger()?.as_of(now),
            })
          })
          .collect()
      })
      .await
  }

  // ── Violations ────────────────────────────────────────────────────────────

  async fn record_violation(&self, input: NewViolation) -> Result<ViolationOutcome> {
    input.validate()?;
    let policy = self.policy;
    let now    = Utc::now();

    self
      .write(move |tx| {
        let mut ledger = sql::ledger_for_update(tx, input.user_id, now)?;
        let previous_status = ledger.account_status;
        let strike_number = ledger.apply_violation(input.suspension_days, &policy, now)?;

        let violation = input.into_violation(strike_number, now);
        sql::insert_violation(tx, &violation)?;
        sql::save_ledger(tx, &ledger)?;

        Ok(ViolationOutcome { violation, ledger, previous_status })
      })
      .await
  }

  async fn get_violation(&self, violation_id: Uuid) -> Result<Option<Violation>> {
    self
      .read(move |conn| sql::load_violation(conn, violation_id))
      .await
  }

  async fn list_violations(&self, user_id: Uuid) -> Result<Vec<Violation>> {
    self
      .read(move |conn| {
        sql::query_violations(
          conn,
          "WHERE user_id = ?1 ORDER BY created_at DESC, strike_number DESC, rowid DESC",
          params![encode_uuid(user_id)],
        )
      })
      .await
  }

  async fn set_appeal_status(
    &self,
    violation_id: Uuid,
    status: AppealStatus,
  ) -> Result<Violation> {
    self
      .write(move |tx| {
        let mut violation = sql::load_violation(tx, violation_id)?
          .ok_or(warden_core::Error::ViolationNotFound(violation_id))?;
        violation.appeal_status = status;
        sql::save_appeal(tx, &violation)?;
        Ok(violation)
      })
      .await
  }

  // ── Overrides ─────────────────────────────────────────────────────────────

  async fn apply_override(
    &self,
    user_id:      Uuid,
    request:      ModeratorOverride,
    moderator_id: Uuid,
  ) -> Result<(ModeratorAction, StrikeLedger)> {
    request.validate()?;
    let policy = self.policy;
    let now    = Utc::now();

    self
      .write(move |tx| {
        let mut ledger = sql::ledger_for_update(tx, user_id, now)?;
        let previous_status = ledger.account_status;
        ledger.apply_override(&request.action, &policy, now)?;

        let action = ModeratorAction::new(request, moderator_id, previous_status, &ledger);
        sql::insert_action(tx, &action)?;
        sql::save_ledger(tx, &ledger)?;

        Ok((action, ledger))
      })
      .await
  }

  async fn list_actions(&self, user_id: Uuid) -> Result<Vec<ModeratorAction>> {
    self.read(move |conn| sql::list_actions(conn, user_id)).await
  }

  // ── Appeals ───────────────────────────────────────────────────────────────

  async fn submit_appeal(
    &self,
    violation_id: Uuid,
    user_id:      Uuid,
    reason:       Option<String>,
  ) -> Result<Violation> {
    let now = Utc::now();

    self
      .write(move |tx| {
        let mut violation = sql::load_violation(tx, violation_id)?
          .filter(|v| v.user_id == user_id)
          .ok_or(warden_core::Error::ViolationNotFound(violation_id))?;
        violation.submit_appeal(reason, now)?;
        sql::save_appeal(tx, &violation)?;
        Ok(violation)
      })
      .await
  }

  async fn resolve_appeal(
    &self,
    violation_id: Uuid,
    decision:     AppealDecision,
    reason:       String,
    moderator_id: Uuid,
  ) -> Result<AppealResolution> {
    validate_resolution(&reason)?;
    let policy = self.policy;
    let now    = Utc::now();

    self
      .write(move |tx| {
        let mut violation = sql::load_violation(tx, violation_id)?
          .ok_or(warden_core::Error::ViolationNotFound(violation_id))?;
        violation.resolve_appeal(decision, &reason)?;

        let mut ledger = sql::ledger_for_update(tx, violation.user_id, now)?;
        let previous_status = ledger.account_status;
        let mut action = None;

        // A strike already removed by hand leaves nothing to roll back.
        if decision == AppealDecision::Approve && ledger.current_strikes > 0 {
          let rollback = ModeratorOverride::new(OverrideAction::RemoveStrike, reason);
          ledger.apply_override(&rollback.action, &policy, now)?;

          let record = ModeratorAction::new(rollback, moderator_id, previous_status, &ledger)
            .for_violation(violation_id);
          sql::insert_action(tx, &record)?;
          action = Some(record);
        } else {
          ledger.expire(now);
        }

        sql::save_ledger(tx, &ledger)?;
        sql::save_appeal(tx, &violation)?;

        Ok(AppealResolution { violation, ledger, previous_status, action })
      })
      .await
  }

  async fn list_appeals(&self, status: AppealStatus, limit: usize) -> Result<Vec<Violation>> {
    let status_str = status.as_ref().to_owned();
    let limit_val  = limit as i64;

    self
      .read(move |conn| {
        sql::query_violations(
          conn,
          "WHERE appeal_status = ?1
           ORDER BY appealed_at ASC, created_at ASC, rowid ASC
           LIMIT ?2",
          params![status_str, limit_val],
        )
      })
      .await
  }

  // ── Maintenance ───────────────────────────────────────────────────────────

  async fn expire_suspensions(&self, now: DateTime<Utc>) -> Result<Vec<StrikeLedger>> {
    self
      .write(move |tx| {
        let mut lifted = sql::expired_ledgers(tx, now)?;
        for ledger in &mut lifted {
          ledger.expire(now);
          sql::save_ledger(tx, ledger)?;
        }
        Ok(lifted)
      })
      .await
  }

  async fn stats(&self) -> Result<ModerationStats> {
    let now_str = encode_dt(Utc::now());

    self
      .read(move |conn| {
        let stats = conn.query_row(
          &format!(
            "SELECT
               (SELECT COUNT(*) FROM violations WHERE appeal_status = 'pending'),
               COALESCE(SUM(eff = 'warning'), 0),
               COALESCE(SUM(eff = 'suspended'), 0),
               COALESCE(SUM(eff = 'banned'), 0),
               COALESCE(SUM(current_strikes > 0), 0),
               COALESCE(SUM(total_violations), 0)
             FROM (
               SELECT {EFFECTIVE_STATUS} AS eff, l.current_strikes, l.total_violations
               FROM ledgers l
             )"
          ),
          named_params! { ":now": now_str },
          |row| {
            let count = |i: usize| row.get::<_, i64>(i).map(|n| n.max(0) as u64);
            Ok(ModerationStats {
              pending_appeals:    count(0)?,
              warning:            count(1)?,
              suspended:          count(2)?,
              banned:             count(3)?,
              users_with_strikes: count(4)?,
              total_violations:   count(5)?,
            })
          },
        )?;
        Ok(stats)
      })
      .await
  }
}

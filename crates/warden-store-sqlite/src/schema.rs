//! SQL schema for the Warden SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
PRAGMA busy_timeout = 5000;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    username      TEXT NOT NULL,
    display_name  TEXT,
    created_at    TEXT NOT NULL
);

-- One row per user, rewritten on every mutation.
CREATE TABLE IF NOT EXISTS ledgers (
    user_id              TEXT PRIMARY KEY REFERENCES users(user_id),
    current_strikes      INTEGER NOT NULL CHECK (current_strikes >= 0),
    total_violations     INTEGER NOT NULL CHECK (total_violations >= 0),
    account_status       TEXT NOT NULL,   -- 'active' | 'warning' | 'suspended' | 'banned'
    suspension_end_date  TEXT,            -- set iff suspended
    last_violation_date  TEXT,
    updated_at           TEXT NOT NULL,
    CHECK ((account_status = 'suspended') = (suspension_end_date IS NOT NULL))
);

-- Violations are never deleted; only the appeal columns change.
CREATE TABLE IF NOT EXISTS violations (
    violation_id       TEXT PRIMARY KEY,
    user_id            TEXT NOT NULL REFERENCES users(user_id),
    strike_number      INTEGER NOT NULL,
    violation_type     TEXT NOT NULL,
    description        TEXT NOT NULL,
    consequence        TEXT NOT NULL,
    suspension_days    INTEGER,
    moderator_id       TEXT,
    moderator_notes    TEXT,
    appeal_status      TEXT NOT NULL DEFAULT 'none',
    appeal_reason      TEXT,
    appealed_at        TEXT,
    appeal_resolution  TEXT,
    created_at         TEXT NOT NULL
);

-- Audit trail; strictly append-only.
CREATE TABLE IF NOT EXISTS moderator_actions (
    action_id         TEXT PRIMARY KEY,
    user_id           TEXT NOT NULL REFERENCES users(user_id),
    action            TEXT NOT NULL,
    reason            TEXT NOT NULL CHECK (length(trim(reason)) > 0),
    days              INTEGER,
    moderator_id      TEXT NOT NULL,
    violation_id      TEXT REFERENCES violations(violation_id),
    previous_status   TEXT NOT NULL,
    resulting_status  TEXT NOT NULL,
    strikes_after     INTEGER NOT NULL,
    created_at        TEXT NOT NULL
);

CREATE TRIGGER IF NOT EXISTS violations_no_delete
BEFORE DELETE ON violations
BEGIN
    SELECT RAISE(ABORT, 'violations are never deleted');
END;

CREATE TRIGGER IF NOT EXISTS moderator_actions_no_update
BEFORE UPDATE ON moderator_actions
BEGIN
    SELECT RAISE(ABORT, 'moderator_actions is append-only');
END;

CREATE TRIGGER IF NOT EXISTS moderator_actions_no_delete
BEFORE DELETE ON moderator_actions
BEGIN
    SELECT RAISE(ABORT, 'moderator_actions is append-only');
END;

CREATE INDEX IF NOT EXISTS violations_user_idx    ON violations(user_id, created_at);
CREATE INDEX IF NOT EXISTS violations_appeal_idx  ON violations(appeal_status, appealed_at);
CREATE INDEX IF NOT EXISTS ledgers_status_idx     ON ledgers(account_status);
CREATE INDEX IF NOT EXISTS actions_user_idx       ON moderator_actions(user_id, created_at);

PRAGMA user_version = 1;
";

//! Plain-text rendering of API responses.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use warden_core::{
  action::ModeratorAction,
  ledger::StrikeLedger,
  store::AppealResolution,
  view::{ModerationStats, StrikeDetail, StrikeSummary},
  violation::Violation,
};

fn date(dt: Option<DateTime<Utc>>) -> String {
  dt.map(|d| d.format("%Y-%m-%d %H:%M").to_string())
    .unwrap_or_else(|| "-".into())
}

fn name(username: &str, display: Option<&str>) -> String {
  match display {
    Some(d) if !d.is_empty() => format!("{d} (@{username})"),
    _ => format!("@{username}"),
  }
}

pub fn summaries(rows: &[StrikeSummary]) -> String {
  if rows.is_empty() {
    return "no ledgers\n".into();
  }
  let mut out = format!(
    "{:<36}  {:<20}  {:>7}  {:<9}  {:>5}  {:<16}\n",
    "USER ID", "USER", "STRIKES", "STATUS", "TOTAL", "LAST VIOLATION"
  );
  for r in rows {
    let _ = writeln!(
      out,
      "{:<36}  {:<20}  {:>5}/3  {:<9}  {:>5}  {:<16}",
      r.user_id,
      format!("@{}", r.user.username),
      r.current_strikes,
      r.account_status,
      r.total_violations,
      date(r.last_violation_date),
    );
  }
  out
}

pub fn ledger(l: &StrikeLedger) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "status:     {}", l.account_status);
  let _ = writeln!(out, "strikes:    {}/3 (total {})", l.current_strikes, l.total_violations);
  if let Some(end) = l.suspension_end_date {
    let _ = writeln!(out, "suspended:  until {}", date(Some(end)));
  }
  let _ = writeln!(out, "last:       {}", date(l.last_violation_date));
  out
}

fn violation_line(v: &Violation) -> String {
  let mut line = format!(
    "#{} {}  {}  {}  appeal={}",
    v.strike_number,
    date(Some(v.created_at)),
    v.violation_type,
    v.consequence,
    v.appeal_status,
  );
  let _ = write!(line, "\n    {}  [{}]", v.description, v.violation_id);
  line
}

pub fn detail(d: &StrikeDetail) -> String {
  let mut out = format!(
    "{}  {}\n",
    name(&d.user.username, d.user.display_name.as_deref()),
    d.user_id
  );
  out.push_str(&ledger(&d.strike_record));
  if d.violations.is_empty() {
    out.push_str("\nno violations\n");
  } else {
    out.push_str("\nviolations:\n");
    for v in &d.violations {
      let _ = writeln!(out, "  {}", violation_line(v));
    }
  }
  out
}

pub fn actions(trail: &[ModeratorAction]) -> String {
  if trail.is_empty() {
    return "no moderator actions\n".into();
  }
  let mut out = String::new();
  for a in trail {
    let days = a.days.map(|d| format!(" {d}d")).unwrap_or_default();
    let _ = writeln!(
      out,
      "{}  {}{}  {} → {} ({} strikes)  by {}",
      date(Some(a.created_at)),
      a.action,
      days,
      a.previous_status,
      a.resulting_status,
      a.strikes_after,
      a.moderator_id,
    );
    let _ = writeln!(out, "    {}", a.reason);
  }
  out
}

pub fn appeals(queue: &[Violation]) -> String {
  if queue.is_empty() {
    return "no pending appeals\n".into();
  }
  let mut out = String::new();
  for v in queue {
    let _ = writeln!(
      out,
      "{}  user {}  filed {}",
      v.violation_id,
      v.user_id,
      date(v.appealed_at),
    );
    let _ = writeln!(out, "    {}", violation_line(v));
    if let Some(reason) = &v.appeal_reason {
      let _ = writeln!(out, "    appeal: {reason}");
    }
  }
  out
}

pub fn resolution(r: &AppealResolution) -> String {
  let mut out = format!(
    "appeal on {} is now {}\n",
    r.violation.violation_id, r.violation.appeal_status
  );
  if r.action.is_some() {
    out.push_str("one strike rolled back\n");
  }
  out.push_str(&ledger(&r.ledger));
  out
}

pub fn stats(s: &ModerationStats) -> String {
  format!(
    "pending appeals:    {}\n\
     warning:            {}\n\
     suspended:          {}\n\
     banned:             {}\n\
     users with strikes: {}\n\
     total violations:   {}\n",
    s.pending_appeals, s.warning, s.suspended, s.banned, s.users_with_strikes, s.total_violations,
  )
}

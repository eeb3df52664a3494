//! Periodic lifting of elapsed suspensions.
//!
//! Reads already present an elapsed suspension as `active`; the sweep makes
//! that durable and announces it without waiting for the next write.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::{
  task::JoinHandle,
  time::{MissedTickBehavior, interval},
};
use warden_api::{ChangeCause, Notifier};
use warden_core::{ledger::AccountStatus, store::ModerationStore};

/// Lift every suspension that ended at or before `now`. Returns how many
/// ledgers changed.
pub async fn sweep_once<S: ModerationStore>(
  store: &S,
  notifier: &Notifier,
  now: DateTime<Utc>,
) -> Result<usize, S::Error> {
  let lifted = store.expire_suspensions(now).await?;
  for ledger in &lifted {
    tracing::info!(user_id = %ledger.user_id, "suspension expired");
    notifier.ledger_changed(AccountStatus::Suspended, ledger, false, ChangeCause::Expiry);
  }
  Ok(lifted.len())
}

/// Run [`sweep_once`] every `every` until the runtime shuts down.
pub fn spawn<S: ModerationStore + 'static>(
  store: Arc<S>,
  notifier: Notifier,
  every: Duration,
) -> JoinHandle<()> {
  tokio::spawn(async move {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
      ticker.tick().await;
      match sweep_once(store.as_ref(), &notifier, Utc::now()).await {
        Ok(0) => {}
        Ok(count) => tracing::info!(count, "expiry sweep lifted suspensions"),
        Err(e) => tracing::error!(error = %e, "expiry sweep failed"),
      }
    }
  })
}

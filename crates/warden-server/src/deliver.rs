//! Status-change delivery.
//!
//! Delivery to end users happens outside this service; here each event is
//! written to the log where a shipper can forward it.

use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};
use warden_api::Notifier;

/// Drain `notifier` for the life of the runtime.
pub fn spawn(notifier: &Notifier) -> JoinHandle<()> {
  let mut rx = notifier.subscribe();
  tokio::spawn(async move {
    loop {
      match rx.recv().await {
        Ok(change) => tracing::info!(
          target: "warden::notify",
          user_id = %change.user_id,
          previous = %change.previous,
          current = %change.current,
          cause = ?change.cause,
          suspension_end = ?change.suspension_end_date,
          "account status changed"
        ),
        Err(RecvError::Lagged(missed)) => {
          tracing::warn!(missed, "status-change delivery fell behind");
        }
        Err(RecvError::Closed) => break,
      }
    }
  })
}

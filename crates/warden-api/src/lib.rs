//! JSON REST API for Warden.
//!
//! Exposes an axum [`Router`] backed by any [`warden_core::store::ModerationStore`].
//! Authentication is the caller's responsibility: a middleware in front of
//! this router must insert an [`Actor`] into the request extensions. Handlers
//! enforce roles themselves.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", warden_api::api_router(store.clone(), notifier.clone()))
//! ```

pub mod appeals;
pub mod error;
pub mod extract;
pub mod notify;
pub mod stats;
pub mod strikes;
pub mod users;
pub mod violations;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use warden_core::store::ModerationStore;

pub use error::ApiError;
pub use extract::{Actor, Admin, Moderator};
pub use notify::{ChangeCause, Notifier, StatusChange};

/// Page size used when a listing request gives no `limit`.
pub const DEFAULT_LIMIT: usize = 50;

/// Largest `limit` a listing request may ask for.
pub const MAX_LIMIT: usize = 500;

/// Shared handler state.
pub struct ApiState<S> {
  pub store:    Arc<S>,
  pub notifier: Notifier,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), notifier: self.notifier.clone() }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, notifier: Notifier) -> Router<()>
where
  S: ModerationStore + 'static,
{
  Router::new()
    // Strike ledgers
    .route("/moderation/strikes", get(strikes::list::<S>))
    .route("/moderation/strikes/{user_id}", get(strikes::detail::<S>))
    .route("/moderation/strikes/{user_id}/actions", get(strikes::actions::<S>))
    .route("/moderation/strikes/{user_id}/{action}", post(strikes::apply::<S>))
    // Violations
    .route("/moderation/violations", post(violations::create::<S>))
    .route("/moderation/violations/{id}", get(violations::get_one::<S>))
    .route("/moderation/violations/{id}/appeal", post(violations::appeal::<S>))
    // Appeals
    .route("/moderation/appeals", get(appeals::list::<S>))
    .route("/moderation/appeals/{id}/decide", post(appeals::decide::<S>))
    // Stats
    .route("/moderation/stats", get(stats::handler::<S>))
    // Self-service
    .route("/me/strikes", get(strikes::mine::<S>))
    // User registry
    .route("/users/{user_id}", get(users::get_one::<S>).put(users::upsert::<S>))
    .with_state(ApiState { store, notifier })
}

/// Resolve a requested page size against the defaults.
pub(crate) fn clamp_limit(limit: Option<usize>) -> usize {
  limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

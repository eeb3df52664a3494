//! Handlers for the appeal queue.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/moderation/appeals` | `?status` (default `pending`), `limit`; oldest appeal first |
//! | `POST` | `/moderation/appeals/{id}/decide` | Body: [`DecideBody`] |

use axum::{Json, extract::State};
use serde::Deserialize;
use uuid::Uuid;
use warden_core::{
  store::{AppealResolution, ModerationStore},
  violation::{AppealDecision, AppealStatus, Violation},
};

use crate::{
  ApiState, ChangeCause, clamp_limit,
  error::ApiError,
  extract::{JsonBody, Moderator, PathParams, QueryParams},
};

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub status: Option<AppealStatus>,
  pub limit:  Option<usize>,
}

/// `GET /moderation/appeals[?status=pending][&limit=...]`
pub async fn list<S: ModerationStore>(
  _: Moderator,
  State(state): State<ApiState<S>>,
  QueryParams(params): QueryParams<ListParams>,
) -> Result<Json<Vec<Violation>>, ApiError> {
  let appeals = state
    .store
    .list_appeals(
      params.status.unwrap_or(AppealStatus::Pending),
      clamp_limit(params.limit),
    )
    .await
    .map_err(ApiError::store)?;
  Ok(Json(appeals))
}

#[derive(Debug, Deserialize)]
pub struct DecideBody {
  pub decision: AppealDecision,
  #[serde(default)]
  pub reason:   String,
}

/// `POST /moderation/appeals/{id}/decide`
///
/// Approval rolls back one strike; the response carries the implied
/// `remove-strike` audit record when that happened.
pub async fn decide<S: ModerationStore>(
  Moderator(actor): Moderator,
  State(state): State<ApiState<S>>,
  PathParams(id): PathParams<Uuid>,
  JsonBody(body): JsonBody<DecideBody>,
) -> Result<Json<AppealResolution>, ApiError> {
  let resolution = state
    .store
    .resolve_appeal(id, body.decision, body.reason, actor.user_id)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(
    violation_id = %id,
    user_id = %resolution.violation.user_id,
    moderator = %actor.username,
    decision = %body.decision,
    status = %resolution.ledger.account_status,
    "appeal decided"
  );
  state.notifier.ledger_changed(
    resolution.previous_status,
    &resolution.ledger,
    false,
    ChangeCause::Appeal,
  );

  Ok(Json(resolution))
}

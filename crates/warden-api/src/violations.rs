//! Handlers for `/moderation/violations` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/moderation/violations` | Body: [`NewViolationBody`]; returns 201 + `{violation, strikeRecord}` |
//! | `GET`  | `/moderation/violations/{id}` | Single violation |
//! | `POST` | `/moderation/violations/{id}/appeal` | Body: `{"reason":"..."}` (optional); owner only |

use axum::{
  Json,
  body::Bytes,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;
use warden_core::{
  store::ModerationStore,
  violation::{Consequence, NewViolation, Violation},
};

use crate::{
  ApiState, ChangeCause,
  error::ApiError,
  extract::{Actor, JsonBody, Moderator, PathParams},
};

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /moderation/violations`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewViolationBody {
  pub user_id:         Uuid,
  #[serde(default)]
  pub violation_type:  String,
  #[serde(default)]
  pub description:     String,
  pub consequence:     Consequence,
  pub suspension_days: Option<i64>,
  pub moderator_notes: Option<String>,
}

impl NewViolationBody {
  fn into_new(self, moderator_id: Uuid) -> Result<NewViolation, ApiError> {
    let suspension_days = self
      .suspension_days
      .map(|d| {
        u32::try_from(d).map_err(|_| ApiError::validation("suspensionDays", "must be positive"))
      })
      .transpose()?;

    Ok(NewViolation {
      user_id: self.user_id,
      violation_type: self.violation_type,
      description: self.description,
      consequence: self.consequence,
      suspension_days,
      moderator_id: Some(moderator_id),
      moderator_notes: self.moderator_notes,
    })
  }
}

/// `POST /moderation/violations`: returns 201 + the violation and the
/// updated ledger.
pub async fn create<S: ModerationStore>(
  Moderator(actor): Moderator,
  State(state): State<ApiState<S>>,
  JsonBody(body): JsonBody<NewViolationBody>,
) -> Result<impl IntoResponse, ApiError> {
  let input = body.into_new(actor.user_id)?;
  let outcome = state
    .store
    .record_violation(input)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(
    user_id = %outcome.violation.user_id,
    violation_id = %outcome.violation.violation_id,
    strike = outcome.violation.strike_number,
    status = %outcome.ledger.account_status,
    "violation recorded"
  );
  state.notifier.ledger_changed(
    outcome.previous_status,
    &outcome.ledger,
    false,
    ChangeCause::Violation,
  );

  Ok((StatusCode::CREATED, Json(outcome)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /moderation/violations/{id}`
pub async fn get_one<S: ModerationStore>(
  _: Moderator,
  State(state): State<ApiState<S>>,
  PathParams(id): PathParams<Uuid>,
) -> Result<Json<Violation>, ApiError> {
  let violation = state
    .store
    .get_violation(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("violation {id} not found")))?;
  Ok(Json(violation))
}

// ─── Appeal ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct AppealBody {
  pub reason: Option<String>,
}

/// `POST /moderation/violations/{id}/appeal`: the caller must own the
/// violation. The body is optional.
pub async fn appeal<S: ModerationStore>(
  actor: Actor,
  State(state): State<ApiState<S>>,
  PathParams(id): PathParams<Uuid>,
  raw: Bytes,
) -> Result<Json<Violation>, ApiError> {
  let body: AppealBody = if raw.iter().all(u8::is_ascii_whitespace) {
    AppealBody::default()
  } else {
    serde_json::from_slice(&raw).map_err(|e| ApiError::validation("body", e.to_string()))?
  };

  let violation = state
    .store
    .submit_appeal(id, actor.user_id, body.reason)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(user_id = %actor.user_id, violation_id = %id, "appeal submitted");
  Ok(Json(violation))
}

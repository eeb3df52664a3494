//! Handlers for strike ledger endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/moderation/strikes` | `?status`, `limit`, `offset`; summaries, most strikes first |
//! | `GET`  | `/moderation/strikes/{user_id}` | Ledger plus violations |
//! | `GET`  | `/moderation/strikes/{user_id}/actions` | Audit trail, newest first |
//! | `POST` | `/moderation/strikes/{user_id}/{action}` | Body: [`OverrideBody`]; returns the updated ledger |
//! | `GET`  | `/me/strikes` | The caller's own ledger plus violations |

use axum::{Json, extract::State};
use serde::Deserialize;
use uuid::Uuid;
use warden_core::{
  action::{ActionKind, ModeratorAction, ModeratorOverride, OverrideAction},
  ledger::{AccountStatus, StrikeLedger},
  store::{LedgerQuery, ModerationStore},
  view::{StrikeDetail, StrikeSummary},
};

use crate::{
  ApiState, ChangeCause, clamp_limit,
  error::ApiError,
  extract::{Actor, JsonBody, Moderator, PathParams, QueryParams},
};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  /// `all` (or absent) for every ledger, otherwise an account status.
  pub status: Option<String>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

fn parse_status(status: Option<&str>) -> Result<Option<AccountStatus>, ApiError> {
  match status.map(str::trim) {
    None | Some("") | Some("all") => Ok(None),
    Some(s) => s
      .parse::<AccountStatus>()
      .map(Some)
      .map_err(|_| ApiError::validation("status", format!("unknown status {s:?}"))),
  }
}

/// `GET /moderation/strikes[?status=...][&limit=...][&offset=...]`
pub async fn list<S: ModerationStore>(
  _: Moderator,
  State(state): State<ApiState<S>>,
  QueryParams(params): QueryParams<ListParams>,
) -> Result<Json<Vec<StrikeSummary>>, ApiError> {
  let query = LedgerQuery {
    status: parse_status(params.status.as_deref())?,
    limit:  Some(clamp_limit(params.limit)),
    offset: params.offset,
  };

  let entries = state
    .store
    .list_ledgers(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(
    entries
      .into_iter()
      .map(|e| StrikeSummary::new(e.user, e.ledger))
      .collect(),
  ))
}

// ─── Detail ───────────────────────────────────────────────────────────────────

async fn load_detail<S: ModerationStore>(store: &S, user_id: Uuid) -> Result<StrikeDetail, ApiError> {
  let user = store
    .get_user(user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {user_id} not found")))?;
  let strike_record = store
    .get_ledger(user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {user_id} not found")))?;
  let violations = store
    .list_violations(user_id)
    .await
    .map_err(ApiError::store)?;

  Ok(StrikeDetail { user_id, user, strike_record, violations })
}

/// `GET /moderation/strikes/{user_id}`
pub async fn detail<S: ModerationStore>(
  _: Moderator,
  State(state): State<ApiState<S>>,
  PathParams(user_id): PathParams<Uuid>,
) -> Result<Json<StrikeDetail>, ApiError> {
  Ok(Json(load_detail(state.store.as_ref(), user_id).await?))
}

/// `GET /me/strikes`
pub async fn mine<S: ModerationStore>(
  actor: Actor,
  State(state): State<ApiState<S>>,
) -> Result<Json<StrikeDetail>, ApiError> {
  Ok(Json(load_detail(state.store.as_ref(), actor.user_id).await?))
}

/// `GET /moderation/strikes/{user_id}/actions`
pub async fn actions<S: ModerationStore>(
  _: Moderator,
  State(state): State<ApiState<S>>,
  PathParams(user_id): PathParams<Uuid>,
) -> Result<Json<Vec<ModeratorAction>>, ApiError> {
  require_user(state.store.as_ref(), user_id).await?;
  let trail = state
    .store
    .list_actions(user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(trail))
}

async fn require_user<S: ModerationStore>(store: &S, user_id: Uuid) -> Result<(), ApiError> {
  store
    .get_user(user_id)
    .await
    .map_err(ApiError::store)?
    .map(|_| ())
    .ok_or_else(|| ApiError::NotFound(format!("user {user_id} not found")))
}

// ─── Override ─────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /moderation/strikes/{user_id}/{action}`.
#[derive(Debug, Deserialize)]
pub struct OverrideBody {
  #[serde(default)]
  pub reason: String,
  /// Required for `extend`, ignored otherwise.
  pub days:   Option<i64>,
}

/// `POST /moderation/strikes/{user_id}/{action}`
pub async fn apply<S: ModerationStore>(
  Moderator(actor): Moderator,
  State(state): State<ApiState<S>>,
  PathParams((user_id, action)): PathParams<(Uuid, String)>,
  JsonBody(body): JsonBody<OverrideBody>,
) -> Result<Json<StrikeLedger>, ApiError> {
  let kind = action
    .parse::<ActionKind>()
    .map_err(|_| ApiError::validation("action", format!("unknown action {action:?}")))?;
  let action = OverrideAction::from_parts(kind, body.days).map_err(ApiError::store)?;

  let (record, ledger) = state
    .store
    .apply_override(user_id, ModeratorOverride::new(action, body.reason), actor.user_id)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(
    %user_id,
    moderator = %actor.username,
    action = %record.action,
    status = %ledger.account_status,
    strikes = ledger.current_strikes,
    "override applied"
  );
  state.notifier.ledger_changed(
    record.previous_status,
    &ledger,
    kind == ActionKind::Extend,
    ChangeCause::Override,
  );

  Ok(Json(ledger))
}

//! Handler for `GET /moderation/stats`.

use axum::{Json, extract::State};
use warden_core::{store::ModerationStore, view::ModerationStats};

use crate::{ApiState, error::ApiError, extract::Moderator};

/// `GET /moderation/stats`
pub async fn handler<S: ModerationStore>(
  _: Moderator,
  State(state): State<ApiState<S>>,
) -> Result<Json<ModerationStats>, ApiError> {
  let stats = state.store.stats().await.map_err(ApiError::store)?;
  Ok(Json(stats))
}

//! Handlers for the `/users` registry.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/users/{user_id}` | Moderator; single profile |
//! | `PUT`  | `/users/{user_id}` | Admin; body `{"username", "displayName"?}`, upsert |

use axum::{Json, extract::State};
use serde::Deserialize;
use uuid::Uuid;
use warden_core::{
  store::ModerationStore,
  user::{NewUserProfile, UserProfile},
};

use crate::{
  ApiState,
  error::ApiError,
  extract::{Admin, JsonBody, Moderator, PathParams},
};

/// `GET /users/{user_id}`
pub async fn get_one<S: ModerationStore>(
  _: Moderator,
  State(state): State<ApiState<S>>,
  PathParams(user_id): PathParams<Uuid>,
) -> Result<Json<UserProfile>, ApiError> {
  let user = state
    .store
    .get_user(user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {user_id} not found")))?;
  Ok(Json(user))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBody {
  #[serde(default)]
  pub username:     String,
  pub display_name: Option<String>,
}

/// `PUT /users/{user_id}`
pub async fn upsert<S: ModerationStore>(
  Admin(actor): Admin,
  State(state): State<ApiState<S>>,
  PathParams(user_id): PathParams<Uuid>,
  JsonBody(body): JsonBody<UserBody>,
) -> Result<Json<UserProfile>, ApiError> {
  let user = state
    .store
    .upsert_user(NewUserProfile {
      user_id,
      username: body.username,
      display_name: body.display_name,
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(%user_id, admin = %actor.username, "user profile saved");
  Ok(Json(user))
}

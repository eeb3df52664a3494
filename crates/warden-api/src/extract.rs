//! Request extractors.
//!
//! The authentication layer in front of the router places an [`Actor`] in
//! the request extensions. [`Moderator`] and [`Admin`] additionally check the
//! actor's role and reject with `403`. [`JsonBody`], [`PathParams`] and
//! [`QueryParams`] wrap the axum extractors so malformed input renders as an
//! [`ApiError`] like every other failure.

use axum::{
  extract::{FromRequest, FromRequestParts},
  http::request::Parts,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_core::user::Role;

use crate::error::ApiError;

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
  pub user_id:  Uuid,
  pub username: String,
  pub role:     Role,
}

impl<S: Send + Sync> FromRequestParts<S> for Actor {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<Actor>()
      .cloned()
      .ok_or(ApiError::Unauthorized)
  }
}

/// An actor with moderation rights (moderator or admin).
#[derive(Debug, Clone)]
pub struct Moderator(pub Actor);

impl<S: Send + Sync> FromRequestParts<S> for Moderator {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    let actor = Actor::from_request_parts(parts, state).await?;
    if !actor.role.can_moderate() {
      return Err(ApiError::Forbidden("moderator role required".into()));
    }
    Ok(Moderator(actor))
  }
}

#[derive(Debug, Clone)]
pub struct Admin(pub Actor);

impl<S: Send + Sync> FromRequestParts<S> for Admin {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    let actor = Actor::from_request_parts(parts, state).await?;
    if actor.role != Role::Admin {
      return Err(ApiError::Forbidden("admin role required".into()));
    }
    Ok(Admin(actor))
  }
}

// ─── Input ───────────────────────────────────────────────────────────────────

/// A JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Typed path segments.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParams<T>(pub T);

/// Typed query string.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

//! HTTP Basic-auth middleware and standalone verifier.
//!
//! A successful check places a [`warden_api::Actor`] in the request
//! extensions, where the API's role extractors pick it up.

use std::{collections::HashMap, sync::Arc};

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::{Request, State},
  http::{HeaderMap, header},
  middleware::Next,
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use warden_api::{Actor, ApiError};

use crate::AccountConfig;

/// The configured logins, keyed by username.
#[derive(Debug, Default)]
pub struct Accounts {
  by_username: HashMap<String, AccountConfig>,
}

impl Accounts {
  pub fn new(accounts: Vec<AccountConfig>) -> Self {
    Self {
      by_username: accounts
        .into_iter()
        .map(|a| (a.username.clone(), a))
        .collect(),
    }
  }

  pub fn len(&self) -> usize { self.by_username.len() }

  pub fn is_empty(&self) -> bool { self.by_username.is_empty() }
}

/// Verify Basic credentials in `headers` against `accounts`.
pub fn verify_auth(headers: &HeaderMap, accounts: &Accounts) -> Result<Actor, ApiError> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;

  let account = accounts
    .by_username
    .get(username)
    .ok_or(ApiError::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&account.password_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Ok(Actor {
    user_id:  account.user_id,
    username: account.username.clone(),
    role:     account.role,
  })
}

/// Middleware: reject unauthenticated requests with `401`, otherwise attach
/// the caller's [`Actor`].
pub async fn require_auth(
  State(accounts): State<Arc<Accounts>>,
  mut req: Request,
  next: Next,
) -> Result<Response, ApiError> {
  let actor = verify_auth(req.headers(), &accounts)?;
  tracing::debug!(user = %actor.username, role = %actor.role, "authenticated");
  req.extensions_mut().insert(actor);
  Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
  use super::*;
  use argon2::{PasswordHasher, password_hash::SaltString};
  use axum::http::HeaderValue;
  use rand_core::OsRng;
  use uuid::Uuid;
  use warden_core::user::Role;

  fn accounts(password: &str) -> Accounts {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();

    Accounts::new(vec![AccountConfig {
      username:      "mod".to_string(),
      password_hash: hash,
      user_id:       Uuid::nil(),
      role:          Role::Moderator,
    }])
  }

  fn headers(value: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    h
  }

  fn basic(user: &str, pass: &str) -> String {
    let encoded = B64.encode(format!("{user}:{pass}"));
    format!("Basic {encoded}")
  }

  #[test]
  fn correct_credentials() {
    let accounts = accounts("secret");
    let actor = verify_auth(&headers(&basic("mod", "secret")), &accounts).unwrap();
    assert_eq!(actor.username, "mod");
    assert_eq!(actor.role, Role::Moderator);
    assert_eq!(actor.user_id, Uuid::nil());
  }

  #[test]
  fn wrong_password() {
    let accounts = accounts("secret");
    assert!(matches!(
      verify_auth(&headers(&basic("mod", "wrong")), &accounts),
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn unknown_user() {
    let accounts = accounts("secret");
    assert!(matches!(
      verify_auth(&headers(&basic("root", "secret")), &accounts),
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn missing_header() {
    let accounts = accounts("secret");
    assert!(matches!(
      verify_auth(&HeaderMap::new(), &accounts),
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn invalid_base64() {
    let accounts = accounts("secret");
    assert!(matches!(
      verify_auth(&headers("Basic !!!not-base64!!!"), &accounts),
      Err(ApiError::Unauthorized)
    ));
  }
}

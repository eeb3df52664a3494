//! HTTP front end for Warden.
//!
//! Wires the JSON API from `warden-api` behind HTTP Basic authentication,
//! and hosts the background tasks: the suspension-expiry sweep and the
//! status-change delivery loop.

pub mod auth;
pub mod deliver;
pub mod sweep;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware, routing::get};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use uuid::Uuid;
use warden_api::Notifier;
use warden_core::{ledger::StrikePolicy, store::ModerationStore, user::Role};

use auth::Accounts;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `WARDEN_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  pub store_path:          PathBuf,
  /// Suspension length applied when a transition lands on `suspended`
  /// without an explicit length.
  #[serde(default = "default_suspension_days")]
  pub suspension_days:     u32,
  #[serde(default = "default_sweep_interval")]
  pub sweep_interval_secs: u64,
  #[serde(default)]
  pub accounts:            Vec<AccountConfig>,
}

/// A login permitted to call the API.
#[derive(Debug, Deserialize, Clone)]
pub struct AccountConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  pub user_id:       Uuid,
  pub role:          Role,
}

impl ServerConfig {
  /// The strike policy this config describes, rejecting a
  /// `suspension_days` outside `1..=365`.
  pub fn strike_policy(&self) -> warden_core::Result<StrikePolicy> {
    let policy = StrikePolicy { suspension_days: self.suspension_days };
    policy.validate()?;
    Ok(policy)
  }
}

fn default_host() -> String { "127.0.0.1".into() }

fn default_port() -> u16 { 8080 }

fn default_suspension_days() -> u32 { 7 }

fn default_sweep_interval() -> u64 { 300 }

// ─── Application state ────────────────────────────────────────────────────────

/// Everything the router needs.
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub notifier: Notifier,
  pub accounts: Arc<Accounts>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      notifier: self.notifier.clone(),
      accounts: Arc::clone(&self.accounts),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full HTTP router: `/api/*` behind Basic auth, plus an
/// unauthenticated `/healthz`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ModerationStore + 'static,
{
  let api = warden_api::api_router(state.store, state.notifier).layer(
    middleware::from_fn_with_state(state.accounts, auth::require_auth),
  );

  Router::new()
    .route("/healthz", get(|| async { "ok" }))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use rand_core::OsRng;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use warden_core::{ledger::AccountStatus, user::NewUserProfile};
  use warden_store_sqlite::SqliteStore;

  const PASSWORD: &str = "secret";

  struct Harness {
    state:     AppState<SqliteStore>,
    moderator: Uuid,
    member:    Uuid,
  }

  fn hash(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string()
  }

  async fn harness() -> Harness {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let moderator = Uuid::new_v4();
    let member = Uuid::new_v4();
    let admin = Uuid::new_v4();
    let password_hash = hash(PASSWORD);

    for (id, name) in [(moderator, "mod"), (member, "member"), (admin, "admin")] {
      store
        .upsert_user(NewUserProfile {
          user_id:      id,
          username:     name.into(),
          display_name: None,
        })
        .await
        .unwrap();
    }

    let account = |username: &str, user_id, role| AccountConfig {
      username: username.into(),
      password_hash: password_hash.clone(),
      user_id,
      role,
    };
    let accounts = Accounts::new(vec![
      account("mod", moderator, Role::Moderator),
      account("member", member, Role::User),
      account("admin", admin, Role::Admin),
    ]);

    Harness {
      state: AppState {
        store:    Arc::new(store),
        notifier: Notifier::default(),
        accounts: Arc::new(accounts),
      },
      moderator,
      member,
    }
  }

  fn auth_header(user: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{PASSWORD}")))
  }

  async fn call(
    state: &AppState<SqliteStore>,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
      builder = builder.header(header::AUTHORIZATION, auth_header(user));
    }
    let req = match body {
      Some(body) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };

    let resp = router(state.clone()).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
  }

  async fn flag(state: &AppState<SqliteStore>, user_id: Uuid) -> Value {
    let (status, body) = call(
      state,
      "POST",
      "/api/moderation/violations",
      Some("mod"),
      Some(json!({
        "userId": user_id,
        "violationType": "harassment",
        "description": "abusive replies",
        "consequence": "warning",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
  }

  // ── Config ──────────────────────────────────────────────────────────────────

  fn config_from(toml: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn suspension_days_are_range_checked() {
    let cfg = config_from("store_path = \"warden.db\"");
    assert_eq!(cfg.strike_policy().unwrap().suspension_days, 7);

    for days in ["0", "366", "4294967295"] {
      let cfg = config_from(&format!("store_path = \"warden.db\"\nsuspension_days = {days}"));
      assert!(cfg.strike_policy().is_err(), "{days} accepted");
    }
  }

  // ── Auth ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn healthz_needs_no_auth() {
    let h = harness().await;
    let resp = router(h.state.clone())
      .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn missing_credentials_is_401() {
    let h = harness().await;
    let (status, body) = call(&h.state, "GET", "/api/moderation/stats", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
  }

  #[tokio::test]
  async fn member_cannot_moderate() {
    let h = harness().await;
    let (status, _) = call(&h.state, "GET", "/api/moderation/strikes", Some("member"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let uri = format!("/api/moderation/strikes/{}/ban", h.member);
    let (status, _) =
      call(&h.state, "POST", &uri, Some("member"), Some(json!({ "reason": "x" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
  }

  // ── Strikes ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn violation_then_listing() {
    let h = harness().await;
    let body = flag(&h.state, h.member).await;
    assert_eq!(body["violation"]["strikeNumber"], 1);
    assert_eq!(body["strikeRecord"]["accountStatus"], "warning");

    let (status, list) =
      call(&h.state, "GET", "/api/moderation/strikes?status=warning", Some("mod"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["userId"], h.member.to_string());
    assert_eq!(list[0]["user"]["username"], "member");
    assert_eq!(list[0]["currentStrikes"], 1);

    let (status, _) =
      call(&h.state, "GET", "/api/moderation/strikes?status=bogus", Some("mod"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn detail_includes_violations() {
    let h = harness().await;
    flag(&h.state, h.member).await;
    flag(&h.state, h.member).await;

    let uri = format!("/api/moderation/strikes/{}", h.member);
    let (status, detail) = call(&h.state, "GET", &uri, Some("mod"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["strikeRecord"]["accountStatus"], "suspended");
    assert!(detail["strikeRecord"]["suspensionEndDate"].is_string());
    assert_eq!(detail["violations"].as_array().unwrap().len(), 2);
    assert_eq!(detail["violations"][0]["strikeNumber"], 2);
  }

  #[tokio::test]
  async fn unknown_user_is_404() {
    let h = harness().await;
    let uri = format!("/api/moderation/strikes/{}", Uuid::new_v4());
    let (status, _) = call(&h.state, "GET", &uri, Some("mod"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn blank_reason_is_rejected_with_field() {
    let h = harness().await;
    let uri = format!("/api/moderation/strikes/{}/add-strike", h.member);
    let (status, body) =
      call(&h.state, "POST", &uri, Some("mod"), Some(json!({ "reason": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "reason");

    let (_, detail) = call(
      &h.state,
      "GET",
      &format!("/api/moderation/strikes/{}", h.member),
      Some("mod"),
      None,
    )
    .await;
    assert_eq!(detail["strikeRecord"]["currentStrikes"], 0);
  }

  #[tokio::test]
  async fn extend_on_warning_conflicts() {
    let h = harness().await;
    flag(&h.state, h.member).await;

    let uri = format!("/api/moderation/strikes/{}/extend", h.member);
    let (status, body) = call(
      &h.state,
      "POST",
      &uri,
      Some("mod"),
      Some(json!({ "reason": "x", "days": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("suspended"));
  }

  #[tokio::test]
  async fn extend_without_days_is_bad_request() {
    let h = harness().await;
    let uri = format!("/api/moderation/strikes/{}/extend", h.member);
    let (status, body) =
      call(&h.state, "POST", &uri, Some("mod"), Some(json!({ "reason": "x" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "days");
  }

  #[tokio::test]
  async fn unknown_action_is_bad_request() {
    let h = harness().await;
    let uri = format!("/api/moderation/strikes/{}/obliterate", h.member);
    let (status, body) =
      call(&h.state, "POST", &uri, Some("mod"), Some(json!({ "reason": "x" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "action");
  }

  #[tokio::test]
  async fn ban_unban_and_audit_trail() {
    let h = harness().await;
    let mut events = h.state.notifier.subscribe();

    let ban = format!("/api/moderation/strikes/{}/ban", h.member);
    let (status, ledger) = call(
      &h.state,
      "POST",
      &ban,
      Some("mod"),
      Some(json!({ "reason": "severe TOS violation" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ledger["accountStatus"], "banned");
    assert_eq!(ledger["currentStrikes"], 0);

    let change = events.recv().await.unwrap();
    assert_eq!(change.user_id, h.member);
    assert_eq!(change.current, AccountStatus::Banned);

    let unban = format!("/api/moderation/strikes/{}/unban", h.member);
    let (_, ledger) = call(
      &h.state,
      "POST",
      &unban,
      Some("mod"),
      Some(json!({ "reason": "appeal upheld externally" })),
    )
    .await;
    assert_eq!(ledger["accountStatus"], "active");
    assert!(ledger["suspensionEndDate"].is_null());

    let uri = format!("/api/moderation/strikes/{}/actions", h.member);
    let (status, trail) = call(&h.state, "GET", &uri, Some("mod"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(trail[0]["action"], "unban");
    assert_eq!(trail[1]["action"], "ban");
    assert_eq!(trail[1]["moderatorId"], h.moderator.to_string());
    assert_eq!(trail[1]["resultingStatus"], "banned");
  }

  // ── Malformed input ─────────────────────────────────────────────────────────

  async fn call_raw(state: &AppState<SqliteStore>, uri: &str, body: &str) -> (StatusCode, Value) {
    let req = Request::builder()
      .method("POST")
      .uri(uri)
      .header(header::AUTHORIZATION, auth_header("mod"))
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_owned()))
      .unwrap();
    let resp = router(state.clone()).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
  }

  #[tokio::test]
  async fn malformed_json_is_a_json_error() {
    let h = harness().await;
    let uri = format!("/api/moderation/strikes/{}/ban", h.member);
    let (status, body) = call_raw(&h.state, &uri, "{\"reason\": ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "body");
    assert!(body["error"].is_string());
  }

  #[tokio::test]
  async fn bad_uuid_in_path_is_a_json_error() {
    let h = harness().await;
    let (status, body) =
      call(&h.state, "GET", "/api/moderation/strikes/not-a-uuid", Some("mod"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "path");
  }

  #[tokio::test]
  async fn unknown_decision_is_a_json_error() {
    let h = harness().await;
    let second = flag(&h.state, h.member).await;
    let vid = second["violation"]["violationId"].as_str().unwrap().to_owned();
    let uri = format!("/api/moderation/appeals/{vid}/decide");
    let (status, body) =
      call_raw(&h.state, &uri, r#"{"decision": "maybe", "reason": "x"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "body");
  }

  #[tokio::test]
  async fn bad_status_query_is_a_json_error() {
    let h = harness().await;
    let (status, body) =
      call(&h.state, "GET", "/api/moderation/appeals?status=lost", Some("mod"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "query");
  }

  #[tokio::test]
  async fn appeal_without_body_is_accepted() {
    let h = harness().await;
    let flagged = flag(&h.state, h.member).await;
    let vid = flagged["violation"]["violationId"].as_str().unwrap().to_owned();
    let uri = format!("/api/moderation/violations/{vid}/appeal");
    let (status, v) = call(&h.state, "POST", &uri, Some("member"), None).await;
    assert_eq!(status, StatusCode::OK, "{v}");
    assert_eq!(v["appealStatus"], "pending");
    assert!(v["appealReason"].is_null());
  }

  #[tokio::test]
  async fn unban_lifts_a_suspension_over_http() {
    let h = harness().await;
    flag(&h.state, h.member).await;
    flag(&h.state, h.member).await;
    let mut changes = h.state.notifier.subscribe();

    let uri = format!("/api/moderation/strikes/{}/unban", h.member);
    let (status, ledger) =
      call(&h.state, "POST", &uri, Some("mod"), Some(json!({ "reason": "lift it" }))).await;
    assert_eq!(status, StatusCode::OK, "{ledger}");
    assert_eq!(ledger["accountStatus"], "active");
    assert!(ledger["suspensionEndDate"].is_null());
    assert_eq!(ledger["currentStrikes"], 2);

    let change = changes.try_recv().unwrap();
    assert_eq!(change.previous, AccountStatus::Suspended);
    assert_eq!(change.current, AccountStatus::Active);
  }

  // ── Appeals ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn appeal_round_trip() {
    let h = harness().await;
    flag(&h.state, h.member).await;
    let second = flag(&h.state, h.member).await;
    let vid = second["violation"]["violationId"].as_str().unwrap().to_owned();

    // Only the owner may appeal.
    let appeal = format!("/api/moderation/violations/{vid}/appeal");
    let (status, _) = call(&h.state, "POST", &appeal, Some("mod"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, v) = call(
      &h.state,
      "POST",
      &appeal,
      Some("member"),
      Some(json!({ "reason": "not me" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["appealStatus"], "pending");

    let (status, _) = call(&h.state, "POST", &appeal, Some("member"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, queue) = call(&h.state, "GET", "/api/moderation/appeals", Some("mod"), None).await;
    assert_eq!(queue.as_array().unwrap().len(), 1);

    let decide = format!("/api/moderation/appeals/{vid}/decide");
    let (status, res) = call(
      &h.state,
      "POST",
      &decide,
      Some("mod"),
      Some(json!({ "decision": "approve", "reason": "mistaken flag" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["violation"]["appealStatus"], "approved");
    assert_eq!(res["strikeRecord"]["currentStrikes"], 1);
    assert_eq!(res["strikeRecord"]["accountStatus"], "warning");
    assert_eq!(res["action"]["action"], "remove-strike");

    let (status, _) = call(
      &h.state,
      "POST",
      &decide,
      Some("mod"),
      Some(json!({ "decision": "reject", "reason": "again" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn member_sees_own_strikes() {
    let h = harness().await;
    flag(&h.state, h.member).await;

    let (status, mine) = call(&h.state, "GET", "/api/me/strikes", Some("member"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["userId"], h.member.to_string());
    assert_eq!(mine["strikeRecord"]["currentStrikes"], 1);
  }

  // ── Stats & users ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn stats_reflect_ledgers() {
    let h = harness().await;
    flag(&h.state, h.member).await;

    let (status, stats) = call(&h.state, "GET", "/api/moderation/stats", Some("mod"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["warning"], 1);
    assert_eq!(stats["usersWithStrikes"], 1);
    assert_eq!(stats["pendingAppeals"], 0);
  }

  #[tokio::test]
  async fn only_admin_registers_users() {
    let h = harness().await;
    let id = Uuid::new_v4();
    let uri = format!("/api/users/{id}");
    let body = json!({ "username": "newbie", "displayName": "New Bie" });

    let (status, _) = call(&h.state, "PUT", &uri, Some("mod"), Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, user) = call(&h.state, "PUT", &uri, Some("admin"), Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["displayName"], "New Bie");

    let (status, user) = call(&h.state, "GET", &uri, Some("mod"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["username"], "newbie");
  }
}

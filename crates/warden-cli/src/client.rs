//! Async HTTP client wrapping the warden JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;
use warden_core::{
  action::{ActionKind, ModeratorAction},
  ledger::StrikeLedger,
  store::AppealResolution,
  view::{ModerationStats, StrikeDetail, StrikeSummary},
  violation::{AppealDecision, Violation},
};

/// Connection settings for the warden API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

/// Async HTTP client for the warden JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }

  /// Send `req` and decode a 2xx JSON body; anything else becomes an error
  /// carrying the server's message.
  async fn send<T: DeserializeOwned>(&self, what: &str, req: RequestBuilder) -> Result<T> {
    tracing::debug!(request = what, "sending");
    let resp = self
      .auth(req)
      .send()
      .await
      .with_context(|| format!("{what} failed"))?;
    if !resp.status().is_success() {
      return Err(server_error(what, resp).await);
    }
    resp
      .json()
      .await
      .with_context(|| format!("deserialising {what} response"))
  }

  // ── Strikes ───────────────────────────────────────────────────────────────

  /// `GET /api/moderation/strikes`
  pub async fn list_strikes(
    &self,
    status: Option<&str>,
    limit: Option<usize>,
  ) -> Result<Vec<StrikeSummary>> {
    let mut query: Vec<(&str, String)> = Vec::new();
    if let Some(status) = status {
      query.push(("status", status.to_owned()));
    }
    if let Some(limit) = limit {
      query.push(("limit", limit.to_string()));
    }
    let req = self.client.get(self.url("/moderation/strikes")).query(&query);
    self.send("GET /moderation/strikes", req).await
  }

  /// `GET /api/moderation/strikes/{user_id}`
  pub async fn strike_detail(&self, user_id: Uuid) -> Result<StrikeDetail> {
    let req = self.client.get(self.url(&format!("/moderation/strikes/{user_id}")));
    self.send("GET /moderation/strikes/{id}", req).await
  }

  /// `GET /api/moderation/strikes/{user_id}/actions`
  pub async fn actions(&self, user_id: Uuid) -> Result<Vec<ModeratorAction>> {
    let req = self
      .client
      .get(self.url(&format!("/moderation/strikes/{user_id}/actions")));
    self.send("GET /moderation/strikes/{id}/actions", req).await
  }

  /// `POST /api/moderation/strikes/{user_id}/{action}`
  pub async fn apply_override(
    &self,
    user_id: Uuid,
    action: ActionKind,
    reason: &str,
    days: Option<u32>,
  ) -> Result<StrikeLedger> {
    let req = self
      .client
      .post(self.url(&format!("/moderation/strikes/{user_id}/{action}")))
      .json(&json!({ "reason": reason, "days": days }));
    self.send("POST /moderation/strikes/{id}/{action}", req).await
  }

  // ── Appeals ───────────────────────────────────────────────────────────────

  /// `GET /api/moderation/appeals?status=pending`
  pub async fn pending_appeals(&self, limit: Option<usize>) -> Result<Vec<Violation>> {
    let mut query = vec![("status", "pending".to_owned())];
    if let Some(limit) = limit {
      query.push(("limit", limit.to_string()));
    }
    let req = self.client.get(self.url("/moderation/appeals")).query(&query);
    self.send("GET /moderation/appeals", req).await
  }

  /// `POST /api/moderation/appeals/{id}/decide`
  pub async fn decide(
    &self,
    violation_id: Uuid,
    decision: AppealDecision,
    reason: &str,
  ) -> Result<AppealResolution> {
    let req = self
      .client
      .post(self.url(&format!("/moderation/appeals/{violation_id}/decide")))
      .json(&json!({ "decision": decision, "reason": reason }));
    self.send("POST /moderation/appeals/{id}/decide", req).await
  }

  // ── Stats ─────────────────────────────────────────────────────────────────

  /// `GET /api/moderation/stats`
  pub async fn stats(&self) -> Result<ModerationStats> {
    let req = self.client.get(self.url("/moderation/stats"));
    self.send("GET /moderation/stats", req).await
  }
}

/// Turn a non-2xx response into an error, preferring the server's
/// `{"error": "..."}` message.
async fn server_error(what: &str, resp: Response) -> anyhow::Error {
  let status = resp.status();
  let body = resp.text().await.unwrap_or_default();
  let message = serde_json::from_str::<serde_json::Value>(&body)
    .ok()
    .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
    .unwrap_or(body);
  anyhow!("{what} → {status}: {message}")
}

//! Users as seen by the moderation service.
//!
//! Accounts are owned by the main application; Warden keeps only the
//! identity needed to label ledgers and to authorise callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Result, error::require_text};

/// What a caller is allowed to do.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  User,
  Moderator,
  Admin,
}

impl Role {
  pub fn can_moderate(self) -> bool { self >= Self::Moderator }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
  pub user_id:      Uuid,
  pub username:     String,
  pub display_name: Option<String>,
  pub created_at:   DateTime<Utc>,
}

/// Input to [`crate::store::ModerationStore::upsert_user`].
#[derive(Debug, Clone)]
pub struct NewUserProfile {
  pub user_id:      Uuid,
  pub username:     String,
  pub display_name: Option<String>,
}

impl NewUserProfile {
  pub fn validate(&self) -> Result<()> { require_text("username", &self.username) }
}

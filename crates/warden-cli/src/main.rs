//! `warden`: moderator command line for the Warden moderation service.
//!
//! # Usage
//!
//! ```
//! warden --url http://localhost:8080 --user mod --password secret list --status suspended
//! warden --config ~/.config/warden/config.toml override <user-id> extend --days 3 --reason "repeat spam"
//! ```

mod client;
mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client::{ApiClient, ApiConfig};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use warden_core::{action::ActionKind, violation::AppealDecision};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "warden", about = "Moderator command line for Warden")]
struct Args {
  /// Path to a TOML config file (url, username, password).
  #[arg(short, long, value_name = "FILE")]
  config: Option<std::path::PathBuf>,

  /// Base URL of the warden server (default: http://localhost:8080).
  #[arg(long, env = "WARDEN_URL")]
  url: Option<String>,

  /// API username.
  #[arg(long, env = "WARDEN_USER")]
  user: Option<String>,

  /// API password (plaintext).
  #[arg(long, env = "WARDEN_PASSWORD")]
  password: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List strike ledgers, most strikes first.
  List {
    /// `all`, `active`, `warning`, `suspended` or `banned`.
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    limit:  Option<usize>,
  },
  /// Show one user's ledger and violations.
  Show { user_id: Uuid },
  /// Show the moderator actions taken on a user, newest first.
  History { user_id: Uuid },
  /// Apply a moderator override.
  Override {
    user_id: Uuid,
    /// extend, cancel, add-strike, remove-strike, ban or unban.
    action:  ActionKind,
    #[arg(long)]
    reason:  String,
    /// Days to add; required for `extend`.
    #[arg(long)]
    days:    Option<u32>,
  },
  /// List pending appeals, oldest first.
  Appeals {
    #[arg(long)]
    limit: Option<usize>,
  },
  /// Approve or reject a pending appeal.
  Decide {
    violation_id: Uuid,
    decision:     Decision,
    #[arg(long)]
    reason:       String,
  },
  /// Show dashboard counters.
  Stats,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Decision {
  Approve,
  Reject,
}

impl From<Decision> for AppealDecision {
  fn from(d: Decision) -> Self {
    match d {
      Decision::Approve => AppealDecision::Approve,
      Decision::Reject => AppealDecision::Reject,
    }
  }
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  username: String,
  #[serde(default)]
  password: String,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  if let Err(e) = run(Args::parse()).await {
    eprintln!("error: {e:#}");
    std::process::exit(1);
  }
}

async fn run(args: Args) -> Result<()> {
  // Load config file if provided.
  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    username: args
      .user
      .or_else(|| (!file_cfg.username.is_empty()).then(|| file_cfg.username.clone()))
      .unwrap_or_default(),
    password: args
      .password
      .or_else(|| (!file_cfg.password.is_empty()).then(|| file_cfg.password.clone()))
      .unwrap_or_default(),
  };

  let client = ApiClient::new(api_config)?;

  let output = match args.command {
    Command::List { status, limit } => {
      render::summaries(&client.list_strikes(status.as_deref(), limit).await?)
    }
    Command::Show { user_id } => render::detail(&client.strike_detail(user_id).await?),
    Command::History { user_id } => render::actions(&client.actions(user_id).await?),
    Command::Override { user_id, action, reason, days } => {
      let ledger = client.apply_override(user_id, action, &reason, days).await?;
      format!("{action} applied to {user_id}\n{}", render::ledger(&ledger))
    }
    Command::Appeals { limit } => render::appeals(&client.pending_appeals(limit).await?),
    Command::Decide { violation_id, decision, reason } => {
      let res = client.decide(violation_id, decision.into(), &reason).await?;
      render::resolution(&res)
    }
    Command::Stats => render::stats(&client.stats().await?),
  };

  print!("{output}");
  Ok(())
}

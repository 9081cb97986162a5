//! `carelink` — operator commands for the CareLink identity platform.
//!
//! Works directly against the SQLite store; no running server is needed.
//!
//! # Usage
//!
//! ```
//! carelink --store carelink.db create-admin
//! carelink --store carelink.db seed all
//! carelink --store carelink.db audit-linkage --repair
//! carelink --config ~/.config/carelink/config.toml pending
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use carelink_notify::{AnyMailer, MailSettings, RelayConfig};
use carelink_store_sqlite::SqliteStore;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "carelink", about = "Operator commands for the CareLink identity platform")]
struct Args {
  /// Path to a TOML config file (store path, mail settings).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// SQLite store path (default: carelink.db).
  #[arg(long, env = "CARELINK_STORE")]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Create or reset the bootstrap administrator account.
  CreateAdmin {
    /// Admin email (default: admin@test.com).
    #[arg(long)]
    email:    Option<String>,
    /// Admin password (default: admin2025).
    #[arg(long)]
    password: Option<String>,
  },
  /// Write development seed data.
  Seed {
    #[arg(value_enum)]
    what: SeedTarget,
  },
  /// Audit facility-admin linkage. Exits 1 when defects remain.
  AuditLinkage {
    /// Fix the single unambiguous missing link, if there is one.
    #[arg(long)]
    repair: bool,
  },
  /// Run a one-shot data migration.
  Migrate {
    #[command(subcommand)]
    which: Migration,
  },
  /// Approve a pending registration.
  Approve {
    user_id: String,
    /// Role to grant instead of the requested one.
    #[arg(long)]
    role:    Option<String>,
  },
  /// Reject a pending registration.
  Reject {
    user_id: String,
    /// Reason recorded on the profile and mailed to the applicant.
    #[arg(long)]
    reason:  String,
  },
  /// List registrations awaiting review.
  Pending,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SeedTarget {
  Facilities,
  Training,
  All,
}

#[derive(Subcommand, Debug)]
enum Migration {
  /// Hoist `consultationData.chwId` to a top-level `chwId` on health records.
  ChwId,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  store_path:         String,
  #[serde(default)]
  mail_sender:        String,
  #[serde(default)]
  mail_reviewer:      String,
  #[serde(default)]
  mail_relay_url:     String,
  #[serde(default)]
  mail_relay_api_key: String,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  // Load config file if provided.
  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let store_path = args
    .store
    .or_else(|| (!file_cfg.store_path.is_empty()).then(|| PathBuf::from(&file_cfg.store_path)))
    .unwrap_or_else(|| PathBuf::from("carelink.db"));

  let mail = MailSettings {
    sender:   non_empty(&file_cfg.mail_sender)
      .unwrap_or_else(|| "admin@lifecareconnect.com".to_string()),
    reviewer: non_empty(&file_cfg.mail_reviewer)
      .unwrap_or_else(|| "admin@lifecareconnect.com".to_string()),
  };
  let relay = match (
    non_empty(&file_cfg.mail_relay_url),
    non_empty(&file_cfg.mail_relay_api_key),
  ) {
    (Some(url), Some(api_key)) => Some(RelayConfig { url, api_key }),
    _ => None,
  };
  let mailer = AnyMailer::from_config(relay).context("building mail relay")?;

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("opening store at {}", store_path.display()))?;

  match args.command {
    Command::CreateAdmin { email, password } => {
      commands::create_admin(&store, email, password).await?;
    }
    Command::Seed { what } => match what {
      SeedTarget::Facilities => commands::seed_facilities(&store).await?,
      SeedTarget::Training => commands::seed_training(&store).await?,
      SeedTarget::All => commands::seed_all(&store).await?,
    },
    Command::AuditLinkage { repair } => {
      let clean = commands::audit_linkage(&store, repair).await?;
      if !clean {
        std::process::exit(1);
      }
    }
    Command::Migrate { which } => match which {
      Migration::ChwId => commands::migrate_chw_id(&store).await?,
    },
    Command::Approve { user_id, role } => {
      commands::approve(&store, &mailer, mail, &user_id, role).await?;
    }
    Command::Reject { user_id, reason } => {
      commands::reject(&store, &mailer, mail, &user_id, &reason).await?;
    }
    Command::Pending => {
      commands::pending(&store, &mailer, mail).await?;
    }
  }

  Ok(())
}

fn non_empty(s: &str) -> Option<String> {
  (!s.is_empty()).then(|| s.to_string())
}

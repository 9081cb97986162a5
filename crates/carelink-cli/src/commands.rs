//! Command implementations for the `carelink` binary.
//!
//! Thin wrappers over `carelink-admin`: run the operation, print a
//! human-readable report, and turn partial failure into a non-zero exit.

use anyhow::{Result, bail};
use carelink_admin::{
  ApprovalWorkflow, LinkageAuditor, LinkageDefect, SeedAdmin, chw_id_backfill,
  ensure_admin,
};
use carelink_core::{notify::DispatchOutcome, user::Role};
use carelink_notify::{AnyMailer, MailSettings};
use carelink_store_sqlite::SqliteStore;

// ─── Provisioning and seeds ───────────────────────────────────────────────────

pub async fn create_admin(
  store: &SqliteStore,
  email: Option<String>,
  password: Option<String>,
) -> Result<()> {
  let mut seed = SeedAdmin::default();
  if let Some(email) = email {
    seed.email = email;
  }
  if let Some(password) = password {
    seed.password = password;
  }

  let provisioned = ensure_admin(store, store, &seed).await?;
  if let Some(previous) = &provisioned.previous_uid {
    println!("replaced identity {previous}");
  }
  println!(
    "admin ready: {} ({})",
    provisioned.user.id, provisioned.user.profile.email
  );
  Ok(())
}

pub async fn seed_facilities(store: &SqliteStore) -> Result<()> {
  let report = carelink_admin::seed_facilities(store, store).await?;
  println!(
    "facilities: {} created, {} skipped",
    report.created, report.skipped
  );
  Ok(())
}

pub async fn seed_training(store: &SqliteStore) -> Result<()> {
  let report = carelink_admin::seed_training_materials(store).await?;
  println!(
    "training materials: {} created, {} skipped",
    report.created, report.skipped
  );
  Ok(())
}

pub async fn seed_all(store: &SqliteStore) -> Result<()> {
  create_admin(store, None, None).await?;
  seed_facilities(store).await?;
  seed_training(store).await?;
  Ok(())
}

// ─── Linkage audit ────────────────────────────────────────────────────────────

/// Audit (or repair) facility-admin linkage. Returns whether the store
/// ended up clean.
pub async fn audit_linkage(store: &SqliteStore, repair: bool) -> Result<bool> {
  let auditor = LinkageAuditor::new(store);
  let report = if repair {
    auditor.repair().await?
  } else {
    auditor.audit().await?
  };

  println!("facilities scanned: {}", report.facilities_scanned);
  println!("facility users scanned: {}", report.users_scanned);
  for defect in &report.defects {
    println!("defect: {}", describe(defect));
  }
  for link in &report.repaired {
    println!("repaired: facility {} -> user {}", link.facility_id, link.user_id);
  }
  for err in &report.errors {
    println!("error: {err}");
  }

  if report.is_clean() {
    println!("linkage clean");
  } else {
    println!(
      "{} defect(s) remain",
      report.defects.len() + report.errors.len()
    );
  }
  Ok(report.is_clean())
}

fn describe(defect: &LinkageDefect) -> String {
  match defect {
    LinkageDefect::UnlinkedFacility { facility_id, facility_name } => {
      format!("facility {facility_id} ({facility_name}) has no admin link")
    }
    LinkageDefect::DanglingAdmin { facility_id, admin_user_id } => {
      format!("facility {facility_id} links missing user {admin_user_id}")
    }
    LinkageDefect::WrongRole { facility_id, admin_user_id, role } => {
      format!("facility {facility_id} links {admin_user_id} whose role is {role}")
    }
    LinkageDefect::OrphanUser { user_id, email } => {
      format!("facility user {user_id} ({email}) is linked from no facility")
    }
    LinkageDefect::DuplicateLink { user_id, facility_ids } => {
      format!(
        "user {user_id} is claimed by {} facilities: {}",
        facility_ids.len(),
        facility_ids.join(", ")
      )
    }
    LinkageDefect::Ambiguous { orphan_facilities, orphan_users } => {
      format!(
        "repair refused: {} unlinked facilities and {} orphaned users",
        orphan_facilities.len(),
        orphan_users.len()
      )
    }
  }
}

// ─── Migrations ───────────────────────────────────────────────────────────────

pub async fn migrate_chw_id(store: &SqliteStore) -> Result<()> {
  let report = chw_id_backfill().run(store).await?;
  println!(
    "health records scanned: {}, updated: {}",
    report.scanned, report.updated
  );
  for err in &report.errors {
    println!("error: {err}");
  }
  if !report.errors.is_empty() {
    bail!("{} document(s) failed to migrate", report.errors.len());
  }
  Ok(())
}

// ─── Review decisions ─────────────────────────────────────────────────────────

pub async fn approve(
  store: &SqliteStore,
  mailer: &AnyMailer,
  mail: MailSettings,
  user_id: &str,
  role: Option<String>,
) -> Result<()> {
  let role = role.map(|r| r.parse::<Role>()).transpose()?;
  let flow = ApprovalWorkflow::new(store, store, mailer, mail);
  let decision = flow.approve(user_id, role).await?;
  println!(
    "approved {} ({}) as {}",
    decision.user.id, decision.user.profile.email, decision.user.profile.role
  );
  println!("notification: {}", outcome_line(&decision.notification));
  Ok(())
}

pub async fn reject(
  store: &SqliteStore,
  mailer: &AnyMailer,
  mail: MailSettings,
  user_id: &str,
  reason: &str,
) -> Result<()> {
  let flow = ApprovalWorkflow::new(store, store, mailer, mail);
  let decision = flow.reject(user_id, reason).await?;
  println!(
    "rejected {} ({}): {reason}",
    decision.user.id, decision.user.profile.email
  );
  println!("notification: {}", outcome_line(&decision.notification));
  Ok(())
}

pub async fn pending(
  store: &SqliteStore,
  mailer: &AnyMailer,
  mail: MailSettings,
) -> Result<()> {
  let flow = ApprovalWorkflow::new(store, store, mailer, mail);
  let users = flow.pending().await?;
  if users.is_empty() {
    println!("no pending registrations");
    return Ok(());
  }
  for user in users {
    let requested = user
      .profile
      .requested_role
      .map(|r| r.to_string())
      .unwrap_or_else(|| "-".to_string());
    println!(
      "{}  {}  requested role: {requested}  registered: {}",
      user.id,
      user.profile.email,
      user.created_at.to_rfc3339()
    );
  }
  Ok(())
}

fn outcome_line(outcome: &DispatchOutcome) -> String {
  match outcome {
    DispatchOutcome::Sent => "sent".to_string(),
    DispatchOutcome::Failed { reason } => format!("failed ({reason})"),
  }
}

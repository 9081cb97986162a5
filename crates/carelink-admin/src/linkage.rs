//! Facility–admin linkage audit and repair.
//!
//! Every facility should point at exactly one `facility`-role user via
//! `adminUserId`, and every `facility`-role user should be pointed at by
//! exactly one facility. [`LinkageAuditor`] checks both directions and,
//! on request, repairs the single unambiguous case: one unlinked facility
//! and one orphaned facility user. Anything less clear-cut is reported
//! and left alone, because a wrong link is worse than a missing one.

use serde::Serialize;
use serde_json::{Map, json};
use std::collections::BTreeMap;
use tracing::{info, warn};

use carelink_core::{
  Error, Result,
  store::{Document, DocumentStore, collections},
  user::Role,
};

// ─── Report Types ──────────────────────────────────────────────────────────

/// A single linkage problem, tied to the document(s) it was found in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkageDefect {
  /// A facility with no `adminUserId` at all.
  UnlinkedFacility {
    facility_id:   String,
    facility_name: String,
  },
  /// A facility whose `adminUserId` matches no user document.
  DanglingAdmin {
    facility_id:   String,
    admin_user_id: String,
  },
  /// A facility linked to a user that exists but is not `facility`-role.
  WrongRole {
    facility_id:   String,
    admin_user_id: String,
    role:          String,
  },
  /// A `facility`-role user no facility points at.
  OrphanUser { user_id: String, email: String },
  /// One user claimed as admin by more than one facility.
  DuplicateLink {
    user_id:      String,
    facility_ids: Vec<String>,
  },
  /// Repair was requested but more than one pairing would fit.
  Ambiguous {
    orphan_facilities: Vec<String>,
    orphan_users:      Vec<String>,
  },
}

/// One link written during repair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepairedLink {
  pub facility_id: String,
  pub user_id:     String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LinkageReport {
  pub facilities_scanned: usize,
  /// `facility`-role user documents considered.
  pub users_scanned:      usize,
  pub defects:            Vec<LinkageDefect>,
  pub repaired:           Vec<RepairedLink>,
  pub errors:             Vec<String>,
}

impl LinkageReport {
  pub fn is_clean(&self) -> bool {
    self.defects.is_empty() && self.errors.is_empty()
  }
}

// ─── Auditor ───────────────────────────────────────────────────────────────

pub struct LinkageAuditor<'a, S> {
  store: &'a S,
}

impl<'a, S> LinkageAuditor<'a, S>
where
  S: DocumentStore,
{
  pub fn new(store: &'a S) -> Self {
    Self { store }
  }

  /// Scan both collections and report every defect. Never writes.
  pub async fn audit(&self) -> Result<LinkageReport> {
    self.run(false).await
  }

  /// Audit, then fix the one case that needs no judgement call.
  pub async fn repair(&self) -> Result<LinkageReport> {
    self.run(true).await
  }

  async fn run(&self, repair: bool) -> Result<LinkageReport> {
    let facilities = self
      .store
      .list(collections::FACILITIES)
      .await
      .map_err(Error::store)?;
    let users = self
      .store
      .list(collections::USERS)
      .await
      .map_err(Error::store)?;

    // uid → role for every user doc that carries a role; the audit reads
    // fields directly so a half-formed profile still counts as present.
    let roles: BTreeMap<&str, &str> = users
      .iter()
      .filter_map(|doc| Some((doc.id.as_str(), doc.str_field("role")?)))
      .collect();
    let facility_users: Vec<&Document> = users
      .iter()
      .filter(|doc| doc.str_field("role") == Some(Role::Facility.as_str()))
      .collect();

    let mut report = LinkageReport {
      facilities_scanned: facilities.len(),
      users_scanned: facility_users.len(),
      ..LinkageReport::default()
    };

    // uid → facilities claiming it, in scan order.
    let mut referenced: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut unlinked: Vec<&Document> = Vec::new();

    for facility in &facilities {
      match facility.str_field("adminUserId") {
        None => {
          unlinked.push(facility);
          report.defects.push(LinkageDefect::UnlinkedFacility {
            facility_id:   facility.id.clone(),
            facility_name: facility
              .str_field("facilityName")
              .unwrap_or_default()
              .to_owned(),
          });
        }
        Some(uid) => {
          referenced.entry(uid).or_default().push(&facility.id);
          match roles.get(uid) {
            None => report.defects.push(LinkageDefect::DanglingAdmin {
              facility_id:   facility.id.clone(),
              admin_user_id: uid.to_owned(),
            }),
            Some(&role) if role != Role::Facility.as_str() => {
              report.defects.push(LinkageDefect::WrongRole {
                facility_id:   facility.id.clone(),
                admin_user_id: uid.to_owned(),
                role:          role.to_owned(),
              })
            }
            Some(_) => {}
          }
        }
      }
    }

    for (uid, facility_ids) in &referenced {
      if facility_ids.len() > 1 {
        report.defects.push(LinkageDefect::DuplicateLink {
          user_id:      (*uid).to_owned(),
          facility_ids: facility_ids.iter().map(|id| (*id).to_owned()).collect(),
        });
      }
    }

    let orphans: Vec<&Document> = facility_users
      .iter()
      .filter(|doc| !referenced.contains_key(doc.id.as_str()))
      .copied()
      .collect();
    for user in &orphans {
      report.defects.push(LinkageDefect::OrphanUser {
        user_id: user.id.clone(),
        email:   user.str_field("email").unwrap_or_default().to_owned(),
      });
    }

    if repair && !unlinked.is_empty() && !orphans.is_empty() {
      if let ([facility], [user]) = (unlinked.as_slice(), orphans.as_slice()) {
        self.bind(&mut report, facility, user).await;
      } else {
        warn!(
          facilities = unlinked.len(),
          users = orphans.len(),
          "linkage repair refused: pairing is ambiguous"
        );
        report.defects.push(LinkageDefect::Ambiguous {
          orphan_facilities: unlinked.iter().map(|f| f.id.clone()).collect(),
          orphan_users:      orphans.iter().map(|u| u.id.clone()).collect(),
        });
      }
    }

    Ok(report)
  }

  /// Write the one unambiguous link and drop the two defects it resolves.
  async fn bind(&self, report: &mut LinkageReport, facility: &Document, user: &Document) {
    let mut patch = Map::new();
    patch.insert("adminUserId".to_owned(), json!(user.id));

    match self
      .store
      .update(collections::FACILITIES, &facility.id, patch)
      .await
    {
      Ok(_) => {
        info!(
          facility = %facility.id,
          user = %user.id,
          "facility admin link repaired"
        );
        report.defects.retain(|defect| {
          !matches!(
            defect,
            LinkageDefect::UnlinkedFacility { facility_id, .. }
              if *facility_id == facility.id
          ) && !matches!(
            defect,
            LinkageDefect::OrphanUser { user_id, .. } if *user_id == user.id
          )
        });
        report.repaired.push(RepairedLink {
          facility_id: facility.id.clone(),
          user_id:     user.id.clone(),
        });
      }
      Err(err) => report
        .errors
        .push(format!("linking {} to {}: {err}", facility.id, user.id)),
    }
  }
}

#[cfg(test)]
mod tests {
  use carelink_store_sqlite::SqliteStore;
  use serde_json::{Value, json};

  use carelink_core::store::{DocumentStore, collections};

  use super::{LinkageAuditor, LinkageDefect};

  async fn store() -> SqliteStore {
    SqliteStore::open_in_memory().await.unwrap()
  }

  async fn add_facility(store: &SqliteStore, name: &str, admin: Option<&str>) -> String {
    let mut body = json!({
      "facilityName": name,
      "facilityType": "hospital",
      "location": "12 Harbor Road",
      "phone": "+1000000000",
      "contactPerson": "Dr. Reed",
      "email": format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
      "services": ["consultation"],
      "isActive": true,
    });
    if let Some(uid) = admin {
      body["adminUserId"] = Value::String(uid.to_owned());
    }
    store
      .add(collections::FACILITIES, body)
      .await
      .unwrap()
      .id
  }

  async fn add_user(store: &SqliteStore, email: &str, role: &str) -> String {
    store
      .add(
        collections::USERS,
        json!({ "email": email, "role": role, "status": "active" }),
      )
      .await
      .unwrap()
      .id
  }

  #[tokio::test]
  async fn fully_linked_store_audits_clean() {
    let store = store().await;
    let uid = add_user(&store, "admin@clinic.example.com", "facility").await;
    add_facility(&store, "Harborside Clinic", Some(&uid)).await;

    let report = LinkageAuditor::new(&store).audit().await.unwrap();

    assert!(report.is_clean());
    assert_eq!(report.facilities_scanned, 1);
    assert_eq!(report.users_scanned, 1);
    assert!(report.repaired.is_empty());
  }

  #[tokio::test]
  async fn audit_finds_every_defect_class() {
    let store = store().await;

    let linked = add_user(&store, "ok@example.com", "facility").await;
    add_facility(&store, "Fine Clinic", Some(&linked)).await;

    let unlinked_id = add_facility(&store, "No Admin Clinic", None).await;
    let dangling_id = add_facility(&store, "Ghost Clinic", Some("no-such-uid")).await;

    let chw = add_user(&store, "chw@example.com", "chw").await;
    let wrong_id = add_facility(&store, "Wrong Role Clinic", Some(&chw)).await;

    let orphan = add_user(&store, "orphan@example.com", "facility").await;

    let shared = add_user(&store, "shared@example.com", "facility").await;
    add_facility(&store, "Twin A", Some(&shared)).await;
    add_facility(&store, "Twin B", Some(&shared)).await;

    let report = LinkageAuditor::new(&store).audit().await.unwrap();

    assert_eq!(report.facilities_scanned, 6);
    // linked admin, orphan, shared; the chw does not count.
    assert_eq!(report.users_scanned, 3);

    assert!(report.defects.contains(&LinkageDefect::UnlinkedFacility {
      facility_id:   unlinked_id,
      facility_name: "No Admin Clinic".into(),
    }));
    assert!(report.defects.contains(&LinkageDefect::DanglingAdmin {
      facility_id:   dangling_id,
      admin_user_id: "no-such-uid".into(),
    }));
    assert!(report.defects.contains(&LinkageDefect::WrongRole {
      facility_id:   wrong_id,
      admin_user_id: chw,
      role:          "chw".into(),
    }));
    assert!(report.defects.contains(&LinkageDefect::OrphanUser {
      user_id: orphan,
      email:   "orphan@example.com".into(),
    }));
    assert!(report.defects.iter().any(|d| matches!(
      d,
      LinkageDefect::DuplicateLink { user_id, facility_ids }
        if *user_id == shared && facility_ids.len() == 2
    )));
    assert_eq!(report.defects.len(), 5);
  }

  #[tokio::test]
  async fn repair_binds_single_orphan_pair() {
    let store = store().await;
    let facility_id = add_facility(&store, "Lone Clinic", None).await;
    let uid = add_user(&store, "lone@example.com", "facility").await;

    let report = LinkageAuditor::new(&store).repair().await.unwrap();

    assert!(report.is_clean());
    assert_eq!(report.repaired.len(), 1);
    assert_eq!(report.repaired[0].facility_id, facility_id);
    assert_eq!(report.repaired[0].user_id, uid);

    let doc = store
      .get(collections::FACILITIES, &facility_id)
      .await
      .unwrap()
      .unwrap();
    assert_eq!(doc.str_field("adminUserId"), Some(uid.as_str()));

    let after = LinkageAuditor::new(&store).audit().await.unwrap();
    assert!(after.is_clean());
  }

  #[tokio::test]
  async fn repair_refuses_ambiguous_pairing() {
    let store = store().await;
    let a = add_facility(&store, "Clinic A", None).await;
    let b = add_facility(&store, "Clinic B", None).await;
    let uid = add_user(&store, "only@example.com", "facility").await;

    let report = LinkageAuditor::new(&store).repair().await.unwrap();

    assert!(report.repaired.is_empty());
    assert!(report.defects.iter().any(|d| matches!(
      d,
      LinkageDefect::Ambiguous { orphan_facilities, orphan_users }
        if orphan_facilities.len() == 2 && orphan_users == &vec![uid.clone()]
    )));

    // Neither facility was touched.
    for id in [&a, &b] {
      let doc = store
        .get(collections::FACILITIES, id)
        .await
        .unwrap()
        .unwrap();
      assert_eq!(doc.str_field("adminUserId"), None);
    }
  }

  #[tokio::test]
  async fn audit_never_writes() {
    let store = store().await;
    add_facility(&store, "Lone Clinic", None).await;
    add_user(&store, "lone@example.com", "facility").await;

    let report = LinkageAuditor::new(&store).audit().await.unwrap();
    assert_eq!(report.defects.len(), 2);
    assert!(report.repaired.is_empty());

    // The repairable pair is still unlinked.
    let facilities = store.list(collections::FACILITIES).await.unwrap();
    assert_eq!(facilities[0].str_field("adminUserId"), None);
  }

  #[tokio::test]
  async fn repair_with_one_side_empty_does_nothing() {
    let store = store().await;
    add_facility(&store, "Lone Clinic", None).await;

    let report = LinkageAuditor::new(&store).repair().await.unwrap();

    assert!(report.repaired.is_empty());
    assert_eq!(report.defects.len(), 1);
    assert!(!report
      .defects
      .iter()
      .any(|d| matches!(d, LinkageDefect::Ambiguous { .. })));
  }
}

//! Development seed data: facilities with linked admin accounts, and the
//! CHW training catalogue.
//!
//! Unlike the raw fixtures these grew out of, `seed_facilities` creates a
//! working `facility`-role account for every facility and records the
//! back-reference, so a freshly seeded store already satisfies the linkage
//! auditor. Both seeders are idempotent: facilities key off the admin
//! email, materials off the title.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::info;

use carelink_core::{
  Error, Result,
  facility::{Facility, FacilityType},
  identity::{IdentityProvider, NewIdentity},
  material::{MaterialType, TrainingMaterial},
  store::{DocumentStore, collections},
  user::{AccountStatus, Role, UserProfile},
};

use crate::claims::ClaimIssuer;

/// First-login password for seeded facility accounts, expected to be
/// rotated by the facility on first use.
const FACILITY_SEED_PASSWORD: &str = "facility2025";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
  pub created: usize,
  pub skipped: usize,
}

// ─── Facilities ────────────────────────────────────────────────────────────

/// Seed the sample facilities, each with its own linked admin account.
///
/// A facility whose admin email already has an identity is counted as
/// skipped and left untouched.
pub async fn seed_facilities<S, P>(store: &S, provider: &P) -> Result<SeedReport>
where
  S: DocumentStore,
  P: IdentityProvider,
{
  let mut report = SeedReport::default();

  for mut facility in sample_facilities() {
    if provider
      .get_user_by_email(&facility.email)
      .await
      .map_err(Error::store)?
      .is_some()
    {
      report.skipped += 1;
      continue;
    }

    let identity = provider
      .create_user(NewIdentity {
        email:          facility.email.clone(),
        password:       FACILITY_SEED_PASSWORD.to_owned(),
        email_verified: true,
      })
      .await
      .map_err(Error::store)?;

    let profile = UserProfile {
      email:          facility.email.clone(),
      role:           Role::Facility,
      status:         AccountStatus::Active,
      display_name:   Some(facility.facility_name.clone()),
      requested_role: None,
      status_reason:  None,
    };
    store
      .set(collections::USERS, &identity.uid, profile.to_value()?)
      .await
      .map_err(Error::store)?;
    ClaimIssuer::new(store, provider)
      .sync_claims(&identity.uid)
      .await?;

    facility.admin_user_id = Some(identity.uid.clone());
    store
      .add(collections::FACILITIES, facility.to_value()?)
      .await
      .map_err(Error::store)?;

    info!(
      facility = %facility.facility_name,
      uid = %identity.uid,
      "seeded facility with linked admin account"
    );
    report.created += 1;
  }

  info!(
    created = report.created,
    skipped = report.skipped,
    "facility seeding finished"
  );
  Ok(report)
}

fn sample_facilities() -> Vec<Facility> {
  fn facility(
    name: &str,
    facility_type: FacilityType,
    location: &str,
    phone: &str,
    contact_person: &str,
    email: &str,
    services: &[&str],
  ) -> Facility {
    Facility {
      facility_name: name.to_owned(),
      facility_type,
      location: location.to_owned(),
      phone: phone.to_owned(),
      contact_person: contact_person.to_owned(),
      email: email.to_owned(),
      services: services.iter().map(|s| (*s).to_owned()).collect(),
      is_active: true,
      admin_user_id: None,
    }
  }

  vec![
    facility(
      "City General Hospital",
      FacilityType::Hospital,
      "123 Main Street, Downtown",
      "+1234567890",
      "Dr. Sarah Johnson",
      "contact@cityhospital.com",
      &["emergency", "consultation", "surgery", "vaccination"],
    ),
    facility(
      "St. Mary Medical Center",
      FacilityType::Hospital,
      "456 Health Avenue, Medical District",
      "+1234567891",
      "Dr. Michael Brown",
      "info@stmaryhospital.com",
      &["emergency", "consultation", "specialist_consultation", "health_checkup"],
    ),
    facility(
      "Quick Diagnostics Lab",
      FacilityType::Laboratory,
      "789 Science Park, Lab District",
      "+1234567892",
      "Dr. Emily Chen",
      "lab@quickdiagnostics.com",
      &["blood_test", "urine_test", "culture_test", "hormone_test"],
    ),
    facility(
      "Precision Medical Laboratory",
      FacilityType::Laboratory,
      "321 Research Boulevard, Science Hub",
      "+1234567893",
      "Dr. Robert Kim",
      "contact@precisionlab.com",
      &["blood_test", "genetic_test", "stool_test", "culture_test"],
    ),
    facility(
      "Health Plus Pharmacy",
      FacilityType::Pharmacy,
      "654 Wellness Street, Shopping Center",
      "+1234567894",
      "PharmD Lisa Wang",
      "info@healthpharmacy.com",
      &["prescription_pickup", "medication_consultation", "vaccination", "health_products"],
    ),
    facility(
      "Family Care Pharmacy",
      FacilityType::Pharmacy,
      "987 Community Road, Residential Area",
      "+1234567895",
      "PharmD John Davis",
      "care@familypharmacy.com",
      &["prescription_pickup", "medication_delivery", "health_products", "vaccination"],
    ),
    facility(
      "Advanced Imaging Center",
      FacilityType::ScanCenter,
      "147 Technology Drive, Medical Plaza",
      "+1234567896",
      "Dr. Amanda Lee",
      "imaging@advancedscans.com",
      &["x_ray", "mri", "ct_scan", "ultrasound"],
    ),
    facility(
      "Radiology Plus Center",
      FacilityType::ScanCenter,
      "258 Diagnostic Lane, Healthcare Complex",
      "+1234567897",
      "Dr. Mark Wilson",
      "scans@radiologyplus.com",
      &["x_ray", "ultrasound", "mammography", "bone_density"],
    ),
    facility(
      "Clear Vision Eye Center",
      FacilityType::EyeCenter,
      "369 Vision Street, Optical District",
      "+1234567898",
      "Dr. Jennifer Taylor",
      "vision@cleareyecenter.com",
      &["eye_exam", "vision_test", "contact_lens", "cataract_consultation"],
    ),
  ]
}

// ─── Training materials ────────────────────────────────────────────────────

/// Seed the CHW training catalogue, skipping titles already present.
pub async fn seed_training_materials<S>(store: &S) -> Result<SeedReport>
where
  S: DocumentStore,
{
  let existing: BTreeSet<String> = store
    .list(collections::TRAINING_MATERIALS)
    .await
    .map_err(Error::store)?
    .iter()
    .filter_map(|doc| doc.str_field("title").map(str::to_owned))
    .collect();

  let mut report = SeedReport::default();
  for material in sample_materials(Utc::now()) {
    if existing.contains(&material.title) {
      report.skipped += 1;
      continue;
    }
    store
      .add(collections::TRAINING_MATERIALS, material.to_value()?)
      .await
      .map_err(Error::store)?;
    report.created += 1;
  }

  info!(
    created = report.created,
    skipped = report.skipped,
    "training material seeding finished"
  );
  Ok(report)
}

/// The whole batch shares one `uploaded_at` instant, the moment of the
/// seeding run.
fn sample_materials(uploaded_at: DateTime<Utc>) -> Vec<TrainingMaterial> {
  let video = |title: &str,
               description: &str,
               url: &str,
               duration: u32,
               tags: &[&str]| TrainingMaterial {
    title: title.to_owned(),
    description: description.to_owned(),
    material_type: MaterialType::Video,
    target_role: Role::Chw,
    url: url.to_owned(),
    file_name: None,
    file_size: None,
    duration: Some(duration),
    download_count: 0,
    view_count: Some(0),
    is_active: true,
    tags: tags.iter().map(|t| (*t).to_owned()).collect(),
    created_by: "admin".to_owned(),
    uploaded_at,
  };

  let pdf = |title: &str,
             description: &str,
             url: &str,
             file_name: &str,
             file_size: u64,
             tags: &[&str]| TrainingMaterial {
    title: title.to_owned(),
    description: description.to_owned(),
    material_type: MaterialType::Pdf,
    target_role: Role::Chw,
    url: url.to_owned(),
    file_name: Some(file_name.to_owned()),
    file_size: Some(file_size),
    duration: None,
    download_count: 0,
    view_count: None,
    is_active: true,
    tags: tags.iter().map(|t| (*t).to_owned()).collect(),
    created_by: "admin".to_owned(),
    uploaded_at,
  };

  vec![
    video(
      "Basic CHW Training Video",
      "Introduction to Community Health Worker role and responsibilities",
      "https://example.com/video1.mp4",
      1800,
      &["basic", "introduction", "chw"],
    ),
    video(
      "Patient Care Techniques",
      "Learn essential patient care techniques for CHWs",
      "https://example.com/video2.mp4",
      2400,
      &["patient-care", "techniques", "practical"],
    ),
    pdf(
      "CHW Guidelines Manual",
      "Comprehensive guidelines for Community Health Workers",
      "https://example.com/chw-manual.pdf",
      "chw-guidelines-manual.pdf",
      2_048_000,
      &["manual", "guidelines", "reference"],
    ),
    pdf(
      "Health Assessment Checklist",
      "Checklist for conducting basic health assessments",
      "https://example.com/checklist.pdf",
      "health-assessment-checklist.pdf",
      512_000,
      &["checklist", "assessment", "health"],
    ),
    pdf(
      "Malaria Management Guide",
      "Guidelines for identifying and managing malaria cases",
      "https://example.com/malaria-guide.pdf",
      "malaria-management-guide.pdf",
      1_024_000,
      &["malaria", "disease-management", "treatment"],
    ),
  ]
}

#[cfg(test)]
mod tests {
  use carelink_store_sqlite::SqliteStore;
  use serde_json::json;

  use carelink_core::{
    facility::FacilityRecord,
    identity::IdentityProvider,
    material::{MaterialType, TrainingMaterial},
    store::{DocumentStore, collections},
  };

  use super::{SeedReport, seed_facilities, seed_training_materials};
  use crate::linkage::LinkageAuditor;

  #[tokio::test]
  async fn seeded_facilities_are_fully_linked() {
    let store = SqliteStore::open_in_memory().await.unwrap();

    let report = seed_facilities(&store, &store).await.unwrap();
    assert_eq!(report, SeedReport { created: 9, skipped: 0 });

    let facilities = store.list(collections::FACILITIES).await.unwrap();
    assert_eq!(facilities.len(), 9);
    for doc in &facilities {
      let record = FacilityRecord::from_document(doc.clone()).unwrap();
      assert!(record.facility.admin_user_id.is_some());
    }

    // Every seeded admin account carries facility claims.
    let identity = store
      .get_user_by_email("contact@cityhospital.com")
      .await
      .unwrap()
      .unwrap();
    assert!(identity.email_verified);
    assert_eq!(identity.claims, json!({ "role": "facility" }));

    let audit = LinkageAuditor::new(&store).audit().await.unwrap();
    assert!(audit.is_clean());
    assert_eq!(audit.facilities_scanned, 9);
    assert_eq!(audit.users_scanned, 9);
  }

  #[tokio::test]
  async fn facility_seeding_is_idempotent() {
    let store = SqliteStore::open_in_memory().await.unwrap();

    seed_facilities(&store, &store).await.unwrap();
    let second = seed_facilities(&store, &store).await.unwrap();

    assert_eq!(second, SeedReport { created: 0, skipped: 9 });
    assert_eq!(store.list(collections::FACILITIES).await.unwrap().len(), 9);
    assert_eq!(store.list(collections::USERS).await.unwrap().len(), 9);
  }

  #[tokio::test]
  async fn training_materials_seed_once() {
    let store = SqliteStore::open_in_memory().await.unwrap();

    let first = seed_training_materials(&store).await.unwrap();
    assert_eq!(first, SeedReport { created: 5, skipped: 0 });

    let second = seed_training_materials(&store).await.unwrap();
    assert_eq!(second, SeedReport { created: 0, skipped: 5 });

    let docs = store.list(collections::TRAINING_MATERIALS).await.unwrap();
    assert_eq!(docs.len(), 5);

    let manual = docs
      .iter()
      .find(|doc| doc.str_field("title") == Some("CHW Guidelines Manual"))
      .unwrap();
    let material: TrainingMaterial =
      serde_json::from_value(manual.body.clone()).unwrap();
    assert_eq!(material.material_type, MaterialType::Pdf);
    assert_eq!(material.file_size, Some(2_048_000));
    assert_eq!(material.duration, None);

    // Clients read the upload stamp from the body, not the envelope.
    let stamp = manual.body["uploadedAt"].as_str().unwrap();
    chrono::DateTime::parse_from_rfc3339(stamp).unwrap();
  }
}

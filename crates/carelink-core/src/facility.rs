//! Facility profiles and their linkage to a controlling user.
//!
//! Every facility is controlled by exactly one user with the facility role,
//! recorded as a back-reference on the facility document. The auditor in
//! `carelink-admin` checks and repairs that linkage; nothing here enforces
//! it at write time, because the two documents live in separate collections
//! with no transaction spanning them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, store::Document};

// ─── Facility type ───────────────────────────────────────────────────────────

/// The kind of healthcare facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityType {
  Hospital,
  Laboratory,
  Pharmacy,
  ScanCenter,
  EyeCenter,
}

impl FacilityType {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Hospital => "hospital",
      Self::Laboratory => "laboratory",
      Self::Pharmacy => "pharmacy",
      Self::ScanCenter => "scan_center",
      Self::EyeCenter => "eye_center",
    }
  }
}

impl std::fmt::Display for FacilityType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for FacilityType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "hospital" => Ok(Self::Hospital),
      "laboratory" => Ok(Self::Laboratory),
      "pharmacy" => Ok(Self::Pharmacy),
      "scan_center" => Ok(Self::ScanCenter),
      "eye_center" => Ok(Self::EyeCenter),
      other => Err(Error::UnknownFacilityType(other.to_string())),
    }
  }
}

// ─── Facility document ───────────────────────────────────────────────────────

/// The `facilities`-collection document body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
  pub facility_name:  String,
  pub facility_type:  FacilityType,
  pub location:       String,
  pub phone:          String,
  pub contact_person: String,
  pub email:          String,
  /// Service names offered at this facility, free-form.
  #[serde(default)]
  pub services:       Vec<String>,
  pub is_active:      bool,
  /// Back-reference to the controlling facility-role user. `None` on a
  /// live facility is a linkage defect, not a valid configuration.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub admin_user_id:  Option<String>,
}

impl Facility {
  pub fn to_value(&self) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(self)?)
  }
}

/// A facility document paired with its store envelope.
///
/// Envelope keys serialize camelCase, matching the flattened body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityRecord {
  pub id:         String,
  pub created_at: DateTime<Utc>,
  #[serde(flatten)]
  pub facility:   Facility,
}

impl FacilityRecord {
  /// Decode a raw `facilities` document. Fails on a malformed body.
  pub fn from_document(doc: Document) -> Result<Self> {
    let facility = serde_json::from_value(doc.body)?;
    Ok(Self { id: doc.id, created_at: doc.created_at, facility })
  }
}

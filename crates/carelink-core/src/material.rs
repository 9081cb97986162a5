//! Training materials offered to platform users.
//!
//! These documents are written by the seeder and read by client apps; the
//! identity machinery never touches them beyond initial provisioning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, user::Role};

/// The delivery format of a training material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialType {
  Video,
  Pdf,
}

/// The `training_materials`-collection document body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingMaterial {
  pub title:         String,
  pub description:   String,
  #[serde(rename = "type")]
  pub material_type: MaterialType,
  /// The role this material is aimed at.
  pub target_role:   Role,
  pub url:           String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub file_name:     Option<String>,
  /// Bytes, for downloadable files.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub file_size:     Option<u64>,
  /// Seconds, for videos.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub duration:      Option<u32>,
  #[serde(default)]
  pub download_count: u64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub view_count:    Option<u64>,
  pub is_active:     bool,
  #[serde(default)]
  pub tags:          Vec<String>,
  /// Uid of the admin that provisioned the material.
  pub created_by:    String,
  pub uploaded_at:   DateTime<Utc>,
}

impl TrainingMaterial {
  pub fn to_value(&self) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(self)?)
  }
}

//! User identities as the platform sees them: roles, account statuses,
//! the canonical claim payload and the `users`-collection profile document.
//!
//! A user is split across two systems. The identity provider holds the
//! credential and the claim payload; the document store holds the profile.
//! The profile's `role` field is the single source of truth for
//! authorization, and claims are re-derived from it after every role write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{Error, Result, store::Document};

// ─── Role ────────────────────────────────────────────────────────────────────

/// The authorization role assigned to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  /// Platform administrator; reviews registrations and manages facilities.
  Admin,
  /// Controls exactly one healthcare facility.
  Facility,
  /// Community health worker.
  Chw,
  /// Registered but not yet granted a working role.
  Unassigned,
}

impl Role {
  /// The wire string stored in documents and claim payloads.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Admin => "admin",
      Self::Facility => "facility",
      Self::Chw => "chw",
      Self::Unassigned => "unassigned",
    }
  }
}

impl std::fmt::Display for Role {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "admin" => Ok(Self::Admin),
      "facility" => Ok(Self::Facility),
      "chw" => Ok(Self::Chw),
      "unassigned" => Ok(Self::Unassigned),
      other => Err(Error::UnknownRole(other.to_string())),
    }
  }
}

// ─── Account status ──────────────────────────────────────────────────────────

/// Where an account sits in its lifecycle.
///
/// Status governs whether the account is usable; the role alone never does.
/// Every status write goes through an explicit transition so that adding a
/// variant forces every call site to say what it means for that variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
  /// Self-registered, awaiting admin review.
  Pending,
  /// Review passed; the account works through normal authentication.
  Approved,
  /// Review failed. Terminal: a fresh registration is required.
  Rejected,
  /// Created directly by an administrator, usable immediately.
  Active,
  /// Administratively switched off.
  Disabled,
}

impl AccountStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Approved => "approved",
      Self::Rejected => "rejected",
      Self::Active => "active",
      Self::Disabled => "disabled",
    }
  }

  /// Whether a review decision (approve or reject) may be applied.
  pub fn awaiting_review(self) -> bool {
    match self {
      Self::Pending => true,
      Self::Approved | Self::Rejected | Self::Active | Self::Disabled => false,
    }
  }
}

impl std::fmt::Display for AccountStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for AccountStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "pending" => Ok(Self::Pending),
      "approved" => Ok(Self::Approved),
      "rejected" => Ok(Self::Rejected),
      "active" => Ok(Self::Active),
      "disabled" => Ok(Self::Disabled),
      other => Err(Error::UnknownStatus(other.to_string())),
    }
  }
}

// ─── Claims ──────────────────────────────────────────────────────────────────

/// The canonical claim payload for a role.
///
/// Claims are a pure function of the stored role, nothing else. They are
/// pushed to the identity provider after every role write and are never an
/// independent source of truth; a stale claim is repaired by re-deriving
/// from the profile, not by trusting the provider.
pub fn canonical_claims(role: Role) -> serde_json::Value {
  json!({ "role": role.as_str() })
}

// ─── Profile document ────────────────────────────────────────────────────────

/// The `users`-collection document body mirroring a provider identity.
///
/// The document id is always the identity's uid; there is no separate key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
  pub email:  String,
  pub role:   Role,
  pub status: AccountStatus,
  /// Shown in notifications; falls back to the email when absent.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub display_name:   Option<String>,
  /// The role asked for at self-registration. Granted (or overridden) by
  /// the reviewer at approval time.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub requested_role: Option<Role>,
  /// Reviewer-provided reason, recorded on rejection.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status_reason:  Option<String>,
}

impl UserProfile {
  pub fn display_name_or_email(&self) -> &str {
    self.display_name.as_deref().unwrap_or(&self.email)
  }

  pub fn to_value(&self) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(self)?)
  }
}

/// A profile document paired with its store envelope.
///
/// Envelope keys serialize camelCase, matching the flattened body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
  pub id:         String,
  pub created_at: DateTime<Utc>,
  #[serde(flatten)]
  pub profile:    UserProfile,
}

impl UserRecord {
  /// Decode a raw `users` document. Fails on a malformed body.
  pub fn from_document(doc: Document) -> Result<Self> {
    let profile = serde_json::from_value(doc.body)?;
    Ok(Self { id: doc.id, created_at: doc.created_at, profile })
  }
}

// ─── Registration input ──────────────────────────────────────────────────────

/// Input to self-registration. The password goes straight to the identity
/// provider and is never persisted by the platform.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRegistration {
  pub email:          String,
  pub password:       String,
  #[serde(default)]
  pub display_name:   Option<String>,
  #[serde(default)]
  pub requested_role: Option<Role>,
}

//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Document bodies and
//! claim payloads are stored as compact JSON. Store-assigned ids are
//! hyphenated lowercase UUIDs.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use carelink_core::{identity::Identity, store::Document};

use crate::{Error, Result};

// ─── Ids ─────────────────────────────────────────────────────────────────────

pub fn new_id() -> String { Uuid::new_v4().hyphenated().to_string() }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `documents` row.
pub struct RawDocument {
  pub doc_id:     String,
  pub created_at: String,
  pub body:       String,
}

impl RawDocument {
  pub fn into_document(self) -> Result<Document> {
    Ok(Document {
      id:         self.doc_id,
      created_at: decode_dt(&self.created_at)?,
      body:       serde_json::from_str(&self.body)?,
    })
  }
}

/// Raw strings read directly from an `identities` row. The password hash
/// is deliberately not part of this projection; nothing outside
/// credential checks ever reads it.
pub struct RawIdentity {
  pub uid:            String,
  pub email:          String,
  pub email_verified: bool,
  pub claims:         String,
  pub created_at:     String,
}

impl RawIdentity {
  pub fn into_identity(self) -> Result<Identity> {
    Ok(Identity {
      uid:            self.uid,
      email:          self.email,
      email_verified: self.email_verified,
      claims:         serde_json::from_str(&self.claims)?,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

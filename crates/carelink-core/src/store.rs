//! The `DocumentStore` trait and the document envelope.
//!
//! The trait is implemented by storage backends (e.g.
//! `carelink-store-sqlite`). Higher layers (`carelink-admin`,
//! `carelink-api`) depend on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ─── Collections ─────────────────────────────────────────────────────────────

/// Collection names used by the platform.
pub mod collections {
  /// Profile documents mirroring provider identities, keyed by uid.
  pub const USERS: &str = "users";
  /// Healthcare facility profiles.
  pub const FACILITIES: &str = "facilities";
  /// Training materials for platform users.
  pub const TRAINING_MATERIALS: &str = "training_materials";
  /// Patient encounter records carrying nested consultation data.
  pub const HEALTH_RECORDS: &str = "health_records";
}

// ─── Document envelope ───────────────────────────────────────────────────────

/// A stored document: a JSON object body plus the store-assigned envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
  pub id:         String,
  /// Assigned by the store at first write; survives later replaces.
  pub created_at: DateTime<Utc>,
  pub body:       Value,
}

impl Document {
  /// Read a top-level field of the body, treating JSON `null` as absent.
  pub fn field(&self, name: &str) -> Option<&Value> {
    match self.body.get(name) {
      None | Some(Value::Null) => None,
      Some(v) => Some(v),
    }
  }

  /// Read a top-level field of the body as a string.
  pub fn str_field(&self, name: &str) -> Option<&str> {
    self.field(name).and_then(Value::as_str)
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a schemaless document-collection store.
///
/// Collections spring into existence on first write. Individual writes are
/// atomic per document; nothing here spans documents, which is why the
/// linkage auditor exists.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch one document by id. Returns `None` if not found.
  fn get<'a>(
    &'a self,
    collection: &'a str,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + 'a;

  /// List every document in a collection, in unspecified order.
  fn list<'a>(
    &'a self,
    collection: &'a str,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + 'a;

  /// Documents whose top-level `field` equals `value`.
  fn query_eq<'a>(
    &'a self,
    collection: &'a str,
    field: &'a str,
    value: &'a Value,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + 'a;

  /// Insert a document under a store-assigned id.
  fn add<'a>(
    &'a self,
    collection: &'a str,
    body: Value,
  ) -> impl Future<Output = Result<Document, Self::Error>> + Send + 'a;

  /// Full write under a caller-chosen id; creates or replaces. A replace
  /// keeps the original `created_at`.
  fn set<'a>(
    &'a self,
    collection: &'a str,
    id: &'a str,
    body: Value,
  ) -> impl Future<Output = Result<Document, Self::Error>> + Send + 'a;

  /// Shallow-merge `patch` into the top-level fields of an existing
  /// document. Fails if the document is absent.
  fn update<'a>(
    &'a self,
    collection: &'a str,
    id: &'a str,
    patch: Map<String, Value>,
  ) -> impl Future<Output = Result<Document, Self::Error>> + Send + 'a;

  /// Remove a document. Returns `false` if it was already absent; absence
  /// is not an error.
  fn delete<'a>(
    &'a self,
    collection: &'a str,
    id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}

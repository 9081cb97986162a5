//! [`SqliteStore`] — the SQLite implementation of [`DocumentStore`] and
//! [`IdentityProvider`].

use std::path::Path;

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use chrono::Utc;
use rand_core::OsRng;
use rusqlite::OptionalExtension as _;
use serde_json::{Map, Value};

use carelink_core::{
  identity::{Identity, IdentityProvider, NewIdentity},
  store::{Document, DocumentStore},
};

use crate::{
  Error, Result,
  encode::{RawDocument, RawIdentity, encode_dt, new_id},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A CareLink document store and identity directory backed by a single
/// SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All
/// statements run on one connection, so individual calls serialise
/// naturally; multi-call sequences are not transactional.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fetch one raw document row.
  async fn fetch_document(
    &self,
    collection: &str,
    id: &str,
  ) -> Result<Option<Document>> {
    let collection = collection.to_owned();
    let id = id.to_owned();

    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT doc_id, created_at, body FROM documents
               WHERE collection = ?1 AND doc_id = ?2",
              rusqlite::params![collection, id],
              |row| {
                Ok(RawDocument {
                  doc_id:     row.get(0)?,
                  created_at: row.get(1)?,
                  body:       row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDocument::into_document).transpose()
  }

  /// Insert-or-replace a document body, preserving `created_at` on
  /// replace, and return the row as stored.
  async fn upsert_document(
    &self,
    collection: &str,
    id: &str,
    body: &Value,
  ) -> Result<Document> {
    if !body.is_object() {
      return Err(Error::BodyNotObject);
    }

    let collection = collection.to_owned();
    let id = id.to_owned();
    let body_str = serde_json::to_string(body)?;
    let now_str = encode_dt(Utc::now());

    let raw: RawDocument = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO documents (collection, doc_id, created_at, body)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (collection, doc_id) DO UPDATE SET body = excluded.body",
          rusqlite::params![collection, id, now_str, body_str],
        )?;

        conn.query_row(
          "SELECT doc_id, created_at, body FROM documents
           WHERE collection = ?1 AND doc_id = ?2",
          rusqlite::params![collection, id],
          |row| {
            Ok(RawDocument {
              doc_id:     row.get(0)?,
              created_at: row.get(1)?,
              body:       row.get(2)?,
            })
          },
        )
        .map_err(Into::into)
      })
      .await?;

    raw.into_document()
  }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = Error;

  async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
    self.fetch_document(collection, id).await
  }

  async fn list(&self, collection: &str) -> Result<Vec<Document>> {
    let collection = collection.to_owned();

    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT doc_id, created_at, body FROM documents
           WHERE collection = ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![collection], |row| {
            Ok(RawDocument {
              doc_id:     row.get(0)?,
              created_at: row.get(1)?,
              body:       row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDocument::into_document).collect()
  }

  async fn query_eq(
    &self,
    collection: &str,
    field: &str,
    value: &Value,
  ) -> Result<Vec<Document>> {
    let collection = collection.to_owned();
    // json_extract normalises both sides to comparable SQL values, so a
    // string field matches a string query and a number field a number.
    let path = format!("$.{field}");
    let value_str = serde_json::to_string(value)?;

    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT doc_id, created_at, body FROM documents
           WHERE collection = ?1
             AND json_extract(body, ?2) = json_extract(?3, '$')",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![collection, path, value_str], |row| {
            Ok(RawDocument {
              doc_id:     row.get(0)?,
              created_at: row.get(1)?,
              body:       row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDocument::into_document).collect()
  }

  async fn add(&self, collection: &str, body: Value) -> Result<Document> {
    if !body.is_object() {
      return Err(Error::BodyNotObject);
    }

    let document = Document {
      id:         new_id(),
      created_at: Utc::now(),
      body,
    };

    let coll_str = collection.to_owned();
    let id_str = document.id.clone();
    let at_str = encode_dt(document.created_at);
    let body_str = serde_json::to_string(&document.body)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO documents (collection, doc_id, created_at, body)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![coll_str, id_str, at_str, body_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(document)
  }

  async fn set(&self, collection: &str, id: &str, body: Value) -> Result<Document> {
    self.upsert_document(collection, id, &body).await
  }

  async fn update(
    &self,
    collection: &str,
    id: &str,
    patch: Map<String, Value>,
  ) -> Result<Document> {
    if patch.is_empty() {
      return self.fetch_document(collection, id).await?.ok_or_else(|| {
        Error::DocumentNotFound {
          collection: collection.to_owned(),
          id:         id.to_owned(),
        }
      });
    }

    // One json_set path/value pair per patched field, applied in a single
    // statement so the merge cannot interleave with another writer.
    let mut args: Vec<String> = Vec::with_capacity(patch.len() * 2);
    for (key, value) in &patch {
      args.push(format!("$.{key}"));
      args.push(serde_json::to_string(value)?);
    }

    let collection = collection.to_owned();
    let id = id.to_owned();
    let coll_str = collection.clone();
    let id_str = id.clone();

    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        let pairs = ", ?, json(?)".repeat(args.len() / 2);
        let sql = format!(
          "UPDATE documents SET body = json_set(body{pairs})
           WHERE collection = ? AND doc_id = ?"
        );

        let params = args
          .iter()
          .map(String::as_str)
          .chain([coll_str.as_str(), id_str.as_str()]);
        let changed = conn.execute(&sql, rusqlite::params_from_iter(params))?;

        if changed == 0 {
          return Ok(None);
        }

        conn
          .query_row(
            "SELECT doc_id, created_at, body FROM documents
             WHERE collection = ?1 AND doc_id = ?2",
            rusqlite::params![coll_str, id_str],
            |row| {
              Ok(RawDocument {
                doc_id:     row.get(0)?,
                created_at: row.get(1)?,
                body:       row.get(2)?,
              })
            },
          )
          .optional()
          .map_err(Into::into)
      })
      .await?;

    match raw {
      Some(raw) => raw.into_document(),
      None => Err(Error::DocumentNotFound { collection, id }),
    }
  }

  async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
    let collection = collection.to_owned();
    let id = id.to_owned();

    let deleted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2",
          rusqlite::params![collection, id],
        )?;
        Ok(n > 0)
      })
      .await?;

    Ok(deleted)
  }
}

// ─── IdentityProvider impl ───────────────────────────────────────────────────

impl IdentityProvider for SqliteStore {
  type Error = Error;

  async fn create_user(&self, input: NewIdentity) -> Result<Identity> {
    let identity = Identity {
      uid:            new_id(),
      email:          input.email.clone(),
      email_verified: input.email_verified,
      claims:         Value::Object(Map::new()),
      created_at:     Utc::now(),
    };

    let uid_str = identity.uid.clone();
    let email_str = identity.email.clone();
    let verified = identity.email_verified;
    let at_str = encode_dt(identity.created_at);
    let password = input.password;

    let created: bool = self
      .conn
      .call(move |conn| {
        let exists: bool = conn
          .query_row(
            "SELECT 1 FROM identities WHERE email = ?1",
            rusqlite::params![email_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if exists {
          return Ok(false);
        }

        // Hashing runs here, on the dedicated database thread, so the
        // async runtime is never blocked by argon2's work factor.
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
          .hash_password(password.as_bytes(), &salt)
          .map_err(|e| tokio_rusqlite::Error::Other(e.to_string().into()))?
          .to_string();

        conn.execute(
          "INSERT INTO identities
             (uid, email, password_hash, email_verified, claims, created_at)
           VALUES (?1, ?2, ?3, ?4, '{}', ?5)",
          rusqlite::params![uid_str, email_str, hash, verified, at_str],
        )?;
        Ok(true)
      })
      .await?;

    if !created {
      return Err(Error::EmailTaken(input.email));
    }

    Ok(identity)
  }

  async fn delete_user(&self, uid: &str) -> Result<bool> {
    let uid = uid.to_owned();

    let deleted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "DELETE FROM identities WHERE uid = ?1",
          rusqlite::params![uid],
        )?;
        Ok(n > 0)
      })
      .await?;

    Ok(deleted)
  }

  async fn get_user(&self, uid: &str) -> Result<Option<Identity>> {
    let uid = uid.to_owned();

    let raw: Option<RawIdentity> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT uid, email, email_verified, claims, created_at
               FROM identities WHERE uid = ?1",
              rusqlite::params![uid],
              |row| {
                Ok(RawIdentity {
                  uid:            row.get(0)?,
                  email:          row.get(1)?,
                  email_verified: row.get(2)?,
                  claims:         row.get(3)?,
                  created_at:     row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawIdentity::into_identity).transpose()
  }

  async fn get_user_by_email(&self, email: &str) -> Result<Option<Identity>> {
    let email = email.to_owned();

    let raw: Option<RawIdentity> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT uid, email, email_verified, claims, created_at
               FROM identities WHERE email = ?1",
              rusqlite::params![email],
              |row| {
                Ok(RawIdentity {
                  uid:            row.get(0)?,
                  email:          row.get(1)?,
                  email_verified: row.get(2)?,
                  claims:         row.get(3)?,
                  created_at:     row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawIdentity::into_identity).transpose()
  }

  async fn set_custom_claims(&self, uid: &str, claims: Value) -> Result<()> {
    let uid_str = uid.to_owned();
    let claims_str = serde_json::to_string(&claims)?;

    let changed = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE identities SET claims = ?2 WHERE uid = ?1",
          rusqlite::params![uid_str, claims_str],
        )?;
        Ok(n)
      })
      .await?;

    if changed == 0 {
      return Err(Error::IdentityNotFound(uid.to_owned()));
    }

    Ok(())
  }
}

//! Error type for `carelink-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] carelink_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("password hash error: {0}")]
  PasswordHash(String),

  /// Attempted to patch a document that was not found.
  #[error("document not found: {collection}/{id}")]
  DocumentNotFound { collection: String, id: String },

  /// Attempted to set claims on an identity that was not found.
  #[error("identity not found: {0}")]
  IdentityNotFound(String),

  /// A document body must be a JSON object.
  #[error("document body is not a JSON object")]
  BodyNotObject,

  #[error("email already registered: {0}")]
  EmailTaken(String),
}

impl From<argon2::password_hash::Error> for Error {
  fn from(err: argon2::password_hash::Error) -> Self {
    Self::PasswordHash(err.to_string())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

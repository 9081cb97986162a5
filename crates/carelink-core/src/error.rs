//! Error types for `carelink-core`.

use thiserror::Error;

use crate::user::AccountStatus;

#[derive(Debug, Error)]
pub enum Error {
  /// An identity or profile lookup missed. Ensure-absent flows treat this
  /// as already satisfied rather than as a failure.
  #[error("user not found: {0}")]
  UserNotFound(String),

  #[error("document not found: {collection}/{id}")]
  DocumentNotFound { collection: String, id: String },

  #[error("email already registered: {0}")]
  EmailTaken(String),

  /// A review decision was applied to an account that is not pending.
  #[error("cannot move account from {from} to {to}")]
  InvalidTransition {
    from: AccountStatus,
    to:   AccountStatus,
  },

  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("unknown account status: {0:?}")]
  UnknownStatus(String),

  #[error("unknown facility type: {0:?}")]
  UnknownFacilityType(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// Failure inside the document store or identity provider backend.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error as [`Error::Store`].
  pub fn store<E>(err: E) -> Self
  where E: std::error::Error + Send + Sync + 'static {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

//! The `IdentityProvider` trait: credentials and custom claims.
//!
//! The provider is an external collaborator from the platform's point of
//! view. It owns uids and credentials; the platform owns everything else
//! and mirrors each identity with a `users`-collection profile document.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An identity as held by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
  /// Opaque, provider-assigned, immutable for the lifetime of the record.
  pub uid:            String,
  pub email:          String,
  pub email_verified: bool,
  /// The claim payload attached to this identity's auth tokens.
  pub claims:         Value,
  pub created_at:     DateTime<Utc>,
}

/// Input to [`IdentityProvider::create_user`]. The password is handed to
/// the provider and never persisted in plaintext anywhere.
#[derive(Debug, Clone)]
pub struct NewIdentity {
  pub email:          String,
  pub password:       String,
  pub email_verified: bool,
}

/// Abstraction over the identity provider backend.
///
/// Lookups return `Option` rather than failing on absence; callers build
/// create-if-missing and ensure-absent flows from that distinction and
/// surface a not-found error themselves where absence is actually wrong.
pub trait IdentityProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Create an identity with an empty claim payload. Fails if the email
  /// is already registered.
  fn create_user(
    &self,
    input: NewIdentity,
  ) -> impl Future<Output = Result<Identity, Self::Error>> + Send + '_;

  /// Remove an identity. Returns `false` if it was already absent.
  fn delete_user<'a>(
    &'a self,
    uid: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Retrieve an identity by uid. Returns `None` if not found.
  fn get_user<'a>(
    &'a self,
    uid: &'a str,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + 'a;

  /// Retrieve an identity by email. Returns `None` if not found.
  fn get_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + 'a;

  /// Replace the whole claim payload for an identity. Idempotent: setting
  /// the same payload twice is indistinguishable from setting it once.
  fn set_custom_claims<'a>(
    &'a self,
    uid: &'a str,
    claims: Value,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

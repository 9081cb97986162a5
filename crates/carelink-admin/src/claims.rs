//! [`ClaimIssuer`] — keeps identity-provider claims equal to the stored
//! role.
//!
//! The profile document's `role` is the only source of truth. The issuer
//! re-derives the claim payload from it and pushes the result; it never
//! reads existing claims back, so a stale or hand-edited payload is simply
//! overwritten.

use serde_json::{Map, Value, json};
use tracing::info;

use carelink_core::{
  Error, Result,
  identity::IdentityProvider,
  store::{DocumentStore, collections},
  user::{Role, UserRecord, canonical_claims},
};

pub struct ClaimIssuer<'a, S, P> {
  store:    &'a S,
  provider: &'a P,
}

impl<'a, S, P> ClaimIssuer<'a, S, P>
where
  S: DocumentStore,
  P: IdentityProvider,
{
  pub fn new(store: &'a S, provider: &'a P) -> Self {
    Self { store, provider }
  }

  /// Re-derive claims from the stored role and push them to the provider.
  ///
  /// Idempotent. Returns the payload that was pushed.
  pub async fn sync_claims(&self, user_id: &str) -> Result<Value> {
    let doc = self
      .store
      .get(collections::USERS, user_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::UserNotFound(user_id.to_owned()))?;
    let user = UserRecord::from_document(doc)?;

    let claims = canonical_claims(user.profile.role);
    self
      .provider
      .set_custom_claims(user_id, claims.clone())
      .await
      .map_err(Error::store)?;

    Ok(claims)
  }

  /// Write `role` to the profile document, then sync claims before
  /// returning. The two writes are one control flow on purpose; a role
  /// without matching claims must never outlive this call.
  pub async fn assign_role(&self, user_id: &str, role: Role) -> Result<Value> {
    let mut patch = Map::new();
    patch.insert("role".to_owned(), json!(role.as_str()));
    self
      .store
      .update(collections::USERS, user_id, patch)
      .await
      .map_err(Error::store)?;

    let claims = self.sync_claims(user_id).await?;
    info!(user_id, role = %role, "role assigned and claims synced");
    Ok(claims)
  }
}

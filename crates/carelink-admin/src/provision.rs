//! Bootstrap provisioning of the platform administrator.
//!
//! [`ensure_admin`] is the first thing run against a fresh deployment. It
//! is deliberately destructive towards its own email: an existing identity
//! under the seed address is deleted and recreated, which resets the
//! password and clears any drifted claims. Only the seed admin gets this
//! treatment; ordinary accounts go through the approval workflow.

use tracing::info;

use carelink_core::{
  Error, Result,
  identity::{IdentityProvider, NewIdentity},
  store::{DocumentStore, collections},
  user::{AccountStatus, Role, UserProfile, UserRecord},
};

use crate::claims::ClaimIssuer;

/// Credentials for the bootstrap administrator. The defaults are
/// first-login credentials and are expected to be rotated immediately.
#[derive(Debug, Clone)]
pub struct SeedAdmin {
  pub email:    String,
  pub password: String,
}

impl Default for SeedAdmin {
  fn default() -> Self {
    Self {
      email:    "admin@test.com".to_owned(),
      password: "admin2025".to_owned(),
    }
  }
}

#[derive(Debug, Clone)]
pub struct Provisioned {
  /// The uid of the identity that was replaced, when one existed.
  pub previous_uid: Option<String>,
  pub user:         UserRecord,
}

/// Create (or recreate) the administrator account and sync its claims.
pub async fn ensure_admin<S, P>(
  store: &S,
  provider: &P,
  seed: &SeedAdmin,
) -> Result<Provisioned>
where
  S: DocumentStore,
  P: IdentityProvider,
{
  let previous_uid = match provider
    .get_user_by_email(&seed.email)
    .await
    .map_err(Error::store)?
  {
    Some(existing) => {
      provider
        .delete_user(&existing.uid)
        .await
        .map_err(Error::store)?;
      // The stale profile doc would otherwise linger under the old uid.
      store
        .delete(collections::USERS, &existing.uid)
        .await
        .map_err(Error::store)?;
      info!(uid = %existing.uid, "replaced existing admin identity");
      Some(existing.uid)
    }
    None => None,
  };

  let identity = provider
    .create_user(NewIdentity {
      email:          seed.email.clone(),
      password:       seed.password.clone(),
      email_verified: true,
    })
    .await
    .map_err(Error::store)?;

  let profile = UserProfile {
    email:          seed.email.clone(),
    role:           Role::Admin,
    status:         AccountStatus::Active,
    display_name:   None,
    requested_role: None,
    status_reason:  None,
  };
  let doc = store
    .set(collections::USERS, &identity.uid, profile.to_value()?)
    .await
    .map_err(Error::store)?;
  let user = UserRecord::from_document(doc)?;

  ClaimIssuer::new(store, provider)
    .sync_claims(&user.id)
    .await?;
  info!(uid = %user.id, email = %seed.email, "admin account provisioned");

  Ok(Provisioned { previous_uid, user })
}

#[cfg(test)]
mod tests {
  use carelink_store_sqlite::SqliteStore;
  use serde_json::json;

  use carelink_core::{
    identity::IdentityProvider,
    store::{DocumentStore, collections},
    user::{AccountStatus, Role},
  };

  use super::{SeedAdmin, ensure_admin};

  #[tokio::test]
  async fn fresh_store_gets_an_active_admin() {
    let store = SqliteStore::open_in_memory().await.unwrap();

    let provisioned = ensure_admin(&store, &store, &SeedAdmin::default())
      .await
      .unwrap();

    assert!(provisioned.previous_uid.is_none());
    assert_eq!(provisioned.user.profile.role, Role::Admin);
    assert_eq!(provisioned.user.profile.status, AccountStatus::Active);

    let identity = store.get_user(&provisioned.user.id).await.unwrap().unwrap();
    assert_eq!(identity.email, "admin@test.com");
    assert!(identity.email_verified);
    assert_eq!(identity.claims, json!({ "role": "admin" }));
  }

  #[tokio::test]
  async fn rerun_replaces_the_identity_and_profile() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let seed = SeedAdmin::default();

    let first = ensure_admin(&store, &store, &seed).await.unwrap();
    let second = ensure_admin(&store, &store, &seed).await.unwrap();

    assert_eq!(second.previous_uid.as_deref(), Some(first.user.id.as_str()));
    assert_ne!(second.user.id, first.user.id);

    // The old identity and its profile doc are gone.
    assert!(store.get_user(&first.user.id).await.unwrap().is_none());
    let profiles = store.list(collections::USERS).await.unwrap();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].id, second.user.id);

    let identity = store.get_user(&second.user.id).await.unwrap().unwrap();
    assert_eq!(identity.claims, json!({ "role": "admin" }));
  }

  #[tokio::test]
  async fn custom_seed_credentials_are_honored() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let seed = SeedAdmin {
      email:    "root@lifecare.example.org".to_owned(),
      password: "not-the-default".to_owned(),
    };

    let provisioned = ensure_admin(&store, &store, &seed).await.unwrap();

    assert_eq!(provisioned.user.profile.email, "root@lifecare.example.org");
    let identity = store
      .get_user_by_email("root@lifecare.example.org")
      .await
      .unwrap()
      .unwrap();
    assert_eq!(identity.uid, provisioned.user.id);
  }
}

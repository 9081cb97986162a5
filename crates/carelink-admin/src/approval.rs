//! [`ApprovalWorkflow`] — the account lifecycle state machine.
//!
//! One state machine per user: `pending` → `approved` | `rejected`, one
//! way. Re-review means a fresh registration (or an administrative reset,
//! which is [`provision`](crate::provision) territory, not this module's).
//!
//! Ordering matters here. The status write is durable before any mail is
//! attempted, and claim sync happens before mail too, so an interrupted or
//! failing dispatch can never leave the account record behind. The mail
//! outcome travels inside [`Decision`], never as the operation's error.

use serde::Serialize;
use serde_json::{Map, json};
use tracing::{info, warn};

use carelink_core::{
  Error, Result,
  identity::{IdentityProvider, NewIdentity},
  notify::{DispatchError, DispatchOutcome, Mailer, Message},
  store::{DocumentStore, collections},
  user::{AccountStatus, NewRegistration, Role, UserProfile, UserRecord},
};
use carelink_notify::{
  MailSettings, approved_message, pending_review_message, rejected_message,
};

use crate::claims::ClaimIssuer;

/// The result of a review decision (or a registration): the user as
/// stored, plus what happened to the best-effort notification.
#[derive(Debug, Clone, Serialize)]
pub struct Decision {
  pub user:         UserRecord,
  pub notification: DispatchOutcome,
}

pub struct ApprovalWorkflow<'a, S, P, M> {
  store:    &'a S,
  provider: &'a P,
  mailer:   &'a M,
  mail:     MailSettings,
}

impl<'a, S, P, M> ApprovalWorkflow<'a, S, P, M>
where
  S: DocumentStore,
  P: IdentityProvider,
  M: Mailer,
{
  pub fn new(store: &'a S, provider: &'a P, mailer: &'a M, mail: MailSettings) -> Self {
    Self { store, provider, mailer, mail }
  }

  // ── Registration ──────────────────────────────────────────────────────────

  /// Self-registration: create the identity, write a `pending` profile,
  /// then tell the reviewer.
  ///
  /// The working role is granted at approval time; until then the profile
  /// carries `role = unassigned` and remembers what was asked for.
  pub async fn register(&self, input: NewRegistration) -> Result<Decision> {
    if self
      .provider
      .get_user_by_email(&input.email)
      .await
      .map_err(Error::store)?
      .is_some()
    {
      return Err(Error::EmailTaken(input.email));
    }

    let identity = self
      .provider
      .create_user(NewIdentity {
        email:          input.email.clone(),
        password:       input.password,
        email_verified: false,
      })
      .await
      .map_err(Error::store)?;

    let profile = UserProfile {
      email:          input.email,
      role:           Role::Unassigned,
      status:         AccountStatus::Pending,
      display_name:   input.display_name,
      requested_role: input.requested_role,
      status_reason:  None,
    };
    let doc = self
      .store
      .set(collections::USERS, &identity.uid, profile.to_value()?)
      .await
      .map_err(Error::store)?;
    let user = UserRecord::from_document(doc)?;
    info!(uid = %user.id, email = %user.profile.email, "registration recorded");

    let notification = self.notify_pending_approval(&user).await;
    Ok(Decision { user, notification })
  }

  /// Tell the reviewer an account awaits review. Best-effort.
  pub async fn notify_pending_approval(&self, user: &UserRecord) -> DispatchOutcome {
    let message = pending_review_message(
      &self.mail,
      user.profile.display_name_or_email(),
      &user.profile.email,
    );
    self.dispatch(message).await
  }

  // ── Review decisions ──────────────────────────────────────────────────────

  /// Approve a pending account.
  ///
  /// The granted role is `role` when given, otherwise the role requested
  /// at registration; when neither exists the account stays `unassigned`.
  /// Claims are re-synced before the applicant is notified.
  pub async fn approve(&self, user_id: &str, role: Option<Role>) -> Result<Decision> {
    let current = self.load(user_id).await?;
    self.check_reviewable(&current, AccountStatus::Approved)?;

    let granted = role.or(current.profile.requested_role);
    let mut patch = Map::new();
    patch.insert("status".to_owned(), json!(AccountStatus::Approved.as_str()));
    if let Some(role) = granted {
      patch.insert("role".to_owned(), json!(role.as_str()));
    }

    let doc = self
      .store
      .update(collections::USERS, user_id, patch)
      .await
      .map_err(Error::store)?;
    let user = UserRecord::from_document(doc)?;

    ClaimIssuer::new(self.store, self.provider)
      .sync_claims(user_id)
      .await?;
    info!(uid = %user.id, role = %user.profile.role, "account approved");

    let message = approved_message(
      &self.mail,
      &user.profile.email,
      user.profile.display_name_or_email(),
    );
    let notification = self.dispatch(message).await;
    Ok(Decision { user, notification })
  }

  /// Reject a pending account, recording the reviewer's reason.
  pub async fn reject(&self, user_id: &str, reason: &str) -> Result<Decision> {
    let current = self.load(user_id).await?;
    self.check_reviewable(&current, AccountStatus::Rejected)?;

    let mut patch = Map::new();
    patch.insert("status".to_owned(), json!(AccountStatus::Rejected.as_str()));
    patch.insert("statusReason".to_owned(), json!(reason));

    let doc = self
      .store
      .update(collections::USERS, user_id, patch)
      .await
      .map_err(Error::store)?;
    let user = UserRecord::from_document(doc)?;
    info!(uid = %user.id, reason, "account rejected");

    let message = rejected_message(
      &self.mail,
      &user.profile.email,
      user.profile.display_name_or_email(),
      reason,
    );
    let notification = self.dispatch(message).await;
    Ok(Decision { user, notification })
  }

  /// Profiles currently awaiting review.
  pub async fn pending(&self) -> Result<Vec<UserRecord>> {
    let docs = self
      .store
      .query_eq(
        collections::USERS,
        "status",
        &json!(AccountStatus::Pending.as_str()),
      )
      .await
      .map_err(Error::store)?;
    docs.into_iter().map(UserRecord::from_document).collect()
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  async fn load(&self, user_id: &str) -> Result<UserRecord> {
    let doc = self
      .store
      .get(collections::USERS, user_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::UserNotFound(user_id.to_owned()))?;
    UserRecord::from_document(doc)
  }

  fn check_reviewable(&self, user: &UserRecord, to: AccountStatus) -> Result<()> {
    if user.profile.status.awaiting_review() {
      Ok(())
    } else {
      Err(Error::InvalidTransition { from: user.profile.status, to })
    }
  }

  /// Send with one retry, folding the result into a [`DispatchOutcome`].
  /// A missing relay is not worth retrying.
  async fn dispatch(&self, message: Message) -> DispatchOutcome {
    let result = match self.mailer.send(&message).await {
      Err(err @ DispatchError::NotConfigured) => Err(err),
      Err(err) => {
        warn!(subject = %message.subject, error = %err, "dispatch failed, retrying once");
        self.mailer.send(&message).await
      }
      ok => ok,
    };

    if let Err(err) = &result {
      warn!(
        to = %message.to,
        subject = %message.subject,
        error = %err,
        "notification not delivered; account state is already durable"
      );
    }
    DispatchOutcome::from_result(result)
  }
}
